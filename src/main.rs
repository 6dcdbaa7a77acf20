use std::{error::Error, future, net::SocketAddr, process::ExitCode};

use fib_channel::{
    client::Client,
    config::{CliArgs, Config, Role},
    readwriter::console,
    server::Server,
    session,
};
use tokio::{io::BufReader, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt::time::UtcTime, EnvFilter};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::try_parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => {
            err.report();
            return ExitCode::from(err.exit_code());
        }
    };

    init_tracing(&args.log_level);

    let config = match Config::resolve(args).await {
        Ok(config) => config,
        Err(err) => {
            err.report();
            return ExitCode::from(err.exit_code());
        }
    };

    let endpoint = config.endpoint;
    info!(role = %endpoint.role, addr = %endpoint.addr, "starting");
    let result = match endpoint.role {
        Role::Server => run_server(endpoint.addr).await,
        Role::Client => run_client(endpoint.addr).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(cause = ?err, "{} failed: {err}", endpoint.role);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
}

async fn run_server(addr: SocketAddr) -> Result<(), BoxError> {
    let server = Server::bind(addr).await?;
    server
        .run_until(async {
            if let Err(err) = signal::ctrl_c().await {
                error!(cause = %err, "could not listen for ctrl-c");
                future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

async fn run_client(addr: SocketAddr) -> Result<(), BoxError> {
    let client = Client::connect(addr).await?;
    info!(%addr, "connected");

    let mut console = BufReader::new(console::stdio());
    session::run(&mut console, client).await?;
    Ok(())
}
