//! Command-line configuration.
//!
//! Resolves the role and the endpoint before any socket is opened. Each
//! category of configuration error maps to its own exit status.

use std::{ffi::OsString, fmt, io, net::SocketAddr};

use clap::{
    error::{ContextKind, ContextValue, ErrorKind},
    ArgGroup, Parser,
};
use tokio::net::lookup_host;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "fib-channel")]
#[command(version)]
#[command(about = "Computes fibonacci numbers over a fixed-size binary protocol", long_about = None)]
#[command(group(ArgGroup::new("role").required(true).args(["server", "client"])))]
pub struct CliArgs {
    /// Run the server
    #[arg(long)]
    pub server: bool,

    /// Run the interactive client
    #[arg(long)]
    pub client: bool,

    /// Host to bind to (server) or connect to (client)
    #[arg(long)]
    pub host: String,

    /// Port to bind to (server) or connect to (client)
    #[arg(long)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Resolved address plus the role to play on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionEndpoint {
    pub role: Role,
    pub addr: SocketAddr,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Help or version output was requested.
    #[error("{0}")]
    Informational(clap::Error),
    /// Arguments were given in the wrong shape or combination.
    #[error("{0}")]
    Malformed(clap::Error),
    /// A required argument is missing.
    #[error("{0}")]
    MissingKey(clap::Error),
    /// The port is not a number in 0..=65535.
    #[error("{0}")]
    InvalidPort(clap::Error),
    /// The host did not resolve to an address.
    #[error("could not resolve host {host:?}")]
    UnresolvableHost {
        host: String,
        #[source]
        source: io::Error,
    },
    /// An argument is not recognized.
    #[error("{0}")]
    UnrecognizedKey(clap::Error),
}

impl From<clap::Error> for ConfigError {
    fn from(err: clap::Error) -> Self {
        match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                ConfigError::Informational(err)
            }
            ErrorKind::MissingRequiredArgument => ConfigError::MissingKey(err),
            ErrorKind::InvalidValue | ErrorKind::ValueValidation if is_port_error(&err) => {
                ConfigError::InvalidPort(err)
            }
            ErrorKind::UnknownArgument => ConfigError::UnrecognizedKey(err),
            _ => ConfigError::Malformed(err),
        }
    }
}

/// Whether clap rejected a value actually given to `--port`.
///
/// A flag left without any value is a malformed invocation, whichever flag it is.
fn is_port_error(err: &clap::Error) -> bool {
    let blames_port = matches!(
        err.get(ContextKind::InvalidArg),
        Some(ContextValue::String(arg)) if arg.starts_with("--port")
    );
    let has_value = matches!(
        err.get(ContextKind::InvalidValue),
        Some(ContextValue::String(value)) if !value.is_empty()
    );
    blames_port && has_value
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::Informational(_) => 0,
            ConfigError::Malformed(_) => 2,
            ConfigError::MissingKey(_) => 3,
            ConfigError::InvalidPort(_) => 4,
            ConfigError::UnresolvableHost { .. } => 5,
            ConfigError::UnrecognizedKey(_) => 6,
        }
    }

    /// Prints the error the way clap would: help to stdout, everything else to stderr.
    pub fn report(&self) {
        match self {
            ConfigError::Informational(err)
            | ConfigError::Malformed(err)
            | ConfigError::MissingKey(err)
            | ConfigError::InvalidPort(err)
            | ConfigError::UnrecognizedKey(err) => {
                let _ = err.print();
            }
            ConfigError::UnresolvableHost { .. } => eprintln!("error: {self}"),
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub endpoint: ConnectionEndpoint,
    pub log_level: String,
}

impl CliArgs {
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?)
    }

    pub fn role(&self) -> Role {
        if self.server {
            Role::Server
        } else {
            Role::Client
        }
    }
}

impl Config {
    /// Resolves the host and port, keeping the first address found.
    pub async fn resolve(args: CliArgs) -> Result<Self, ConfigError> {
        let role = args.role();
        let unresolvable = |source: io::Error| ConfigError::UnresolvableHost {
            host: args.host.clone(),
            source,
        };

        let addr = lookup_host((args.host.as_str(), args.port))
            .await
            .map_err(unresolvable)?
            .next()
            .ok_or_else(|| {
                unresolvable(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses found",
                ))
            })?;

        Ok(Self {
            endpoint: ConnectionEndpoint { role, addr },
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn exit_code(args: &[&str]) -> u8 {
        match CliArgs::try_parse_args(args.iter().copied()) {
            Ok(_) => panic!("expected {args:?} to be rejected"),
            Err(err) => err.exit_code(),
        }
    }

    #[test]
    fn test_parse_server() {
        let args = CliArgs::try_parse_args(["fib-channel", "--server", "--host", "localhost", "--port", "8964"])
            .unwrap();
        assert_eq!(args.role(), Role::Server);
        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 8964);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(exit_code(&["fib-channel", "--help"]), 0);
        assert_eq!(
            exit_code(&["fib-channel", "--server", "--client", "--host", "h", "--port", "1"]),
            2
        );
        assert_eq!(exit_code(&["fib-channel", "--host", "h", "--port", "1"]), 3);
        assert_eq!(exit_code(&["fib-channel", "--client", "--port", "1"]), 3);
        assert_eq!(
            exit_code(&["fib-channel", "--client", "--host", "h", "--port", "65536"]),
            4
        );
        assert_eq!(
            exit_code(&["fib-channel", "--client", "--host", "h", "--port", "http"]),
            4
        );
        assert_eq!(
            exit_code(&["fib-channel", "--client", "--host", "h", "--port", "1", "--bogus", "x"]),
            6
        );
        assert_eq!(exit_code(&["fib-channel", "--client", "--port", "1", "--host"]), 2);
        assert_eq!(exit_code(&["fib-channel", "--client", "--host", "h", "--port"]), 2);
    }

    #[tokio::test]
    async fn test_resolve_endpoint() {
        let args = CliArgs::try_parse_args(["fib-channel", "--client", "--host", "127.0.0.1", "--port", "8964"])
            .unwrap();
        let config = Config::resolve(args).await.unwrap();
        assert_eq!(
            config.endpoint,
            ConnectionEndpoint {
                role: Role::Client,
                addr: "127.0.0.1:8964".parse().unwrap(),
            }
        );
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let args = CliArgs::try_parse_args(["fib-channel", "--server", "--host", "not a host", "--port", "1"])
            .unwrap();
        let err = Config::resolve(args).await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
