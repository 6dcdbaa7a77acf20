//! Interactive client session.
//!
//! Every console line is either an integer index to look up or a bare empty
//! line meaning quit. Lines that are not a 32-bit integer are reported back
//! to the user and nothing is sent for them.

use std::num::ParseIntError;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::{
    client::Client,
    error::{ConnectionError, SessionError},
    Request, Response, Transport,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Query(i32),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid input {line:?}: expected an integer between {} and {}", i32::MIN, i32::MAX)]
pub struct ParseLineError {
    line: String,
    #[source]
    source: ParseIntError,
}

/// Interprets one console line, with or without its trailing line break.
pub fn parse_line(line: &str) -> Result<Command, ParseLineError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() {
        return Ok(Command::Quit);
    }
    line.trim()
        .parse()
        .map(Command::Query)
        .map_err(|source| ParseLineError {
            line: line.to_owned(),
            source,
        })
}

/// Runs the session until the user quits or the input ends, then closes the connection.
pub async fn run<C, TP>(console: &mut C, mut client: Client<TP>) -> Result<(), SessionError>
where
    C: AsyncBufRead + AsyncWrite + Unpin,
    TP: Transport<Request, Response, TransportError = ConnectionError> + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if console.read_line(&mut line).await? == 0 {
            info!("input closed, disconnecting");
            break;
        }

        match parse_line(&line) {
            Ok(Command::Quit) => {
                info!("disconnecting");
                break;
            }
            Ok(Command::Query(index)) => {
                let value = client.call(index).await?;
                debug!(index, value, "answer received");
                console
                    .write_all(format!("answer: {value}\n").as_bytes())
                    .await?;
            }
            Err(err) => {
                console.write_all(format!("{err}\n").as_bytes()).await?;
            }
        }
        console.flush().await?;
    }

    client.close().await?;
    Ok(())
}
