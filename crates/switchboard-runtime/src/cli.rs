//! Command-line adapter.
//!
//! ```text
//! <service> start                  start every enabled listener
//! <service> <method> <data>        dispatch <method> with JSON-encoded <data>
//! <service> call <envelope>        dispatch a full JSON envelope
//! ```
//!
//! One invocation performs one dispatch. The JSON result is returned to the
//! caller for printing; any failure is an error and nothing is printed.

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Arg, ArgMatches, Command};
use serde_json::Value;
use switchboard_core::{DispatchError, DispatchResult, Dispatcher, Envelope, encode_result};
use tracing::{debug, warn};

use crate::error::{RuntimeError, RuntimeResult};

const START: &str = "start";
const CALL: &str = "call";

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Start the listeners and background tasks.
    Start,
    /// A dispatch ran; holds the JSON-encoded result.
    Output(String),
    /// Help text was requested or no command was given.
    Help(String),
}

/// Builds and runs the command line for one dispatcher.
#[derive(Debug, Clone)]
pub struct Cli {
    name: String,
    dispatcher: Dispatcher,
}

impl Cli {
    /// Creates the CLI for service `name`.
    pub fn new(name: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            name: name.into(),
            dispatcher,
        }
    }

    /// The `clap` command: `start`, `call` and one subcommand per method.
    ///
    /// Methods named `start` or `call` stay reachable through `call`.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone())
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(Command::new(START).about("Start services"))
            .subcommand(
                Command::new(CALL)
                    .about("Dispatch a JSON envelope")
                    .arg(Arg::new("envelope").help("{\"method\": ..., \"data\": ...}")),
            );

        for descriptor in self.dispatcher.registry().iter() {
            let method = descriptor.name();
            if method == START || method == CALL {
                warn!(method = %method, "Method shadows a built-in command, use `call` instead");
                continue;
            }
            command = command.subcommand(
                Command::new(method.to_string())
                    .about(descriptor.describe().to_string())
                    .arg(Arg::new("data").help("JSON-encoded request data")),
            );
        }

        command
    }

    /// Parses `args` (program name first) and performs the invocation.
    pub async fn run_from<I, T>(&self, args: I) -> RuntimeResult<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.command().try_get_matches_from(args) {
            Ok(matches) => self.execute(&matches).await,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                        | ErrorKind::DisplayVersion
                ) =>
            {
                Ok(Invocation::Help(err.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Performs the invocation described by `matches`.
    pub async fn execute(&self, matches: &ArgMatches) -> RuntimeResult<Invocation> {
        let Some((name, sub)) = matches.subcommand() else {
            return Err(RuntimeError::Cli("no command given".to_string()));
        };
        if name == START {
            return Ok(Invocation::Start);
        }

        let input = if name == CALL {
            sub.get_one::<String>("envelope")
        } else {
            sub.get_one::<String>("data")
        }
        .map(String::as_str)
        .unwrap_or_default();

        let envelope = if name == CALL {
            parse_envelope(input)
        } else {
            envelope_for(name, input)
        }
        .map_err(|err| RuntimeError::command(name, err))?;

        self.dispatch(name, envelope).await.map(Invocation::Output)
    }

    async fn dispatch(&self, name: &str, envelope: Envelope) -> RuntimeResult<String> {
        debug!(command = %name, method = %envelope.method, "Executing command");
        let outcome = self.dispatcher.dispatch(envelope).await;
        if let Some(err) = outcome.failure_error() {
            return Err(RuntimeError::command(name, err));
        }

        let body = encode_result(&outcome).map_err(|err| RuntimeError::command(name, err))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Decodes a full envelope given on the command line.
pub fn parse_envelope(input: &str) -> DispatchResult<Envelope> {
    if input.is_empty() {
        return Err(DispatchError::decode("empty data provided"));
    }
    let envelope = Envelope::decode(input.as_bytes())?;
    if envelope.method.is_empty() {
        return Err(DispatchError::validation("empty message method got"));
    }
    Ok(envelope)
}

/// Builds the envelope for `method` from JSON-encoded data.
pub fn envelope_for(method: &str, data: &str) -> DispatchResult<Envelope> {
    if data.is_empty() {
        return Err(DispatchError::decode("empty data provided"));
    }
    let data: Value =
        serde_json::from_str(data).map_err(|e| DispatchError::decode(e.to_string()))?;
    Ok(Envelope::new(method, data))
}
