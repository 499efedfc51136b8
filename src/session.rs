/*!
Request cycle driver.

One cycle is: send argv, classify the response, act on it. A confirmation
directive ends the cycle with a resubmission carrying `--confirm <answer>`;
the single-use confirmation state bounds the loop to two cycles.
*/

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::color;
use crate::config::Config;
use crate::confirm::{self, ConfirmationState};
use crate::errors::ProxyError;
use crate::exec::CommandExecutor;
use crate::response::{self, Classification, Directive};
use crate::transport::{Response, Transport};
use crate::validate::{self, Allowlist};

/// What a finished cycle asks the loop to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Exit(i32),
    Resubmit(Vec<String>),
}

/// Operator-facing streams. The child process always inherits the real stdio.
pub struct Streams<'a> {
    pub stdin: &'a mut dyn BufRead,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Owns everything one process invocation needs; no ambient globals.
pub struct Session<T: Transport> {
    transport: T,
    config: Config,
    allowlist: Allowlist,
    confirmation: ConfirmationState,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Self::with_allowlist(transport, config, Allowlist::default())
    }

    pub fn with_allowlist(transport: T, config: Config, allowlist: Allowlist) -> Self {
        Self {
            transport,
            config,
            allowlist,
            confirmation: ConfirmationState::default(),
        }
    }

    pub fn confirmation(&self) -> ConfirmationState {
        self.confirmation
    }

    /// Run request cycles until one finishes. Returns the process exit code.
    pub fn run(
        &mut self,
        argv: Vec<String>,
        streams: &mut Streams<'_>,
    ) -> Result<i32, ProxyError> {
        let mut argv = argv;
        loop {
            let response = self.transport.send(&argv)?;
            match self.handle(response, &argv, streams)? {
                Step::Exit(code) => return Ok(code),
                Step::Resubmit(next) => argv = next,
            }
        }
    }

    /// Act on one response for the request that produced it.
    pub fn handle(
        &mut self,
        mut response: Response,
        argv: &[String],
        streams: &mut Streams<'_>,
    ) -> Result<Step, ProxyError> {
        match response::classify(&response) {
            Classification::Failure { status } => {
                debug!(status, "server rejected request");
                if io::copy(&mut *response.body, &mut *streams.stderr).is_err() {
                    report(streams, "! Error copying response body to stderr");
                }
                Ok(Step::Exit(1))
            }
            Classification::Directive(Directive::Output) => {
                if io::copy(&mut *response.body, &mut *streams.stdout).is_err() {
                    report(streams, "! Error copying response body to stdout");
                }
                let _ = streams.stdout.flush();
                Ok(Step::Exit(0))
            }
            Classification::Directive(Directive::Confirm { prompt }) => {
                self.confirmation.consume()?;
                let answer = confirm::prompt_for_answer(
                    &prompt,
                    &mut *response.body,
                    &mut *streams.stdin,
                    &mut *streams.stdout,
                )?;
                Ok(Step::Resubmit(confirm::confirmed_argv(answer, argv)))
            }
            Classification::Directive(Directive::Execute {
                program,
                pg_password,
            }) => {
                let raw = response::read_args_body(&mut *response.body)
                    .map_err(ProxyError::ReadBody)?;
                let received = validate::split_nul_args(&raw);

                let verdict =
                    validate::validate(&self.allowlist, &program, argv, received.clone());
                let args = match verdict.into_result() {
                    Ok(args) => args,
                    Err(rejection) => {
                        debug!(
                            "failure: {} {:?}",
                            self.config.executable_for(&program).display(),
                            received
                        );
                        warn!(%program, reason = %rejection, "refusing server-requested command");
                        return Err(rejection.into());
                    }
                };

                let executor = CommandExecutor::new(&self.config, &self.allowlist);
                let code = executor.execute(&program, args, pg_password.as_deref())?;
                Ok(Step::Exit(code))
            }
        }
    }
}

fn report(streams: &mut Streams<'_>, msg: &str) {
    let _ = writeln!(streams.stderr, "{msg}");
}

/// Print a fatal error line the way the binary does.
pub fn report_fatal(err: &ProxyError) {
    color::log_error_stderr(color::color_enabled_stderr(), &err.to_string());
}
