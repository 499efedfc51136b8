use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use tracing::{debug, Level};

use crate::config::Config;
use crate::errors::ProxyError;
use crate::validate::Allowlist;

pub const PGPASSWORD_ENV: &str = "PGPASSWORD";

/// A validated program invocation. Standard streams are always inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecRequest {
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(OsString, OsString)>,
}

impl ExecRequest {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Turns execute directives into child processes.
#[derive(Debug, Clone, Copy)]
pub struct CommandExecutor<'a> {
    config: &'a Config,
    allowlist: &'a Allowlist,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(config: &'a Config, allowlist: &'a Allowlist) -> Self {
        Self { config, allowlist }
    }

    /// Resolve the executable and attach PGPASSWORD for database clients.
    pub fn prepare(
        &self,
        program: &str,
        args: Vec<String>,
        pg_password: Option<&str>,
    ) -> ExecRequest {
        let mut request = ExecRequest::new(self.config.executable_for(program)).args(args);
        if let Some(pw) = pg_password {
            if self.allowlist.is_pg_client(program) {
                request = request.env(PGPASSWORD_ENV, pw);
            }
        }
        request
    }

    /// Run the program to completion and return the exit code to propagate.
    pub fn execute(
        &self,
        program: &str,
        args: Vec<String>,
        pg_password: Option<&str>,
    ) -> Result<i32, ProxyError> {
        spawn_and_wait(&self.prepare(program, args, pg_password))
    }
}

/// Spawn with inherited stdio and wait. Blocks for the child's lifetime.
pub fn spawn_and_wait(request: &ExecRequest) -> Result<i32, ProxyError> {
    if tracing::enabled!(Level::DEBUG) {
        let resolved = which::which(&request.program).unwrap_or_else(|_| request.program.clone());
        debug!("exec: {} {:?}", resolved.display(), request.args);
    }

    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args);
    for (key, value) in &request.env {
        cmd.env(key, value);
    }

    let status = cmd.status().map_err(ProxyError::Spawn)?;
    exit_code_for_status(status)
}

fn exit_code_for_status(status: ExitStatus) -> Result<i32, ProxyError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }
    Err(ProxyError::Signaled(signal_name(status)))
}

#[cfg(unix)]
fn signal_name(status: ExitStatus) -> String {
    use nix::sys::signal::Signal;
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(sig) => Signal::try_from(sig)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|_| sig.to_string()),
        None => "unknown".to_string(),
    }
}

#[cfg(not(unix))]
fn signal_name(_status: ExitStatus) -> String {
    "unknown".to_string()
}
