use std::env;
use std::io;
use std::process::ExitCode;

use ubi_cli::{
    exit_code_for_proxy_error, report_fatal, telemetry_init, Allowlist, Config, HttpTransport,
    ProxyError, Session, Streams,
};

fn fail(err: &ProxyError) -> ExitCode {
    report_fatal(err);
    ExitCode::from(exit_code_for_proxy_error(err))
}

/// Operator argv, forwarded verbatim (no local flag parsing).
fn forwarded_argv() -> Vec<String> {
    env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn main() -> ExitCode {
    let argv = forwarded_argv();

    let allowlist = Allowlist::default();
    let config = match Config::from_env(&allowlist) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    telemetry_init(config.debug);

    let transport = match HttpTransport::new(&config) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("http client init failed: {e:#}");
            return fail(&ProxyError::BuildRequest);
        }
    };

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut streams = Streams {
        stdin: &mut stdin,
        stdout: &mut stdout,
        stderr: &mut stderr,
    };

    let mut session = Session::with_allowlist(transport, config, allowlist);
    match session.run(argv, &mut streams) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => fail(&e),
    }
}
