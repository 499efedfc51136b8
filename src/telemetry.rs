use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

const DEBUG_DIRECTIVE: &str = "ubi_cli=debug,ubi=debug";

/// Filter directive: explicit `UBI_LOG`, else our own crates at debug under UBI_DEBUG, else silent.
pub fn filter_directive(log_env: Option<&str>, debug: bool) -> String {
    match log_env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(d) => d.to_string(),
        None if debug => DEBUG_DIRECTIVE.to_string(),
        None => "off".to_string(),
    }
}

/// Install the stderr fmt subscriber once. Stdout stays reserved for server output.
pub fn telemetry_init(debug: bool) {
    if INIT.get().is_some() {
        return;
    }
    let log_env = env::var("UBI_LOG").ok();
    let directive = filter_directive(log_env.as_deref(), debug);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("off"));

    let res = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(crate::color::color_enabled_stderr())
        .with_target(false)
        .without_time()
        .try_init();
    if res.is_err() {
        eprintln!("ubi: logging init skipped (global subscriber already set)");
    }
    let _ = INIT.set(());
}
