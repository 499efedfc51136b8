#![allow(clippy::module_name_repetitions)]
//! Color mode configuration and ANSI painting helpers.
//!
//! Logging helpers policy (stderr one-liners):
//! - Apply only to the `!` error lines printed by the binary.
//! - Never color server-provided text (error bodies are copied verbatim).
//! - Keep exact message strings; helpers only add color when enabled.

use once_cell::sync::OnceCell;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

static STDERR_COLOR: OnceCell<bool> = OnceCell::new();

pub fn parse_color_mode(s: &str) -> Option<ColorMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(ColorMode::Auto),
        "always" | "on" | "true" | "yes" => Some(ColorMode::Always),
        "never" | "off" | "false" | "no" => Some(ColorMode::Never),
        _ => None,
    }
}

/// Decide whether to color, given NO_COLOR presence, the UBI_COLOR preference and TTY state.
pub fn color_enabled_for(no_color: bool, pref: Option<ColorMode>, is_tty: bool) -> bool {
    // Per https://no-color.org/
    if no_color {
        return false;
    }
    match pref.unwrap_or(ColorMode::Auto) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_tty,
    }
}

pub fn color_enabled_stderr() -> bool {
    *STDERR_COLOR.get_or_init(|| {
        let pref = std::env::var("UBI_COLOR")
            .ok()
            .and_then(|v| parse_color_mode(&v));
        color_enabled_for(
            std::env::var_os("NO_COLOR").is_some(),
            pref,
            atty::is(atty::Stream::Stderr),
        )
    })
}

/// Wrap string with ANSI color code when enabled; otherwise return unchanged.
pub fn paint(enabled: bool, code: &str, s: &str) -> String {
    if enabled {
        format!("{code}{s}\x1b[0m")
    } else {
        s.to_string()
    }
}

pub fn log_error_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, "\x1b[31;1m", msg));
}
