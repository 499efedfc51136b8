//! Single-use confirmation handshake.

use std::io::{self, BufRead, Read, Write};

use crate::errors::ProxyError;

pub const CONFIRM_FLAG: &str = "--confirm";

/// One-way `Allowed -> Consumed` switch; at most one confirmation per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    #[default]
    Allowed,
    Consumed,
}

impl ConfirmationState {
    /// Use the confirmation. Fails on every call after the first.
    pub fn consume(&mut self) -> Result<(), ProxyError> {
        match self {
            ConfirmationState::Allowed => {
                *self = ConfirmationState::Consumed;
                Ok(())
            }
            ConfirmationState::Consumed => Err(ProxyError::RepeatedConfirmation),
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self == ConfirmationState::Allowed
    }
}

/// Build the argv for the resubmitted request: `--confirm <answer>` then the current argv.
pub fn confirmed_argv(answer: String, current: &[String]) -> Vec<String> {
    let mut next = Vec::with_capacity(current.len() + 2);
    next.push(CONFIRM_FLAG.to_string());
    next.push(answer);
    next.extend(current.iter().cloned());
    next
}

/// Show `body` and `prompt`, then read one answer line from `input`.
///
/// The caller must have consumed the confirmation state already.
pub fn prompt_for_answer(
    prompt: &str,
    body: &mut dyn Read,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<String, ProxyError> {
    io::copy(body, &mut *out).map_err(|_| ProxyError::ConfirmationOutput)?;
    write!(out, "\n{prompt}: ")
        .and_then(|_| out.flush())
        .map_err(|_| ProxyError::ConfirmationOutput)?;

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => return Err(ProxyError::ConfirmationRead),
        Ok(_) => {}
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
