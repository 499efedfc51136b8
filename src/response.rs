//! Response classification: picks the handling path from status and sentinel headers.

use std::io::Read;

use crate::transport::Response;

pub const EXECUTE_HEADER: &str = "ubi-command-execute";
pub const CONFIRM_HEADER: &str = "ubi-confirm";
pub const PGPASSWORD_HEADER: &str = "ubi-pgpassword";

/// Execute bodies are read once and truncated at this size.
pub const MAX_ARGS_BODY: u64 = 1024 * 1024;

/// Classified intent of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Output,
    Confirm {
        prompt: String,
    },
    Execute {
        program: String,
        pg_password: Option<String>,
    },
}

/// Status-level outcome: a non-2xx response is never a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Failure { status: u16 },
    Directive(Directive),
}

/// Classify a response. First non-empty sentinel wins: execute, then confirm.
pub fn classify(response: &Response) -> Classification {
    if !response.is_success() {
        return Classification::Failure {
            status: response.status,
        };
    }

    let directive = if let Some(program) = response.header(EXECUTE_HEADER) {
        Directive::Execute {
            program: program.to_string(),
            pg_password: response.header(PGPASSWORD_HEADER).map(str::to_string),
        }
    } else if let Some(prompt) = response.header(CONFIRM_HEADER) {
        Directive::Confirm {
            prompt: prompt.to_string(),
        }
    } else {
        Directive::Output
    };
    Classification::Directive(directive)
}

/// Read an execute body, capped at `MAX_ARGS_BODY`; excess bytes are dropped.
pub fn read_args_body(body: &mut dyn Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    body.take(MAX_ARGS_BODY).read_to_end(&mut buf)?;
    Ok(buf)
}
