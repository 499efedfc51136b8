/*!
Argument validation for server-requested program execution.

The operator's own argv is the trust root. A server response may reuse those
tokens in any order, but it may add at most one token the operator did not
type, and only after a `--` separator (or, for `pg_dumpall`, as a `-d<db>`
flag). Everything here is pure so it can be tested without network or process
fixtures.
*/

use std::collections::HashSet;
use std::fmt;

/// A program the server may ask us to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedProgram {
    pub name: &'static str,
    /// Database clients receive PGPASSWORD from the `ubi-pgpassword` header.
    pub pg_client: bool,
}

const DEFAULT_PROGRAMS: &[AllowedProgram] = &[
    AllowedProgram { name: "ssh", pg_client: false },
    AllowedProgram { name: "scp", pg_client: false },
    AllowedProgram { name: "sftp", pg_client: false },
    AllowedProgram { name: "psql", pg_client: true },
    AllowedProgram { name: "pg_dump", pg_client: true },
    AllowedProgram { name: "pg_dumpall", pg_client: true },
];

/// Static set of executable program names.
#[derive(Debug, Clone, Copy)]
pub struct Allowlist {
    programs: &'static [AllowedProgram],
}

impl Allowlist {
    pub const fn new(programs: &'static [AllowedProgram]) -> Self {
        Self { programs }
    }

    pub fn get(&self, name: &str) -> Option<&AllowedProgram> {
        self.programs.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_pg_client(&self, name: &str) -> bool {
        self.get(name).map(|p| p.pg_client).unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.programs.iter().map(|p| p.name)
    }
}

impl Default for Allowlist {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAMS)
    }
}

/// Why a command-execution directive was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ProgramNotInArgv,
    UnsupportedProgram,
    MultipleForeignArguments,
    ForeignArgumentBeforeSeparator,
    MissingSeparator,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::ProgramNotInArgv => "not executing program not in original argv",
            Rejection::UnsupportedProgram => "unsupported program requested",
            Rejection::MultipleForeignArguments => "multiple arguments not in submitted argv",
            Rejection::ForeignArgumentBeforeSeparator => {
                "argument before '--' not in submitted argv"
            }
            Rejection::MissingSeparator => "no '--' in returned argv",
        };
        f.write_str(s)
    }
}

/// Outcome of validating a proposed argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    Accepted(Vec<String>),
    Rejected(Rejection),
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted(_))
    }

    pub fn into_result(self) -> Result<Vec<String>, Rejection> {
        match self {
            ValidationVerdict::Accepted(args) => Ok(args),
            ValidationVerdict::Rejected(r) => Err(r),
        }
    }
}

pub const SEPARATOR: &str = "--";

/// Split an execute-directive body into argument tokens.
///
/// Mirrors a plain split on NUL: an empty body is one empty token.
pub fn split_nul_args(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .split('\0')
        .map(str::to_string)
        .collect()
}

/// Decide whether `received` may be executed as the argument list of `program`.
///
/// `original` is the argv actually submitted in the current request cycle.
pub fn validate(
    allowlist: &Allowlist,
    program: &str,
    original: &[String],
    received: Vec<String>,
) -> ValidationVerdict {
    if !original.iter().any(|a| a == program) {
        return ValidationVerdict::Rejected(Rejection::ProgramNotInArgv);
    }
    if !allowlist.contains(program) {
        return ValidationVerdict::Rejected(Rejection::UnsupportedProgram);
    }

    match check_tokens(program, original, &received) {
        Ok(()) => ValidationVerdict::Accepted(received),
        Err(r) => ValidationVerdict::Rejected(r),
    }
}

fn check_tokens(program: &str, original: &[String], received: &[String]) -> Result<(), Rejection> {
    let submitted: HashSet<&str> = original.iter().map(String::as_str).collect();

    let mut seen_separator = false;
    let mut seen_custom = false;
    let mut pg_dumpall_exception = false;

    for arg in received {
        if arg == SEPARATOR {
            seen_separator = true;
        } else if submitted.contains(arg.as_str()) {
            continue;
        } else if seen_custom {
            return Err(Rejection::MultipleForeignArguments);
        } else if seen_separator {
            seen_custom = true;
        } else if program == "pg_dumpall" && arg.starts_with("-d") {
            seen_custom = true;
            pg_dumpall_exception = true;
        } else {
            return Err(Rejection::ForeignArgumentBeforeSeparator);
        }
    }

    if !seen_separator && !pg_dumpall_exception {
        return Err(Rejection::MissingSeparator);
    }
    Ok(())
}
