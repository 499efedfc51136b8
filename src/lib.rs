#![allow(clippy::module_name_repetitions)]
//! ubi-cli: forwards a command line to the control plane and acts on the directive it returns.
//!
//! Module map:
//! - transport: POST argv as JSON, expose status/headers/body
//! - response: classify a response into output, confirmation or execution
//! - validate: decide which server-supplied arguments may be executed
//! - exec: run a validated program with inherited stdio
//! - confirm: single-use confirmation handshake
//! - session: the request cycle loop tying the above together

mod color;
mod config;
mod confirm;
mod errors;
mod exec;
mod response;
mod session;
mod telemetry;
mod transport;
mod validate;

pub use color::*;
pub use config::*;
pub use confirm::*;
pub use errors::*;
pub use exec::*;
pub use response::*;
pub use session::*;
pub use telemetry::*;
pub use transport::*;
pub use validate::*;
