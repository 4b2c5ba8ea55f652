//! Remote call dispatch
//!
//! Name lookup, schema validation, typed decoding and routing of calls.

mod command;
mod dispatcher;
mod error;
mod operation;

pub use command::{Command, LookupCommand, SessionCommand};
pub use dispatcher::{Dispatcher, RemoteCall};
pub use error::CallError;
pub use operation::{Operation, ValidatedArgs};
