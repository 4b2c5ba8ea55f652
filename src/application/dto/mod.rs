//! Data transfer objects exchanged with remote callers

mod call_value;
mod rowset;

pub use call_value::CallValue;
pub use rowset::Rowset;
