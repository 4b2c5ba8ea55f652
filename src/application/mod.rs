//! Application layer - Use cases, ports and call dispatch
//!
//! Depends on the domain layer only. Infrastructure plugs in through the
//! outbound ports.

pub mod dispatch;
pub mod dto;
pub mod ports;
pub mod services;
