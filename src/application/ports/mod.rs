//! Ports - The seams between application services and the outside world

pub mod outbound;
