//! World container adapters

mod in_memory_world;

pub use in_memory_world::InMemoryWorld;
