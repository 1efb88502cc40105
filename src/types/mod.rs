//! Type system module

mod type_system;

pub use type_system::Type;
