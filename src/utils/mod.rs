//! Utility module

mod diagnostic;
mod error;

pub use diagnostic::{Category, Diagnostic};
pub use error::{Error, Result};
