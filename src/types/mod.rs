//! Shared types

mod error;

pub use error::{ProfileError, Result};
