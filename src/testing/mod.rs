//! Testing utilities and mock implementations
//!
//! Lets routing be exercised end to end without real agents or a model.

pub mod mocks;

pub use mocks::*;
