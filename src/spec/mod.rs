//! Canonical page spec: the typed document and its schema validator.

pub mod model;
pub mod validator;

pub use model::{Component, PageSpec, Theme};
pub use validator::{validate, ValidationError};
