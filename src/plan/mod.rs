//! Turning raw model output into a validated page: JSON recovery,
//! normalization of loosely shaped plans, and candidate assembly.

pub mod adapter;
pub mod extract;
pub mod normalize;
pub mod sentinel;

pub use adapter::{to_page_spec, AdapterError};
pub use extract::{parse_json_response, ParseError};
pub use sentinel::Sentinel;
