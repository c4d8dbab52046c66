use thiserror::Error;

use crate::llm::UpstreamError;
use crate::plan::{AdapterError, ParseError};
use crate::rules::RulesError;
use crate::spec::ValidationError;

pub const DECLINE_MESSAGE: &str =
    "Sorry, I can only answer questions about Charles Pfaff and his work.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while generating the page. Please try again.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("input is empty")]
    Empty,
    #[error("input is {actual} characters; the limit is {max}")]
    TooLong { max: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("request rejected by topic filter: {reason}")]
    FilteredOut { reason: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Adapter(AdapterError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("model declined the request as out of scope")]
    OutOfScope { message: Option<String> },
    #[error(transparent)]
    Rules(#[from] RulesError),
}

impl From<AdapterError> for PipelineError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Invalid(violations) => Self::Validation(violations),
            other => Self::Adapter(other),
        }
    }
}

impl PipelineError {
    /// Text safe to show an end user. Diagnostics stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(InputError::Empty) => "Please enter a request.".to_string(),
            Self::Input(InputError::TooLong { max, .. }) => {
                format!("Please keep your request under {max} characters.")
            }
            Self::FilteredOut { .. } | Self::OutOfScope { message: None } => {
                DECLINE_MESSAGE.to_string()
            }
            Self::OutOfScope {
                message: Some(message),
            } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
