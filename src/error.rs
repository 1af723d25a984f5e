//! Errors surfaced to the user by a single analysis request.

use thiserror::Error;

/// Everything that can go wrong between pressing "analyze" and seeing the
/// result. None of these are fatal; each is shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The endpoint is not configured or is not an http(s) URL.
    #[error("Please provide a valid API endpoint URL.")]
    InvalidEndpoint,

    /// Nothing but whitespace was submitted.
    #[error("Please enter some text to analyze.")]
    EmptyInput,

    /// The API answered with something other than 200.
    #[error("Failed to analyze text. Status Code: {status}")]
    RequestFailed { status: u16, body: String },

    /// The request never produced a response.
    #[error("An error occurred: {message}")]
    NetworkError { message: String },

    /// A 200 reply whose body or nested `response` document did not decode.
    #[error("Failed to parse the response from the server.")]
    MalformedResponse,
}

impl AnalysisError {
    /// Extra text shown beneath the message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AnalysisError::RequestFailed { body, .. } => Some(body),
            _ => None,
        }
    }
}
