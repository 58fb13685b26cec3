use thiserror::Error;

/// Failures talking to the upstream forecast provider.
///
/// Every variant carries a message fit to show to a user; none of them is
/// retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to forecast provider failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("forecast provider responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse forecast response: {0}")]
    Parse(String),

    /// Errors reported inside a successful response body.
    #[error("API responded with errors: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        ProviderError::Transport(err.without_url())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to build template {name}: {reason}")]
    TemplateBuild { name: String, reason: String },

    #[error("the template {0} does not exist")]
    TemplateNotFound(String),

    /// Output written before the failure is left in the sink.
    #[error("failed to render template {name}: {reason}")]
    Render { name: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Joins an error and all of its sources into one line.
///
/// Template engine errors keep the interesting part (the missing variable,
/// the parse location) in their source chain.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
