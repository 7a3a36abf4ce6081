use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("model returned no content")]
    EmptyResponse,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AiError {
    /// True when the call never produced a model response (transport or
    /// non-2xx status), as opposed to a response we could not use.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid analyzer configuration: {0}")]
    Config(#[source] AiError),
    #[error("language model unreachable: all {attempts} calls failed")]
    ModelUnreachable { attempts: usize },
}
