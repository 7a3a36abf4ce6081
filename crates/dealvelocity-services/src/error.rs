use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Turn a non-2xx response into [`ServiceError::Server`], passing others through.
    pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Self::Server {
            status: status.as_u16(),
            body,
        })
    }
}
