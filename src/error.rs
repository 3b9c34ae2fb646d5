#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum OfdaError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl OfdaError {
    /// True when the upstream answered but the payload could not be parsed.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ApiJson { .. })
    }
}
