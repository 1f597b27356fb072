use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RemoteError {
    #[error(transparent)]
    #[diagnostic(
        code(duckcp_remote::network),
        help("Check your internet connection or the configured proxy")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(duckcp_remote::http_error))]
    HttpError { status: u16, url: String },

    #[error("{api} failed with code {code}: {msg}")]
    #[diagnostic(
        code(duckcp_remote::api_error),
        help("Check the app credentials and that the app can access the document")
    )]
    Api { api: String, code: i64, msg: String },

    #[error("Invalid response from {url}: {reason}")]
    #[diagnostic(code(duckcp_remote::invalid_response))]
    InvalidResponse { url: String, reason: String },

    #[error("Invalid URL: {url}")]
    #[diagnostic(code(duckcp_remote::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        RemoteError::Network(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
