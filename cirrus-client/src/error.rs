use cirrus_dav::error::ParsingError;

use crate::tree::TreeError;

/// A response body that could not be turned into the promised structure.
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("invalid XML: {0}")]
    Xml(#[from] ParsingError),
    #[error("invalid multi-status hierarchy: {0}")]
    Tree(#[from] TreeError),
    #[error("LOCK success carried no lock token")]
    MissingLockToken,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or completed at the network layer.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server answered, but the body failed to parse.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] MalformedResponse),

    /// A non-success HTTP status, surfaced by [`DavResponse::error_for_status`].
    ///
    /// [`DavResponse::error_for_status`]: crate::DavResponse::error_for_status
    #[error("HTTP {status} {status_text}")]
    Protocol {
        status: http::StatusCode,
        status_text: String,
        body: String,
    },

    /// Programmer misuse: invalid configuration or request parameters.
    #[error("usage error: {0}")]
    Usage(String),
}

impl Error {
    pub(crate) fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Transport(Box::new(e))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Protocol { status, .. } if *status == http::StatusCode::UNAUTHORIZED)
    }
}

impl From<ParsingError> for Error {
    fn from(value: ParsingError) -> Self {
        Error::MalformedResponse(MalformedResponse::Xml(value))
    }
}

impl From<TreeError> for Error {
    fn from(value: TreeError) -> Self {
        Error::MalformedResponse(MalformedResponse::Tree(value))
    }
}
