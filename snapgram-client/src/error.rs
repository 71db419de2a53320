use std::time::Duration;

use snapgram_api::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Recovers the service-side error out of an error returned by a `Backend`
    pub fn from_backend(err: anyhow::Error) -> Error {
        match err.downcast::<ApiError>() {
            Ok(err) => Error::Api(err),
            Err(err) => Error::Anyhow(err),
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}
