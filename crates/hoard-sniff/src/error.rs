use std::io;

use crate::MediaType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported content type: {detected}")]
    Unsupported { detected: MediaType },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// `true` when the bytes were read fine but the content was refused.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
