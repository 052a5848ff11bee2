use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum HeaderError {
    #[error("buffer too small: need {expected} bytes, have {found}")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("bad {0} checksum")]
    BadChecksum(String),
}
