use thiserror::Error;

use crate::bloom::BloomConfigBuilderError;

pub type BloomResult<T> = std::result::Result<T, BloomError>;

#[derive(Error, Debug, PartialEq)]
pub enum BloomError {
    #[error("Invalid parameter: error rate must be in [0.000001, 1.0), got {rate}")]
    InvalidParameter { rate: f64 },

    /// Conversion target for `BloomConfigBuilderError`. Every config field
    /// has a builder default, so `BloomConfigBuilder::build` does not fail
    /// today and this variant is not produced by the crate itself.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Hash generation exhausted: {generated}/{requested} functions after {attempts} draws"
    )]
    HashGenerationExhausted {
        requested: usize,
        generated: usize,
        attempts: usize,
    },
}

impl From<BloomConfigBuilderError> for BloomError {
    fn from(err: BloomConfigBuilderError) -> Self {
        BloomError::InvalidConfig(err.to_string())
    }
}
