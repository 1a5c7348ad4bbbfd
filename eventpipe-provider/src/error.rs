use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider descriptor was empty.")]
    EmptyDescriptor,

    #[error("Provider name was not specified.")]
    MissingName,

    #[error("Invalid provider keywords '{value}': {source}")]
    InvalidKeywords {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Invalid provider at position {index}: {source}")]
    InvalidListEntry {
        index: usize,
        #[source]
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// The descriptor or the name was missing; the caller passed a bad argument.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            ProviderError::EmptyDescriptor | ProviderError::MissingName => true,
            ProviderError::InvalidKeywords { .. } => false,
            ProviderError::InvalidListEntry { source, .. } => source.is_invalid_argument(),
        }
    }

    /// The keywords field was present but could not be read as a 64-bit hex number.
    pub fn is_numeric_conversion(&self) -> bool {
        match self {
            ProviderError::InvalidKeywords { .. } => true,
            ProviderError::InvalidListEntry { source, .. } => source.is_numeric_conversion(),
            _ => false,
        }
    }
}
