use std::path::PathBuf;

use thiserror::Error;

/// Failures while assembling a classpath.
///
/// Only [`ClasspathError::Configuration`] and [`ClasspathError::Resolution`]
/// abort a classpath computation; the other variants are logged by the
/// caller and the offending source is skipped.
#[derive(Error, Debug)]
pub enum ClasspathError {
    #[error("{coordinate} not found in {known:?}")]
    Configuration { coordinate: String, known: Vec<String> },

    #[error("failed to resolve {artifact}: {reason}")]
    Resolution { artifact: String, reason: String },

    #[error("invalid classpath element {element:?}: {reason}")]
    PathConversion { element: String, reason: String },

    #[error("dependency resolution required: {reason}")]
    DependencyResolution { reason: String },

    #[error("malformed POM {path}: {reason}")]
    Pom { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClasspathError>;
