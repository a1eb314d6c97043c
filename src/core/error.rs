// Copyright @yucwang 2026

use std::fmt;
use std::path::PathBuf;

/// Hard failures of a sampling run. Texture decode problems never surface
/// here; they degrade to flat material colors.
#[derive(Debug)]
pub enum SampleError {
    EmptyMesh,
    ZeroArea,
    NoAttributes,
    /// `run` was called on a sampler that already reached a terminal state.
    Finished,
    /// The destination could not be created. Raised before any sampling.
    Output { path: PathBuf, source: std::io::Error },
    /// Write failure while streaming or finalizing.
    Io(std::io::Error),
}

impl From<std::io::Error> for SampleError {
    fn from(err: std::io::Error) -> Self {
        SampleError::Io(err)
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::EmptyMesh => write!(f, "mesh has no triangles"),
            SampleError::ZeroArea => write!(f, "mesh has zero surface area"),
            SampleError::NoAttributes => write!(f, "attribute mask selects no attributes"),
            SampleError::Finished => write!(f, "sampler has already run"),
            SampleError::Output { path, source } => {
                write!(f, "cannot create output {}: {}", path.display(), source)
            }
            SampleError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Output { source, .. } => Some(source),
            SampleError::Io(err) => Some(err),
            _ => None,
        }
    }
}
