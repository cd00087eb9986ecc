//! Error kinds produced by the mesh pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// The path does not resolve to a readable file.
    #[error("OBJ file not found or unreadable: {}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Bad token, bad index, short face or inconsistent index buffer.
    #[error("malformed OBJ{}: {reason}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    MalformedFile { line: Option<usize>, reason: String },

    /// The file parsed but contained no faces.
    #[error("OBJ contained no faces")]
    EmptyMesh,
}

impl AssetError {
    /// Malformed-file error tied to a 0-based line number.
    pub(crate) fn at_line(line_no: usize, reason: impl Into<String>) -> Self {
        Self::MalformedFile {
            line: Some(line_no + 1),
            reason: reason.into(),
        }
    }

    /// Malformed-file error not tied to a source line (post-assembly checks).
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFile {
            line: None,
            reason: reason.into(),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
