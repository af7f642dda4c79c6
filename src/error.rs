//! Errors raised while rewriting a manifest

use thiserror::Error;

/// Every variant is fatal for the current build.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unsupported manifest version: {0} (expected 2 or 3)")]
    UnsupportedManifestVersion(u8),

    #[error("entry name conflict for \"{name}\": \"{first}\" and \"{second}\" would produce the same output")]
    EntryNameConflict {
        name: String,
        first: String,
        second: String,
    },

    #[error("additional input \"{0}\" must name a single file; patterns are not supported")]
    PatternInput(String),

    #[error("no compiled output found for \"{0}\"")]
    MissingOutput(String),

    #[error("invalid additional input kind \"{0}\" (expected one of: scripts, html, styles)")]
    InvalidInputKind(String),

    #[error("web_accessible_resources has the wrong shape for manifest version {version}")]
    InvalidResourceDeclaration { version: u8 },

    #[error("manifest field {field} references \"{file}\" which is not part of the build output")]
    UnresolvedReference { field: String, file: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
