use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The markup of a cached page does not have the shape the legacy blog
/// engine is known to produce. Fatal for the page or post being processed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing required element `{selector}`")]
    MissingElement { selector: &'static str },

    #[error("missing required attribute `{attribute}` on `{selector}`")]
    MissingAttribute {
        selector: &'static str,
        attribute: &'static str,
    },

    #[error("invalid address {value:?}")]
    InvalidAddress { value: String },

    #[error("unrecognized publish date: {raw:?}")]
    InvalidDate { raw: String },

    #[error("post body must end with a clearing div, found {found}")]
    MissingTrailingClear { found: String },
}

/// Why a single post could not be hydrated.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post page is not in the offline cache: {}", path.display())]
    NotCached { path: PathBuf },

    #[error("read cached post page: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("post url cannot be mapped to a cache path: {reason}")]
    InvalidUrl { reason: String },

    #[error(transparent)]
    Structure(#[from] ExtractError),
}

impl PostError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotCached { .. } | Self::Read { .. } => FailureKind::Unavailable,
            Self::InvalidUrl { .. } | Self::Structure(_) => FailureKind::Structure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unavailable,
    Structure,
}

/// A unit (archive page or post) that was dropped from the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitFailure {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}
