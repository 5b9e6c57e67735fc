/// Why a single patch was rejected. Always local to that patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    InvalidProposal { reason: String },
    UnknownAction { action: String },
    Blocked { path: String, reason: &'static str },
    ContentTooLarge { len: usize, max: usize },
    DangerousPattern { pattern: &'static str },
    FileNotFound { path: String },
    Io { path: String, message: String },
    AnchorNotFound,
    AnchorAmbiguous,
    OldValueNotFound,
    OldValueAmbiguous,
    OldValueTooFarFromAnchor { distance: usize, max: usize },
    SuspiciousShrink { old_len: usize, new_len: usize },
    LineRemoval { old_lines: usize, new_lines: usize },
    FileWouldShrink { before: usize, after: usize },
    DuplicateContent,
}

impl PatchError {
    /// Stable identifier for callers that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            PatchError::InvalidProposal { .. } => "invalid_proposal",
            PatchError::UnknownAction { .. } => "unknown_action",
            PatchError::Blocked { .. } => "blocked",
            PatchError::ContentTooLarge { .. } => "content_too_large",
            PatchError::DangerousPattern { .. } => "dangerous_pattern",
            PatchError::FileNotFound { .. } => "file_not_found",
            PatchError::Io { .. } => "io",
            PatchError::AnchorNotFound => "anchor_not_found",
            PatchError::AnchorAmbiguous => "anchor_ambiguous",
            PatchError::OldValueNotFound => "old_value_not_found",
            PatchError::OldValueAmbiguous => "old_value_ambiguous",
            PatchError::OldValueTooFarFromAnchor { .. } => "old_value_too_far_from_anchor",
            PatchError::SuspiciousShrink { .. } => "suspicious_shrink",
            PatchError::LineRemoval { .. } => "line_removal",
            PatchError::FileWouldShrink { .. } => "file_would_shrink",
            PatchError::DuplicateContent => "duplicate_content",
        }
    }
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::InvalidProposal { reason } => write!(f, "invalid proposal: {reason}"),
            PatchError::UnknownAction { action } => {
                write!(f, "unknown action `{action}`; expected insert, append or update")
            }
            PatchError::Blocked { path, reason } => write!(f, "blocked path `{path}`: {reason}"),
            PatchError::ContentTooLarge { len, max } => {
                write!(f, "content is {len} characters; the limit is {max}")
            }
            PatchError::DangerousPattern { pattern } => {
                write!(f, "content contains a forbidden construct ({pattern})")
            }
            PatchError::FileNotFound { path } => write!(f, "file not found: {path}"),
            PatchError::Io { path, message } => write!(f, "io error on {path}: {message}"),
            PatchError::AnchorNotFound => write!(f, "anchor not found in file"),
            PatchError::AnchorAmbiguous => {
                write!(f, "anchor occurs more than once; include more surrounding text")
            }
            PatchError::OldValueNotFound => write!(f, "oldValue not found in file"),
            PatchError::OldValueAmbiguous => {
                write!(f, "oldValue occurs more than once; include more surrounding text")
            }
            PatchError::OldValueTooFarFromAnchor { distance, max } => write!(
                f,
                "oldValue is {distance} characters from the anchor; the limit is {max}"
            ),
            PatchError::SuspiciousShrink { old_len, new_len } => write!(
                f,
                "update would shrink {old_len} characters to {new_len}; refusing to drop history"
            ),
            PatchError::LineRemoval {
                old_lines,
                new_lines,
            } => write!(
                f,
                "update would replace {old_lines} line(s) with {new_lines}; lines may not be removed"
            ),
            PatchError::FileWouldShrink { before, after } => {
                write!(f, "file would shrink from {before} to {after} lines")
            }
            PatchError::DuplicateContent => write!(f, "content already present in file"),
        }
    }
}

impl std::error::Error for PatchError {}

/// Whole-request failures, reported apart from per-patch outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    Malformed(String),
    NoPatches,
    TooManyPatches { count: usize, max: usize },
    AnalysisTooLong { len: usize, max: usize },
    InvalidDataset(String),
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::Malformed(_) => "malformed",
            RequestError::NoPatches => "no_patches",
            RequestError::TooManyPatches { .. } => "too_many_patches",
            RequestError::AnalysisTooLong { .. } => "analysis_too_long",
            RequestError::InvalidDataset(_) => "invalid_dataset",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string(), "code": self.code() })
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Malformed(e) => write!(f, "malformed request: {e}"),
            RequestError::NoPatches => write!(f, "no patches supplied"),
            RequestError::TooManyPatches { count, max } => {
                write!(f, "{count} patches supplied; at most {max} per request")
            }
            RequestError::AnalysisTooLong { len, max } => {
                write!(f, "analysis is {len} characters; the limit is {max}")
            }
            RequestError::InvalidDataset(id) => write!(
                f,
                "invalid dataset `{id}`: use 1-64 letters, digits, `-` or `_`"
            ),
        }
    }
}

impl std::error::Error for RequestError {}
