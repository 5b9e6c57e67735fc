use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::PatchError;

/// One candidate mutation exactly as the upstream extraction step produced it.
/// Nothing here is trusted yet; see [`PatchOp::try_from_proposal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchProposal {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub anchor: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    /// Set when the element could not be read as a proposal object.
    #[serde(skip)]
    pub shape_error: Option<String>,
}

impl PatchProposal {
    /// Read one `patches` element without failing the whole request: an
    /// element of the wrong shape keeps whatever string fields it has and
    /// is rejected later as that patch's `InvalidProposal`.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<PatchProposal>(value.clone()) {
            Ok(p) => p,
            Err(e) => {
                let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
                PatchProposal {
                    file: text("file").unwrap_or_default(),
                    action: text("action").unwrap_or_default(),
                    anchor: text("anchor").unwrap_or_default(),
                    content: text("content").unwrap_or_default(),
                    old_value: text("oldValue"),
                    shape_error: Some(e.to_string()),
                }
            }
        }
    }
}

fn lenient_patches<'de, D>(de: D) -> Result<Option<Vec<PatchProposal>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(de)?;
    Ok(raw.map(|items| items.into_iter().map(PatchProposal::from_value).collect()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// New line(s) before the anchor's line.
    Insert,
    /// New line(s) after the anchor's line.
    Append,
    /// Replace the unique `old_value` span near the anchor.
    Update { old_value: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Append => "append",
            Action::Update { .. } => "update",
        }
    }
}

/// A proposal that passed the shape checks: every required field is present
/// and the action is one the engine knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOp {
    pub file: String,
    pub anchor: String,
    pub content: String,
    pub action: Action,
}

impl PatchOp {
    pub fn try_from_proposal(p: &PatchProposal) -> Result<Self, PatchError> {
        let invalid = |reason: &str| PatchError::InvalidProposal {
            reason: reason.to_string(),
        };

        if let Some(shape) = &p.shape_error {
            return Err(invalid(&format!("not a patch object: {shape}")));
        }
        if p.file.trim().is_empty() {
            return Err(invalid("`file` is required"));
        }
        if p.anchor.is_empty() {
            return Err(invalid("`anchor` must be a non-empty string"));
        }
        if p.content.trim().is_empty() {
            return Err(invalid("`content` must be a non-empty string"));
        }
        if p.action.trim().is_empty() {
            return Err(invalid("`action` is required"));
        }

        let action = match p.action.trim().to_ascii_lowercase().as_str() {
            "insert" => Action::Insert,
            "append" => Action::Append,
            "update" => match p.old_value.as_deref() {
                Some(old) if !old.is_empty() => Action::Update {
                    old_value: old.to_string(),
                },
                _ => return Err(invalid("`oldValue` is required for update")),
            },
            other => {
                return Err(PatchError::UnknownAction {
                    action: other.to_string(),
                });
            }
        };

        Ok(PatchOp {
            file: p.file.trim().to_string(),
            anchor: p.anchor.clone(),
            content: p.content.clone(),
            action,
        })
    }
}

/// Outcome of the validate-only pipeline for one proposal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPreview {
    pub patch: PatchProposal,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub detail: String,
    pub diff: String,
    pub lines_added: usize,
}

/// Outcome of the apply pipeline for one proposal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResult {
    pub patch: PatchProposal,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    #[serde(default)]
    pub analysis: String,
    pub dataset: String,
    #[serde(default, deserialize_with = "lenient_patches")]
    pub patches: Option<Vec<PatchProposal>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub dataset: String,
    #[serde(default, deserialize_with = "lenient_patches")]
    pub patches: Option<Vec<PatchProposal>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    pub total_candidates: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub total_lines_added: usize,
    pub files_affected: Vec<String>,
    pub per_patch_preview: Vec<PatchPreview>,
    pub validated_patches: Vec<PatchProposal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub applied_count: usize,
    pub failed_count: usize,
    pub per_patch_result: Vec<PatchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(action: &str, old_value: Option<&str>) -> PatchProposal {
        PatchProposal {
            file: "data/acme/timeline.ts".into(),
            action: action.into(),
            anchor: "EVENTS".into(),
            content: "x".into(),
            old_value: old_value.map(str::to_string),
            shape_error: None,
        }
    }

    #[test]
    fn action_names_are_case_insensitive() {
        let op = PatchOp::try_from_proposal(&proposal(" Append ", None)).unwrap();
        assert_eq!(op.action, Action::Append);
    }

    #[test]
    fn update_without_old_value_is_invalid() {
        let err = PatchOp::try_from_proposal(&proposal("update", None)).unwrap_err();
        assert_eq!(err.code(), "invalid_proposal");
        let err = PatchOp::try_from_proposal(&proposal("update", Some(""))).unwrap_err();
        assert_eq!(err.code(), "invalid_proposal");
    }

    #[test]
    fn unknown_action_is_reported_by_name() {
        let err = PatchOp::try_from_proposal(&proposal("delete", None)).unwrap_err();
        assert_eq!(err.code(), "unknown_action");
        assert!(err.to_string().contains("delete"));
    }

    #[test]
    fn missing_action_is_invalid_not_unknown() {
        for action in ["", "  "] {
            let err = PatchOp::try_from_proposal(&proposal(action, None)).unwrap_err();
            assert_eq!(err.code(), "invalid_proposal");
        }
    }

    #[test]
    fn wrong_shaped_elements_stay_per_patch() {
        let req: PreviewRequest = serde_json::from_value(serde_json::json!({
            "dataset": "acme",
            "patches": [
                "not an object",
                {"file": "data/acme/a.ts", "action": "insert", "anchor": "A", "content": 5},
                {"file": "data/acme/a.ts", "action": "insert", "anchor": "A", "content": "b"},
            ],
        }))
        .unwrap();
        let patches = req.patches.unwrap();
        assert_eq!(patches.len(), 3);
        assert_eq!(patches[1].file, "data/acme/a.ts");
        for p in &patches[..2] {
            let err = PatchOp::try_from_proposal(p).unwrap_err();
            assert_eq!(err.code(), "invalid_proposal");
        }
        assert!(PatchOp::try_from_proposal(&patches[2]).is_ok());
    }

    #[test]
    fn empty_anchor_is_invalid() {
        let mut p = proposal("insert", None);
        p.anchor.clear();
        assert_eq!(
            PatchOp::try_from_proposal(&p).unwrap_err().code(),
            "invalid_proposal"
        );
    }

    #[test]
    fn old_value_is_read_from_camel_case() {
        let p: PatchProposal = serde_json::from_value(serde_json::json!({
            "file": "data/acme/a.ts",
            "action": "update",
            "anchor": "A",
            "content": "b",
            "oldValue": "a",
        }))
        .unwrap();
        assert_eq!(p.old_value.as_deref(), Some("a"));
    }
}
