use std::sync::Arc;

use super::common::{Param, ParamType, off_runtime};
use crate::patching::Engine;

pub use crate::patching::PreviewRequest as Args;

/// Validate every candidate and render its diff. Never writes.
pub async fn call(engine: Arc<Engine>, args: Args) -> serde_json::Value {
    off_runtime("preview", move || match engine.preview(args) {
        Ok(report) => serde_json::to_value(report)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
        Err(e) => e.to_json(),
    })
    .await
}

pub fn spec() -> (&'static str, &'static str, Vec<Param>) {
    (
        "preview_patches",
        "Dry-run a list of proposed record edits. Each patch is {file, action: insert|append|update, anchor, content, oldValue?}. Insert puts content on a new line before the anchor's line, append after it, update replaces the unique oldValue near the anchor. Returns a per-patch verdict with a diff and the subset that is safe to apply.",
        vec![
            Param {
                name: "dataset",
                desc: "Identifier of the tracked entity; every file must live in its directory",
                param_type: ParamType::String,
                required: true,
            },
            Param {
                name: "analysis",
                desc: "The free-text analysis the patches were derived from",
                param_type: ParamType::String,
                required: false,
            },
            Param {
                name: "patches",
                desc: "Candidate patches",
                param_type: ParamType::Array,
                required: true,
            },
        ],
    )
}
