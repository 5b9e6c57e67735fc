use std::sync::Arc;

use super::common::{Param, ParamType, off_runtime};
use crate::patching::Engine;

pub use crate::patching::ApplyRequest as Args;

/// Re-validate and write each patch in order; failures stay per patch.
pub async fn call(engine: Arc<Engine>, args: Args) -> serde_json::Value {
    off_runtime("apply", move || match engine.apply(args) {
        Ok(report) => serde_json::to_value(report)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() })),
        Err(e) => e.to_json(),
    })
    .await
}

pub fn spec() -> (&'static str, &'static str, Vec<Param>) {
    (
        "apply_patches",
        "Apply patches previously returned as validatedPatches by preview_patches. Every patch is checked again against the current file before an atomic write; the previous version is kept as a timestamped .bak file.",
        vec![
            Param {
                name: "dataset",
                desc: "Identifier of the tracked entity; must match the preview",
                param_type: ParamType::String,
                required: true,
            },
            Param {
                name: "patches",
                desc: "The validatedPatches list from a preview",
                param_type: ParamType::Array,
                required: true,
            },
        ],
    )
}
