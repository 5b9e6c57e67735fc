use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::anchor::{LocateError, line_count, locate_unique, preview};
use super::error::{PatchError, RequestError};
use super::model::{
    ApplyReport, ApplyRequest, PatchOp, PatchPreview, PatchProposal, PatchResult, PreviewReport,
    PreviewRequest,
};
use super::safety::ContentScanner;
use super::sandbox::Sandbox;
use super::{diff, filesystem, invariants, planning};
use crate::config::EngineConfig;

/// Two-phase patch engine. Holds no file contents between calls; every
/// request reads the store fresh.
pub struct Engine {
    sandbox: Sandbox,
    scanner: ContentScanner,
    max_anchor_distance: usize,
    max_analysis_chars: usize,
    max_patches: usize,
}

/// A patch that passed the whole pipeline against some `before` text.
struct Planned {
    path: PathBuf,
    before: String,
    after: String,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sandbox: Sandbox::new(
                config.root.clone(),
                config.allowed_dirs.clone(),
                config.required_extension.clone(),
            ),
            scanner: ContentScanner::new(config.max_content_chars),
            max_anchor_distance: config.max_anchor_distance,
            max_analysis_chars: config.max_analysis_chars,
            max_patches: config.max_patches,
        }
    }

    /// Dry run. Never writes. Patches are evaluated in order against an
    /// in-memory view of the store, so a later patch on the same file sees
    /// what the earlier valid ones would have written.
    pub fn preview(&self, req: PreviewRequest) -> Result<PreviewReport, RequestError> {
        let analysis_len = req.analysis.chars().count();
        if analysis_len > self.max_analysis_chars {
            return Err(RequestError::AnalysisTooLong {
                len: analysis_len,
                max: self.max_analysis_chars,
            });
        }
        let patches = self.check_request(&req.dataset, req.patches)?;
        tracing::info!(
            "preview: dataset={} candidates={}",
            req.dataset,
            patches.len()
        );

        let mut overlay: HashMap<PathBuf, String> = HashMap::new();
        let mut previews = Vec::with_capacity(patches.len());
        let mut validated = Vec::new();
        let mut files = BTreeSet::new();
        let mut total_lines_added = 0;

        for proposal in patches {
            let outcome = self.run_pipeline(&proposal, &req.dataset, |path, display| {
                match overlay.get(path) {
                    Some(text) => Ok(text.clone()),
                    None => filesystem::read_text(path, display),
                }
            });
            match outcome {
                Ok((op, planned)) => {
                    let lines_added = line_count(&planned.after) - line_count(&planned.before);
                    let diff = diff::render(&op.file, &planned.before, &planned.after);
                    tracing::debug!("preview ok: {} +{lines_added} line(s)", op.file);
                    total_lines_added += lines_added;
                    files.insert(self.display_path(&planned.path));
                    overlay.insert(planned.path, planned.after);
                    validated.push(proposal.clone());
                    previews.push(PatchPreview {
                        patch: proposal,
                        valid: true,
                        code: None,
                        detail: "ok".to_string(),
                        diff,
                        lines_added,
                    });
                }
                Err(e) => {
                    log_rejection("preview", &proposal, &e);
                    previews.push(PatchPreview {
                        patch: proposal,
                        valid: false,
                        code: Some(e.code()),
                        detail: e.to_string(),
                        diff: String::new(),
                        lines_added: 0,
                    });
                }
            }
        }

        let valid_count = validated.len();
        tracing::info!(
            "preview: dataset={} valid={valid_count} invalid={}",
            req.dataset,
            previews.len() - valid_count
        );
        Ok(PreviewReport {
            total_candidates: previews.len(),
            valid_count,
            invalid_count: previews.len() - valid_count,
            total_lines_added,
            files_affected: files.into_iter().collect(),
            per_patch_preview: previews,
            validated_patches: validated,
        })
    }

    /// Re-validate each patch against the file as it is now, then write it.
    /// Strictly sequential; a failure affects only its own patch.
    pub fn apply(&self, req: ApplyRequest) -> Result<ApplyReport, RequestError> {
        let patches = self.check_request(&req.dataset, req.patches)?;
        tracing::info!("apply: dataset={} patches={}", req.dataset, patches.len());

        let mut results = Vec::with_capacity(patches.len());
        for proposal in patches {
            let outcome = self
                .run_pipeline(&proposal, &req.dataset, filesystem::read_text)
                .and_then(|(op, planned)| {
                    filesystem::write_atomically(&planned.path, &planned.after)
                        .map(|backup| (op, backup))
                        .map_err(|e| PatchError::Io {
                            path: proposal.file.clone(),
                            message: format!("write: {e}"),
                        })
                });
            match outcome {
                Ok((op, backup)) => {
                    let backup = self.display_path(&backup);
                    tracing::info!("applied {} to {} (backup {backup})", op.action.name(), op.file);
                    results.push(PatchResult {
                        patch: proposal,
                        success: true,
                        code: None,
                        detail: "applied".to_string(),
                        backup: Some(backup),
                    });
                }
                Err(e) => {
                    log_rejection("apply", &proposal, &e);
                    results.push(PatchResult {
                        patch: proposal,
                        success: false,
                        code: Some(e.code()),
                        detail: e.to_string(),
                        backup: None,
                    });
                }
            }
        }

        let applied_count = results.iter().filter(|r| r.success).count();
        tracing::info!(
            "apply: dataset={} applied={applied_count} failed={}",
            req.dataset,
            results.len() - applied_count
        );
        Ok(ApplyReport {
            applied_count,
            failed_count: results.len() - applied_count,
            per_patch_result: results,
        })
    }

    fn check_request(
        &self,
        dataset: &str,
        patches: Option<Vec<PatchProposal>>,
    ) -> Result<Vec<PatchProposal>, RequestError> {
        if !is_valid_dataset(dataset) {
            return Err(RequestError::InvalidDataset(dataset.to_string()));
        }
        let patches = patches.unwrap_or_default();
        if patches.is_empty() {
            return Err(RequestError::NoPatches);
        }
        if patches.len() > self.max_patches {
            return Err(RequestError::TooManyPatches {
                count: patches.len(),
                max: self.max_patches,
            });
        }
        Ok(patches)
    }

    /// Shape -> sandbox -> content scan -> read -> anchor -> plan -> invariants.
    fn run_pipeline(
        &self,
        proposal: &PatchProposal,
        dataset: &str,
        mut read: impl FnMut(&Path, &str) -> Result<String, PatchError>,
    ) -> Result<(PatchOp, Planned), PatchError> {
        let op = PatchOp::try_from_proposal(proposal)?;
        let path = self.sandbox.resolve(&op.file)?;
        self.sandbox.check_dataset(&path, dataset)?;
        self.scanner.scan(&op.content)?;

        let before = read(&path, &op.file)?;
        let anchor_idx = locate_unique(&before, &op.anchor).map_err(|e| match e {
            LocateError::NotFound => PatchError::AnchorNotFound,
            LocateError::Ambiguous => PatchError::AnchorAmbiguous,
        })?;
        let after = planning::plan(&before, &op, anchor_idx, self.max_anchor_distance)?;
        invariants::check(&before, &after, &op)?;

        Ok((
            op,
            Planned {
                path,
                before,
                after,
            },
        ))
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(self.sandbox.root())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn is_valid_dataset(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn log_rejection(phase: &str, proposal: &PatchProposal, e: &PatchError) {
    tracing::warn!(
        "{phase} rejected: file={} action={} anchor={} code={} ({e})",
        proposal.file,
        proposal.action,
        preview(&proposal.anchor),
        e.code()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_ids_are_slugs() {
        assert!(is_valid_dataset("acme"));
        assert!(is_valid_dataset("ACME_corp-2"));
        assert!(!is_valid_dataset(""));
        assert!(!is_valid_dataset("../acme"));
        assert!(!is_valid_dataset("a/b"));
        assert!(!is_valid_dataset(&"x".repeat(65)));
    }
}
