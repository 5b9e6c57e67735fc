use super::anchor::{LocateError, char_distance, line_end, line_start, locate_unique};
use super::error::PatchError;
use super::model::{Action, PatchOp};

/// Compute the post-patch text. Pure: no I/O, no invariant checks.
///
/// `anchor_idx` is the byte offset of the op's (unique) anchor in `text`.
pub fn plan(
    text: &str,
    op: &PatchOp,
    anchor_idx: usize,
    max_anchor_distance: usize,
) -> Result<String, PatchError> {
    match &op.action {
        Action::Insert => Ok(insert_before_line(text, anchor_idx, &op.content)),
        Action::Append => {
            let anchor_end = anchor_idx + op.anchor.len();
            // An anchor ending in `\n` already covers its whole line.
            let line_at = if op.anchor.ends_with('\n') {
                anchor_end - 1
            } else {
                anchor_end
            };
            Ok(append_after_line(text, line_at, &op.content))
        }
        Action::Update { old_value } => {
            let old_idx = locate_unique(text, old_value).map_err(|e| match e {
                LocateError::NotFound => PatchError::OldValueNotFound,
                LocateError::Ambiguous => PatchError::OldValueAmbiguous,
            })?;
            let distance = char_distance(text, anchor_idx, old_idx);
            if distance > max_anchor_distance {
                return Err(PatchError::OldValueTooFarFromAnchor {
                    distance,
                    max: max_anchor_distance,
                });
            }
            let mut out = String::with_capacity(text.len() - old_value.len() + op.content.len());
            out.push_str(&text[..old_idx]);
            out.push_str(&op.content);
            out.push_str(&text[old_idx + old_value.len()..]);
            Ok(out)
        }
    }
}

fn insert_before_line(text: &str, idx: usize, content: &str) -> String {
    let content = content.trim_end_matches('\n');
    let at = line_start(text, idx);
    let mut out = String::with_capacity(text.len() + content.len() + 1);
    out.push_str(&text[..at]);
    out.push_str(content);
    out.push('\n');
    out.push_str(&text[at..]);
    out
}

fn append_after_line(text: &str, idx: usize, content: &str) -> String {
    let content = content.trim_end_matches('\n');
    let at = line_end(text, idx).unwrap_or(text.len());
    let mut out = String::with_capacity(text.len() + content.len() + 1);
    out.push_str(&text[..at]);
    out.push('\n');
    out.push_str(content);
    out.push_str(&text[at..]);
    out
}
