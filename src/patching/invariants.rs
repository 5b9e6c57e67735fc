//! Merge-only guarantees. A patch that passes here cannot delete, truncate or
//! duplicate an existing record; the worst an unreliable proposal can do is
//! get rejected.
use super::anchor::line_count;
use super::error::PatchError;
use super::model::{Action, PatchOp};

/// Run every check in order, stopping at the first failure.
pub fn check(before: &str, after: &str, op: &PatchOp) -> Result<(), PatchError> {
    check_not_duplicate(before, op)?;
    if let Action::Update { old_value } = &op.action {
        check_update_shrink(old_value, &op.content)?;
    }
    check_file_not_shrinking(before, after)
}

fn check_not_duplicate(before: &str, op: &PatchOp) -> Result<(), PatchError> {
    match &op.action {
        Action::Insert | Action::Append => {
            if before.contains(op.content.trim()) {
                return Err(PatchError::DuplicateContent);
            }
        }
        Action::Update { old_value } => {
            if *old_value == op.content {
                return Err(PatchError::DuplicateContent);
            }
        }
    }
    Ok(())
}

fn check_update_shrink(old_value: &str, content: &str) -> Result<(), PatchError> {
    let old_len = old_value.chars().count();
    let new_len = content.chars().count();
    // new_len >= old_len * 0.5, kept in integers
    if new_len * 2 < old_len {
        return Err(PatchError::SuspiciousShrink { old_len, new_len });
    }
    let old_lines = line_count(old_value);
    let new_lines = line_count(content);
    if new_lines < old_lines {
        return Err(PatchError::LineRemoval {
            old_lines,
            new_lines,
        });
    }
    Ok(())
}

fn check_file_not_shrinking(before: &str, after: &str) -> Result<(), PatchError> {
    let before = line_count(before);
    let after = line_count(after);
    if after < before {
        return Err(PatchError::FileWouldShrink { before, after });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(action: Action, content: &str) -> PatchOp {
        PatchOp {
            file: "data/acme/x.ts".into(),
            anchor: "A".into(),
            content: content.into(),
            action,
        }
    }

    fn update(old: &str, content: &str) -> PatchOp {
        op(
            Action::Update {
                old_value: old.into(),
            },
            content,
        )
    }

    #[test]
    fn duplicate_insert_and_append_are_rejected() {
        let before = "A\n  - already here\n";
        for action in [Action::Insert, Action::Append] {
            let p = op(action, "  - already here  ");
            assert_eq!(
                check(before, "irrelevant", &p),
                Err(PatchError::DuplicateContent)
            );
        }
    }

    #[test]
    fn no_op_update_is_a_duplicate() {
        assert_eq!(
            check("x", "x", &update("price: 10", "price: 10")),
            Err(PatchError::DuplicateContent)
        );
    }

    #[test]
    fn halving_is_the_shrink_boundary() {
        assert!(check("abcd", "ab", &update("abcd", "ab")).is_ok());
        assert_eq!(
            check("abcde", "ab", &update("abcde", "ab")),
            Err(PatchError::SuspiciousShrink {
                old_len: 5,
                new_len: 2
            })
        );
    }

    #[test]
    fn update_may_not_drop_lines() {
        let old = "line one\nline two";
        let new = "line one, line two merged";
        assert_eq!(
            check("x", "x", &update(old, new)),
            Err(PatchError::LineRemoval {
                old_lines: 2,
                new_lines: 1
            })
        );
    }

    #[test]
    fn whole_file_may_not_shrink() {
        let p = op(Action::Append, "new");
        assert_eq!(
            check("a\nb\nc", "a\nb", &p),
            Err(PatchError::FileWouldShrink {
                before: 3,
                after: 2
            })
        );
        assert!(check("a\nb", "a\nnew\nb", &p).is_ok());
    }
}
