use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::PatchError;

/// Read the current text of a target. Always hits storage; nothing is cached
/// across patches or requests.
pub fn read_text(path: &Path, display: &str) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PatchError::FileNotFound {
            path: display.to_string(),
        },
        _ => PatchError::Io {
            path: display.to_string(),
            message: format!("read: {e}"),
        },
    })
}

/// A backup taken and a replacement fully written next to the target, not
/// yet swapped in. Dropping it without [`StagedWrite::commit`] removes the
/// temporary file and leaves the target untouched.
pub struct StagedWrite {
    tmp: NamedTempFile,
    target: PathBuf,
    backup: PathBuf,
}

impl StagedWrite {
    /// Rename the temporary file over the target. Same directory, same
    /// filesystem: readers see either the old or the new content.
    pub fn commit(self) -> io::Result<PathBuf> {
        self.tmp.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.backup)
    }
}

/// Back up `target`, then write `new_text` to a sibling temporary file.
pub fn stage(target: &Path, new_text: &str) -> io::Result<StagedWrite> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(target)?.permissions();

    let backup = backup_path(target)?;
    fs::copy(target, &backup)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(new_text.as_bytes())?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.as_file().sync_all()?;

    Ok(StagedWrite {
        tmp,
        target: target.to_path_buf(),
        backup,
    })
}

/// Backup, temp write, rename. Returns the backup path.
pub fn write_atomically(target: &Path, new_text: &str) -> io::Result<PathBuf> {
    stage(target, new_text)?.commit()
}

const BACKUP_STAMP: &[time::format_description::BorrowedFormatItem<'static>] =
    time::macros::format_description!(
        "[year][month][day]T[hour][minute][second].[subsecond digits:9]"
    );

/// `<name>.<UTC timestamp>.bak` beside the target; never reuses an existing path.
fn backup_path(target: &Path) -> io::Result<PathBuf> {
    let stamp = time::OffsetDateTime::now_utc()
        .format(BACKUP_STAMP)
        .map_err(io::Error::other)?;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "target has no file name"))?;

    let mut n = 0u32;
    loop {
        let candidate = if n == 0 {
            target.with_file_name(format!("{name}.{stamp}.bak"))
        } else {
            target.with_file_name(format!("{name}.{stamp}-{n}.bak"))
        };
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siblings(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_replaces_content_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("timeline.ts");
        fs::write(&target, "old\n").unwrap();

        let backup = write_atomically(&target, "new\nold\n").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new\nold\n");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old\n");
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("timeline.ts."));
        assert!(name.ends_with(".bak"));
        let stamp = &name["timeline.ts.".len()..name.len() - ".bak".len()];
        assert_eq!(stamp.len(), 25, "{stamp}");
        assert_eq!(&stamp[8..9], "T");
        assert_eq!(&stamp[15..16], ".");
        assert!(stamp.chars().filter(|c| c.is_ascii_digit()).count() == 23);
        assert_eq!(siblings(dir.path()).len(), 2);
    }

    #[test]
    fn crash_before_rename_leaves_original_intact() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("timeline.ts");
        let original = b"LIST = [\n  {date:'2026-01-01'},\n];\n";
        fs::write(&target, original).unwrap();

        let staged = stage(&target, "completely different\n").unwrap();
        let backup = staged.backup.clone();
        // process dies here: the rename never happens
        drop(staged);

        assert_eq!(fs::read(&target).unwrap(), original);
        assert_eq!(fs::read(&backup).unwrap(), original);
        // only the target and its backup remain
        assert_eq!(siblings(dir.path()).len(), 2);
    }

    #[test]
    fn consecutive_writes_get_distinct_backups() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.ts");
        fs::write(&target, "1\n").unwrap();
        let b1 = write_atomically(&target, "1\n2\n").unwrap();
        let b2 = write_atomically(&target, "1\n2\n3\n").unwrap();
        assert_ne!(b1, b2);
        assert_eq!(fs::read_to_string(b2).unwrap(), "1\n2\n");
    }

    #[test]
    fn missing_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("gone.ts");
        assert!(stage(&target, "x").is_err());
        assert_eq!(
            read_text(&target, "data/gone.ts"),
            Err(PatchError::FileNotFound {
                path: "data/gone.ts".into()
            })
        );
    }

    #[cfg(unix)]
    #[test]
    fn permissions_survive_the_swap() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.ts");
        fs::write(&target, "1\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();
        write_atomically(&target, "1\n2\n").unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
