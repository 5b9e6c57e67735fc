use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::error::PatchError;

/// Confines caller-supplied relative paths to a set of sub-directories of the
/// file-store root.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    allowed_dirs: Vec<String>,
    required_extension: String,
}

impl Sandbox {
    /// `root` must already be canonical; see [`crate::config::EngineConfig::from_env`].
    pub fn new(root: PathBuf, allowed_dirs: Vec<String>, required_extension: String) -> Self {
        Self {
            root,
            allowed_dirs,
            required_extension,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` to an absolute path under the root.
    ///
    /// - The leading segment must be one of the allowed directories.
    /// - The file name must end with the required extension.
    /// - After collapsing `.`/`..` and following symlinks on the existing
    ///   prefix, the result must still start with `root/`.
    ///
    /// The leaf need not exist; missing files are reported later by the reader.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, PatchError> {
        let blocked = |reason: &'static str| PatchError::Blocked {
            path: path.to_string(),
            reason,
        };

        let input = Path::new(path);
        if input.is_absolute() || path.starts_with('/') || path.starts_with('\\') {
            return Err(blocked("absolute paths are not allowed"));
        }

        let mut components = input.components().filter(|c| *c != Component::CurDir);
        match components.next() {
            Some(Component::Normal(first)) => {
                let first = first.to_string_lossy();
                if !self.allowed_dirs.iter().any(|d| *d == first) {
                    return Err(blocked("leading directory is not in the allow-list"));
                }
            }
            _ => return Err(blocked("leading directory is not in the allow-list")),
        }

        if !path.ends_with(&self.required_extension) {
            return Err(blocked("file extension is not allowed"));
        }

        let mut rel = PathBuf::new();
        for c in input.components() {
            match c {
                Component::CurDir => {}
                Component::Normal(part) => rel.push(part),
                Component::ParentDir => {
                    if !rel.pop() {
                        return Err(blocked("path navigates above the root"));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(blocked("absolute paths are not allowed"));
                }
            }
        }

        let real = soft_canonicalize(self.root.join(&rel))
            .map_err(|_| blocked("path could not be canonicalized"))?;
        // Component-wise: `/srv/root-other` does not start with `/srv/root`.
        if real == self.root || !real.starts_with(&self.root) {
            return Err(blocked("path resolves outside the root"));
        }

        // Re-check the allow-list on the resolved path: `data/../other/x.ts`
        // passes the lexical check above but lands somewhere else.
        let inside = real.strip_prefix(&self.root).unwrap_or(&real);
        match inside.components().next() {
            Some(Component::Normal(first))
                if self.allowed_dirs.iter().any(|d| *d == first.to_string_lossy()) => {}
            _ => return Err(blocked("path resolves outside the allowed directories")),
        }

        Ok(real)
    }

    /// Ensure a resolved path sits in `<allowed dir>/<dataset>/...`.
    pub fn check_dataset(&self, resolved: &Path, dataset: &str) -> Result<(), PatchError> {
        let inside = resolved.strip_prefix(&self.root).unwrap_or(resolved);
        let mut components = inside.components();
        let _allowed_dir = components.next();
        match (components.next(), components.next()) {
            (Some(Component::Normal(ds)), Some(_)) if ds.to_string_lossy() == dataset => Ok(()),
            _ => Err(PatchError::Blocked {
                path: inside.display().to_string(),
                reason: "path is outside the requested dataset",
            }),
        }
    }
}

/// Canonicalize the deepest existing ancestor of `p`, then append the missing tail.
/// This follows symlinks in the existing prefix but does not require the leaf to exist.
pub fn soft_canonicalize<P: AsRef<Path>>(p: P) -> io::Result<PathBuf> {
    let mut existing = p.as_ref();

    let mut tail = Vec::new();
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => {
                if let Some(name) = existing.file_name() {
                    tail.push(name.to_os_string());
                }
                existing = parent;
            }
            None => break,
        }
    }

    let mut base = if fs::symlink_metadata(existing).is_ok() {
        existing.canonicalize()?
    } else {
        PathBuf::new()
    };
    for seg in tail.into_iter().rev() {
        base.push(seg);
    }
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox() -> (tempfile::TempDir, Sandbox) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("data/acme")).unwrap();
        fs::write(root.join("data/acme/timeline.ts"), "x\n").unwrap();
        let sb = Sandbox::new(root, vec!["data".into()], ".ts".into());
        (dir, sb)
    }

    fn assert_blocked(sb: &Sandbox, path: &str) {
        match sb.resolve(path) {
            Err(PatchError::Blocked { .. }) => {}
            other => panic!("expected Blocked for {path}, got {other:?}"),
        }
    }

    #[test]
    fn resolves_allowed_file() {
        let (_d, sb) = sandbox();
        let p = sb.resolve("data/acme/timeline.ts").unwrap();
        assert_eq!(p, sb.root().join("data/acme/timeline.ts"));
        // leaf need not exist
        assert!(sb.resolve("./data/acme/new.ts").is_ok());
    }

    #[test]
    fn rejects_traversal_absolute_and_prefix_escapes() {
        let (_d, sb) = sandbox();
        assert_blocked(&sb, "../../etc/passwd");
        assert_blocked(&sb, "data/../../etc/passwd.ts");
        assert_blocked(&sb, "data/../secrets/keys.ts");
        assert_blocked(&sb, "/etc/passwd");
        assert_blocked(&sb, "/tmp/data/acme/x.ts");
        assert_blocked(&sb, "src/app.ts");
        assert_blocked(&sb, "database/acme/x.ts");
        assert_blocked(&sb, "data");
        assert_blocked(&sb, "");
    }

    #[test]
    fn rejects_wrong_extension() {
        let (_d, sb) = sandbox();
        assert_blocked(&sb, "data/acme/timeline.js");
        assert_blocked(&sb, "data/acme/timeline.ts.bak");
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_escape() {
        let (_d, sb) = sandbox();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("evil.ts"), "x\n").unwrap();
        std::os::unix::fs::symlink(outside.path(), sb.root().join("data/link")).unwrap();
        assert_blocked(&sb, "data/link/evil.ts");
    }

    #[test]
    fn dataset_scope_is_enforced() {
        let (_d, sb) = sandbox();
        let p = sb.resolve("data/acme/timeline.ts").unwrap();
        assert!(sb.check_dataset(&p, "acme").is_ok());
        assert!(sb.check_dataset(&p, "globex").is_err());
        let top = sb.resolve("data/top.ts").unwrap();
        assert!(sb.check_dataset(&top, "top.ts").is_err());
    }
}
