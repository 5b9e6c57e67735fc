//! Engine settings, read once from the environment and passed down explicitly.
use eyre::{Result, WrapErr, eyre};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Canonical file-store root.
    pub root: PathBuf,
    /// First path segment of every patch target must be one of these.
    pub allowed_dirs: Vec<String>,
    pub required_extension: String,
    pub max_content_chars: usize,
    pub max_anchor_distance: usize,
    pub max_analysis_chars: usize,
    pub max_patches: usize,
}

impl EngineConfig {
    /// Defaults rooted at `root`, which must exist.
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = root
            .canonicalize()
            .wrap_err_with(|| format!("file-store root {} is not accessible", root.display()))?;
        if !root.is_dir() {
            return Err(eyre!("file-store root {} is not a directory", root.display()));
        }
        Ok(Self {
            root,
            allowed_dirs: vec!["data".to_string()],
            required_extension: ".ts".to_string(),
            max_content_chars: 5_000,
            max_anchor_distance: 2_000,
            max_analysis_chars: 50_000,
            max_patches: 50,
        })
    }

    /// `RECORDPATCH_*` variables override the defaults; the root defaults to the CWD.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let root = match lookup("RECORDPATCH_ROOT") {
            Some(r) if !r.trim().is_empty() => PathBuf::from(r.trim()),
            _ => std::env::current_dir()?,
        };
        let mut config = Self::with_root(root)?;

        if let Some(dirs) = lookup("RECORDPATCH_ALLOWED_DIRS") {
            let dirs: Vec<String> = dirs
                .split(',')
                .map(|d| d.trim().trim_matches('/').to_string())
                .filter(|d| !d.is_empty())
                .collect();
            if dirs.is_empty() {
                return Err(eyre!("RECORDPATCH_ALLOWED_DIRS names no directories"));
            }
            if let Some(bad) = dirs.iter().find(|d| d.contains(['/', '\\']) || *d == "..") {
                return Err(eyre!("RECORDPATCH_ALLOWED_DIRS: `{bad}` is not a single directory name"));
            }
            config.allowed_dirs = dirs;
        }
        if let Some(ext) = lookup("RECORDPATCH_EXTENSION") {
            let ext = ext.trim();
            config.required_extension = if ext.starts_with('.') {
                ext.to_string()
            } else {
                format!(".{ext}")
            };
        }

        let number = |key: &str, default: usize| -> Result<usize> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .wrap_err_with(|| format!("{key} must be a non-negative integer, got `{v}`")),
                None => Ok(default),
            }
        };
        config.max_content_chars = number("RECORDPATCH_MAX_CONTENT_CHARS", config.max_content_chars)?;
        config.max_anchor_distance =
            number("RECORDPATCH_MAX_ANCHOR_DISTANCE", config.max_anchor_distance)?;
        config.max_analysis_chars =
            number("RECORDPATCH_MAX_ANALYSIS_CHARS", config.max_analysis_chars)?;
        config.max_patches = number("RECORDPATCH_MAX_PATCHES", config.max_patches)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([("RECORDPATCH_ROOT", dir.path().display().to_string())]);
        let c = EngineConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(c.root, dir.path().canonicalize().unwrap());
        assert_eq!(c.allowed_dirs, vec!["data"]);
        assert_eq!(c.required_extension, ".ts");
        assert_eq!(c.max_content_chars, 5000);
        assert_eq!(c.max_anchor_distance, 2000);
    }

    #[test]
    fn overrides_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let vars = HashMap::from([
            ("RECORDPATCH_ROOT", dir.path().display().to_string()),
            ("RECORDPATCH_ALLOWED_DIRS", "data, companies/".to_string()),
            ("RECORDPATCH_EXTENSION", "json".to_string()),
            ("RECORDPATCH_MAX_CONTENT_CHARS", "100".to_string()),
        ]);
        let c = EngineConfig::from_lookup(lookup(vars)).unwrap();
        assert_eq!(c.allowed_dirs, vec!["data", "companies"]);
        assert_eq!(c.required_extension, ".json");
        assert_eq!(c.max_content_chars, 100);
    }

    #[test]
    fn bad_values_are_startup_errors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().display().to_string();
        let vars = HashMap::from([
            ("RECORDPATCH_ROOT", root.clone()),
            ("RECORDPATCH_MAX_PATCHES", "lots".to_string()),
        ]);
        assert!(EngineConfig::from_lookup(lookup(vars)).is_err());

        let vars = HashMap::from([
            ("RECORDPATCH_ROOT", root),
            ("RECORDPATCH_ALLOWED_DIRS", "data/acme".to_string()),
        ]);
        assert!(EngineConfig::from_lookup(lookup(vars)).is_err());

        let vars = HashMap::from([("RECORDPATCH_ROOT", "/definitely/not/here".to_string())]);
        assert!(EngineConfig::from_lookup(lookup(vars)).is_err());
    }
}
