use regex::Regex;

use super::error::PatchError;

/// A compiled denylist entry.
struct DangerousPattern {
    name: &'static str,
    regex: Regex,
}

/// Last check before AI-authored text lands in a data file that the
/// application later loads: bounded size, no executable constructs.
///
/// This is a textual heuristic. Data files must still be loaded through a
/// schema-validated reader, never evaluated.
pub struct ContentScanner {
    max_chars: usize,
    patterns: Vec<DangerousPattern>,
}

impl ContentScanner {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            patterns: compile_patterns(),
        }
    }

    pub fn scan(&self, content: &str) -> Result<(), PatchError> {
        let len = content.chars().count();
        if len > self.max_chars {
            return Err(PatchError::ContentTooLarge {
                len,
                max: self.max_chars,
            });
        }
        if let Some(p) = self.patterns.iter().find(|p| p.regex.is_match(content)) {
            return Err(PatchError::DangerousPattern { pattern: p.name });
        }
        Ok(())
    }
}

fn compile_patterns() -> Vec<DangerousPattern> {
    const PATTERNS: &[(&str, &str)] = &[
        ("dynamic import", r"\bimport\s*\("),
        ("static import", r"(?m)^\s*import\s+[\w{*]"),
        ("require call", r"\brequire\s*\("),
        ("eval call", r"\beval\s*\("),
        ("function constructor", r"\bnew\s+Function\s*\(|\bFunction\s*\("),
        ("process access", r"\bprocess\s*(\.|\[)"),
        ("environment access", r"\bDeno\s*\.\s*env\b|\bimport\s*\.\s*meta\b"),
        ("child process", r"\bchild_process\b|\bexecSync\b|\bspawnSync\b|\bexec\s*\("),
        ("timer with code", r#"\bset(Timeout|Interval)\s*\(\s*['"`]"#),
        ("global object access", r"\bglobalThis\b|\b__proto__\b|\bconstructor\s*\["),
        ("script tag", r"(?i)<\s*script\b"),
    ];
    PATTERNS
        .iter()
        .filter_map(|&(name, src)| match Regex::new(src) {
            Ok(regex) => Some(DangerousPattern { name, regex }),
            Err(e) => {
                tracing::error!("dangerous pattern `{name}` failed to compile: {e}");
                None
            }
        })
        .collect()
}
