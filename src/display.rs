use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use serde_json::Value;

#[derive(Clone, Copy)]
pub struct Caps {
    /// We can emit ANSI color sequences to stderr.
    pub colorful: bool,
    /// We can safely prompt and wait for stdin input.
    pub can_prompt_user: bool,
}

/// Operator-facing rendering on stderr. Stdout is reserved for JSON.
pub struct Display {
    caps: Caps,
}

impl Display {
    pub fn new(caps: Caps) -> Self {
        Display { caps }
    }

    /// Show each patch verdict from a `preview_patches` response, with the
    /// diff for the valid ones.
    pub fn show_preview(&self, report: &Value) {
        let previews = report["perPatchPreview"].as_array().cloned().unwrap_or_default();
        for (n, p) in previews.iter().enumerate() {
            let head = patch_head(n, &p["patch"]);
            if p["valid"].as_bool().unwrap_or(false) {
                let added = p["linesAdded"].as_u64().unwrap_or(0);
                self.show_verdict(&head, &format!("+{added} line(s)"), Color::Green);
                self.show_diff(p["diff"].as_str().unwrap_or_default());
            } else {
                self.show_verdict(&head, p["detail"].as_str().unwrap_or_default(), Color::Red);
            }
        }
        self.show_summary(&format!(
            "{} of {} patch(es) valid, {} line(s) added across {} file(s)",
            report["validCount"].as_u64().unwrap_or(0),
            report["totalCandidates"].as_u64().unwrap_or(0),
            report["totalLinesAdded"].as_u64().unwrap_or(0),
            report["filesAffected"].as_array().map_or(0, Vec::len),
        ));
    }

    /// Show each outcome from an `apply_patches` response.
    pub fn show_apply(&self, report: &Value) {
        let results = report["perPatchResult"].as_array().cloned().unwrap_or_default();
        for (n, r) in results.iter().enumerate() {
            let head = patch_head(n, &r["patch"]);
            match (r["backup"].as_str(), r["success"].as_bool()) {
                (Some(backup), Some(true)) => {
                    self.show_verdict(&head, &format!("applied, backup {backup}"), Color::Green)
                }
                _ => self.show_verdict(&head, r["detail"].as_str().unwrap_or_default(), Color::Red),
            }
        }
        self.show_summary(&format!(
            "{} applied, {} failed",
            report["appliedCount"].as_u64().unwrap_or(0),
            report["failedCount"].as_u64().unwrap_or(0)
        ));
    }

    /// Show a whole-request failure.
    pub fn show_error(&self, message: &str) {
        self.show_verdict("error", message, Color::Red);
    }

    fn show_verdict(&self, head: &str, detail: &str, color: Color) {
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetAttribute(Attribute::Bold),
                Print(head),
                SetAttribute(Attribute::Reset),
                Print(": "),
                SetForegroundColor(color),
                Print(detail),
                ResetColor,
                Print("\n"),
            );
        } else {
            eprintln!("{head}: {detail}");
        }
    }

    fn show_diff(&self, diff: &str) {
        for line in diff.lines() {
            if !self.caps.colorful {
                eprintln!("{line}");
                continue;
            }
            let color = if line.starts_with("@@") {
                Color::DarkCyan
            } else if line.starts_with("+++") || line.starts_with("---") {
                Color::DarkGrey
            } else if line.starts_with('+') {
                Color::Green
            } else if line.starts_with('-') {
                Color::Red
            } else {
                Color::Reset
            };
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(color),
                Print(line),
                ResetColor,
                Print("\n"),
            );
        }
        eprintln!();
    }

    fn show_summary(&self, line: &str) {
        if self.caps.colorful {
            let _ = crossterm::execute!(
                std::io::stderr(),
                SetForegroundColor(Color::DarkCyan),
                Print(line),
                ResetColor,
                Print("\n"),
            );
        } else {
            eprintln!("{line}");
        }
    }

    /// Ask the operator whether the validated patches should be written.
    /// Returns true only if approved.
    pub fn confirm_apply(&self, count: usize) -> bool {
        if !self.caps.can_prompt_user {
            eprintln!("not applying: no terminal to confirm on");
            return false;
        }
        let _ = crossterm::execute!(
            std::io::stderr(),
            Print(format!("Apply {count} patch(es)? [y/N] ")),
        );
        yes_or_no()
    }
}

fn patch_head(n: usize, patch: &Value) -> String {
    format!(
        "#{} {} {}",
        n + 1,
        patch["action"].as_str().unwrap_or("?"),
        patch["file"].as_str().unwrap_or("?")
    )
}

fn yes_or_no() -> bool {
    let mut buffer = String::new();
    let stdin = std::io::stdin();
    let Ok(_read) = stdin.read_line(&mut buffer) else {
        return false;
    };
    let first_char = buffer.trim().chars().next().unwrap_or('n');
    first_char.eq_ignore_ascii_case(&'y')
}

/// Prefer colorful output on TTY stderr; fall back to plain printing.
pub fn make_display() -> Display {
    let stderr_is_tty = atty::is(atty::Stream::Stderr);
    let stdin_is_tty = atty::is(atty::Stream::Stdin);
    Display::new(Caps {
        colorful: stderr_is_tty && std::env::var_os("NO_COLOR").is_none(),
        can_prompt_user: stdin_is_tty && stderr_is_tty,
    })
}
