/// Why [`locate_unique`] could not return a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateError {
    NotFound,
    Ambiguous,
}

/// Byte offset of the single occurrence of `needle` in `text`.
///
/// Overlapping repeats count: `"aa"` in `"aaa"` is ambiguous. The engine never
/// guesses between candidates.
pub fn locate_unique(text: &str, needle: &str) -> Result<usize, LocateError> {
    if needle.is_empty() {
        return Err(LocateError::NotFound);
    }
    let first = text.find(needle).ok_or(LocateError::NotFound)?;
    let next_start = first + text[first..].chars().next().map_or(1, char::len_utf8);
    if text[next_start..].contains(needle) {
        return Err(LocateError::Ambiguous);
    }
    Ok(first)
}

/// Number of `\n`-separated segments: `"a"` is 1, `"a\n"` is 2.
pub fn line_count(s: &str) -> usize {
    s.split('\n').count()
}

/// Byte offset where the line containing `idx` starts.
pub fn line_start(text: &str, idx: usize) -> usize {
    text[..idx].rfind('\n').map_or(0, |p| p + 1)
}

/// Byte offset of the `\n` ending the line containing `idx`, if any.
pub fn line_end(text: &str, idx: usize) -> Option<usize> {
    text[idx..].find('\n').map(|p| idx + p)
}

/// Character distance between two byte offsets.
pub fn char_distance(text: &str, a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    text[lo..hi].chars().count()
}

/// Single-line, length-limited rendering for log lines.
pub fn preview(s: &str) -> String {
    let s = s.replace('\n', "\\n");
    match s.char_indices().nth(80) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s,
    }
}
