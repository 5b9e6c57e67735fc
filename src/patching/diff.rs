//! Unified-diff-style preview of one computed mutation.
//!
//! Not a minimal diff: a forward scan that, on divergence, looks for the
//! nearest point where both sides agree again on two consecutive lines. That
//! is enough for the shapes the planner produces (one inserted block or one
//! replaced span) and always reproduces `after` exactly when applied.

const CONTEXT: usize = 2;
const SYNC_RUN: usize = 2;

/// A divergent region: `a[a_start..a_end]` became `b[b_start..b_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    a_end: usize,
    b_start: usize,
    b_end: usize,
}

/// Render `before` -> `after` for operator review. Empty when nothing changed.
pub fn render(path: &str, before: &str, after: &str) -> String {
    let a: Vec<&str> = before.split('\n').collect();
    let b: Vec<&str> = after.split('\n').collect();
    let blocks = change_blocks(&a, &b);
    if blocks.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {path}\n+++ {path}\n");
    for group in group_blocks(&blocks) {
        render_hunk(&mut out, &a, &b, group);
    }
    out
}

fn change_blocks(a: &[&str], b: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        if i < a.len() && j < b.len() && a[i] == b[j] {
            i += 1;
            j += 1;
            continue;
        }
        let (di, dj) = resync(a, b, i, j);
        blocks.push(Block {
            a_start: i,
            a_end: i + di,
            b_start: j,
            b_end: j + dj,
        });
        i += di;
        j += dj;
    }
    blocks
}

/// Smallest combined advance `(di, dj)` after which both sides agree again.
fn resync(a: &[&str], b: &[&str], i: usize, j: usize) -> (usize, usize) {
    let (ra, rb) = (a.len() - i, b.len() - j);
    for k in 1..=ra + rb {
        for di in 0..=k.min(ra) {
            let dj = k - di;
            if dj > rb {
                continue;
            }
            if synced(a, b, i + di, j + dj) {
                return (di, dj);
            }
        }
    }
    (ra, rb)
}

/// Both cursors agree on the next `SYNC_RUN` lines, or on the whole remainder
/// when fewer lines are left.
fn synced(a: &[&str], b: &[&str], i: usize, j: usize) -> bool {
    let (ra, rb) = (a.len() - i, b.len() - j);
    if ra >= SYNC_RUN && rb >= SYNC_RUN {
        a[i..i + SYNC_RUN] == b[j..j + SYNC_RUN]
    } else {
        a[i..] == b[j..]
    }
}

/// Merge blocks whose context windows would touch.
fn group_blocks(blocks: &[Block]) -> Vec<&[Block]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for k in 1..blocks.len() {
        if blocks[k].a_start - blocks[k - 1].a_end > 2 * CONTEXT {
            groups.push(&blocks[start..k]);
            start = k;
        }
    }
    groups.push(&blocks[start..]);
    groups
}

fn render_hunk(out: &mut String, a: &[&str], b: &[&str], group: &[Block]) {
    let (first, last) = (group[0], group[group.len() - 1]);
    // Equal runs have the same length on both sides, so one lead/trail fits both.
    let lead = first.a_start.min(CONTEXT);
    let trail = (a.len() - last.a_end).min(CONTEXT);
    let a_start = first.a_start - lead;
    let b_start = first.b_start - lead;
    let a_len = last.a_end + trail - a_start;
    let b_len = last.b_end + trail - b_start;

    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        a_start + 1,
        a_len,
        b_start + 1,
        b_len
    ));

    let mut cursor = a_start;
    for block in group {
        push_lines(out, ' ', &a[cursor..block.a_start]);
        push_lines(out, '-', &a[block.a_start..block.a_end]);
        push_lines(out, '+', &b[block.b_start..block.b_end]);
        cursor = block.a_end;
    }
    push_lines(out, ' ', &a[cursor..last.a_end + trail]);
}

fn push_lines(out: &mut String, prefix: char, lines: &[&str]) {
    for l in lines {
        out.push(prefix);
        out.push_str(l);
        out.push('\n');
    }
}
