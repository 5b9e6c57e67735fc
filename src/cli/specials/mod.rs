use eyre::Result;

/// Handle one-shot CLI commands like `--help` or `--version`.
/// Returns true if a special action was handled and the program should exit.
pub fn handle_specials_if_needed() -> Result<bool> {
    let mut args = std::env::args();
    let _ = args.next(); // binary name

    let arg = args.next().unwrap_or_default();

    if matches!(arg.as_str(), "" | "help" | "--help" | "-H" | "-h" | "-?") {
        println!(
            "{}",
            concat!(
                "recordpatch: merge-only patches for append-only record files\n\n",
                "  $ recordpatch preview < proposals.json   # validate and diff, never writes\n",
                "  $ recordpatch apply < validated.json     # re-validate and write atomically\n",
                "  $ recordpatch review proposals.json      # preview, confirm, apply\n\n",
                "Request: {\"dataset\": \"acme\", \"analysis\": \"...\", \"patches\": [{\"file\", \"action\", \"anchor\", \"content\", \"oldValue\"?}]}\n",
                "Environment: RECORDPATCH_ROOT, RECORDPATCH_ALLOWED_DIRS, RECORDPATCH_EXTENSION,\n",
                "  RECORDPATCH_MAX_CONTENT_CHARS, RECORDPATCH_MAX_ANCHOR_DISTANCE,\n",
                "  RECORDPATCH_MAX_ANALYSIS_CHARS, RECORDPATCH_MAX_PATCHES, RUST_LOG\n"
            )
        );
        return Ok(true);
    }

    if matches!(arg.as_str(), "version" | "--version" | "-V" | "-v") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    // Otherwise, not a special
    Ok(false)
}
