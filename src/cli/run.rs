use eyre::{Result, eyre};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::cli::{io, specials};
use crate::config::EngineConfig;
use crate::display::{self, Display};
use crate::patching::{Engine, RequestError};
use crate::tools::{self, ExposedTools};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Preview,
    Apply,
    /// Preview, ask the operator, then apply the validated subset.
    Review,
}

impl Mode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "preview" | "dry-run" => Some(Mode::Preview),
            "apply" => Some(Mode::Apply),
            "review" => Some(Mode::Review),
            _ => None,
        }
    }
}

/// CLI entrypoint: one request in (stdin or file), one JSON response out.
pub async fn run() -> Result<()> {
    crate::logging::setup_tracing_logger();

    if specials::handle_specials_if_needed()? {
        return Ok(());
    }

    let mut args = std::env::args();
    let _ = args.next(); // binary name
    let command = args.next().unwrap_or_default();
    let mode = Mode::parse(&command)
        .ok_or_else(|| eyre!("unknown command `{command}`; see `recordpatch help`"))?;
    let file = args.next();
    if mode == Mode::Review && file.is_none() {
        return Err(eyre!("review reads the request from a file so stdin stays free for the prompt"));
    }

    let display = display::make_display();
    let body = io::read_request(file.as_deref())?;
    let request: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => return fail(&display, RequestError::Malformed(e.to_string()).to_json()),
    };

    let config = EngineConfig::from_env()?;
    tracing::debug!("store root {}", config.root.display());
    let tools = tools::all_tools(Arc::new(Engine::new(&config)));

    match mode {
        Mode::Preview => {
            let report = call(&tools, "preview_patches", request).await?;
            finish(&display, report, Display::show_preview)
        }
        Mode::Apply => {
            let report = call(&tools, "apply_patches", request).await?;
            finish(&display, report, Display::show_apply)
        }
        Mode::Review => {
            let outcome = review(&tools, &display, request, Display::confirm_apply).await?;
            if outcome.get("error").is_some() {
                return fail(&display, outcome);
            }
            print_json(&outcome)
        }
    }
}

/// Preview, show every verdict, and apply the validated subset only when
/// `confirm` approves. Returns the `{preview, apply}` object for stdout, or
/// the preview's request error object unchanged.
async fn review(
    tools: &ExposedTools,
    display: &Display,
    request: Value,
    confirm: impl FnOnce(&Display, usize) -> bool,
) -> Result<Value> {
    let dataset = request["dataset"].clone();
    let preview = call(tools, "preview_patches", request).await?;
    if preview.get("error").is_some() {
        return Ok(preview);
    }
    display.show_preview(&preview);

    let valid = preview["validCount"].as_u64().unwrap_or(0) as usize;
    if valid == 0 {
        eprintln!("no changes needed");
        return Ok(json!({ "preview": preview, "apply": Value::Null }));
    }
    if !confirm(display, valid) {
        return Ok(json!({ "preview": preview, "apply": Value::Null }));
    }

    let apply_request = json!({
        "dataset": dataset,
        "patches": preview["validatedPatches"].clone(),
    });
    let applied = call(tools, "apply_patches", apply_request).await?;
    if applied.get("error").is_none() {
        display.show_apply(&applied);
    }
    Ok(json!({ "preview": preview, "apply": applied }))
}

async fn call(tools: &ExposedTools, name: &str, request: Value) -> Result<Value> {
    tools::invoke(tools, name, request)
        .await
        .map_err(|e| eyre!("{name}: {e}"))
}

/// Render for the operator, print the JSON, and turn a request-level error
/// into a non-zero exit.
fn finish(display: &Display, report: Value, show: fn(&Display, &Value)) -> Result<()> {
    if report.get("error").is_some() {
        return fail(display, report);
    }
    show(display, &report);
    print_json(&report)
}

fn fail(display: &Display, error: Value) -> Result<()> {
    let message = error["error"].as_str().unwrap_or("request failed").to_string();
    display.show_error(&message);
    print_json(&error)?;
    Err(eyre!(message))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
