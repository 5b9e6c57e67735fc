use eyre::{Result, WrapErr, eyre};
use std::io::Read;

fn stdin_is_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Request body: the named file, or all of stdin when no file is given.
pub fn read_request(path: Option<&str>) -> Result<String> {
    let buf = match path {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("could not read request file {path}"))?,
        None => {
            if stdin_is_tty() {
                return Err(eyre!("pipe a JSON request on stdin or pass a request file"));
            }
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!(e))?;
            buf
        }
    };
    if buf.trim().is_empty() {
        return Err(eyre!("request is empty"));
    }
    Ok(buf)
}
