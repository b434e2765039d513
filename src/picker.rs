// src/picker.rs
//! Out-of-core glue: hand display lines to `fzf`, get one selection back,
//! and open a chosen link in the platform browser. Nothing here affects
//! pipeline semantics.

use std::io::Write;
use std::process::{Command, Stdio};

fn fzf_available() -> bool {
    Command::new("fzf")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Present the options through fzf and return the selected line, or `None`
/// on cancellation, empty input, or missing fzf.
pub fn choose(options: &[String]) -> Option<String> {
    if options.is_empty() || !fzf_available() {
        return None;
    }
    let mut child = match Command::new("fzf")
        .arg("--prompt=Select Article >")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = ?e, "fzf spawn failed");
            return None;
        }
    };
    if let Some(stdin) = child.stdin.as_mut() {
        // fzf may close stdin early once the user has typed; not an error
        let _ = stdin.write_all(options.join("\n").as_bytes());
    }
    match child.wait_with_output() {
        Ok(out) if out.status.success() => {
            let line = String::from_utf8_lossy(&out.stdout).trim().to_string();
            (!line.is_empty()).then_some(line)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::error!(error = ?e, "fzf failed");
            None
        }
    }
}

/// Fire-and-forget browser launch.
pub fn open_in_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = Command::new("open");
        c.arg(url);
        c
    };
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    match cmd.stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
        Ok(_) => tracing::info!(url = %url, "opening in browser"),
        Err(e) => tracing::error!(error = ?e, url = %url, "browser launch failed"),
    }
}
