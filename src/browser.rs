//! Opening URLs in the user's browser.

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Platform command that opens `url` with the default handler.
fn opener(url: &str) -> Result<Command> {
    let cmd = if cfg!(target_os = "linux") {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("rundll32");
        c.arg("url.dll,FileProtocolHandler").arg(url);
        c
    } else {
        bail!("opening a browser is unsupported on this platform");
    };
    Ok(cmd)
}

/// Starts `cmd` and waits for it on a background task, so the child is
/// reaped when it exits. Must be called inside a tokio runtime.
fn spawn_detached(mut cmd: Command) -> std::io::Result<JoinHandle<()>> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let mut child = cmd.spawn()?;
    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if !status.success() => {
                tracing::warn!("{} exited with {}", program, status)
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("failed to wait for {}: {}", program, e),
        }
    }))
}

/// Starts the opener without waiting for it to exit.
pub fn open_url(url: &str) -> Result<()> {
    spawn_detached(opener(url)?).with_context(|| format!("failed to open {}", url))?;
    Ok(())
}

/// Opens each URL, logging failures instead of returning them.
pub fn open_all(urls: &[String]) {
    for url in urls {
        if let Err(e) = open_url(url) {
            tracing::warn!("{:#}", e);
        }
    }
}
