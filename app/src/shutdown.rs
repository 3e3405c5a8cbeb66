use std::io::{self, Read};

use tokio_util::sync::CancellationToken;

/// Byte on stdin that requests a shutdown.
pub const QUIT_KEY: u8 = b'q';

/// Read `input` until the quit key arrives.
///
/// Returns `Ok(true)` on the quit key and `Ok(false)` at end of input.
pub fn wait_for_quit_key(mut input: impl Read) -> io::Result<bool> {
    let mut buf = [0u8; 64];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => return Ok(false),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf[..n].iter().any(|b| b.eq_ignore_ascii_case(&QUIT_KEY)) {
            return Ok(true);
        }
    }
}

/// Cancel `token` when the quit key is read from stdin.
///
/// Runs on a plain thread since stdin reads cannot be interrupted. End of
/// input leaves the token alone so a detached process keeps running.
pub fn spawn_quit_listener(token: CancellationToken) {
    let spawned = std::thread::Builder::new()
        .name("quit-listener".into())
        .spawn(move || match wait_for_quit_key(io::stdin().lock()) {
            Ok(true) => {
                tracing::info!("Quit key pressed");
                token.cancel();
            }
            Ok(false) => tracing::debug!("Stdin closed, quit key disabled"),
            Err(e) => tracing::warn!(error = %e, "Failed to read stdin"),
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to start quit listener");
    }
}

/// Cancel `token` on Ctrl+C.
pub fn spawn_ctrl_c_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received");
                token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
}
