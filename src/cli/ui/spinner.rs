use colored::*;
use std::future::Future;
use std::io::{IsTerminal, Write};
use std::time::Duration;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Drive `future` to completion while animating a spinner on stderr
///
/// Falls back to awaiting silently when stderr is not a terminal.
pub async fn with_spinner<F, T>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let mut stderr = std::io::stderr();
    if !stderr.is_terminal() {
        return future.await;
    }

    tokio::pin!(future);
    let mut frame = 0;

    let result = loop {
        let _ = write!(stderr, "\r{} {}", FRAMES[frame].cyan().bold(), message);
        let _ = stderr.flush();

        match tokio::time::timeout(FRAME_DURATION, &mut future).await {
            Ok(result) => break result,
            Err(_) => frame = (frame + 1) % FRAMES.len(),
        }
    };

    // Clear the spinner line
    let _ = write!(stderr, "\r\x1b[2K");
    let _ = stderr.flush();

    result
}
