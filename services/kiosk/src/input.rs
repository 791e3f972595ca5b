//! Line-oriented input from a keyboard-wedge scanner on stdin

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::driver::KioskInput;

pub const END_SESSION_COMMAND: &str = "/end";

/// A scanned line becomes a change of the input field followed by Enter
pub fn parse_line(line: &str) -> Vec<KioskInput> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == END_SESSION_COMMAND {
        return vec![KioskInput::EndSession];
    }
    vec![KioskInput::Changed(trimmed.to_string()), KioskInput::Submit]
}

/// Forward lines from `reader` until it ends or the driver stops listening
pub async fn forward_lines<R>(reader: R, events: mpsc::Sender<KioskInput>) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        for event in parse_line(&line) {
            if events.send(event).await.is_err() {
                debug!("Input receiver closed");
                return Ok(());
            }
        }
    }
    Ok(())
}
