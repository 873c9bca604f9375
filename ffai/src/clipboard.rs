use arboard::Clipboard;
use tracing::{debug, warn};

/// Put `text` on the system clipboard. Returns false when no clipboard is available.
pub fn copy(text: &str) -> bool {
    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => {
            debug!("copied {} bytes to clipboard", text.len());
            true
        }
        Err(err) => {
            warn!("clipboard unavailable: {err}");
            false
        }
    }
}
