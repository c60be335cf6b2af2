//! Output side: the glasses render primitive, chunk rendering and paced schedules.

pub mod schedule;

use std::io::Write;

use crate::core::format::DisplayChunk;

pub use schedule::{DisplaySlot, Pacing, Schedule, Ticket};

/// Render primitive of the host display session. Calls are fire-and-forget.
pub trait Display: Send + Sync {
    /// Replace whatever is on screen with `text`.
    fn show_text(&self, text: &str);

    /// Blank the screen (used when the session cools down).
    fn clear(&self) {}
}

/// Screen text for a chunk: `"(i/N) <text>"` when there is more than one chunk.
pub fn render_chunk(chunk: &DisplayChunk) -> String {
    if chunk.total_count > 1 {
        format!("({}/{}) {}", chunk.index + 1, chunk.total_count, chunk.text)
    } else {
        chunk.text.clone()
    }
}

/// Split text into display lines respecting its newlines, then wrap to `width`.
/// Uses textwrap for correct UTF-8 handling; `width == 0` disables wrapping.
pub(crate) fn wrap_for_display(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() || width == 0 {
            out.push(line.to_string());
            continue;
        }
        out.extend(
            textwrap::wrap(line, width)
                .into_iter()
                .map(|cow| cow.into_owned()),
        );
    }
    out
}

/// Stand-in for the glasses text wall: each update is printed to stdout as a
/// framed block wrapped to the display's line width.
pub struct TerminalDisplay {
    line_width: usize,
}

impl TerminalDisplay {
    pub fn new(line_width: usize) -> Self {
        Self { line_width }
    }

    fn frame(&self) -> String {
        "-".repeat(self.line_width.clamp(10, 120) + 4)
    }
}

impl Display for TerminalDisplay {
    fn show_text(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let frame = self.frame();
        let _ = writeln!(out, "{}", frame);
        for line in wrap_for_display(text, self.line_width) {
            let _ = writeln!(out, "| {}", line);
        }
        let _ = writeln!(out, "{}", frame);
        let _ = out.flush();
    }

    fn clear(&self) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.frame());
        let _ = out.flush();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Display;

    /// Display that records every update, for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingDisplay {
        shown: Mutex<Vec<String>>,
        clears: AtomicUsize,
    }

    impl RecordingDisplay {
        pub(crate) fn shown(&self) -> Vec<String> {
            self.shown.lock().unwrap().clone()
        }

        pub(crate) fn clears(&self) -> usize {
            self.clears.load(Ordering::SeqCst)
        }
    }

    impl Display for RecordingDisplay {
        fn show_text(&self, text: &str) {
            self.shown.lock().unwrap().push(text.to_string());
        }

        fn clear(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }
}
