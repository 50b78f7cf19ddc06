use std::io::{self, Write};
use std::sync::Mutex;

const BAR_CELLS: usize = 50;
const WIDEST_TAIL: usize = "[100%".len();

/// Formats `percent` as a bracketed 50 cell bar with the value inside it, e.g.
/// `[=========================50%                          ]`.
///
/// Values in `0..=100` always give the same width. Anything outside that range
/// gives a longer or emptier bar; callers are trusted to stay in range.
pub fn render_bar(percent: f64) -> String {
    let filled = (percent / 2.0).round_ties_even() as usize;
    // `{:.0}` alone would round 0.5 down to 0.
    let mut bar = format!("[{}{}%", "=".repeat(filled), percent.round());
    let padding = (BAR_CELLS + WIDEST_TAIL).saturating_sub(bar.chars().count());
    bar.push_str(&" ".repeat(padding));
    bar.push(']');
    bar
}

/// Draws a two line status (label, then bar) at the top left of the terminal.
///
/// Every call holds one lock for the whole write, so updates coming from
/// different threads never interleave. The last write wins on screen.
pub struct ProgressRenderer<W> {
    out: Mutex<W>,
}

impl ProgressRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ProgressRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn render(&self, label: &str, percent: f64) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Cursor home, then clear each line before writing it.
        let _ = write!(out, "\x1B[H\x1B[2K{}\n\x1B[2K{}", label, render_bar(percent));
        let _ = out.flush();
    }

    /// Moves the cursor below the status so later output doesn't overwrite it.
    pub fn finish(&self) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(out);
        let _ = out.flush();
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
