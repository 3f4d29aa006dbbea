//! Output formatting
//!
//! Human or JSON output, styled messages and spinners, all driven by the
//! global CLI flags.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::Spinner;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable spinners
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Whether interactive decorations (colors, spinners) are allowed
    pub fn decorated(&self) -> bool {
        !self.json && !self.quiet
    }
}
