//! Styling for docluster's terminal output.
//!
//! Every styled string printed by the binary goes through [`THEME`]. Colors
//! are dropped when `NO_COLOR` is set or stdout is not a terminal.

use console::Style;
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::path::Path;
use std::sync::LazyLock;

use crate::clustering::TrainingOutcome;

pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Outcome class of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
}

impl Status {
    fn icon(self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Error => "✗",
            Status::Warning => "⚠",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    success: Style,
    error: Style,
    warning: Style,
    header: Style,
    dim: Style,
    path: Style,
    /// Distances, error sums and counts
    number: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bright(),
            error: Style::new().red().bright(),
            warning: Style::new().yellow().bright(),
            header: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            path: Style::new().magenta(),
            number: Style::new().cyan(),
        }
    }
}

impl Theme {
    /// `NO_COLOR` is unset and stdout is a terminal.
    pub fn colors_enabled() -> bool {
        use is_terminal::IsTerminal;
        std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal()
    }

    fn paint<T: Display>(&self, style: &Style, text: T) -> String {
        if Self::colors_enabled() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Icon-prefixed status line.
    pub fn status(&self, status: Status, text: &str) -> String {
        if !Self::colors_enabled() {
            return format!("{} {text}", status.icon());
        }
        let (icon, style) = match status {
            Status::Success => (status.icon().green().to_string(), &self.success),
            Status::Error => (status.icon().red().to_string(), &self.error),
            Status::Warning => (status.icon().yellow().to_string(), &self.warning),
        };
        format!("{icon} {}", style.apply_to(text))
    }

    pub fn header(&self, text: &str) -> String {
        self.paint(&self.header, text)
    }

    /// Recovery suggestions and other secondary text.
    pub fn hint(&self, text: &str) -> String {
        self.paint(&self.dim, text)
    }

    pub fn path(&self, path: &Path) -> String {
        self.paint(&self.path, path.display())
    }

    pub fn count(&self, count: usize) -> String {
        self.paint(&self.number, count)
    }

    /// A query-to-document distance, four decimals.
    pub fn distance(&self, distance: f64) -> String {
        self.paint(&self.number, format!("{distance:.4}"))
    }

    /// Sum of squared distances to centroids, six decimals.
    pub fn square_sum(&self, square_sum: f64) -> String {
        self.paint(&self.number, format!("{square_sum:.6}"))
    }

    /// One status line summarising how training ended.
    pub fn training(&self, outcome: TrainingOutcome) -> String {
        let iterations = outcome.iterations();
        if outcome.is_converged() {
            self.status(
                Status::Success,
                &format!("Converged after {iterations} iterations"),
            )
        } else {
            self.status(
                Status::Warning,
                &format!("Stopped at the {iterations} iteration cap before converging"),
            )
        }
    }
}
