use colored::*;

/// Console handles diagnostic messages on stderr
///
/// Reports go to stdout through the printers; everything the user should
/// notice but not parse goes through here.
#[derive(Debug, Clone)]
pub struct Console {
    color: bool,
    note_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            color: true,
            note_color: Color::Cyan,
        }
    }

    /// Enable or disable colored output
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn label(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print an informational note (data source, snapshot age, etc.)
    pub fn print_note(&self, message: &str) {
        eprintln!("{} {}", self.label("Note:", self.note_color), message);
    }

    /// Print a warning that does not stop the command
    pub fn print_warning(&self, message: &str) {
        eprintln!("{} {}", self.label("Warning:", Color::Yellow), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", self.label("Error:", Color::Red), error);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
