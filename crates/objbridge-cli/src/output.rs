//! Colored output for metadump commands.
//!
//! Uses `termcolor` for cross-platform colored terminal output.
//! Respects the `NO_COLOR` environment variable and the `--color` flag.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer over any color-capable sink.
///
/// Commands write through this so tests can capture their output in a
/// `termcolor::Buffer`.
pub struct StyledOutput<W> {
    out: W,
}

impl StyledOutput<StandardStream> {
    /// Styled output on stdout with the given color choice.
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> StyledOutput<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write text with a specific color and style.
    pub fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.out.set_color(&spec);
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    /// Bold line introducing a section.
    pub fn heading(&mut self, text: &str) {
        self.write_styled(text, None, true);
        self.newline();
    }

    /// Cyan text (entity names).
    pub fn name(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Cyan), false);
    }

    /// Green text (kinds and flags).
    pub fn tag(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Green), false);
    }

    /// Yellow bold text.
    pub fn warning(&mut self, text: &str) {
        self.write_styled(text, Some(Color::Yellow), true);
    }

    /// Dim text (encodings, versions).
    pub fn dim(&mut self, text: &str) {
        self.write_styled(text, Some(Color::White), false);
    }

    /// Plain text (no color).
    pub fn plain(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
    }

    /// `  label: value` line.
    pub fn field(&mut self, label: &str, value: &str) {
        self.plain(&format!("  {:<16}", format!("{}:", label)));
        self.plain(value);
        self.newline();
    }

    pub fn newline(&mut self) {
        let _ = writeln!(self.out);
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn test_field_alignment() {
        let mut out = StyledOutput::new(Buffer::no_color());
        out.field("Kind", "struct");
        out.heading("Members");
        let text = String::from_utf8(out.into_inner().into_inner()).unwrap();
        assert_eq!(text, "  Kind:           struct\nMembers\n");
    }

    #[test]
    fn test_flag_choice() {
        if std::env::var_os("NO_COLOR").is_none() {
            assert_eq!(resolve_color_choice(Some("never")), ColorChoice::Never);
            assert_eq!(resolve_color_choice(None), ColorChoice::Auto);
        }
    }
}
