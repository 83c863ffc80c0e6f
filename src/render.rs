//! Terminal rendering of command output.
//!
//! Commands build a complete [`Document`] in memory and render it once, so a
//! failure part-way through a command never leaves partial output behind.

pub mod markdown;
pub mod panel;
pub mod table;

use std::io::{self, Write};

use clap::ValueEnum;
use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

pub use markdown::{format_markdown, MarkdownMode};
pub use panel::Panel;
pub use table::{Align, Column, Table};

/// Widest layout used, even on wide terminals.
pub const MAX_WIDTH: usize = 120;

/// Layout width when the terminal size is unknown.
pub const FALLBACK_WIDTH: usize = 100;

/// Visual role of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Default text.
    Plain,
    /// Bold.
    Bold,
    /// Markdown headings.
    Heading,
    /// Panel borders and titles.
    Title,
    /// Field labels and list markers.
    Label,
    /// Inline code and code blocks.
    Code,
    /// Numbers called out in prose.
    Metric,
    /// Positive deltas.
    Positive,
    /// Negative deltas and priority lines.
    Negative,
    /// Folder names in trees.
    Folder,
    /// File names in trees.
    File,
    /// De-emphasised text.
    Muted,
}

impl Style {
    fn color_spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Self::Plain => {}
            Self::Bold => {
                spec.set_bold(true);
            }
            Self::Heading => {
                spec.set_fg(Some(Color::Ansi256(214))).set_bold(true);
            }
            Self::Title => {
                spec.set_fg(Some(Color::Ansi256(117))).set_bold(true);
            }
            Self::Label => {
                spec.set_fg(Some(Color::Ansi256(183))).set_bold(true);
            }
            Self::Code => {
                spec.set_fg(Some(Color::Ansi256(230)));
            }
            Self::Metric => {
                spec.set_fg(Some(Color::Ansi256(48))).set_bold(true);
            }
            Self::Positive => {
                spec.set_fg(Some(Color::Ansi256(48)));
            }
            Self::Negative => {
                spec.set_fg(Some(Color::Red));
            }
            Self::Folder => {
                spec.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Self::File => {
                spec.set_fg(Some(Color::Green));
            }
            Self::Muted => {
                spec.set_dimmed(true);
            }
        }
        spec
    }
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Text to print.
    pub text: String,
    /// How to print it.
    pub style: Style,
}

impl Span {
    /// Creates a span.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Creates an unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::Plain)
    }
}

/// One output line as styled spans.
pub type Line = Vec<Span>;

/// A `Label: value` line with a bold label.
pub fn key_value(label: &str, value: impl Into<String>) -> Line {
    vec![Span::new(format!("{label}: "), Style::Bold), Span::plain(value)]
}

/// Plain text of a line.
pub fn line_text(line: &[Span]) -> String {
    line.iter().map(|span| span.text.as_str()).collect()
}

/// Approximate terminal column width of `text`.
///
/// Emoji and other wide pictographs count as two columns; variation
/// selectors and joiners count as zero.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0xFE00..=0xFE0F | 0x200D => 0,
            0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF => 2,
            _ => 1,
        })
        .sum()
}

/// Width of a line in columns.
pub fn line_width(line: &[Span]) -> usize {
    line.iter().map(|span| display_width(&span.text)).sum()
}

/// Writes one line followed by a newline, resetting colours after each span.
pub fn write_line(out: &mut dyn WriteColor, line: &[Span]) -> io::Result<()> {
    write_spans(out, line)?;
    writeln!(out)
}

/// Writes spans without a trailing newline.
pub fn write_spans(out: &mut dyn WriteColor, line: &[Span]) -> io::Result<()> {
    for span in line {
        if span.style == Style::Plain {
            write!(out, "{}", span.text)?;
        } else {
            out.set_color(&span.style.color_spec())?;
            write!(out, "{}", span.text)?;
            out.reset()?;
        }
    }
    Ok(())
}

/// One renderable unit of a [`Document`].
#[derive(Debug, Clone)]
pub enum Block {
    /// A bold section title.
    Title(String),
    /// Lines rendered as-is.
    Lines(Vec<Line>),
    /// A bordered box.
    Panel(Panel),
    /// A table.
    Table(Table),
}

/// Fully built output of one command.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block.
    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Appends plain text, one line per input line.
    pub fn push_text(&mut self, text: &str) -> &mut Self {
        let lines = text.lines().map(|l| vec![Span::plain(l)]).collect();
        self.push(Block::Lines(lines))
    }

    /// The blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Renders all blocks separated by blank lines.
    pub fn render(&self, out: &mut dyn WriteColor, width: usize) -> io::Result<()> {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            match block {
                Block::Title(title) => write_line(out, &[Span::new(title.clone(), Style::Title)])?,
                Block::Lines(lines) => {
                    for line in lines {
                        write_line(out, line)?;
                    }
                }
                Block::Panel(panel) => panel.render(out, width)?,
                Block::Table(table) => table.render(out)?,
            }
        }
        out.flush()
    }

    /// Renders without colour into a string.
    pub fn to_plain_string(&self, width: usize) -> String {
        let mut buffer = termcolor::Buffer::no_color();
        // Writing into an in-memory buffer cannot fail.
        let _ = self.render(&mut buffer, width);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

/// `--color` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Colour when stdout is a terminal.
    #[default]
    Auto,
    /// Always colour.
    Always,
    /// Never colour.
    Never,
}

impl ColorMode {
    /// termcolor choice for stdout.
    pub fn choice(self, stdout_is_terminal: bool) -> ColorChoice {
        match self {
            Self::Always => ColorChoice::Always,
            Self::Never => ColorChoice::Never,
            Self::Auto if stdout_is_terminal => ColorChoice::Auto,
            Self::Auto => ColorChoice::Never,
        }
    }
}

/// Layout width: the terminal width minus a margin, capped at [`MAX_WIDTH`].
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols).saturating_sub(4))
        .ok()
        .filter(|width| *width >= 40)
        .map_or(FALLBACK_WIDTH, |width| width.min(MAX_WIDTH))
}

/// Renders `document` to stdout.
pub fn print_document(document: &Document, color: ColorMode) -> io::Result<()> {
    use std::io::IsTerminal;

    let choice = color.choice(io::stdout().is_terminal());
    let stdout = termcolor::StandardStream::stdout(choice);
    let mut lock = stdout.lock();
    document.render(&mut lock, terminal_width())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_counts_wide_glyphs() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("🔒 x"), 4);
        assert_eq!(display_width("├── "), 4);
    }

    #[test]
    fn blocks_are_separated_by_blank_lines() {
        let mut doc = Document::new();
        doc.push(Block::Title("Report".to_string()));
        doc.push_text("one\ntwo");
        assert_eq!(doc.to_plain_string(80), "Report\n\none\ntwo\n");
    }

    #[test]
    fn colored_output_resets_after_spans() {
        let mut buffer = termcolor::Buffer::ansi();
        write_line(&mut buffer, &[Span::new("hi", Style::Bold), Span::plain("!")]).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(text.starts_with("\u{1b}["));
        assert!(text.contains("hi\u{1b}[0m!"));
    }

    #[test]
    fn color_mode_respects_terminal() {
        assert_eq!(ColorMode::Auto.choice(false), ColorChoice::Never);
        assert_eq!(ColorMode::Auto.choice(true), ColorChoice::Auto);
        assert_eq!(ColorMode::Always.choice(false), ColorChoice::Always);
    }
}
