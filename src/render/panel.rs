//! Bordered boxes with word wrapping.

use std::io::{self, Write};

use termcolor::WriteColor;

use super::{display_width, line_width, write_spans, Line, Span, Style};

/// Narrowest panel drawn.
const MIN_WIDTH: usize = 20;

/// A titled, bordered box of lines.
#[derive(Debug, Clone)]
pub struct Panel {
    /// Title drawn into the top border.
    pub title: Option<String>,
    /// Body lines, wrapped to the panel width.
    pub lines: Vec<Line>,
    /// Border style.
    pub border: Style,
}

impl Panel {
    /// Creates a panel with a title.
    pub fn new(title: impl Into<String>, lines: Vec<Line>) -> Self {
        Self {
            title: Some(title.into()),
            lines,
            border: Style::Title,
        }
    }

    /// Sets the border style.
    #[must_use]
    pub fn with_border(mut self, border: Style) -> Self {
        self.border = border;
        self
    }

    /// Draws the panel `width` columns wide.
    pub fn render(&self, out: &mut dyn WriteColor, width: usize) -> io::Result<()> {
        let width = width.max(MIN_WIDTH);
        let inner = width - 4;

        let mut top = String::from("╭─");
        let mut used = 2;
        if let Some(title) = &self.title {
            let title = format!(" {title} ");
            used += display_width(&title);
            top.push_str(&title);
        }
        top.push_str(&"─".repeat(width.saturating_sub(used + 1)));
        top.push('╮');
        write_spans(out, &[Span::new(top, self.border)])?;
        writeln!(out)?;

        for line in &self.lines {
            for row in wrap_line(line, inner) {
                let pad = inner.saturating_sub(line_width(&row));
                write_spans(out, &[Span::new("│ ", self.border)])?;
                write_spans(out, &row)?;
                write!(out, "{}", " ".repeat(pad))?;
                write_spans(out, &[Span::new(" │", self.border)])?;
                writeln!(out)?;
            }
        }

        let bottom = format!("╰{}╯", "─".repeat(width - 2));
        write_spans(out, &[Span::new(bottom, self.border)])?;
        writeln!(out)
    }
}

/// Word-wraps a styled line to `width` columns.
///
/// Leading indentation is repeated on continuation rows. Words longer than
/// `width` are split.
pub fn wrap_line(line: &[Span], width: usize) -> Vec<Line> {
    if line_width(line) <= width {
        return vec![line.to_vec()];
    }

    let indent: String = line
        .first()
        .map(|span| span.text.chars().take_while(|c| *c == ' ').collect())
        .unwrap_or_default();
    let width = width.max(indent.len() + 1);

    let mut rows: Vec<Line> = Vec::new();
    let mut row: Line = Vec::new();
    let mut row_width = 0;

    for span in line {
        for word in split_keeping_spaces(&span.text) {
            let word_width = display_width(word);
            if row_width + word_width > width && row_width > indent.len() {
                rows.push(trim_end(std::mem::take(&mut row)));
                row.push(Span::plain(indent.clone()));
                row_width = indent.len();
                if word.trim().is_empty() {
                    continue;
                }
            }
            if word_width > width - row_width {
                for chunk in split_at_width(word, width - indent.len()) {
                    if row_width + display_width(&chunk) > width {
                        rows.push(std::mem::take(&mut row));
                        row.push(Span::plain(indent.clone()));
                        row_width = indent.len();
                    }
                    row_width += display_width(&chunk);
                    push_text(&mut row, &chunk, span.style);
                }
                continue;
            }
            row_width += word_width;
            push_text(&mut row, word, span.style);
        }
    }
    if !row.is_empty() {
        rows.push(trim_end(row));
    }
    rows
}

fn push_text(row: &mut Line, text: &str, style: Style) {
    match row.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => row.push(Span::new(text, style)),
    }
}

fn trim_end(mut row: Line) -> Line {
    if let Some(last) = row.last_mut() {
        let trimmed = last.text.trim_end().len();
        last.text.truncate(trimmed);
    }
    row
}

/// Splits text into words, each carrying its trailing whitespace.
fn split_keeping_spaces(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, c) in text.char_indices() {
        if c == ' ' {
            in_space = true;
        } else if in_space {
            words.push(&text[start..i]);
            start = i;
            in_space = false;
        }
    }
    if start < text.len() {
        words.push(&text[start..]);
    }
    words
}

fn split_at_width(word: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for c in word.chars() {
        let w = display_width(c.encode_utf8(&mut [0; 4]));
        if current_width + w > width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::line_text;

    fn render(panel: &Panel, width: usize) -> String {
        let mut buffer = termcolor::Buffer::no_color();
        panel.render(&mut buffer, width).unwrap();
        String::from_utf8(buffer.into_inner()).unwrap()
    }

    #[test]
    fn panel_draws_title_and_borders() {
        let panel = Panel::new("Report", vec![vec![Span::plain("hello")]]);
        insta::assert_snapshot!(render(&panel, 24), @r"
        ╭─ Report ─────────────╮
        │ hello                │
        ╰──────────────────────╯
        ");
    }

    #[test]
    fn every_row_has_the_same_width() {
        let text = "word ".repeat(40);
        let panel = Panel::new("T", vec![vec![Span::plain(text)]]);
        let output = render(&panel, 30);
        for row in output.lines() {
            assert_eq!(display_width(row), 30, "{row}");
        }
    }

    #[test]
    fn wrapping_preserves_words_and_indent() {
        let line = vec![Span::plain("  "), Span::new("alpha beta gamma delta", Style::Bold)];
        let rows = wrap_line(&line, 13);
        let texts: Vec<String> = rows.iter().map(|r| line_text(r)).collect();
        assert_eq!(texts, vec!["  alpha beta", "  gamma delta"]);
        assert_eq!(rows[1][1].style, Style::Bold);
    }

    #[test]
    fn long_words_are_split() {
        let rows = wrap_line(&[Span::plain("abcdefghij")], 4);
        let texts: Vec<String> = rows.iter().map(|r| line_text(r)).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }
}
