//! Column-aligned tables.

use std::io::{self, Write};

use termcolor::WriteColor;

use super::{display_width, write_line, Line, Span, Style};

/// Cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Pad on the right.
    Left,
    /// Pad on the left.
    Right,
}

/// A table column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Header text.
    pub header: String,
    /// Cell alignment.
    pub align: Align,
    /// Style for cells pushed as plain text.
    pub style: Style,
}

impl Column {
    /// Left-aligned column.
    pub fn left(header: impl Into<String>, style: Style) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            style,
        }
    }

    /// Right-aligned column.
    pub fn right(header: impl Into<String>, style: Style) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
            style,
        }
    }
}

/// A titled table of styled cells.
#[derive(Debug, Clone)]
pub struct Table {
    /// Title printed above the header.
    pub title: Option<String>,
    /// Column definitions.
    pub columns: Vec<Column>,
    /// Rows of cells; missing cells render empty.
    pub rows: Vec<Vec<Span>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            title: Some(title.into()),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row styled by column.
    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let row = cells
            .into_iter()
            .zip(&self.columns)
            .map(|(cell, column)| Span::new(cell, column.style))
            .collect();
        self.rows.push(row);
    }

    /// Appends a row of pre-styled cells.
    pub fn push_styled_row(&mut self, cells: Vec<Span>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| display_width(&cell.text))
                    .chain(std::iter::once(display_width(&column.header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Draws the table.
    pub fn render(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        let widths = self.widths();

        if let Some(title) = &self.title {
            write_line(out, &[Span::new(title.clone(), Style::Title)])?;
        }

        let header: Vec<Span> = self
            .columns
            .iter()
            .map(|column| Span::new(column.header.clone(), Style::Bold))
            .collect();
        write_line(out, &self.format_row(&header, &widths))?;

        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        writeln!(out, "{}", rule.join("┼"))?;

        for row in &self.rows {
            write_line(out, &self.format_row(row, &widths))?;
        }
        Ok(())
    }

    fn format_row(&self, cells: &[Span], widths: &[usize]) -> Line {
        let mut line = Vec::new();
        let last = self.columns.len().saturating_sub(1);
        for (i, (column, width)) in self.columns.iter().zip(widths).enumerate() {
            if i > 0 {
                line.push(Span::plain("│"));
            }
            let cell = cells.get(i).cloned().unwrap_or_else(|| Span::plain(""));
            let pad = " ".repeat(width.saturating_sub(display_width(&cell.text)));
            match column.align {
                Align::Left => {
                    line.push(Span::plain(" "));
                    line.push(cell);
                    if i < last {
                        line.push(Span::plain(format!("{pad} ")));
                    }
                }
                Align::Right => {
                    line.push(Span::plain(format!(" {pad}")));
                    line.push(cell);
                    if i < last {
                        line.push(Span::plain(" "));
                    }
                }
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let mut table = Table::new(
            "Contributors",
            vec![
                Column::left("Name", Style::Plain),
                Column::right("Commits", Style::Metric),
            ],
        );
        table.push_row(["Ada Lovelace", "12"]);
        table.push_row(["Bob", "3"]);

        let mut buffer = termcolor::Buffer::no_color();
        table.render(&mut buffer).unwrap();
        let output = String::from_utf8(buffer.into_inner()).unwrap();
        insta::assert_snapshot!(output, @r"
        Contributors
         Name         │ Commits
        ──────────────┼─────────
         Ada Lovelace │      12
         Bob          │       3
        ");
    }

    #[test]
    fn missing_cells_render_blank() {
        let mut table = Table::new("T", vec![Column::left("A", Style::Plain), Column::left("B", Style::Plain)]);
        table.push_styled_row(vec![Span::plain("x")]);
        let mut buffer = termcolor::Buffer::no_color();
        table.render(&mut buffer).unwrap();
        let output = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(output.ends_with(" x │ \n"));
    }
}
