//! Plain-text tables for terminal listings.

use std::fmt::{self, Write as _};

/// Cells longer than this are cut and end with `...`.
pub const MAX_CELL_WIDTH: usize = 48;

#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TextTable {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds a row, padding or cutting it to the header width.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .map(|cell| clean_cell(&cell.into()))
            .collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", format_line(&self.headers, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(1))).collect();
        let _ = writeln!(output, "{}", format_line(&rule, &widths));
        for row in &self.rows {
            let _ = writeln!(output, "{}", format_line(row, &widths));
        }
        output
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

impl fmt::Display for TextTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn clean_cell(value: &str) -> String {
    let flat: String = value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if flat.chars().count() > MAX_CELL_WIDTH {
        let kept: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{kept}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let mut table = TextTable::new(["#", "header"]);
        table.push_row(["1", "Name"]);
        table.push_row(["2", "Date of birth"]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "#  header");
        assert_eq!(lines[1], "-  -------------");
        assert_eq!(lines[2], "1  Name");
        assert_eq!(lines[3], "2  Date of birth");
    }

    #[test]
    fn long_and_multiline_cells_are_flattened() {
        let mut table = TextTable::new(["value"]);
        table.push_row(["line one\nline two".to_string()]);
        table.push_row(["x".repeat(100)]);
        let rendered = table.render();
        assert!(rendered.contains("line one line two"));
        assert!(rendered.contains(&format!("{}...", "x".repeat(MAX_CELL_WIDTH - 3))));
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = TextTable::new(["a", "b"]);
        table.push_row(["only"]);
        assert_eq!(table.render().lines().nth(2), Some("only"));
    }
}
