//! Fixed-width grid tables.

/// A grid table with a header row; cells may span several lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridTable {
    title: Option<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl GridTable {
    pub fn new(header: &[&str]) -> Self {
        Self {
            title: None,
            header: header.iter().map(|cell| cell.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a row; missing cells are left empty, extra cells dropped.
    pub fn add_row(&mut self, cells: Vec<String>) {
        let mut cells = cells;
        cells.resize(self.header.len(), String::new());
        self.rows.push(cells);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a `table` directive with the longtable class.
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut out = String::from(".. table::");
        if let Some(title) = &self.title {
            out.push(' ');
            out.push_str(title);
        }
        out.push('\n');
        out.push_str("    :class: longtable\n\n");

        out.push_str(&divider(&widths, '-'));
        out.push_str(&render_row(&widths, &self.header));
        out.push_str(&divider(&widths, '='));
        for row in &self.rows {
            out.push_str(&render_row(&widths, row));
            out.push_str(&divider(&widths, '-'));
        }
        out
    }

    /// Longest line of each column plus two.
    fn column_widths(&self) -> Vec<usize> {
        (0..self.header.len())
            .map(|column| {
                std::iter::once(&self.header)
                    .chain(&self.rows)
                    .map(|row| cell_width(&row[column]))
                    .max()
                    .unwrap_or_default()
                    + 2
            })
            .collect()
    }
}

fn cell_width(cell: &str) -> usize {
    cell.split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or_default()
}

fn divider(widths: &[usize], style: char) -> String {
    let mut out = String::from("    ");
    for width in widths {
        out.push('+');
        out.extend(std::iter::repeat_n(style, width + 2));
    }
    out.push_str("+\n");
    out
}

fn render_row(widths: &[usize], row: &[String]) -> String {
    let lines: Vec<Vec<&str>> = row.iter().map(|cell| cell.split('\n').collect()).collect();
    let height = lines.iter().map(Vec::len).max().unwrap_or(1);

    let mut out = String::new();
    for line in 0..height {
        out.push_str("    |");
        for (cell, width) in lines.iter().zip(widths) {
            let text = cell.get(line).copied().unwrap_or_default();
            out.push(' ');
            out.push_str(text);
            out.extend(std::iter::repeat_n(' ', width - text.chars().count() + 1));
            out.push('|');
        }
        out.push('\n');
    }
    out
}
