//! Plain-text data table used by every list screen.

use crate::pagination::PageInfo;

/// A column: header plus a cell renderer.
pub struct Column<T> {
    pub header: &'static str,
    pub cell: Box<dyn Fn(&T) -> String>,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, cell: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            header,
            cell: Box::new(cell),
        }
    }
}

/// Columns + rows + optional pagination footer.
pub struct DataTable<'a, T> {
    columns: Vec<Column<T>>,
    rows: &'a [T],
    page: Option<PageInfo>,
    empty_message: &'static str,
}

impl<'a, T> DataTable<'a, T> {
    pub fn new(columns: Vec<Column<T>>, rows: &'a [T]) -> Self {
        Self {
            columns,
            rows,
            page: None,
            empty_message: "No results",
        }
    }

    pub fn with_page(mut self, page: PageInfo) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_empty_message(mut self, message: &'static str) -> Self {
        self.empty_message = message;
        self
    }

    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| self.columns.iter().map(|c| (c.cell)(row)).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(col.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c.header, *w))
            .collect();
        out.push_str(header.join(" | ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');

        if cells.is_empty() {
            out.push_str(self.empty_message);
            out.push('\n');
        }
        for row in &cells {
            let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
            out.push_str(line.join(" | ").trim_end());
            out.push('\n');
        }

        if let Some(page) = &self.page {
            out.push_str(&page.footer());
            out.push('\n');
        }
        out
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}
