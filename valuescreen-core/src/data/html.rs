//! HTML table extraction.
//!
//! Flattens every `<table>` of a document into rows of text cells. Rows of
//! nested tables belong to the inner table only. Cell text is the
//! concatenation of its text nodes (footnote superscripts included, which is
//! where labels like `Shares Outstanding 5` come from) with whitespace
//! collapsed.

use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlCell {
    pub text: String,
    /// `true` for `<th>`, `false` for `<td>`.
    pub header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub rows: Vec<Vec<HtmlCell>>,
}

impl HtmlTable {
    /// Rows holding at least one `<td>`.
    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<HtmlCell>> {
        self.rows.iter().filter(|row| row.iter().any(|c| !c.header))
    }

    /// Widest row, in cells.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Text of the first cell of every row.
    pub fn first_column(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|row| row.first())
            .map(|c| c.text.as_str())
    }

    /// Whether any cell's text equals `text` exactly.
    pub fn contains_text(&self, text: &str) -> bool {
        self.rows.iter().flatten().any(|c| c.text == text)
    }

    /// Whether any `<th>` cell's text equals `text` exactly.
    pub fn has_header(&self, text: &str) -> bool {
        self.rows.iter().flatten().any(|c| c.header && c.text == text)
    }

    /// Leading two cells of each data row as `(attribute, value)`.
    /// Rows narrower than two cells are skipped.
    pub fn leading_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.data_rows().filter_map(|row| match row.as_slice() {
            [attr, value, ..] => Some((attr.text.clone(), value.text.clone())),
            _ => None,
        })
    }
}

fn selector(css: &'static str) -> Selector {
    // Only ever called with literal selectors.
    Selector::parse(css).expect("invalid static selector")
}

/// Every table in document order.
pub fn parse_tables(html: &str) -> Vec<HtmlTable> {
    let document = Html::parse_document(html);
    let table_sel = selector("table");
    let row_sel = selector("tr");

    document
        .select(&table_sel)
        .map(|table| {
            let rows = table
                .select(&row_sel)
                .filter(|tr| owning_table(tr).map(|t| t.id()) == Some(table.id()))
                .map(|tr| row_cells(&tr))
                .filter(|cells| !cells.is_empty())
                .collect();
            HtmlTable { rows }
        })
        .collect()
}

fn owning_table<'a>(row: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn row_cells(row: &ElementRef<'_>) -> Vec<HtmlCell> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| {
            let header = match cell.value().name() {
                "th" => true,
                "td" => false,
                _ => return None,
            };
            Some(HtmlCell {
                text: cell_text(&cell),
                header,
            })
        })
        .collect()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
