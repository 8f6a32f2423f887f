/// Table locator: the only place that knows where things sit on the page.
///
/// The source page is a single HTML table. The header row carries two dates
/// and every body row is one lake:
///
/// ```text
///   | Lac | Niveau max.  | 2.1.2024   | 1.1.2024   |
///   | ... | 680.50 msm   | 675.20 msm | 674.80 msm |
/// ```
///
/// Selectors and column positions are configurable so that a markup change
/// on the source site only touches `[layout]` in the configuration file.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::model::ExtractError;

/// Selectors and column positions describing the level table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    /// Selects the table; the first match is used.
    pub table: String,
    /// Selects header cells, relative to the table.
    pub header_cells: String,
    /// Selects body rows, relative to the table.
    pub rows: String,
    /// Selects data cells, relative to a row.
    pub cells: String,
    pub name_column: usize,
    pub max_level_column: usize,
    pub first_date_column: usize,
    pub second_date_column: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table: "table".to_string(),
            header_cells: "thead tr th".to_string(),
            rows: "tbody tr".to_string(),
            cells: "td".to_string(),
            name_column: 0,
            max_level_column: 1,
            first_date_column: 2,
            second_date_column: 3,
        }
    }
}

/// Trimmed text of the cells of one body row.
///
/// A cell missing from the row reads as an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCells {
    pub name: String,
    pub max_level: String,
    pub first_level: String,
    pub second_level: String,
}

/// Compiled form of a [`TableLayout`].
#[derive(Debug)]
pub struct TableLocator {
    table: Selector,
    header_cells: Selector,
    rows: Selector,
    cells: Selector,
    layout: TableLayout,
}

impl TableLocator {
    /// Compiles the layout's selectors.
    ///
    /// Fails with `ExtractError::Layout` on an invalid selector or when both
    /// date columns point at the same cell.
    pub fn new(layout: &TableLayout) -> Result<Self, ExtractError> {
        if layout.first_date_column == layout.second_date_column {
            return Err(ExtractError::Layout(format!(
                "both date columns are {}",
                layout.first_date_column
            )));
        }

        Ok(Self {
            table: compile("table", &layout.table)?,
            header_cells: compile("header_cells", &layout.header_cells)?,
            rows: compile("rows", &layout.rows)?,
            cells: compile("cells", &layout.cells)?,
            layout: layout.clone(),
        })
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Column indices of the two header dates, in page order.
    pub fn date_columns(&self) -> (usize, usize) {
        (self.layout.first_date_column, self.layout.second_date_column)
    }

    fn table<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        doc.select(&self.table).next()
    }

    /// Trimmed text of the two header date cells, `None` for a cell that
    /// does not exist (including when there is no table at all).
    pub fn header_dates(&self, doc: &Html) -> (Option<String>, Option<String>) {
        let Some(table) = self.table(doc) else {
            return (None, None);
        };
        let header: Vec<ElementRef<'_>> = table.select(&self.header_cells).collect();
        let (first, second) = self.date_columns();
        (
            header.get(first).map(|cell| cell_text(*cell)),
            header.get(second).map(|cell| cell_text(*cell)),
        )
    }

    /// Cell text of every body row, in page order.
    pub fn rows(&self, doc: &Html) -> Vec<RowCells> {
        let Some(table) = self.table(doc) else {
            return Vec::new();
        };

        table
            .select(&self.rows)
            .map(|row| {
                let cells: Vec<String> = row.select(&self.cells).map(cell_text).collect();
                let at = |i: usize| cells.get(i).cloned().unwrap_or_default();
                RowCells {
                    name: at(self.layout.name_column),
                    max_level: at(self.layout.max_level_column),
                    first_level: at(self.layout.first_date_column),
                    second_level: at(self.layout.second_date_column),
                }
            })
            .collect()
    }
}

impl Default for TableLocator {
    fn default() -> Self {
        let layout = TableLayout::default();
        Self {
            table: Selector::parse(&layout.table).expect("valid selector"),
            header_cells: Selector::parse(&layout.header_cells).expect("valid selector"),
            rows: Selector::parse(&layout.rows).expect("valid selector"),
            cells: Selector::parse(&layout.cells).expect("valid selector"),
            layout,
        }
    }
}

fn compile(field: &str, selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector)
        .map_err(|e| ExtractError::Layout(format!("{} selector {:?}: {}", field, selector, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
