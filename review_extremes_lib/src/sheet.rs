//! The spreadsheet side of a run: reading the grid, locating columns,
//! adding the review columns and writing results back.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AgentError;
use crate::types::ProductReference;

pub const PRODUCT_NAME_HEADER: &str = "PRODUCT NAME";
pub const URL_HEADER: &str = "URL";
pub const POSITIVE_REVIEW_HEADER: &str = "Most Positive Review";
pub const NEGATIVE_REVIEW_HEADER: &str = "Most Negative Review";
/// Written to the positive column when a product yields no reviews.
pub const NO_REVIEWS_MARKER: &str = "No reviews found";

/// A single cell write. Rows and columns are 1-based, as in a spreadsheet UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl CellUpdate {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// A grid of string cells that can be read whole and updated cell by cell.
pub trait Sheet {
    /// Every row of the sheet. Rows may have different lengths.
    fn all_values(&self) -> Result<Vec<Vec<String>>, AgentError>;

    /// Applies `updates` as one persisted write.
    fn update_cells(&mut self, updates: &[CellUpdate]) -> Result<(), AgentError>;
}

fn apply_updates(grid: &mut Vec<Vec<String>>, updates: &[CellUpdate]) {
    for update in updates {
        let (row, col) = (update.row.max(1) - 1, update.col.max(1) - 1);
        if grid.len() <= row {
            grid.resize_with(row + 1, Vec::new);
        }
        let cells = &mut grid[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = update.value.clone();
    }
}

/// An in-memory sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
    writes: usize,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows, writes: 0 }
    }

    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Looks up a cell by 1-based position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row.checked_sub(1)?)?
            .get(col.checked_sub(1)?)
            .map(String::as_str)
    }

    /// Number of `update_cells` calls received.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Sheet for MemorySheet {
    fn all_values(&self) -> Result<Vec<Vec<String>>, AgentError> {
        Ok(self.rows.clone())
    }

    fn update_cells(&mut self, updates: &[CellUpdate]) -> Result<(), AgentError> {
        apply_updates(&mut self.rows, updates);
        self.writes += 1;
        Ok(())
    }
}

/// A sheet stored as a CSV file.
///
/// The file is read once on open. Every write rewrites the whole file via a
/// sibling temp file and a rename, so a reader never sees half a row update.
pub struct CsvSheet {
    path: PathBuf,
    rows: Vec<Vec<String>>,
}

impl CsvSheet {
    /// Reads the whole file. Blank lines are kept as empty rows so row
    /// numbers match the file's physical lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path)?;
        let rows = read_rows(&data)?;
        tracing::debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AgentError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp)?;
            for row in &self.rows {
                if row.is_empty() {
                    // csv writes an empty record as `""`; keep the line blank.
                    writer.flush()?;
                    writer.get_ref().write_all(b"\n")?;
                } else {
                    writer.write_record(row)?;
                }
            }
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Parses CSV bytes into rows, one per record plus one empty row per blank
/// line.
///
/// The `csv` reader skips blank lines silently. Each read starts at the
/// first skipped byte, so the blank lines are counted from the bytes
/// consumed before the record's first field.
fn read_rows(data: &[u8]) -> Result<Vec<Vec<String>>, AgentError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let from = reader.position().byte() as usize;
        if !reader.read_record(&mut record)? {
            break;
        }
        let to = reader.position().byte() as usize;
        let skipped = data[from..to]
            .iter()
            .take_while(|b| **b == b'\r' || **b == b'\n')
            .filter(|b| **b == b'\n')
            .count();
        // `\n` left over from the previous record's `\r\n` terminator.
        let leftover = from > 0 && data[from - 1] == b'\r' && data.get(from) == Some(&b'\n');
        let blank_lines = skipped - usize::from(leftover && skipped > 0);
        rows.extend(std::iter::repeat_with(Vec::new).take(blank_lines));
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

impl Sheet for CsvSheet {
    fn all_values(&self) -> Result<Vec<Vec<String>>, AgentError> {
        Ok(self.rows.clone())
    }

    fn update_cells(&mut self, updates: &[CellUpdate]) -> Result<(), AgentError> {
        apply_updates(&mut self.rows, updates);
        self.persist()
    }
}

/// Column positions (0-based) discovered in the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub header_row_index: usize,
    pub product_col: usize,
    pub url_col: usize,
    pub positive_col: usize,
    pub negative_col: usize,
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

impl SheetLayout {
    /// Locates the input columns and adds the review columns if needed.
    ///
    /// Fails before writing anything if the header row is missing or lacks
    /// the product-name or URL column. Added review headers are persisted
    /// before this returns.
    pub fn prepare<S: Sheet>(sheet: &mut S, header_row_index: usize) -> Result<Self, AgentError> {
        let values = sheet.all_values()?;
        let mut headers = values
            .get(header_row_index)
            .cloned()
            .ok_or(AgentError::SheetTooShort {
                rows: values.len(),
                header_row: header_row_index + 1,
            })?;

        let product_col = find_column(&headers, PRODUCT_NAME_HEADER).ok_or_else(|| {
            AgentError::MissingColumn(PRODUCT_NAME_HEADER.to_string(), header_row_index + 1)
        })?;
        let url_col = find_column(&headers, URL_HEADER).ok_or_else(|| {
            AgentError::MissingColumn(URL_HEADER.to_string(), header_row_index + 1)
        })?;

        let mut added = Vec::new();
        for name in [POSITIVE_REVIEW_HEADER, NEGATIVE_REVIEW_HEADER] {
            if find_column(&headers, name).is_none() {
                tracing::info!("Creating '{}' column", name);
                headers.push(name.to_string());
                added.push(CellUpdate::new(header_row_index + 1, headers.len(), name));
            }
        }
        if !added.is_empty() {
            sheet.update_cells(&added)?;
        }

        // Both are present now: either found or just appended.
        let positive_col = find_column(&headers, POSITIVE_REVIEW_HEADER).unwrap_or(headers.len());
        let negative_col = find_column(&headers, NEGATIVE_REVIEW_HEADER).unwrap_or(headers.len());

        Ok(Self {
            header_row_index,
            product_col,
            url_col,
            positive_col,
            negative_col,
        })
    }

    /// 1-based sheet row of the `i`-th data row.
    pub fn row_number(&self, data_index: usize) -> usize {
        self.header_row_index + 2 + data_index
    }

    /// Data rows worth processing, in sheet order.
    ///
    /// Rows too short to reach the URL column and rows whose URL cell does
    /// not contain `http` are skipped. With `skip_processed`, rows whose
    /// positive-review cell is already filled are skipped too.
    pub fn products(&self, values: &[Vec<String>], skip_processed: bool) -> Vec<ProductReference> {
        values
            .iter()
            .skip(self.header_row_index + 1)
            .enumerate()
            .filter_map(|(i, row)| {
                let url = row.get(self.url_col)?;
                if !url.contains("http") {
                    return None;
                }
                if skip_processed && row.get(self.positive_col).is_some_and(|c| !c.is_empty()) {
                    tracing::debug!("Row {} already processed, skipping", self.row_number(i));
                    return None;
                }
                Some(ProductReference {
                    display_name: row.get(self.product_col).cloned().unwrap_or_default(),
                    source_url: url.clone(),
                    row_number: self.row_number(i),
                })
            })
            .collect()
    }

    /// Data rows below the header, processable or not.
    pub fn data_row_count(&self, values: &[Vec<String>]) -> usize {
        values.len().saturating_sub(self.header_row_index + 1)
    }

    /// Cell writes for a product's extremes: both columns in one batch.
    pub fn review_updates(&self, row: usize, best: &str, worst: &str) -> Vec<CellUpdate> {
        vec![
            CellUpdate::new(row, self.positive_col + 1, best),
            CellUpdate::new(row, self.negative_col + 1, worst),
        ]
    }

    /// Cell write marking a product with no reviews. The negative column is
    /// left alone.
    pub fn no_reviews_update(&self, row: usize) -> Vec<CellUpdate> {
        vec![CellUpdate::new(row, self.positive_col + 1, NO_REVIEWS_MARKER)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with_header(header: &[&str], data: &[&[&str]]) -> MemorySheet {
        let mut rows: Vec<&[&str]> = Vec::new();
        rows.push(&["Report"]);
        for _ in 0..4 {
            rows.push(&[]);
        }
        rows.push(header);
        rows.extend_from_slice(data);
        MemorySheet::from_rows(&rows)
    }

    #[test]
    fn finds_columns_by_name_in_any_order() {
        let mut sheet = sheet_with_header(
            &["URL", "Notes", "PRODUCT NAME", "Most Negative Review", "Most Positive Review"],
            &[],
        );
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        assert_eq!(layout.url_col, 0);
        assert_eq!(layout.product_col, 2);
        assert_eq!(layout.negative_col, 3);
        assert_eq!(layout.positive_col, 4);
        assert_eq!(sheet.write_count(), 0);
    }

    #[test]
    fn appends_missing_review_columns_in_one_write() {
        let mut sheet = sheet_with_header(&["PRODUCT NAME", "URL"], &[]);
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        assert_eq!(layout.positive_col, 2);
        assert_eq!(layout.negative_col, 3);
        assert_eq!(sheet.cell(6, 3), Some("Most Positive Review"));
        assert_eq!(sheet.cell(6, 4), Some("Most Negative Review"));
        assert_eq!(sheet.write_count(), 1);
    }

    #[test]
    fn appends_only_the_missing_column() {
        let mut sheet = sheet_with_header(&["PRODUCT NAME", "Most Positive Review", "URL"], &[]);
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        assert_eq!(layout.positive_col, 1);
        assert_eq!(layout.negative_col, 3);
        assert_eq!(sheet.cell(6, 4), Some("Most Negative Review"));
    }

    #[test]
    fn header_match_is_case_sensitive() {
        let mut sheet = sheet_with_header(&["Product Name", "URL"], &[]);
        let err = SheetLayout::prepare(&mut sheet, 5).unwrap_err();
        assert!(matches!(err, AgentError::MissingColumn(ref name, 6) if name == "PRODUCT NAME"));
        assert_eq!(sheet.write_count(), 0);
    }

    #[test]
    fn missing_url_column_fails_without_writing() {
        let mut sheet = sheet_with_header(&["PRODUCT NAME", "Link"], &[]);
        let err = SheetLayout::prepare(&mut sheet, 5).unwrap_err();
        assert!(matches!(err, AgentError::MissingColumn(ref name, _) if name == "URL"));
        assert_eq!(sheet.write_count(), 0);
    }

    #[test]
    fn short_sheet_is_rejected() {
        let mut sheet = MemorySheet::from_rows(&[&["PRODUCT NAME", "URL"]]);
        let err = SheetLayout::prepare(&mut sheet, 5).unwrap_err();
        assert!(matches!(err, AgentError::SheetTooShort { rows: 1, header_row: 6 }));
    }

    #[test]
    fn products_skip_short_and_non_http_rows() {
        let mut sheet = sheet_with_header(
            &["PRODUCT NAME", "URL"],
            &[
                &["Widget", "https://example.com/dp/B000000001/"],
                &["No link"],
                &["Blank", ""],
                &["Relative", "/dp/B000000002"],
                &["Gadget", "http://example.com/gp/product/B000000003"],
            ],
        );
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        let values = sheet.all_values().unwrap();
        let products = layout.products(&values, false);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].display_name, "Widget");
        assert_eq!(products[0].row_number, 7);
        assert_eq!(products[1].display_name, "Gadget");
        assert_eq!(products[1].row_number, 11);
        assert_eq!(layout.data_row_count(&values), 5);
    }

    #[test]
    fn missing_product_name_cell_is_empty() {
        let mut sheet = sheet_with_header(&["URL", "Notes", "PRODUCT NAME"], &[&["https://x.test/a"]]);
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        let products = layout.products(&sheet.all_values().unwrap(), false);
        assert_eq!(products[0].display_name, "");
    }

    #[test]
    fn skip_processed_skips_filled_rows() {
        let mut sheet = sheet_with_header(
            &["PRODUCT NAME", "URL", "Most Positive Review", "Most Negative Review"],
            &[
                &["Done", "https://x.test/a", "[5.0 out of 5 stars] Great", "[1.0] Bad"],
                &["Todo", "https://x.test/b", ""],
            ],
        );
        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        let values = sheet.all_values().unwrap();
        assert_eq!(layout.products(&values, false).len(), 2);
        let todo = layout.products(&values, true);
        assert_eq!(todo.len(), 1);
        assert_eq!(todo[0].display_name, "Todo");
    }

    #[test]
    fn update_grows_short_rows() {
        let mut sheet = MemorySheet::from_rows(&[&["a"]]);
        sheet
            .update_cells(&[CellUpdate::new(3, 2, "x")])
            .unwrap();
        assert_eq!(sheet.rows().len(), 3);
        assert_eq!(sheet.cell(3, 2), Some("x"));
        assert_eq!(sheet.cell(3, 1), Some(""));
    }

    #[test]
    fn csv_sheet_round_trips_updates() {
        let path = std::env::temp_dir().join(format!(
            "review-extremes-sheet-{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, "title\nPRODUCT NAME,URL\nWidget,https://x.test/dp/B000000001\n")
            .unwrap();

        let mut sheet = CsvSheet::open(&path).unwrap();
        let layout = SheetLayout::prepare(&mut sheet, 1).unwrap();
        sheet
            .update_cells(&layout.review_updates(3, "[5.0] good, really", "[1.0] bad"))
            .unwrap();

        let reopened = CsvSheet::open(&path).unwrap();
        let rows = reopened.all_values().unwrap();
        assert_eq!(rows[1], vec!["PRODUCT NAME", "URL", "Most Positive Review", "Most Negative Review"]);
        assert_eq!(rows[2][2], "[5.0] good, really");
        assert_eq!(rows[2][3], "[1.0] bad");
        assert_eq!(rows[0], vec!["title"]);

        std::fs::remove_file(&path).unwrap();
    }

    fn temp_csv(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "review-extremes-{}-{}.csv",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn csv_sheet_keeps_blank_lines_as_rows() {
        let path = temp_csv(
            "blank-lines",
            "Tracker\n\n\n\n\nPRODUCT NAME,URL\nWidget,https://shop.test/dp/B000000001\n",
        );

        let mut sheet = CsvSheet::open(&path).unwrap();
        let rows = sheet.all_values().unwrap();
        assert_eq!(rows.len(), 7);
        assert!(rows[1..5].iter().all(|r| r.is_empty()));
        assert_eq!(rows[5], vec!["PRODUCT NAME", "URL"]);

        let layout = SheetLayout::prepare(&mut sheet, 5).unwrap();
        let products = layout.products(&sheet.all_values().unwrap(), false);
        assert_eq!(products[0].row_number, 7);
        sheet
            .update_cells(&layout.review_updates(7, "[5.0] good", "[1.0] bad"))
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Tracker\n\n\n\n\nPRODUCT NAME,URL,Most Positive Review,Most Negative Review\n\
             Widget,https://shop.test/dp/B000000001,[5.0] good,[1.0] bad\n"
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn csv_sheet_blank_lines_with_crlf_and_multiline_cells() {
        let path = temp_csv(
            "crlf",
            "Tracker\r\n\r\n\"two\nlines\",x\r\n\r\nPRODUCT NAME,URL\r\n",
        );
        let rows = CsvSheet::open(&path).unwrap().all_values().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], vec!["Tracker"]);
        assert!(rows[1].is_empty());
        // one record, even though the quoted cell spans two lines
        assert_eq!(rows[2], vec!["two\nlines", "x"]);
        assert!(rows[3].is_empty());
        assert_eq!(rows[4], vec!["PRODUCT NAME", "URL"]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn csv_sheet_missing_file_is_an_error() {
        assert!(CsvSheet::open("/nonexistent/sheet.csv").is_err());
    }
}
