use anyhow::Result;
use review_extremes_lib::{ExtractionResult, ReviewRecord, RunSummary};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct ReviewRow {
    #[tabled(rename = "Kind")]
    #[serde(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Rating")]
    #[serde(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Review")]
    #[serde(rename = "Review")]
    review: String,
}

#[derive(Tabled, Serialize)]
struct CanonicalRow {
    #[tabled(rename = "Input")]
    #[serde(rename = "Input")]
    input: String,
    #[tabled(rename = "Product ID")]
    #[serde(rename = "Product ID")]
    product_id: String,
    #[tabled(rename = "Reviews URL")]
    #[serde(rename = "Reviews URL")]
    reviews_url: String,
}

#[derive(Tabled, Serialize)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    #[serde(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

/// One line of `canonicalize` output.
pub struct CanonicalEntry {
    pub input: String,
    pub product_id: Option<String>,
    pub reviews_url: String,
}

// -- Row builders --

fn build_extremes_rows(result: &ExtractionResult) -> Vec<ReviewRow> {
    match result.extremes() {
        Some(extremes) => vec![
            review_row("best", &extremes.best),
            review_row("worst", &extremes.worst),
        ],
        None => Vec::new(),
    }
}

fn build_ranked_rows(records: &[ReviewRecord]) -> Vec<ReviewRow> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| review_row(&format!("#{}", i + 1), r))
        .collect()
}

fn review_row(kind: &str, record: &ReviewRecord) -> ReviewRow {
    ReviewRow {
        kind: kind.to_string(),
        rating: format_rating(record.numeric_rating),
        review: record.display_text.clone(),
    }
}

fn build_canonical_rows(entries: &[CanonicalEntry]) -> Vec<CanonicalRow> {
    entries
        .iter()
        .map(|e| CanonicalRow {
            input: e.input.clone(),
            product_id: e.product_id.clone().unwrap_or_else(|| "-".to_string()),
            reviews_url: e.reviews_url.clone(),
        })
        .collect()
}

fn build_summary_rows(summary: &RunSummary) -> Vec<SummaryRow> {
    [
        ("Data rows", summary.rows_total.to_string()),
        ("Skipped", summary.rows_skipped.to_string()),
        ("Processed", summary.rows_processed.to_string()),
        ("Reviews written", summary.reviews_written.to_string()),
        ("No reviews", summary.no_reviews.to_string()),
        ("Load failures", summary.fetch_failures.to_string()),
        ("Interrupted", if summary.interrupted { "yes" } else { "no" }.to_string()),
    ]
    .into_iter()
    .map(|(metric, value)| SummaryRow {
        metric: metric.to_string(),
        value,
    })
    .collect()
}

fn format_rating(rating: f64) -> String {
    if rating == 0.0 {
        "?".to_string()
    } else {
        format!("{:.1}", rating)
    }
}

// -- Generic printers --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_extremes(result: &ExtractionResult, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(result);
        return Ok(());
    }
    if result.is_empty() {
        eprintln!("No reviews found");
        return Ok(());
    }
    print_rows(build_extremes_rows(result), format)
}

pub fn print_ranked(records: &[ReviewRecord], format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(&records);
        return Ok(());
    }
    if records.is_empty() {
        eprintln!("No reviews found");
        return Ok(());
    }
    print_rows(build_ranked_rows(records), format)
}

pub fn print_canonical(entries: &[CanonicalEntry], format: &OutputFormat) -> Result<()> {
    print_rows(build_canonical_rows(entries), format)
}

pub fn print_summary(summary: &RunSummary, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(summary);
        return Ok(());
    }
    print_rows(build_summary_rows(summary), format)
}

pub fn print_json<T: serde::Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: f64, text: &str) -> ReviewRecord {
        ReviewRecord {
            numeric_rating: rating,
            display_text: text.to_string(),
        }
    }

    fn csv_from_rows<T: Serialize>(rows: &[T]) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row).unwrap();
        }
        wtr.flush().unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert!(matches!(OutputFormat::parse("json"), OutputFormat::Json));
        assert!(matches!(OutputFormat::parse("csv"), OutputFormat::Csv));
        assert!(matches!(OutputFormat::parse("md"), OutputFormat::Markdown));
        assert!(matches!(OutputFormat::parse("whatever"), OutputFormat::Table));
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(4.0), "4.0");
        assert_eq!(format_rating(4.25), "4.2");
        assert_eq!(format_rating(0.0), "?");
    }

    #[test]
    fn test_build_extremes_rows() {
        let result = ExtractionResult::new(review(5.0, "[5.0] yay"), review(1.0, "[1.0] nay"));
        let rows = build_extremes_rows(&result);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, "best");
        assert_eq!(rows[0].rating, "5.0");
        assert_eq!(rows[1].kind, "worst");
        assert_eq!(rows[1].review, "[1.0] nay");
    }

    #[test]
    fn test_build_extremes_rows_empty() {
        assert!(build_extremes_rows(&ExtractionResult::empty()).is_empty());
    }

    #[test]
    fn test_build_ranked_rows_numbers_positions() {
        let rows = build_ranked_rows(&[review(5.0, "a"), review(2.0, "b")]);
        assert_eq!(rows[0].kind, "#1");
        assert_eq!(rows[1].kind, "#2");
    }

    #[test]
    fn test_build_canonical_rows_marks_missing_id() {
        let rows = build_canonical_rows(&[CanonicalEntry {
            input: "https://example.com".into(),
            product_id: None,
            reviews_url: "https://example.com".into(),
        }]);
        assert_eq!(rows[0].product_id, "-");
    }

    #[test]
    fn test_summary_rows() {
        let summary = RunSummary {
            rows_total: 4,
            rows_processed: 3,
            interrupted: true,
            ..RunSummary::default()
        };
        let rows = build_summary_rows(&summary);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].value, "4");
        assert_eq!(rows[6].value, "yes");
    }

    #[test]
    fn test_csv_review_headers() {
        let rows = build_ranked_rows(&[review(3.0, "[3.0 out of 5 stars] fine, mostly")]);
        let csv = csv_from_rows(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "Kind,Rating,Review");
        assert_eq!(
            lines.next().unwrap(),
            "#1,3.0,\"[3.0 out of 5 stars] fine, mostly\""
        );
    }

    #[test]
    fn test_json_extraction_result_shape() {
        let result = ExtractionResult::new(review(4.0, "b"), review(2.0, "w"));
        let val = serde_json::to_value(&result).unwrap();
        assert_eq!(val["extremes"]["best"]["numeric_rating"], 4.0);
        assert_eq!(val["extremes"]["worst"]["display_text"], "w");

        let empty = serde_json::to_value(ExtractionResult::empty()).unwrap();
        assert!(empty["extremes"].is_null());
    }

    #[test]
    fn test_markdown_review_structure() {
        let rows = build_ranked_rows(&[review(5.0, "great")]);
        let mut table = Table::new(&rows);
        table.with(Style::markdown());
        let md = table.to_string();
        assert!(md.contains('|'));
        assert!(md.contains("---"));
        assert!(md.lines().next().unwrap().contains("Review"));
    }
}
