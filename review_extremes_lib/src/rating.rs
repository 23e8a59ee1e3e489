//! Star-rating label parsing.

/// Parses the leading number of a rating label such as `"4.0 out of 5 stars"`.
///
/// Anything unreadable (missing label, empty text, a non-numeric or
/// non-finite first token) yields `0.0`. The same value is produced for a
/// genuine zero-star label; callers cannot tell the two apart.
pub fn parse_rating(label: Option<&str>) -> f64 {
    label
        .and_then(|text| text.split(' ').next())
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
