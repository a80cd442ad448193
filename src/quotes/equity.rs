// src/quotes/equity.rs
//! Stooq path: CSV quote rows, probed across exchange suffixes.
//! Row format: Symbol,Date,Time,Open,High,Low,Close,Volume; unknown symbols
//! come back as "N/D" fields rather than an error status.

use async_trait::async_trait;

use crate::net;
use crate::quotes::EquityCsv;

/// Probe order: unsuffixed first, then the major national suffixes, each
/// with the currency quotes on that exchange settle in.
pub const SUFFIXES: [(&str, &str); 7] = [
    ("", "USD"),
    (".us", "USD"),
    (".uk", "GBP"),
    (".de", "EUR"),
    (".jp", "JPY"),
    (".fr", "EUR"),
    (".pl", "PLN"),
];

/// Known indices use Stooq's own notation instead of suffix probing.
pub fn index_override(symbol: &str) -> Option<(&'static str, &'static str)> {
    match symbol {
        "^GSPC" => Some(("^spx", "USD")),
        "^DJI" => Some(("^dji", "USD")),
        "^IXIC" => Some(("^ndq", "USD")),
        "^FTSE" => Some(("^ukx", "GBP")),
        "^GDAXI" => Some(("^dax", "EUR")),
        "^N225" => Some(("^nkx", "JPY")),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub symbol: String,
    pub open: f64,
    pub close: f64,
}

/// Parse a Stooq CSV body into a usable row. Returns `None` for the "N/D"
/// placeholder rows Stooq serves for unknown symbols.
pub fn parse_csv(body: &str) -> Option<CsvRow> {
    let line = body.lines().nth(1)?;
    let cols: Vec<&str> = line.split(',').collect();
    if cols.len() < 7 {
        return None;
    }
    let open = cols[3].trim().parse::<f64>().ok()?;
    let close = cols[6].trim().parse::<f64>().ok()?;
    if !close.is_finite() {
        return None;
    }
    Some(CsvRow {
        symbol: cols[0].trim().to_string(),
        open,
        close,
    })
}

pub struct Stooq;

#[async_trait]
impl EquityCsv for Stooq {
    async fn quote_row(&self, provider_symbol: &str) -> Option<CsvRow> {
        let url = net::url_with_params(
            "https://stooq.com/q/l/",
            &[
                ("s", provider_symbol.to_ascii_lowercase().as_str()),
                ("f", "sd2t2ohlcv"),
                ("h", ""),
                ("e", "csv"),
            ],
        );
        let body = net::get_text(&url).await?;
        parse_csv(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_regular_row() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    AAPL.US,2026-08-06,22:00:07,226.5,229.1,225.8,228.4,50114200\n";
        let row = parse_csv(body).unwrap();
        assert_eq!(row.symbol, "AAPL.US");
        assert!((row.open - 226.5).abs() < 1e-9);
        assert!((row.close - 228.4).abs() < 1e-9);
    }

    #[test]
    fn nd_row_is_rejected() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    ZZZZ,N/D,N/D,N/D,N/D,N/D,N/D,N/D\n";
        assert!(parse_csv(body).is_none());
    }

    #[test]
    fn empty_and_header_only_bodies_are_rejected() {
        assert!(parse_csv("").is_none());
        assert!(parse_csv("Symbol,Date,Time,Open,High,Low,Close,Volume\n").is_none());
    }

    #[test]
    fn index_overrides_cover_the_majors() {
        assert_eq!(index_override("^GSPC"), Some(("^spx", "USD")));
        assert_eq!(index_override("^FTSE"), Some(("^ukx", "GBP")));
        assert_eq!(index_override("AAPL"), None);
    }
}
