//! Result export — text table, CSV, and JSON.
//!
//! Sinks consume the aggregated [`ScanResult`]; nothing here feeds back into
//! scan semantics.

use crate::coordinator::ScanResult;
use anyhow::{Context, Result};
use screenlab_core::engine::MatchRecord;

/// Render a fixed-width text table plus the counter summary.
pub fn render_table(result: &ScanResult) -> String {
    let mut out = String::new();

    if result.matches.is_empty() {
        out.push_str("No matches.\n");
    } else {
        out.push_str(&format!(
            "{:<8} {:<16} {:<10} {:>10} {:>10}  {:<10} {}\n",
            "id", "name", "market", "close", "lots", "bias", "note"
        ));
        for record in &result.matches {
            let bias = record
                .bias_pct
                .map(|b| format!("{b:.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            out.push_str(&format!(
                "{:<8} {:<16} {:<10} {:>10.2} {:>10}  {:<10} {}\n",
                record.instrument_id,
                record.name,
                record.market.to_string(),
                record.close,
                record.volume_lots,
                bias,
                record.note,
            ));
        }
    }

    out.push_str(&format!(
        "\n{} matched / {} attempted ({} no-match, {} thin history, {} fetch errors, {} compute errors){}\n",
        result.matched,
        result.attempted,
        result.no_match,
        result.insufficient_history,
        result.fetch_errors,
        result.compute_errors,
        if result.cancelled { " [cancelled]" } else { "" },
    ));
    out
}

/// Export match records as CSV.
///
/// Columns: as_of, instrument_id, name, market, close, volume_lots,
/// strategy, bias_pct (empty for the not-applicable sentinel).
pub fn export_csv(records: &[MatchRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "as_of",
        "instrument_id",
        "name",
        "market",
        "close",
        "volume_lots",
        "strategy",
        "bias_pct",
    ])
    .context("write CSV header")?;

    for record in records {
        wtr.write_record([
            record.as_of.to_string(),
            record.instrument_id.clone(),
            record.name.clone(),
            record.market.to_string(),
            format!("{:.2}", record.close),
            record.volume_lots.to_string(),
            record.strategy.clone(),
            record.bias_pct.map(|b| b.to_string()).unwrap_or_default(),
        ])
        .context("write CSV record")?;
    }

    let bytes = wtr.into_inner().context("flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Serialize a full scan result to pretty JSON.
pub fn export_json(result: &ScanResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize ScanResult to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use screenlab_core::domain::MarketTier;

    fn sample_record(id: &str, lots: u64, bias: Option<f64>) -> MatchRecord {
        MatchRecord {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            instrument_id: id.to_string(),
            name: "Test Corp".to_string(),
            market: MarketTier::Primary,
            close: 123.45,
            volume_lots: lots,
            strategy: "momentum-ignition".to_string(),
            note: "test note".to_string(),
            bias_pct: bias,
        }
    }

    fn sample_result() -> ScanResult {
        ScanResult {
            matches: vec![
                sample_record("2330", 900, Some(12.5)),
                sample_record("2317", 700, None),
            ],
            attempted: 3,
            matched: 2,
            no_match: 1,
            ..ScanResult::default()
        }
    }

    #[test]
    fn table_lists_matches_and_summary() {
        let table = render_table(&sample_result());
        assert!(table.contains("2330"));
        assert!(table.contains("12.50%"));
        assert!(table.contains("n/a"));
        assert!(table.contains("2 matched / 3 attempted"));
    }

    #[test]
    fn table_empty_result() {
        let table = render_table(&ScanResult::default());
        assert!(table.contains("No matches."));
        assert!(table.contains("0 matched / 0 attempted"));
    }

    #[test]
    fn csv_has_header_and_sentinel_blank() {
        let result = sample_result();
        let csv = export_csv(&result.matches).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "as_of,instrument_id,name,market,close,volume_lots,strategy,bias_pct"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-06-28,2330"));
        assert!(first.contains("12.5"));
        let second = lines.next().unwrap();
        assert!(second.ends_with("momentum-ignition,"), "blank bias: {second}");
    }

    #[test]
    fn json_roundtrip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.matches.len(), 2);
        assert_eq!(back.matched, 2);
        assert_eq!(back.matches[0].instrument_id, "2330");
    }
}
