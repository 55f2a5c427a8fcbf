//! Yahoo Finance bar fetcher.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with retries and
//! exponential backoff. Instruments are mapped to Yahoo symbols by board
//! tier: primary listings get a `.TW` suffix, secondary listings `.TWO`.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; the CSV directory fetcher is the fallback when it is unavailable.

use super::provider::{BarFetcher, DataError};
use crate::domain::{Bar, Instrument, MarketTier};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Trading-day coverage requested from the chart API. Roughly 18 months of
/// calendar days, enough for a 200-bar window plus the multi-day trend checks.
const LOOKBACK_DAYS: i64 = 548;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    // Yahoo serves volume as a decimal-capable column; keep it f64 until the
    // bar is built so nothing truncates early.
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance daily-bar fetcher.
pub struct YahooFetcher {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooFetcher {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Yahoo symbol for an instrument, by board tier.
    fn symbol(instrument: &Instrument) -> String {
        match instrument.market {
            MarketTier::Primary => format!("{}.TW", instrument.id),
            MarketTier::Secondary => format!("{}.TWO", instrument.id),
        }
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse the chart API response into bars, oldest first.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::InstrumentNotFound {
                        id: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays and halts come through as all-None rows.
            let (open, high, low, close) = match (open, high, low, close) {
                (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
                _ => continue,
            };

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0.0).max(0.0) as u64,
            });
        }

        if bars.is_empty() {
            return Err(DataError::InstrumentNotFound {
                id: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    /// Execute the HTTP request with retry and exponential backoff.
    fn fetch_with_retry(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(LOOKBACK_DAYS);
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::ResponseFormatChanged(format!(
                            "HTTP {status} for {symbol}"
                        )));
                        continue;
                    }

                    let parsed: ChartResponse = match resp.json() {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            last_error =
                                Some(DataError::ResponseFormatChanged(format!("bad JSON: {e}")));
                            continue;
                        }
                    };
                    return Self::parse_response(symbol, parsed);
                }
                Err(e) => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("retries exhausted".into())))
    }
}

impl BarFetcher for YahooFetcher {
    fn name(&self) -> &str {
        "yahoo-finance"
    }

    fn fetch_daily(&self, instrument: &Instrument) -> Result<Vec<Bar>, DataError> {
        self.fetch_with_retry(&Self::symbol(instrument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_suffix_by_tier() {
        let primary = Instrument::new("2330", "TSMC", MarketTier::Primary);
        let secondary = Instrument::new("5483", "SAS", MarketTier::Secondary);
        assert_eq!(YahooFetcher::symbol(&primary), "2330.TW");
        assert_eq!(YahooFetcher::symbol(&secondary), "5483.TWO");
    }

    #[test]
    fn chart_url_contains_range_and_interval() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let url = YahooFetcher::chart_url("2330.TW", start, end);
        assert!(url.contains("/v8/finance/chart/2330.TW"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains("period1="));
        assert!(url.contains("period2="));
    }

    #[test]
    fn parse_skips_null_rows_and_keeps_decimal_volume() {
        let resp = ChartResponse {
            chart: ChartResult {
                result: Some(vec![ChartData {
                    timestamp: Some(vec![1_704_153_600, 1_704_240_000, 1_704_326_400]),
                    indicators: Indicators {
                        quote: vec![QuoteData {
                            open: vec![Some(100.0), None, Some(102.0)],
                            high: vec![Some(101.0), None, Some(103.0)],
                            low: vec![Some(99.0), None, Some(101.0)],
                            close: vec![Some(100.5), None, Some(102.5)],
                            volume: vec![Some(1500.9), None, Some(2000.0)],
                        }],
                    },
                }]),
                error: None,
            },
        };
        let bars = YahooFetcher::parse_response("2330.TW", resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 1500);
        assert_eq!(bars[1].close, 102.5);
    }

    #[test]
    fn parse_not_found_error() {
        let resp = ChartResponse {
            chart: ChartResult {
                result: None,
                error: Some(ChartError {
                    code: "Not Found".into(),
                    description: "No data found".into(),
                }),
            },
        };
        assert!(matches!(
            YahooFetcher::parse_response("0000.TW", resp),
            Err(DataError::InstrumentNotFound { .. })
        ));
    }
}
