// =============================================================================
// Fund CSV Source — daily NAV download from a fund company's CSV feed
// =============================================================================
//
// File layout (cp932 / Windows-31J encoded):
//
//   ｅＭＡＸＩＳ Ｓｌｉｍ 米国株式（Ｓ＆Ｐ５００）              <- asset name
//   基準日,基準価額(円),基準価額（分配金再投資）(円),...       <- header
//   2018/07/03,10038,10038,,0.01                              <- rows
//
// The download is decoded and parsed in memory; nothing touches the disk.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::types::{PricePoint, PriceSeries};

/// Date formats accepted in the date column.
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

fn default_delimiter() -> char {
    ','
}

fn default_date_column() -> String {
    "基準日".to_string()
}

fn default_price_column() -> String {
    "基準価額(円)".to_string()
}

/// Column layout of a fund CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundCsvLayout {
    /// Field separator (must be ASCII).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Header name of the date column.
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Header name of the price column.
    #[serde(default = "default_price_column")]
    pub price_column: String,
}

impl Default for FundCsvLayout {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            date_column: default_date_column(),
            price_column: default_price_column(),
        }
    }
}

/// Decode and parse a downloaded fund CSV into a price series named after the
/// asset-name line.
pub fn parse_fund_csv(bytes: &[u8], layout: &FundCsvLayout) -> Result<PriceSeries> {
    if !layout.delimiter.is_ascii() {
        bail!("fund CSV delimiter {:?} is not ASCII", layout.delimiter);
    }

    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
    if had_errors {
        warn!("fund CSV contained bytes outside cp932, replaced with U+FFFD");
    }

    let (name_line, body) = text
        .split_once('\n')
        .context("fund CSV has no header line after the asset name")?;
    let asset_name = name_line.trim().trim_start_matches('\u{feff}').trim();
    if asset_name.is_empty() {
        bail!("fund CSV asset-name line is empty");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(layout.delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .context("failed to read fund CSV header line")?
        .clone();
    let date_idx = column_index(&headers, &layout.date_column)?;
    let price_idx = column_index(&headers, &layout.price_column)?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read fund CSV row")?;
        // +2: the asset-name line and the header line precede the record.
        let line = record.position().map_or(0, |p| p.line() + 2);

        if record.iter().all(str::is_empty) {
            continue;
        }

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date)
            .with_context(|| format!("line {line}: invalid date {raw_date:?}"))?;

        let raw_price = record.get(price_idx).unwrap_or_default();
        let price: f64 = raw_price
            .parse()
            .with_context(|| format!("line {line}: invalid price {raw_price:?}"))?;

        points.push(PricePoint::new(date, price));
    }

    debug!(asset = asset_name, rows = points.len(), "fund CSV rows parsed");

    PriceSeries::new(asset_name, points).context("fund CSV rows do not form a valid price series")
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers.iter().position(|h| h == name).with_context(|| {
        format!(
            "fund CSV has no {name:?} column (found: {})",
            headers.iter().collect::<Vec<_>>().join(", ")
        )
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .with_context(|| format!("expected one of {DATE_FORMATS:?}"))
}

// =============================================================================
// Client
// =============================================================================

/// Downloads fund CSVs over HTTP.
#[derive(Debug, Clone)]
pub struct FundCsvClient {
    client: reqwest::Client,
}

impl FundCsvClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `csv_url` and parse the body with `layout`.
    #[instrument(skip(self, layout), name = "fund_csv::fetch")]
    pub async fn fetch(&self, csv_url: &str, layout: &FundCsvLayout) -> Result<PriceSeries> {
        let resp = self
            .client
            .get(csv_url)
            .send()
            .await
            .context("fund CSV request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("fund CSV download returned {status}");
        }

        let bytes = resp
            .bytes()
            .await
            .context("failed to read fund CSV body")?;
        debug!(bytes = bytes.len(), "fund CSV downloaded");

        let series = parse_fund_csv(&bytes, layout)?;
        info!(asset = series.name(), points = series.len(), "fund CSV loaded");
        Ok(series)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ｅＭＡＸＩＳ Ｓｌｉｍ 米国株式（Ｓ＆Ｐ５００）\r\n\
基準日,基準価額(円),基準価額（分配金再投資）(円),分配金（税引前）(円),純資産総額（億円）\r\n\
2018/07/03,10038,10038,,0.01\r\n\
2018/07/04,9936,9936,,0.01\r\n\
2018/07/05,9942,9942,,1.05\r\n\
2018/07/06,10057,10057,,1.06\r\n";

    fn cp932(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn parses_cp932_fund_csv() {
        let series = parse_fund_csv(&cp932(SAMPLE), &FundCsvLayout::default()).unwrap();
        assert_eq!(series.name(), "ｅＭＡＸＩＳ Ｓｌｉｍ 米国株式（Ｓ＆Ｐ５００）");
        assert_eq!(series.len(), 4);
        assert_eq!(series.dates()[0], NaiveDate::from_ymd_opt(2018, 7, 3).unwrap());
        assert_eq!(series.prices(), vec![10038.0, 9936.0, 9942.0, 10057.0]);
    }

    #[test]
    fn skips_blank_rows() {
        let text = format!("{SAMPLE}\r\n,,,,\r\n");
        let series = parse_fund_csv(&cp932(&text), &FundCsvLayout::default()).unwrap();
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn semicolon_layout_with_iso_dates() {
        let text = "Index Fund\nDate;Price;Assets\n2020-01-02;101.5;3\n2020-01-03;102.25;3\n";
        let layout = FundCsvLayout {
            delimiter: ';',
            date_column: "Date".into(),
            price_column: "Price".into(),
        };
        let series = parse_fund_csv(text.as_bytes(), &layout).unwrap();
        assert_eq!(series.name(), "Index Fund");
        assert_eq!(series.prices(), vec![101.5, 102.25]);
    }

    #[test]
    fn malformed_price_reports_line_number() {
        let text = SAMPLE.replace("2018/07/05,9942", "2018/07/05,abc");
        let err = parse_fund_csv(&cp932(&text), &FundCsvLayout::default()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 5: invalid price \"abc\""), "{msg}");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let text = SAMPLE.replace("2018/07/04", "July 4th");
        let err = parse_fund_csv(&cp932(&text), &FundCsvLayout::default()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 4: invalid date"), "{msg}");
    }

    #[test]
    fn out_of_order_dates_fail_validation() {
        let text = SAMPLE.replace("2018/07/06", "2018/07/01");
        let err = parse_fund_csv(&cp932(&text), &FundCsvLayout::default()).unwrap_err();
        assert!(format!("{err:#}").contains("index 3"));
    }

    #[test]
    fn missing_column_lists_headers() {
        let layout = FundCsvLayout {
            price_column: "NAV".into(),
            ..FundCsvLayout::default()
        };
        let err = parse_fund_csv(&cp932(SAMPLE), &layout).unwrap_err();
        assert!(format!("{err:#}").contains("基準日"));
    }

    #[test]
    fn missing_header_line_is_an_error() {
        assert!(parse_fund_csv(b"only a name", &FundCsvLayout::default()).is_err());
        assert!(parse_fund_csv(b"\n a,b\n", &FundCsvLayout::default()).is_err());
    }
}
