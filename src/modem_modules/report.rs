//! Aligned console report of a [`StatusTable`].
use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use super::fields::ChannelVector;
use super::status::StatusTable;
use crate::error::PollError;

pub const LABEL_WIDTH: usize = 18;
pub const VALUE_WIDTH: usize = 12;
pub const SIGNIFICANT_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Aligned console table.
    #[default]
    Text,
    /// The same sections as pretty-printed JSON.
    Json,
}

/// One report line: which metric to print, its label, and a unit conversion factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSpec {
    pub key: String,
    pub label: String,
    pub scale: f64,
}

impl RowSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, scale: f64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            scale,
        }
    }
}

/// A titled group of rows, printed in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub rows: Vec<RowSpec>,
}

impl Section {
    pub fn new(title: impl Into<String>, rows: Vec<RowSpec>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// The downstream and upstream channel layout of the SMCD3G status page.
pub fn default_sections() -> Vec<Section> {
    vec![
        Section::new(
            "Downstream Channels",
            vec![
                RowSpec::new("DownstreamFrequency", "Frequency (MHz)", 1.0),
                RowSpec::new("DownstreamDSLockStatus", "Lock Status", 1.0),
                RowSpec::new("DownstreamQam", "Modulation (QAM)", 1.0),
                RowSpec::new("DownstreamChannelPowerdBmV", "Power (dBmV)", 1.0),
                RowSpec::new("DownstreamSnr", "SNR", 1.0),
            ],
        ),
        Section::new(
            "Upstream Channels",
            vec![
                // Upstream frequencies are reported in Hz.
                RowSpec::new("UpstreamFrequency", "Frequency (MHz)", 1e-6),
                RowSpec::new("UpstreamLockStatus", "Lock Status", 1.0),
                RowSpec::new("UpstreamModu", "Modulation (QAM)", 1.0),
                RowSpec::new("UpstreamChannelPower", "Power (dBmV)", 1.0),
                RowSpec::new("UpstreamChannelId", "Channel ID", 1.0),
            ],
        ),
    ]
}

/// Writes a single row. Metrics missing from the table print as zeros.
pub fn render_row<W: Write>(
    out: &mut W,
    table: &StatusTable,
    row: &RowSpec,
) -> std::io::Result<()> {
    let label = format!("{}:", row.label);
    write!(out, "  {label:<width$}", width = LABEL_WIDTH)?;
    for value in table.get(&row.key).scaled(row.scale).iter() {
        let value = format_general(value, SIGNIFICANT_DIGITS);
        write!(out, "  {value:>width$}", width = VALUE_WIDTH)?;
    }
    writeln!(out)
}

pub fn render_section<W: Write>(
    out: &mut W,
    table: &StatusTable,
    section: &Section,
) -> std::io::Result<()> {
    writeln!(out, "{}", section.title)?;
    for row in &section.rows {
        render_row(out, table, row)?;
    }
    Ok(())
}

/// Writes every section, separated by a blank line.
pub fn render_report<W: Write>(
    out: &mut W,
    table: &StatusTable,
    sections: &[Section],
) -> Result<(), PollError> {
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        render_section(out, table, section)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SectionReport<'a> {
    pub title: &'a str,
    pub rows: Vec<RowReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RowReport<'a> {
    pub key: &'a str,
    pub label: &'a str,
    pub values: ChannelVector,
}

/// Resolves the sections against the table, applying each row's scale.
pub fn build_report<'a>(table: &StatusTable, sections: &'a [Section]) -> Vec<SectionReport<'a>> {
    sections
        .iter()
        .map(|section| SectionReport {
            title: &section.title,
            rows: section
                .rows
                .iter()
                .map(|row| RowReport {
                    key: &row.key,
                    label: &row.label,
                    values: table.get(&row.key).scaled(row.scale),
                })
                .collect(),
        })
        .collect()
}

/// Scraped values are always finite, so every value serializes as a JSON number.
pub fn render_json<W: Write>(
    out: &mut W,
    table: &StatusTable,
    sections: &[Section],
) -> Result<(), PollError> {
    serde_json::to_writer_pretty(&mut *out, &build_report(table, sections))?;
    writeln!(out)?;
    Ok(())
}

pub fn render<W: Write>(
    out: &mut W,
    table: &StatusTable,
    sections: &[Section],
    format: ReportFormat,
) -> Result<(), PollError> {
    match format {
        ReportFormat::Text => render_report(out, table, sections),
        ReportFormat::Json => render_json(out, table, sections),
    }
}

/// Formats like C's `%.{precision}g`: rounds to `precision` significant digits, drops
/// trailing zeros, and switches to exponent form (`1e+06`) outside `1e-4..10^precision`.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem_modules::status::scrape_status;

    fn render_to_string(table: &StatusTable, row: &RowSpec) -> String {
        let mut out = Vec::new();
        render_row(&mut out, table, row).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(626.998, 6), "626.998");
        assert_eq!(format_general(3.72122, 6), "3.72122");
        assert_eq!(format_general(37.9359, 6), "37.9359");
        assert_eq!(format_general(38.5, 6), "38.5");
        assert_eq!(format_general(256.0, 6), "256");
        assert_eq!(format_general(0.0, 6), "0");
        assert_eq!(format_general(-2.5, 6), "-2.5");
        assert_eq!(format_general(123456.0, 6), "123456");
        assert_eq!(format_general(1234567.0, 6), "1.23457e+06");
        assert_eq!(format_general(1e6, 6), "1e+06");
        assert_eq!(format_general(0.0001, 6), "0.0001");
        assert_eq!(format_general(0.00001, 6), "1e-05");
        assert_eq!(format_general(1.0 / 3.0, 6), "0.333333");
        assert_eq!(format_general(f64::NAN, 6), "NaN");
        assert_eq!(format_general(f64::NEG_INFINITY, 6), "-Inf");
    }

    #[test]
    fn test_format_general_rounds_before_choosing_notation() {
        // Rounds up to 1e+06, which no longer fits in six digits.
        assert_eq!(format_general(999999.7, 6), "1e+06");
        assert_eq!(format_general(9.999996, 6), "10");
    }

    #[test]
    fn test_render_downstream_frequency_row() {
        let page = "var CmDownstreamFrequencyBase = \"626.998|639.001|645.002|650.999|\";\n\
                    var CmDownstreamSnrBase = \"37.356|37.356|37.356|37.9359\";\n";
        let table = scrape_status(page.as_bytes()).unwrap();

        let line = render_to_string(
            &table,
            &RowSpec::new("DownstreamFrequency", "Frequency (MHz)", 1.0),
        );
        assert!(line.starts_with("  Frequency (MHz):"));
        assert_eq!(
            line,
            "  Frequency (MHz):         626.998       639.001       645.002       650.999\n"
        );

        let line = render_to_string(&table, &RowSpec::new("DownstreamSnr", "SNR", 1.0));
        assert_eq!(
            line,
            "  SNR:                      37.356        37.356        37.356       37.9359\n"
        );
    }

    #[test]
    fn test_render_applies_scale() {
        let page = "var CmUpstreamFrequencyBase = \"18899700|23699600|30599500|36999400|\";\n";
        let table = scrape_status(page.as_bytes()).unwrap();
        let line = render_to_string(
            &table,
            &RowSpec::new("UpstreamFrequency", "Frequency (MHz)", 1e-6),
        );
        assert_eq!(
            line,
            "  Frequency (MHz):         18.8997       23.6996       30.5995       36.9994\n"
        );
    }

    #[test]
    fn test_absent_key_renders_zero_row() {
        let table = StatusTable::default();
        let row = RowSpec::new("UpstreamChannelId", "Channel ID", 1e-6);
        let line = render_to_string(&table, &row);
        let values = format!("  {:>12}", "0").repeat(4);
        let expected = format!("  {:<18}{values}\n", "Channel ID:");
        assert_eq!(line, expected);
    }

    #[test]
    fn test_render_report_sections() {
        let page = "var CmUpstreamChannelIdBase = \"73|74|75|76|\";\n";
        let table = scrape_status(page.as_bytes()).unwrap();
        let mut out = Vec::new();
        render_report(&mut out, &table, &default_sections()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "Downstream Channels");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "Upstream Channels");
        assert_eq!(
            lines[12],
            "  Channel ID:                   73            74            75            76"
        );
    }

    #[test]
    fn test_render_selects_format() {
        let page = "var CmDownstreamSnrBase = \"37.356|37.356|37.356|37.9359\";\n";
        let table = scrape_status(page.as_bytes()).unwrap();
        let sections = default_sections();

        let mut text = Vec::new();
        render(&mut text, &table, &sections, ReportFormat::Text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("Downstream Channels\n"));

        let mut json = Vec::new();
        render(&mut json, &table, &sections, ReportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["rows"][4]["key"], "DownstreamSnr");
        assert_eq!(parsed[0]["rows"][4]["values"][3], 37.9359);
    }

    #[test]
    fn test_format_names_match_cli_values() {
        assert_eq!(ReportFormat::from_str("json", true), Ok(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("text", true), Ok(ReportFormat::Text));
        assert_eq!(ReportFormat::default(), ReportFormat::Text);
    }

    #[test]
    fn test_render_json() {
        let table: StatusTable = [(
            "UpstreamFrequency".to_string(),
            ChannelVector::new([1_000_000.0, 2_000_000.0, 0.0, 0.0]),
        )]
        .into_iter()
        .collect();
        let sections = vec![Section::new(
            "Upstream Channels",
            vec![RowSpec::new("UpstreamFrequency", "Frequency (MHz)", 1e-6)],
        )];

        let mut out = Vec::new();
        render_json(&mut out, &table, &sections).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed[0]["title"], "Upstream Channels");
        assert_eq!(parsed[0]["rows"][0]["key"], "UpstreamFrequency");
        assert_eq!(parsed[0]["rows"][0]["label"], "Frequency (MHz)");
        assert_eq!(
            parsed[0]["rows"][0]["values"],
            serde_json::json!([1.0, 2.0, 0.0, 0.0])
        );
    }
}
