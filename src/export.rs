use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    core::{
        invoice::InvoiceLine,
        report::{AreaBillingTotal, BillingReport},
    },
    prelude::*,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M";

/// Totals row as the finance spreadsheet expects it.
#[derive(Serialize)]
struct TotalRow<'a> {
    area: &'a str,
    first_start: String,
    last_end: String,
    minutes: i64,
    total_kwh: String,
    total_cost: String,
}

impl<'a> From<&'a AreaBillingTotal> for TotalRow<'a> {
    fn from(total: &'a AreaBillingTotal) -> Self {
        let format = |timestamp: Option<chrono::NaiveDateTime>| {
            timestamp.map_or_else(String::new, |timestamp| {
                timestamp.format(TIMESTAMP_FORMAT).to_string()
            })
        };
        Self {
            area: total.area.as_ref(),
            first_start: format(total.first_start),
            last_end: format(total.last_end),
            minutes: total.duration.round_to_minutes(),
            total_kwh: format!("{:.3}", total.total_energy.into_inner()),
            total_cost: total.total_cost.round_to_cents().to_string(),
        }
    }
}

/// Write the per-area totals as CSV, one row per area.
#[instrument(skip_all, fields(n_totals = report.totals.len()))]
pub fn write_totals_csv<W: Write>(report: &BillingReport, writer: W) -> Result {
    let mut writer = csv::Writer::from_writer(writer);
    for total in &report.totals {
        writer
            .serialize(TotalRow::from(total))
            .with_context(|| format!("failed to write the total of `{}`", total.area))?;
    }
    writer.flush().context("failed to flush the totals")?;
    Ok(())
}

/// Invoice row with the column names the invoicing spreadsheet expects.
#[derive(Serialize)]
struct InvoiceRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,

    #[serde(rename = "Club")]
    club: &'a str,

    #[serde(rename = "Area")]
    area: &'a str,

    #[serde(rename = "Start Time")]
    start_time: String,

    #[serde(rename = "End Time")]
    end_time: String,

    #[serde(rename = "Duration (minutes)")]
    minutes: i64,

    #[serde(rename = "Detailed Summary")]
    detailed_summary: String,

    #[serde(rename = "Short Summary")]
    short_summary: String,

    #[serde(rename = "Total Cost")]
    total_cost: String,
}

impl<'a> From<&'a InvoiceLine> for InvoiceRow<'a> {
    fn from(line: &'a InvoiceLine) -> Self {
        Self {
            date: line.date,
            club: line.club.as_deref().unwrap_or_default(),
            area: line.area.as_ref(),
            start_time: line.start.format(TIME_FORMAT).to_string(),
            end_time: line.end.format(TIME_FORMAT).to_string(),
            minutes: line.duration.round_to_minutes(),
            detailed_summary: line.detailed_summary(),
            short_summary: line.short_summary(),
            total_cost: line.total_cost.round_to_cents().to_string(),
        }
    }
}

/// Write the invoice lines as CSV, one row per date, club and area.
#[instrument(skip_all, fields(n_lines = report.lines.len()))]
pub fn write_invoice_csv<W: Write>(report: &BillingReport, writer: W) -> Result {
    let mut writer = csv::Writer::from_writer(writer);
    for line in &report.lines {
        writer.serialize(InvoiceRow::from(line)).with_context(|| {
            format!("failed to write the invoice line of `{}` on {}", line.area, line.date)
        })?;
    }
    writer.flush().context("failed to flush the invoice lines")?;
    Ok(())
}

pub fn write_report_json<W: Write>(report: &BillingReport, writer: W) -> Result {
    serde_json::to_writer_pretty(writer, report).context("failed to serialize the report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{error::BillingError, invoice::ScenarioUsage, report::BillingIssue},
        quantity::{cost::Cost, energy::KilowattHours, time::Hours},
    };

    fn report() -> BillingReport {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(18, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(19, 30, 0).unwrap();
        BillingReport {
            totals: vec![
                AreaBillingTotal {
                    area: "Admiral Park North".into(),
                    total_energy: KilowattHours::new(18.0),
                    total_cost: Cost::new(4.734),
                    duration: Hours::new(1.5),
                    first_start: Some(start),
                    last_end: Some(end),
                },
                AreaBillingTotal::idle("Baker Oval".into()),
            ],
            issues: vec![BillingIssue {
                error: BillingError::UnknownScenario {
                    scenario: "Nowhere - Main".into(),
                    facility: Some("Nowhere".to_owned()),
                },
                n_records: 3,
            }],
            lines: vec![InvoiceLine {
                date: start.date(),
                club: Some("Harbour FC".to_owned()),
                area: "Admiral Park North".into(),
                facility: Some("Admiral Park".to_owned()),
                start,
                end,
                duration: Hours::new(1.5),
                total_energy: KilowattHours::new(18.0),
                total_cost: Cost::new(4.734),
                scenarios: vec![ScenarioUsage {
                    scenario: "Admiral Park - North 50 lux".into(),
                    first_on: start,
                    last_off: end,
                    billed: Hours::new(1.5),
                    energy: KilowattHours::new(18.0),
                    cost: Cost::new(4.734),
                    absorbed: Vec::new(),
                }],
            }],
        }
    }

    #[test]
    fn test_write_totals_csv() {
        let mut buffer = Vec::new();
        write_totals_csv(&report(), &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "area,first_start,last_end,minutes,total_kwh,total_cost\n\
             Admiral Park North,2025-03-01 18:00:00,2025-03-01 19:30:00,90,18.000,4.73\n\
             Baker Oval,,,0,0.000,0.00\n",
        );
    }

    #[test]
    fn test_write_invoice_csv() {
        let mut buffer = Vec::new();
        write_invoice_csv(&report(), &mut buffer).unwrap();
        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            [
                "Date",
                "Club",
                "Area",
                "Start Time",
                "End Time",
                "Duration (minutes)",
                "Detailed Summary",
                "Short Summary",
                "Total Cost",
            ],
        );
        let rows: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[0], "2025-03-01");
        assert_eq!(&row[1], "Harbour FC");
        assert_eq!(&row[3], "18:00");
        assert_eq!(&row[4], "19:30");
        assert_eq!(&row[5], "90");
        assert!(row[6].starts_with(
            "Admiral Park | Admiral Park North | Date: 2025-03-01 (Sat) | Club: Harbour FC\n",
        ));
        assert_eq!(&row[7], "North 50 lux: 18:00-19:30 (90min) | Total: 4.73");
        assert_eq!(&row[8], "4.73");
    }

    #[test]
    fn test_write_report_json() {
        let mut buffer = Vec::new();
        write_report_json(&report(), &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["totals"][0]["area"], "Admiral Park North");
        assert_eq!(value["totals"][0]["total_kwh"], 18.0);
        assert_eq!(value["issues"][0]["kind"], "unknown_scenario");
        assert_eq!(value["issues"][0]["scenario"], "Nowhere - Main");
        assert_eq!(value["issues"][0]["n_records"], 3);
        assert_eq!(value["lines"][0]["club"], "Harbour FC");
        assert_eq!(value["lines"][0]["scenarios"][0]["scenario"], "Admiral Park - North 50 lux");
    }
}
