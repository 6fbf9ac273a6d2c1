use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use chrono::NaiveDateTime;
use csv::StringRecord;
use itertools::Itertools;

use crate::{ops::Interval, prelude::*, quantity::power::Kilowatts, usage::UsageRecord};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const CLUB: &str = "Club";
const FACILITY: &str = "Facility";
const LIGHTING: &str = "Lighting";
const TURN_ON: &str = "Turn on";
const TURN_OFF: &str = "Turn off";
const RATED_POWER: &str = "Rated power (kW)";

const REQUIRED_COLUMNS: [&str; 6] = [CLUB, FACILITY, LIGHTING, TURN_ON, TURN_OFF, RATED_POWER];

/// Column positions resolved from the header row.
struct Columns {
    club: usize,
    facility: usize,
    lighting: usize,
    turn_on: usize,
    turn_off: usize,
    rated_power: usize,
}

impl Columns {
    fn try_from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|header| header == name);
        let missing =
            REQUIRED_COLUMNS.into_iter().filter(|&name| position(name).is_none()).join(", ");
        if !missing.is_empty() {
            bail!(
                "invalid usage export, missing required columns: {missing} (expected: {}, found: {})",
                REQUIRED_COLUMNS.join(", "),
                headers.iter().join(", "),
            );
        }
        let column = |name: &str| position(name).with_context(|| format!("missing `{name}`"));
        Ok(Self {
            club: column(CLUB)?,
            facility: column(FACILITY)?,
            lighting: column(LIGHTING)?,
            turn_on: column(TURN_ON)?,
            turn_off: column(TURN_OFF)?,
            rated_power: column(RATED_POWER)?,
        })
    }
}

pub fn read_usage_file<P: AsRef<Path>>(path: P) -> Result<Vec<UsageRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open the usage export `{}`", path.display()))?;
    read_usage_export(file)
        .with_context(|| format!("failed to read the usage export `{}`", path.display()))
}

/// Read the lighting controller export.
///
/// The first line is a banner, the second one is the header. Summary rows (`Total…` clubs, rows
/// without a turn-on time) are skipped.
#[instrument(skip_all)]
pub fn read_usage_export<R: Read>(reader: R) -> Result<Vec<UsageRecord>> {
    let mut reader = BufReader::new(reader);
    let mut banner = String::new();
    reader.read_line(&mut banner).context("failed to read the export banner")?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::try_from_headers(reader.headers().context("failed to read the header")?)?;

    let mut n_rows = 0_usize;
    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to read row #{}", index + 1))?;
        n_rows += 1;
        if let Some(record) = parse_row(&row, &columns)
            .with_context(|| format!("invalid row #{}: {}", index + 1, row.iter().join(",")))?
        {
            records.push(record);
        }
    }

    ensure!(n_rows != 0, "the usage export is empty");
    ensure!(!records.is_empty(), "no usage rows left after skipping the summary rows");
    info!(n_rows, n_records = records.len(), "read the usage export");
    Ok(records)
}

fn parse_row(row: &StringRecord, columns: &Columns) -> Result<Option<UsageRecord>> {
    let field = |index: usize| row.get(index).unwrap_or_default();

    let club = field(columns.club);
    if club.is_empty() || club.contains("Total") || field(columns.turn_on).is_empty() {
        return Ok(None);
    }

    let facility = field(columns.facility);
    let lighting = field(columns.lighting).trim_matches('-');
    let interval = Interval::new(
        parse_timestamp(field(columns.turn_on))?,
        parse_timestamp(field(columns.turn_off))?,
    );
    let rated_power = field(columns.rated_power);
    let reported_power = if rated_power.is_empty() {
        None
    } else {
        Some(
            rated_power
                .parse::<Kilowatts>()
                .with_context(|| format!("invalid rated power `{rated_power}`"))?,
        )
    };

    Ok(Some(
        UsageRecord::builder()
            .scenario(format!("{facility} - {lighting}"))
            .interval(interval)
            .maybe_reported_power(reported_power)
            .facility(facility)
            .club(club)
            .build(),
    ))
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid timestamp `{value}`, expected DD/MM/YYYY HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const EXPORT: &str = "\
Illuminator Central usage report
Club,Facility,Lighting,Turn on,Turn off,Rated power (kW),Cost/kWh
Harbour FC,Admiral Park,-North 50 lux-,01/03/2025 18:00:00,01/03/2025 19:30:00,12.5,$0.263
Harbour FC,Admiral Park,Full 100 lux,01/03/2025 19:00:00,01/03/2025 20:00:00,,$0.263
Total,,,,,,
,Admiral Park,North 50 lux,,,,
";

    #[test]
    fn test_read_usage_export() {
        let records = read_usage_export(EXPORT.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.scenario.as_ref(), "Admiral Park - North 50 lux");
        assert_eq!(first.facility.as_deref(), Some("Admiral Park"));
        assert_eq!(first.club.as_deref(), Some("Harbour FC"));
        assert_abs_diff_eq!(first.reported_power.unwrap().into_inner(), 12.5);
        assert_eq!(first.interval.len().num_minutes(), 90);

        assert!(records[1].reported_power.is_none());
    }

    #[test]
    fn test_missing_columns() {
        let export = "banner\nClub,Facility,Turn on\nA,B,01/03/2025 18:00:00\n";
        let error = read_usage_export(export.as_bytes()).unwrap_err().to_string();
        assert!(error.contains("Lighting"), "{error}");
        assert!(error.contains("Rated power (kW)"), "{error}");
    }

    #[test]
    fn test_only_summary_rows() {
        let export = "banner\nClub,Facility,Lighting,Turn on,Turn off,Rated power (kW)\nTotal,,,,,\n";
        assert!(read_usage_export(export.as_bytes()).is_err());
    }

    #[test]
    fn test_invalid_timestamp() {
        let export = "banner\nClub,Facility,Lighting,Turn on,Turn off,Rated power (kW)\n\
                      A,B,C,2025-03-01 18:00,01/03/2025 19:00:00,1\n";
        let error = format!("{:#}", read_usage_export(export.as_bytes()).unwrap_err());
        assert!(error.contains("DD/MM/YYYY"), "{error}");
    }
}
