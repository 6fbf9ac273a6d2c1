use chrono::NaiveDateTime;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    config::ConfigModel,
    core::{
        invoice::InvoiceLine,
        report::{BillingIssue, BillingReport},
        resolver::UnmappedScenario,
    },
    quantity::energy::KilowattHours,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map_or_else(String::new, |timestamp| timestamp.format(TIMESTAMP_FORMAT).to_string())
}

pub fn build_totals_table(report: &BillingReport) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Area", "First on", "Last off", "Duration", "Energy", "Cost"]);
    for total in &report.totals {
        let is_idle = total.total_energy <= KilowattHours::ZERO;
        table.add_row(vec![
            Cell::new(&total.area).add_attribute(Attribute::Bold),
            Cell::new(format_timestamp(total.first_start)).add_attribute(Attribute::Dim),
            Cell::new(format_timestamp(total.last_end)).add_attribute(Attribute::Dim),
            Cell::new(total.duration).set_alignment(CellAlignment::Right),
            Cell::new(total.total_energy)
                .set_alignment(CellAlignment::Right)
                .fg(if is_idle { Color::DarkGrey } else { Color::Reset }),
            Cell::new(total.total_cost.round_to_cents()).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(report.total_energy())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(report.total_cost().round_to_cents())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_lines_table(lines: &[InvoiceLine]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Club", "Area", "Session", "Duration", "Cost", "Summary"]);
    for line in lines {
        table.add_row(vec![
            Cell::new(line.date.format("%Y-%m-%d %a")),
            Cell::new(line.club.as_deref().unwrap_or_default()).add_attribute(Attribute::Bold),
            Cell::new(&line.area),
            Cell::new(format!("{}-{}", line.start.format("%H:%M"), line.end.format("%H:%M")))
                .add_attribute(Attribute::Dim),
            Cell::new(format!("{} min", line.duration.round_to_minutes()))
                .set_alignment(CellAlignment::Right),
            Cell::new(line.total_cost.round_to_cents()).set_alignment(CellAlignment::Right),
            Cell::new(line.short_summary()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

/// Area of the issue, otherwise the facility the export reported.
fn issue_area(issue: &BillingIssue) -> String {
    issue.error.area().map_or_else(
        || issue.error.facility().map_or_else(String::new, ToOwned::to_owned),
        ToString::to_string,
    )
}

pub fn build_issues_table(issues: &[BillingIssue]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Area", "Scenarios", "Records", "Reason"]);
    for issue in issues {
        table.add_row(vec![
            Cell::new(issue_area(issue)),
            Cell::new(issue.error.scenarios().into_iter().join("\n")),
            Cell::new(issue.n_records).set_alignment(CellAlignment::Right),
            Cell::new(&issue.error).fg(if issue.error.is_fatal() {
                Color::Red
            } else {
                Color::DarkYellow
            }),
        ]);
    }
    table
}

pub fn build_unmapped_table(unmapped: &[UnmappedScenario]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Scenario", "Facility", "Records"]);
    for scenario in unmapped {
        table.add_row(vec![
            Cell::new(&scenario.scenario).fg(Color::DarkYellow),
            Cell::new(scenario.facility.as_deref().unwrap_or_default())
                .add_attribute(Attribute::Dim),
            Cell::new(scenario.n_records).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_scenarios_table(config: &ConfigModel) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Scenario", "Area", "Rated power", "Rule"]);
    for (scenario, mapping) in config.scenarios() {
        let rule = config.rule(scenario);
        table.add_row(vec![
            Cell::new(scenario),
            Cell::new(&mapping.area).add_attribute(Attribute::Bold),
            mapping.rated_power.map_or_else(
                || Cell::new("n/a").fg(Color::DarkGrey),
                |power| Cell::new(power).set_alignment(CellAlignment::Right),
            ),
            rule.map_or_else(
                || Cell::new("standalone").add_attribute(Attribute::Dim),
                |ranked| Cell::new(format!("composite #{}", ranked.level)).fg(Color::Cyan),
            ),
        ]);
    }
    table
}

/// Composite rules of every area, from the broadest to the narrowest.
pub fn build_precedence_table(config: &ConfigModel) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Area", "Level", "Composite", "Override", "Subsumes"]);
    for (area, precedence) in config.precedences() {
        for ranked in precedence.rules() {
            table.add_row(vec![
                Cell::new(area).add_attribute(Attribute::Bold),
                Cell::new(ranked.level).set_alignment(CellAlignment::Right),
                Cell::new(&ranked.rule.composite),
                Cell::new(ranked.rule.override_power).set_alignment(CellAlignment::Right),
                Cell::new(ranked.subsumed.iter().join("\n")).add_attribute(Attribute::Dim),
            ]);
        }
    }
    table
}
