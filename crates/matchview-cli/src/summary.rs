use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use matchview_layout::{ScoreBand, ScoreThresholds};
use matchview_model::{AggregatedCandidate, CandidateStatus};

use crate::commands::SummaryReport;

pub fn print_summary(report: &SummaryReport) {
    println!("Snapshot: {}", report.snapshot.display());
    println!("{}", candidate_table(&report.candidates, report.limit));
    if report.candidates.len() > report.limit {
        println!(
            "... {} more candidates not shown",
            report.candidates.len() - report.limit
        );
    }
    println!("{}", status_table(report));
    println!("{}", band_table(report));
    if !report.summary.matchers.is_empty() {
        println!("Matchers: {}", report.summary.matchers.join(", "));
    }
}

fn candidate_table(candidates: &[AggregatedCandidate], limit: usize) -> Table {
    let thresholds = ScoreThresholds::default();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Target"),
        header_cell("Score"),
        header_cell("Matchers"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for candidate in candidates.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&candidate.source_column),
            Cell::new(&candidate.target_column),
            score_cell(candidate.score, thresholds.categorize(candidate.score)),
            Cell::new(candidate.matchers.join(", ")),
            status_cell(candidate.status),
        ]);
    }
    table
}

fn status_table(report: &SummaryReport) -> Table {
    let summary = &report.summary;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Status"), header_cell("Candidates")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for status in CandidateStatus::ALL {
        table.add_row(vec![
            status_cell(status),
            count_cell(summary.status_count(status)),
        ]);
    }
    let mean = summary
        .mean_score
        .map_or_else(|| "-".to_string(), |mean| format!("mean {mean:.3}"));
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} ({mean})", summary.total)).add_attribute(Attribute::Bold),
    ]);
    table
}

fn band_table(report: &SummaryReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Score band"),
        header_cell("Meaning"),
        header_cell("Candidates"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for band in [ScoreBand::High, ScoreBand::Medium, ScoreBand::Low] {
        let count = report.summary.by_band.get(&band).copied().unwrap_or(0);
        table.add_row(vec![
            score_band_cell(band),
            Cell::new(band.description()),
            count_cell(count),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn score_cell(score: f64, band: Option<ScoreBand>) -> Cell {
    let cell = Cell::new(format!("{score:.3}"));
    match band {
        Some(ScoreBand::High) => cell.fg(Color::Green).add_attribute(Attribute::Bold),
        Some(ScoreBand::Medium) => cell.fg(Color::Yellow),
        Some(ScoreBand::Low) => cell,
        None => cell.fg(Color::DarkGrey),
    }
}

fn score_band_cell(band: ScoreBand) -> Cell {
    let cell = Cell::new(format!("{band:?}"));
    match band {
        ScoreBand::High => cell.fg(Color::Green),
        ScoreBand::Medium => cell.fg(Color::Yellow),
        ScoreBand::Low => cell,
    }
}

fn status_cell(status: CandidateStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        CandidateStatus::Accepted => cell.fg(Color::Green),
        CandidateStatus::Rejected => cell.fg(Color::Red),
        CandidateStatus::Discarded => cell.fg(Color::DarkGrey),
        CandidateStatus::Idle => cell,
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(Color::DarkGrey)
    }
}
