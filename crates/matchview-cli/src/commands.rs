use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span};

use matchview_layout::{
    CandidateSummary, LayoutConfig, MatrixLayout, NodeSelection, PageWindow, ReviewSession,
    SourceSelector, ViewFilter, aggregate, save_config,
};
use matchview_model::{AggregatedCandidate, CandidateStatus, MatchSnapshot, Side};

use crate::cli::{ConfigArgs, LayoutArgs, SummaryArgs};

/// Aggregated candidates of one snapshot and their statistics.
pub struct SummaryReport {
    pub snapshot: PathBuf,
    pub candidates: Vec<AggregatedCandidate>,
    pub summary: CandidateSummary,
    pub limit: usize,
}

fn load_snapshot(path: &Path) -> Result<MatchSnapshot> {
    let snapshot =
        MatchSnapshot::load(path).with_context(|| format!("load snapshot {}", path.display()))?;
    info!(
        candidates = snapshot.candidates.len(),
        matchers = snapshot.matchers.len(),
        "Loaded snapshot from {:?}",
        path
    );
    Ok(snapshot)
}

pub fn run_summary(args: &SummaryArgs, config: &LayoutConfig) -> Result<SummaryReport> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let aggregated = aggregate(&snapshot.candidates, &snapshot.matchers);
    let summary = CandidateSummary::from_candidates(&aggregated);
    let threshold = args.threshold.unwrap_or(config.view.threshold);
    let candidates = aggregated
        .into_iter()
        .filter(|candidate| candidate.score >= threshold)
        .collect();
    Ok(SummaryReport {
        snapshot: args.snapshot.clone(),
        candidates,
        summary,
        limit: args.limit,
    })
}

/// Builds the view filter requested on the command line.
pub fn view_filter(args: &LayoutArgs, config: &LayoutConfig) -> ViewFilter {
    let statuses: Option<BTreeSet<CandidateStatus>> = if args.status.is_empty() {
        None
    } else {
        Some(args.status.iter().map(|status| (*status).into()).collect())
    };
    let selected = |keys: &[String]| {
        if keys.is_empty() {
            None
        } else {
            Some(keys.iter().cloned().collect::<BTreeSet<String>>())
        }
    };
    ViewFilter {
        threshold: args.threshold.unwrap_or(config.view.threshold),
        statuses,
        source: args
            .source
            .clone()
            .map_or(SourceSelector::All, SourceSelector::Column),
        page: args
            .page
            .map(|index| PageWindow::new(config.view.page_size, index)),
        selection: NodeSelection {
            source: selected(&args.select_source),
            target: selected(&args.select_target),
        },
    }
}

pub fn run_layout(args: &LayoutArgs, config: LayoutConfig) -> Result<MatrixLayout> {
    let span = info_span!("layout", snapshot = %args.snapshot.display());
    let _guard = span.enter();

    let snapshot = load_snapshot(&args.snapshot)?;
    let filter = view_filter(args, &config);
    let mut session = ReviewSession::new(snapshot, config);
    session.set_filter(filter);
    if let Some(focus) = &args.focus {
        session.set_focus(&focus.source, &focus.target);
    }
    for key in &args.toggle_source {
        session.toggle_node(Side::Source, key);
    }
    for key in &args.toggle_target {
        session.toggle_node(Side::Target, key);
    }

    let layout = session.layout();
    let stats = session.cache_stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        "Layout cache"
    );
    info!(
        cells = layout.cells.len(),
        sources = layout.source.scale.len(),
        targets = layout.target.scale.len(),
        "Computed layout"
    );
    Ok(layout)
}

pub fn render_layout(layout: &MatrixLayout, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(layout)
    } else {
        serde_json::to_string(layout)
    };
    json.context("serialize layout")
}

/// Prints the effective configuration and optionally writes it.
pub fn run_config(args: &ConfigArgs, config: &LayoutConfig, path: Option<&Path>) -> Result<String> {
    let rendered = config.to_toml().context("serialize layout config")?;
    if args.write {
        let path = path.ok_or_else(|| anyhow!("no configuration path available; pass --config"))?;
        save_config(config, path).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FocusArg, StatusArg};

    const SNAPSHOT: &str = r#"{
        "candidates": [
            {"source_column": "gender", "target_column": "sex", "score": 0.6, "matcher": "A", "status": "accepted"},
            {"source_column": "gender", "target_column": "sex", "score": 0.6, "matcher": "B"},
            {"source_column": "age", "target_column": "age_at_diagnosis", "score": 0.8, "matcher": "A"},
            {"source_column": "race", "target_column": "race", "score": 0.3, "matcher": "B", "status": "rejected"}
        ],
        "matchers": [{"name": "A", "weight": 0.5}, {"name": "B", "weight": 0.5}],
        "target_ontology": [
            {"name": "sex", "parent": "demographic", "grandparent": "clinical"},
            {"name": "race", "parent": "demographic", "grandparent": "clinical"},
            {"name": "age_at_diagnosis", "parent": "diagnosis", "grandparent": "clinical"}
        ]
    }"#;

    fn write_snapshot(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, SNAPSHOT).expect("write snapshot");
        path
    }

    fn layout_args(snapshot: PathBuf) -> LayoutArgs {
        LayoutArgs {
            snapshot,
            focus: None,
            toggle_source: Vec::new(),
            toggle_target: Vec::new(),
            threshold: None,
            status: Vec::new(),
            page: None,
            source: None,
            select_source: Vec::new(),
            select_target: Vec::new(),
            pretty: false,
        }
    }

    #[test]
    fn summary_applies_threshold_after_statistics() {
        let dir = tempfile::tempdir().expect("temp dir");
        let args = SummaryArgs {
            snapshot: write_snapshot(&dir),
            threshold: Some(0.5),
            limit: 10,
        };
        let report = run_summary(&args, &LayoutConfig::default()).expect("summary");
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].source_column, "gender");
        assert_eq!(report.candidates[0].status, CandidateStatus::Accepted);
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let args = layout_args(dir.path().join("absent.json"));
        let error = run_layout(&args, LayoutConfig::default()).expect_err("missing file");
        assert!(error.to_string().contains("load snapshot"));
    }

    #[test]
    fn filter_follows_flags() {
        let mut args = layout_args(PathBuf::from("snapshot.json"));
        args.status = vec![StatusArg::Idle, StatusArg::Accepted];
        args.page = Some(1);
        args.select_target = vec!["demographic".to_string()];
        let mut config = LayoutConfig::default();
        config.view.threshold = 0.25;
        config.view.page_size = 2;

        let filter = view_filter(&args, &config);
        assert_eq!(filter.threshold, 0.25);
        assert_eq!(filter.page, Some(PageWindow::new(2, 1)));
        assert_eq!(filter.source, SourceSelector::All);
        assert_eq!(
            filter.statuses,
            Some(BTreeSet::from([CandidateStatus::Idle, CandidateStatus::Accepted]))
        );
        assert_eq!(filter.selection.source, None);
        assert_eq!(
            filter.selection.target,
            Some(BTreeSet::from(["demographic".to_string()]))
        );
    }

    #[test]
    fn layout_runs_end_to_end() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut args = layout_args(write_snapshot(&dir));
        args.focus = Some(FocusArg {
            source: "gender".to_string(),
            target: "sex".to_string(),
        });
        args.toggle_target = vec!["diagnosis".to_string()];
        args.select_target = vec!["demographic".to_string()];

        let layout = run_layout(&args, LayoutConfig::default()).expect("layout");
        assert_eq!(layout.cells.len(), 2);
        assert_eq!(layout.target.scale.focused_column(), Some("sex"));

        let json = render_layout(&layout, false).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["cells"][0]["geometry"]["shape"], "rect");
        assert_eq!(value["focus"]["cell"]["target_column"], "sex");
    }

    #[test]
    fn config_write_needs_a_path() {
        let config = LayoutConfig::default();
        let rendered = run_config(&ConfigArgs { write: false }, &config, None).expect("render");
        assert!(rendered.contains("[grid]"));
        assert!(run_config(&ConfigArgs { write: true }, &config, None).is_err());

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("layout.toml");
        run_config(&ConfigArgs { write: true }, &config, Some(&path)).expect("write");
        assert!(path.exists());
    }
}
