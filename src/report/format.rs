//! Formatted terminal output for searches.
//!
//! We keep formatting code in one place so:
//! - the search code stays free of presentation concerns
//! - output changes are localized

use chrono::{DateTime, SecondsFormat, TimeZone};

use crate::domain::ProgressSnapshot;
use crate::search::{AnnealResult, Highscore, SearchStats};

/// One progress line, as printed by the periodic reporter.
pub fn format_progress_line<Tz: TimeZone>(at: &DateTime<Tz>, snapshot: &ProgressSnapshot) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} best={} explored={} log2(pruned)={}",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        fmt_score(snapshot.best_score),
        snapshot.num_explored,
        fmt_log2(snapshot.log2_num_pruned),
    )
}

/// Ranked table of the top `top` entries; `labels[i]` names feature column `i`.
pub fn format_highscore(highscore: &Highscore, labels: &[String], top: usize) -> String {
    let mut out = String::new();
    if highscore.is_empty() {
        out.push_str("No models recorded.\n");
        return out;
    }

    out.push_str(&format!(
        "{:>4}  {:>14}  {:>3}  {}\n",
        "rank", "score", "k", "features"
    ));
    for (rank, node) in highscore.iter().take(top).enumerate() {
        let names: Vec<String> = node
            .model
            .selected()
            .into_iter()
            .map(|i| label(labels, i))
            .collect();
        out.push_str(&format!(
            "{:>4}  {:>14}  {:>3}  {}\n",
            rank + 1,
            fmt_score(node.score),
            node.num_features(),
            truncate(&names.join(", "), 80)
        ));
    }

    if let Some(best) = highscore.best() {
        out.push_str("\nBest model coefficients:\n");
        for (i, c) in best.model.selected().into_iter().zip(best.coeff.iter()) {
            out.push_str(&format!("  {:<24} {c:>14.6}\n", truncate(&label(labels, i), 24)));
        }
    }
    out
}

/// Summary block printed after a branch-and-bound run.
pub fn format_search_summary(
    rows: usize,
    num_features: usize,
    snapshot: &ProgressSnapshot,
    stats: &SearchStats,
) -> String {
    let mut out = String::new();
    out.push_str("=== featselect - branch and bound ===\n");
    out.push_str(&format!("Data: n={rows} | features={num_features}\n"));
    out.push_str(&format!(
        "Models: explored={} | log2(pruned)={} | total=2^{num_features}\n",
        snapshot.num_explored,
        fmt_log2(snapshot.log2_num_pruned),
    ));
    out.push_str(&format!(
        "Nodes: scored={} pruned={} discarded={} | peak backlog={} (deferred pops {})\n",
        stats.scored, stats.pruned, stats.discarded, stats.peak_backlog, stats.deferred_pops
    ));
    out.push_str(&format!("Best score: {}\n", fmt_score(snapshot.best_score)));
    out
}

pub fn format_anneal(result: &AnnealResult, labels: &[String]) -> String {
    let names: Vec<String> = result.selected.iter().map(|&i| label(labels, i)).collect();
    format!(
        "Warm start: score={} k={} [{}]\n",
        fmt_score(result.score),
        result.selected.len(),
        truncate(&names.join(", "), 80)
    )
}

fn label(labels: &[String], i: usize) -> String {
    labels.get(i).cloned().unwrap_or_else(|| format!("x{i}"))
}

fn fmt_score(v: f64) -> String {
    if v.is_finite() { format!("{v:.6e}") } else { "-".to_string() }
}

fn fmt_log2(v: f64) -> String {
    if v == f64::NEG_INFINITY { "none".to_string() } else { format!("{v:.2}") }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Model, Node};
    use chrono::Utc;

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn progress_line_has_rfc3339_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let snap = ProgressSnapshot {
            best_score: -12.5,
            num_explored: 42,
            log2_num_pruned: 3.0,
        };
        assert_eq!(
            format_progress_line(&at, &snap),
            "2024-03-01T12:30:00Z best=-1.250000e1 explored=42 log2(pruned)=3.00"
        );
        let fresh = format_progress_line(&at, &ProgressSnapshot::default());
        assert!(fresh.ends_with("log2(pruned)=none"));
    }

    #[test]
    fn highscore_table_uses_feature_names() {
        let mut highscore = Highscore::new(5);
        let mut node = Node::root(Model::from_bools(&[true, false, true]));
        node.score = -3.0;
        node.coeff = vec![1.5, -0.5];
        highscore.insert(node);

        let table = format_highscore(&highscore, &names(), 10);
        assert!(table.contains("a, c"));
        assert!(table.contains("Best model coefficients"));
        assert!(table.contains("-0.500000"));
    }

    #[test]
    fn empty_highscore_says_so() {
        let table = format_highscore(&Highscore::new(3), &names(), 10);
        assert_eq!(table, "No models recorded.\n");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
