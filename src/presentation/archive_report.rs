// Archive report - per-file text summary for the `inspect` command
use crate::application::archive_service::{ArchiveBatch, ArchiveOutcome, summarize};
use crate::domain::parameter::{compass_point, describe};
use std::fmt::Write as _;

pub fn render_batch(batch: &ArchiveBatch) -> String {
    let mut out = String::new();
    for outcome in &batch.outcomes {
        out.push_str(&render_outcome(outcome));
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Loaded {} of {} file(s)",
        batch.loaded,
        batch.outcomes.len()
    );
    out
}

pub fn render_outcome(outcome: &ArchiveOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} [{}]", outcome.path.display(), outcome.format);

    let parsed = match &outcome.result {
        Ok(parsed) => parsed,
        Err(err) => {
            let _ = writeln!(out, "   skipped: {err}");
            return out;
        }
    };

    let summary = summarize(&parsed.records);
    let _ = writeln!(
        out,
        "   {} rows x {} columns, {} skipped, {} sentinel cells removed",
        summary.rows,
        parsed.records.columns().len(),
        parsed.skipped_rows,
        parsed.sentinel_rewrites
    );
    if let Some((first, last)) = summary.time_span {
        let _ = writeln!(
            out,
            "   {} .. {}",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%Y-%m-%d %H:%M:%S")
        );
    }

    let _ = writeln!(
        out,
        "   {:<12}{:>8}{:>11}{:>11}{:>11}{:>11}  {}",
        "Column", "Points", "Min", "Max", "Mean", "Std", "Description"
    );
    for (name, stats) in &summary.columns {
        let std_dev = stats
            .std_dev
            .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
        let description = describe(name).map(|(label, _)| label).unwrap_or("");
        let _ = writeln!(
            out,
            "   {:<12}{:>8}{:>11.3}{:>11.3}{:>11.3}{:>11}  {}",
            name, stats.points, stats.min, stats.max, stats.mean, std_dev, description
        );
    }

    if let Some((direction, speed_column)) = &summary.prevailing_direction {
        let _ = writeln!(
            out,
            "   Prevailing direction: {:.0}° ({}) from {} / D",
            direction,
            compass_point(*direction),
            speed_column
        );
    }
    out
}
