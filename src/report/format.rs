//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the simulation code stays clean and testable
//! - output changes are localized

use crate::io::ingest::SeriesStats;
use crate::io::summary::DaySweepFile;
use crate::plan::SavingPlanResult;
use crate::report::stats::{SpreadDistribution, best_day_counts};
use crate::sweep::{SweepReport, WindowSummary};

/// Format a single run: inputs, totals and the last `tail` purchases.
pub fn format_run_summary(stats: &SeriesStats, result: &SavingPlanResult, tail: usize) -> String {
    let mut out = String::new();
    let config = result.config();

    out.push_str("=== spd - Saving Plan Run ===\n");
    out.push_str(&format_series_line(stats));
    out.push_str(&format!(
        "Plan: {} per month on day {} | period {} | first month: {:?}\n",
        fmt_money(config.invest_amount),
        config.target_day,
        config.period,
        config.first_month
    ));

    let invested = result.total_invested();
    let worth = result.total_worth();
    out.push_str(&format!(
        "Purchases: {} ({} .. {})\n",
        result.purchases(),
        result.first_purchase().map(|d| d.to_string()).unwrap_or_default(),
        result.last_purchase().map(|d| d.to_string()).unwrap_or_default(),
    ));
    out.push_str(&format!(
        "Invested: {} | Units: {:.4} | Worth: {} | Gain: {:+.2}%\n",
        fmt_money(invested),
        result.total_units(),
        fmt_money(worth),
        pct_change(invested, worth)
    ));

    if tail > 0 {
        out.push('\n');
        out.push_str(
            format!(
                "{:<10} {:>12} {:>14} {:>16} {:>14}",
                "date", "close", "bought", "units", "worth"
            )
            .trim_end(),
        );
        out.push('\n');
        out.push_str(&format!("{:-<10} {:-<12} {:-<14} {:-<16} {:-<14}\n", "", "", "", "", ""));
        let skip = result.rows().len().saturating_sub(tail);
        for r in &result.rows()[skip..] {
            out.push_str(&format!(
                "{:<10} {:>12.4} {:>14.6} {:>16.6} {:>14}\n",
                r.date,
                r.close,
                r.bought_units,
                r.cumulative_units,
                fmt_money(r.total_worth)
            ));
        }
    }

    out
}

/// Format a day sweep: one line per target day, best marked `*`, worst `!`.
pub fn format_day_table(file: &DaySweepFile) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Day sweep: {} per month | period {} | first month: {:?}\n\n",
        fmt_money(file.invest_amount),
        file.period,
        file.first_month
    ));
    out.push_str(
        format!(
            "{:>4} {:>5} {:>16} {:>12} {:>10}",
            "", "day", "worth", "vs best", "purchases"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<4} {:-<5} {:-<16} {:-<12} {:-<10}\n", "", "", "", "", ""));

    let best = file.summary.map(|s| (s.best_day, s.best_worth));
    let worst_day = file.summary.map(|s| s.worst_day);

    for day in &file.days {
        let Some(worth) = day.total_worth else {
            out.push_str(&format!("{:>4} {:>5} {:>16} {:>12} {:>10}\n", "", day.target_day, "-", "-", "-"));
            continue;
        };
        let marker = match (best, worst_day) {
            (Some((b, _)), _) if b == day.target_day => "*",
            (_, Some(w)) if w == day.target_day => "!",
            _ => "",
        };
        let gap = best
            .map(|(_, b)| format!("{:+.2}%", pct_change(b, worth)))
            .unwrap_or_default();
        out.push_str(&format!(
            "{marker:>4} {:>5} {:>16} {:>12} {:>10}\n",
            day.target_day,
            fmt_money(worth),
            gap,
            day.purchases
        ));
    }

    out.push('\n');
    match &file.summary {
        Some(s) => out.push_str(&format!(
            "Best day {} ({}) | worst day {} ({}) | spread {} ({:.2}%)\n",
            s.best_day,
            fmt_money(s.best_worth),
            s.worst_day,
            fmt_money(s.worst_worth),
            fmt_money(s.spread_abs),
            s.spread_pct
        )),
        None => out.push_str("No target day produced a result.\n"),
    }
    let failed = file.days.iter().filter(|d| d.total_worth.is_none()).count();
    if failed > 0 {
        out.push_str(&format!("Excluded days (no result): {failed}\n"));
    }

    out
}

/// Format a window sweep: counts, spread distribution, best-day frequency and extremes.
pub fn format_sweep_report(report: &SweepReport, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("=== spd - Window Sweep ===\n");
    out.push_str(&format!(
        "Windows: {}/{} completed | runs ok: {}/{}\n",
        report.windows_completed,
        report.windows_total,
        report.tasks_ok,
        report.tasks_total()
    ));
    let f = &report.failures;
    out.push_str(&format!(
        "Skipped: empty={} ambiguous={} other={} cancelled={}\n",
        f.empty_result, f.ambiguous_selection, f.other, f.cancelled
    ));
    if report.cancelled {
        out.push_str("Sweep was cancelled; results are partial.\n");
    }

    out.push_str("\nSpread between best and worst day (% of worst):\n");
    match SpreadDistribution::from_summaries(&report.summaries) {
        Some(d) => {
            out.push_str(&format!(
                "n={} | min={:.3} q1={:.3} median={:.3} q3={:.3} max={:.3} | mean={:.3}\n",
                d.count, d.min, d.q1, d.median, d.q3, d.max, d.mean
            ));
        }
        None => out.push_str("(no windows with results)\n"),
    }

    let counts = best_day_counts(&report.summaries);
    let mut ranked: Vec<(usize, usize)> = counts
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .map(|(i, n)| (i + 1, *n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if !ranked.is_empty() {
        let parts: Vec<String> = ranked
            .iter()
            .take(top_n.max(1))
            .map(|(day, n)| format!("day {day}: {n}"))
            .collect();
        out.push_str(&format!("Most frequent best day: {}\n", parts.join(", ")));
    }

    if top_n > 0 && !report.summaries.is_empty() {
        let mut by_spread: Vec<&WindowSummary> = report.summaries.iter().collect();
        by_spread.sort_by(|a, b| b.spread_pct.total_cmp(&a.spread_pct).then(a.window.cmp(&b.window)));

        out.push_str("\nWidest spreads:\n");
        out.push_str(&format_window_table(by_spread.iter().take(top_n).copied()));
        out.push_str("\nNarrowest spreads:\n");
        out.push_str(&format_window_table(by_spread.iter().rev().take(top_n).copied()));
    }

    out
}

fn format_window_table<'a>(rows: impl Iterator<Item = &'a WindowSummary>) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<23} {:>4} {:>16} {:>4} {:>16} {:>9}",
            "window", "min", "min worth", "max", "max worth", "spread"
        )
        .trim_end(),
    );
    out.push('\n');
    for s in rows {
        out.push_str(&format!(
            "{:<23} {:>4} {:>16} {:>4} {:>16} {:>8.3}%\n",
            s.window.to_string(),
            s.min_day,
            fmt_money(s.min_worth),
            s.max_day,
            fmt_money(s.max_worth),
            s.spread_pct
        ));
    }
    out
}

fn format_series_line(stats: &SeriesStats) -> String {
    format!(
        "Prices: n={} | {} .. {} | close=[{:.2}, {:.2}]\n",
        stats.n_points, stats.first_date, stats.last_date, stats.min_close, stats.max_close
    )
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 { (to - from) / from * 100.0 } else { 0.0 }
}

/// Two decimals with thousands separators.
fn fmt_money(v: f64) -> String {
    let raw = format!("{:.2}", v.abs());
    let (int_part, frac) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::trading_days;
    use crate::domain::{FirstMonthPolicy, Period, PlanConfig, PricePoint, PriceSeries};
    use crate::io::ingest::compute_stats;
    use crate::plan::simulate;
    use crate::sweep::{DiscardSink, SweepOptions, SweepRunner, generate_windows, sweep_days};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::new(
            trading_days(d(2018, 1, 1), d(2021, 12, 31))
                .enumerate()
                .map(|(i, date)| PricePoint::new(date, 30.0 + (i as f64 * 0.2).sin() * 3.0 + i as f64 * 0.02))
                .collect(),
        )
    }

    #[test]
    fn money_is_grouped() {
        assert_eq!(fmt_money(0.0), "0.00");
        assert_eq!(fmt_money(999.994), "999.99");
        assert_eq!(fmt_money(1234.5), "1,234.50");
        assert_eq!(fmt_money(1234567.891), "1,234,567.89");
        assert_eq!(fmt_money(-1000.0), "-1,000.00");
    }

    #[test]
    fn run_summary_shows_tail_rows() {
        let series = series();
        let stats = compute_stats(&series).unwrap();
        let result = simulate(&series, &PlanConfig::new(100.0, 10, Period::Max)).unwrap();
        let text = format_run_summary(&stats, &result, 3);
        assert!(text.contains("Purchases: 48"));
        assert!(text.contains("Invested: 4,800.00"));
        let last = result.rows().last().unwrap().date.to_string();
        assert!(text.contains(&last));
        assert_eq!(text.lines().filter(|l| l.starts_with("2021-")).count(), 3);
    }

    #[test]
    fn day_table_marks_best_worst_and_missing() {
        let series = series();
        let period = Period::range(d(2019, 1, 10), d(2020, 6, 20)).unwrap();
        let sweep = sweep_days(&series, 100.0, &period, FirstMonthPolicy::Drop).unwrap();
        let file = DaySweepFile::from_sweep(&sweep, 100.0, FirstMonthPolicy::Drop);
        let text = format_day_table(&file);
        let summary = file.summary.unwrap();

        let best_line = text
            .lines()
            .find(|l| l.trim_start().starts_with('*'))
            .unwrap();
        assert!(best_line.contains(&format!(" {} ", summary.best_day)));
        assert!(text.lines().any(|l| l.trim_start().starts_with('!')));
        assert!(text.contains(&format!("Best day {}", summary.best_day)));
        assert_eq!(
            text.lines().filter(|l| l.trim_end().ends_with(" -")).count(),
            sweep.failures().len()
        );
    }

    #[test]
    fn sweep_report_lists_distribution_and_extremes() {
        let series = series();
        let windows = generate_windows(&series, 2, 6).unwrap();
        let runner = SweepRunner::new(SweepOptions::default()).unwrap();
        let report = runner.run(&series, 100.0, &windows, &mut DiscardSink).unwrap();
        let text = format_sweep_report(&report, 2);

        assert!(text.contains(&format!("Windows: {}/{}", windows.len(), windows.len())));
        assert!(text.contains("median="));
        assert!(text.contains("Widest spreads:"));
        assert!(text.contains("Most frequent best day:"));
        let narrowest = text.split("Narrowest spreads:").nth(1).unwrap();
        assert_eq!(narrowest.lines().filter(|l| l.starts_with("20")).count(), 2);
    }

    #[test]
    fn empty_sweep_report_degrades_gracefully() {
        let text = format_sweep_report(&SweepReport::default(), 5);
        assert!(text.contains("(no windows with results)"));
        assert!(!text.contains("Widest"));
    }
}
