//! Analyze command implementation.

use anyhow::Result;
use midgrid_config::AppConfig;
use midgrid_indicators::{IndicatorRow, Rolling};
use midgrid_monitor::Snapshot;

use super::{analyze_series, apply_data_args, apply_grid_args, load_series, Analysis};
use crate::cli::{AnalyzeArgs, OutputFormat};

pub async fn run(args: AnalyzeArgs, mut config: AppConfig) -> Result<()> {
    apply_data_args(&mut config, &args.data);
    apply_grid_args(&mut config, &args.grid);
    config.validate()?;

    let series = load_series(&config).await?;
    let analysis = analyze_series(&config, &series)?;

    match args.output {
        OutputFormat::Json => {
            let Analysis {
                rows,
                pivots,
                plan,
                alerts,
            } = analysis;
            let snapshot = Snapshot::new(&series.symbol, &rows, args.rows, Some(pivots), Some(plan), alerts);
            println!("{}", snapshot.to_json()?);
        }
        OutputFormat::Text => print_text(&series.symbol, &analysis, args.rows),
    }

    Ok(())
}

fn cell(value: &Rolling<f64>) -> String {
    match value {
        Rolling::Ready { value } => format!("{value:>10.4}"),
        Rolling::Unavailable { .. } => format!("{:>10}", "n/a"),
        Rolling::Undefined => format!("{:>10}", "undef"),
    }
}

fn print_row(row: &IndicatorRow) {
    println!(
        "{}  {:>10.4} {:>8.4} {} {} {} {} {}  {:<6} {:<6} {:<4}",
        row.date,
        row.mid_price,
        row.amplitude,
        cell(&row.avg_amplitude),
        cell(&row.atr),
        cell(&row.atr_change),
        cell(&row.amplitude_percentile),
        cell(&row.amplitude_zscore),
        row.mpmi_cross.map_or_else(String::new, |c| format!("{c:?}").to_lowercase()),
        row.star.map_or_else(String::new, |c| format!("{c:?}").to_lowercase()),
        row.breakout.map_or_else(String::new, |b| format!("{b:?}").to_lowercase()),
    );
}

fn print_text(symbol: &str, analysis: &Analysis, last_n: usize) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    ANALYSIS: {symbol}");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!(
        "date        {:>10} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10}  {:<6} {:<6} {:<4}",
        "mid", "amp", "avg_amp", "atr", "atr_chg%", "pctl", "zscore", "cross", "star", "brk"
    );
    let start = analysis.rows.len().saturating_sub(last_n);
    for row in &analysis.rows[start..] {
        print_row(row);
    }
    println!();

    let p = &analysis.pivots;
    println!("PIVOTS ({:?}, reference bar {})", p.method, p.date);
    println!("───────────────────────────────────────────────────────────");
    for (label, price) in p.members().iter().rev() {
        println!("  {:<4} {:>12.4}", label.to_string(), price);
    }
    println!();

    let plan = &analysis.plan;
    println!(
        "GRID ({:?}, {:.4} .. {:.4}, {} levels)",
        plan.spacing_mode,
        plan.lower_bound,
        plan.upper_bound,
        plan.level_count()
    );
    println!("───────────────────────────────────────────────────────────");
    if let Some(adj) = plan.adjustment {
        println!(
            "  {} requested, {} kept after merging {} close levels",
            adj.requested, adj.actual, adj.merged
        );
    }
    for level in plan.levels().iter().rev() {
        let anchor = level.anchor.map(|a| format!("[{a}]")).unwrap_or_default();
        println!(
            "  L{:<3} {:>12.4}  {:<8} {}",
            level.index,
            level.price,
            format!("{:?}", level.role).to_lowercase(),
            anchor
        );
    }
    println!();

    println!("ALERTS");
    println!("───────────────────────────────────────────────────────────");
    if analysis.alerts.is_empty() {
        println!("  none");
    }
    for alert in &analysis.alerts {
        println!("  [{}] {}: {}", alert.severity, alert.kind, alert.message);
    }
}
