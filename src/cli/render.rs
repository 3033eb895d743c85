//! Builds terminal tables for query results.
//!
//! These functions only format; they never query or print, so they can be
//! exercised directly in tests.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::models::{
    CitySnapshot, CorrelationMatrix, CycleGranularity, CycleStat, DailySeries, RegressionStats,
    RiskCategory,
};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

/// Category cell tinted with the category's color token.
fn risk_cell(risk: RiskCategory) -> Cell {
    let cell = Cell::new(risk.label());
    match parse_hex_color(risk.color()) {
        Some((r, g, b)) => cell.fg(Color::Rgb { r, g, b }),
        None => cell,
    }
}

fn parse_hex_color(token: &str) -> Option<(u8, u8, u8)> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Current status per city, worst first when pre-ranked by the caller.
pub fn snapshot_table(snapshots: &[CitySnapshot]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["City", "Last Reading", "AQI", "Category", "Guidance"]);
    for s in snapshots {
        table.add_row(vec![
            Cell::new(&s.city),
            Cell::new(s.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{:.1}", s.aqi)),
            risk_cell(s.risk),
            Cell::new(s.risk.guidance()),
        ]);
    }
    table
}

/// Cycle aggregation results, one row per `(city, bucket)` group.
pub fn cycle_table(granularity: CycleGranularity, stats: &[CycleStat]) -> Table {
    let bucket_header = match granularity {
        CycleGranularity::HourOfDay => "Hour",
        CycleGranularity::DayOfWeek => "Day",
        CycleGranularity::Month => "Month",
    };
    let mut table = base_table();
    table.set_header(vec![
        "City",
        bucket_header,
        "Readings",
        "Mean AQI",
        "Std",
        "Min",
        "Max",
    ]);
    for s in stats {
        table.add_row(vec![
            Cell::new(&s.city),
            Cell::new(s.key.label()),
            Cell::new(s.count),
            Cell::new(format!("{:.1}", s.mean)),
            Cell::new(opt(s.std)),
            Cell::new(format!("{:.1}", s.min)),
            Cell::new(format!("{:.1}", s.max)),
        ]);
    }
    table
}

/// Daily trend for one city, truncated to the most recent `limit` grid days.
///
/// Returns the table together with the number of omitted leading days.
pub fn trend_table(series: &DailySeries, limit: usize) -> (Table, usize) {
    let mut table = base_table();
    table.set_header(vec![
        "Date".to_string(),
        "Readings".to_string(),
        "Mean AQI".to_string(),
        "Min".to_string(),
        "Max".to_string(),
        format!("{}-day Avg", series.window_days),
    ]);

    let total = series.points.len();
    let skipped = total.saturating_sub(limit);
    for p in &series.points[skipped..] {
        table.add_row(vec![
            Cell::new(p.date),
            Cell::new(p.count),
            Cell::new(opt(p.mean)),
            Cell::new(opt(p.min)),
            Cell::new(opt(p.max)),
            Cell::new(opt(p.rolling)),
        ]);
    }
    (table, skipped)
}

/// Square correlation matrix with pollutant names on both axes.
pub fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = base_table();
    let mut header = vec!["".to_string()];
    header.extend(matrix.pollutants.iter().map(|p| p.to_string()));
    table.set_header(header);

    for (i, row) in matrix.coefficients.iter().enumerate() {
        let mut cells = vec![Cell::new(matrix.pollutants[i].to_string())];
        for value in row {
            cells.push(Cell::new(match value {
                Some(r) => format!("{:.2}", r),
                None => "-".to_string(),
            }));
        }
        table.add_row(cells);
    }
    table
}

/// One-line description of a least-squares fit.
pub fn regression_line(x: &str, y: &str, stats: &RegressionStats) -> String {
    format!(
        "{} = {:.3} x {} + {:.3} (r² = {:.3}, n = {})",
        y, stats.slope, x, stats.intercept, stats.r_squared, stats.sample_count
    )
}
