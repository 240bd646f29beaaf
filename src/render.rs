use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use comparator::ComparisonSet;
use core_types::{MetricValue, Trend};
use engine::{ComparisonOutcome, TokenReport};

const MISSING: &str = "n/a";

const SPARK_LEVELS: [char; 8] = [' ', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Characters per sparkline in the comparison table.
pub const SPARKLINE_WIDTH: usize = 10;

pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{value:.precision$}")
    }
}

pub fn format_option(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format_number(v, precision))
}

pub fn format_metric(value: &MetricValue, precision: usize) -> String {
    match value {
        MetricValue::Number(v) => format_number(*v, precision),
        MetricValue::Trend(t) => t.to_string(),
        MetricValue::Null => MISSING.to_string(),
    }
}

fn metric_cell(value: &MetricValue, precision: usize) -> Cell {
    let cell = Cell::new(format_metric(value, precision));
    match value {
        MetricValue::Trend(Trend::Bullish) => cell.fg(Color::Green),
        MetricValue::Trend(Trend::Bearish) => cell.fg(Color::Red),
        MetricValue::Null => cell.fg(Color::DarkGrey),
        _ => cell,
    }
}

/// A one-line unicode chart of `values`, evenly sampled down to at most `width` points.
///
/// A flat series draws a mid-height line.
pub fn sparkline(values: &[f64], width: usize) -> String {
    let sampled: Vec<f64> = if width > 0 && values.len() > width {
        let step = values.len() as f64 / width as f64;
        (0..width).map(|i| values[(i as f64 * step) as usize]).collect()
    } else {
        values.to_vec()
    };

    let (min, max) = sampled
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return SPARK_LEVELS[3].to_string().repeat(sampled.len());
    }

    let top = SPARK_LEVELS.len() - 1;
    sampled
        .iter()
        .map(|v| SPARK_LEVELS[(((v - min) / range * top as f64) as usize).min(top)])
        .collect()
}

/// Green when the series ends above where it started, red when below.
fn sparkline_cell(prices: &[f64]) -> Cell {
    let cell = Cell::new(sparkline(prices, SPARKLINE_WIDTH));
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if last > first => cell.fg(Color::Green),
        (Some(first), Some(last)) if last < first => cell.fg(Color::Red),
        _ => cell,
    }
}

fn new_table(header: Vec<Cell>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// The single-token view: market snapshot first, then every derived metric.
pub fn report_table(report: &TokenReport, precision: usize) -> Table {
    let mut table = new_table(vec![
        Cell::new(format!("{} ({})", report.symbol, report.name)),
        Cell::new("Value"),
    ]);

    table.add_row(vec![Cell::new("price"), Cell::new(format_option(report.current_price, precision))]);
    table.add_row(vec![Cell::new("market_cap"), Cell::new(format_option(report.market_cap, 0))]);
    table.add_row(vec![Cell::new("total_volume"), Cell::new(format_option(report.total_volume, 0))]);
    table.add_row(vec![
        Cell::new(format!("volume ({})", report.exchange_pair)),
        Cell::new(format_number(report.exchange_volume, 0)),
    ]);

    for (name, value) in report.metrics.iter() {
        table.add_row(vec![Cell::new(name), metric_cell(value, precision)]);
    }
    table
}

/// One row per entity and compared metric, with its position in the set.
///
/// `set` is the set the outcome was computed from; each entity's first row carries a
/// sparkline of its price history.
pub fn comparison_table(outcome: &ComparisonOutcome, set: &ComparisonSet, precision: usize) -> Table {
    let mut table = new_table(
        ["Symbol", "Price trend", "Metric", "Value", "Dev %", "Z", "Pctl"]
            .into_iter()
            .map(Cell::new)
            .collect(),
    );

    for (entity, source) in outcome.comparison.entities.iter().zip(set.iter()) {
        let prices = source.prices.prices();
        for (row, (metric, scored)) in entity.metrics.iter().enumerate() {
            let trend_cell = if row == 0 { sparkline_cell(&prices) } else { Cell::new("") };
            let z_cell = Cell::new(format_option(scored.z_score, 2));
            let z_cell = match scored.z_score {
                Some(z) if z >= 1.0 => z_cell.fg(Color::Green),
                Some(z) if z <= -1.0 => z_cell.fg(Color::Red),
                _ => z_cell,
            };
            table.add_row(vec![
                Cell::new(&entity.symbol),
                trend_cell,
                Cell::new(metric),
                Cell::new(format_option(scored.value, precision)),
                Cell::new(format_option(scored.dev_pct, 1)),
                z_cell,
                Cell::new(format_option(scored.percentile, 0)),
            ]);
        }
    }
    table
}

/// Per-metric distribution across the set.
pub fn summary_table(outcome: &ComparisonOutcome, precision: usize) -> Table {
    let mut table = new_table(
        ["Metric", "N", "Mean", "Std", "Min", "Q25", "Median", "Q75", "Max"]
            .into_iter()
            .map(Cell::new)
            .collect(),
    );

    for s in &outcome.comparison.summaries {
        table.add_row(vec![
            Cell::new(&s.metric),
            Cell::new(s.count),
            Cell::new(format_option(s.mean, precision)),
            Cell::new(format_option(s.std, precision)),
            Cell::new(format_option(s.min, precision)),
            Cell::new(format_option(s.q25, precision)),
            Cell::new(format_option(s.median, precision)),
            Cell::new(format_option(s.q75, precision)),
            Cell::new(format_option(s.max, precision)),
        ]);
    }
    table
}

/// `None` when no pair of tokens shares enough history to correlate.
pub fn correlation_table(outcome: &ComparisonOutcome) -> Option<Table> {
    let matrix = &outcome.correlation;
    if matrix.is_empty() {
        return None;
    }

    let mut header = vec![Cell::new("")];
    header.extend(matrix.symbols.iter().map(Cell::new));
    let mut table = new_table(header);

    for (symbol, row) in matrix.symbols.iter().zip(&matrix.values) {
        let mut cells = vec![Cell::new(symbol)];
        cells.extend(row.iter().map(|v| Cell::new(format_number(*v, 2))));
        table.add_row(cells);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comparator::{ComparisonEntity, ComparisonSet};
    use core_types::{MetricResult, PricePoint, PriceSeries, VolumeSeries};

    #[test]
    fn numbers_respect_precision_and_sentinels() {
        assert_eq!(format_number(1.23456, 2), "1.23");
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY, 2), "-inf");
        assert_eq!(format_number(f64::NAN, 2), "n/a");
        assert_eq!(format_option(None, 2), "n/a");
    }

    #[test]
    fn metric_values_render_by_kind() {
        assert_eq!(format_metric(&MetricValue::Number(0.0), 3), "0.000");
        assert_eq!(format_metric(&MetricValue::Trend(Trend::Bearish), 3), "BEARISH");
        assert_eq!(format_metric(&MetricValue::Null, 3), "n/a");
    }

    #[test]
    fn report_table_lists_every_metric() {
        let mut metrics = MetricResult::new();
        metrics.insert("cv", 0.1234);
        metrics.insert("trend", Trend::Bullish);
        metrics.insert("sharpe_ratio", None::<f64>);
        let report = TokenReport {
            query: "btc".into(),
            id: "bitcoin".into(),
            symbol: "BTC".into(),
            name: "Bitcoin".into(),
            current_price: Some(50_000.0),
            market_cap: None,
            total_volume: Some(1.0e9),
            exchange_pair: "BTCUSDT".into(),
            exchange_volume: 5.0e8,
            metrics,
            prices: PriceSeries::default(),
            volumes: VolumeSeries::default(),
        };

        let rendered = report_table(&report, 2).to_string();
        assert!(rendered.contains("BTC (Bitcoin)"));
        assert!(rendered.contains("0.12"));
        assert!(rendered.contains("BULLISH"));
        assert!(rendered.contains("volume (BTCUSDT)"));
        assert_eq!(report_table(&report, 2).row_iter().count(), 4 + 3);
    }

    #[test]
    fn sparkline_scales_between_extremes() {
        assert_eq!(sparkline(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 10), " ▂▃▄▅▆▇█");
        assert_eq!(sparkline(&[3.0, 1.0, 2.0], 10), "█ ▄");
        assert_eq!(sparkline(&[5.0; 4], 10), "▄▄▄▄");
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn long_series_are_sampled_to_the_width() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let line = sparkline(&values, 10);
        assert_eq!(line.chars().count(), 10);
        assert!(line.starts_with(' '));
        assert!(line.ends_with('▇') || line.ends_with('█'));
    }

    #[test]
    fn comparison_table_draws_one_sparkline_per_entity() {
        let series = |prices: &[f64]| {
            PriceSeries::new(
                prices
                    .iter()
                    .enumerate()
                    .map(|(i, p)| PricePoint::from_millis(1_700_000_000_000 + i as i64 * 86_400_000, *p).unwrap())
                    .collect(),
            )
        };
        let set: ComparisonSet = [
            ComparisonEntity::new("UP")
                .with_metric("cv", 0.1)
                .with_metric("spread_pct", 0.02)
                .with_prices(series(&[1.0, 2.0, 3.0])),
            ComparisonEntity::new("FLAT")
                .with_metric("cv", 0.2)
                .with_metric("spread_pct", 0.01)
                .with_prices(series(&[4.0, 4.0])),
        ]
        .into_iter()
        .collect();
        let metrics = vec!["cv".to_string(), "spread_pct".to_string()];
        let outcome = engine::compare_set(&set, &metrics);

        let table = comparison_table(&outcome, &set, 2);
        assert_eq!(table.row_iter().count(), 4);
        let rendered = table.to_string();
        assert!(rendered.contains("Price trend"));
        assert!(rendered.contains(" ▄█"));
        assert!(rendered.contains("▄▄"));
    }

    #[test]
    fn correlation_table_is_skipped_without_history() {
        let set: ComparisonSet = [ComparisonEntity::new("A"), ComparisonEntity::new("B")]
            .into_iter()
            .collect();
        let outcome = engine::compare_set(&set, &["cv".to_string()]);
        assert!(correlation_table(&outcome).is_none());
    }

    #[test]
    fn correlation_table_has_a_row_per_symbol() {
        let series = |slope: f64| {
            PriceSeries::new(
                (0..5)
                    .map(|i| PricePoint::from_millis(1_700_000_000_000 + i * 86_400_000, 1.0 + slope * i as f64).unwrap())
                    .collect(),
            )
        };
        let set: ComparisonSet = [
            ComparisonEntity::new("A").with_prices(series(1.0)),
            ComparisonEntity::new("B").with_prices(series(2.0)),
        ]
        .into_iter()
        .collect();
        let outcome = engine::compare_set(&set, &[]);

        let table = correlation_table(&outcome).unwrap();
        assert_eq!(table.row_iter().count(), 2);
        assert!(table.to_string().contains("1.00"));
    }
}
