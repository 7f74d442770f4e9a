use std::collections::BTreeMap;

use serde::Serialize;

use crate::dashboard::series::{Category, DataPoint, Metric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricCard {
    pub title: String,
    pub value: f64,
    pub display: String,
    /// Headline form, e.g. `$2.5M`.
    pub compact: String,
    /// Percent change of the later half of the selection over the earlier
    /// half. `None` below two points.
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub cards: Vec<MetricCard>,
    pub revenue_by_category: Vec<CategoryTotal>,
}

pub fn overview(points: &[&DataPoint]) -> Overview {
    let cards = vec![
        card("Total Sales", "$", points, total(Metric::Sales)),
        card("Total Users", "", points, total(Metric::Users)),
        card("Total Revenue", "$", points, total(Metric::Revenue)),
        card("Avg Daily Sales", "$", points, avg_sales),
    ];

    Overview {
        cards,
        revenue_by_category: revenue_by_category(points),
    }
}

fn total(metric: Metric) -> impl Fn(&[&DataPoint]) -> f64 {
    move |points| points.iter().map(|p| metric.value(p)).sum()
}

fn avg_sales(points: &[&DataPoint]) -> f64 {
    mean(points.iter().map(|p| p.sales))
}

fn card<F>(title: &str, prefix: &str, points: &[&DataPoint], measure: F) -> MetricCard
where
    F: Fn(&[&DataPoint]) -> f64,
{
    let value = measure(points);
    MetricCard {
        title: title.to_string(),
        value,
        display: format!("{prefix}{}", format_grouped(value)),
        compact: format!("{prefix}{}", format_compact(value)),
        delta: half_over_half(points, &measure),
    }
}

/// Points are in date order; an odd middle point is left out.
fn half_over_half<F>(points: &[&DataPoint], measure: F) -> Option<f64>
where
    F: Fn(&[&DataPoint]) -> f64,
{
    let half = points.len() / 2;
    if half == 0 {
        return None;
    }
    let earlier = &points[..half];
    let later = &points[points.len() - half..];
    Some(percentage_change(measure(later), measure(earlier)))
}

/// Revenue summed per category, categories without points omitted.
pub fn revenue_by_category(points: &[&DataPoint]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<Category, f64> = BTreeMap::new();
    for point in points {
        *totals.entry(point.category).or_default() += point.revenue;
    }
    totals
        .into_iter()
        .map(|(category, revenue)| CategoryTotal { category, revenue })
        .collect()
}

/// Per-metric statistics; empty when nothing is selected.
pub fn summarize_points(points: &[&DataPoint]) -> BTreeMap<Metric, MetricSummary> {
    Metric::ALL
        .into_iter()
        .filter_map(|metric| {
            let values: Vec<f64> = points.iter().map(|p| metric.value(p)).collect();
            summarize(&values).map(|summary| (metric, summary))
        })
        .collect()
}

pub fn summarize(values: &[f64]) -> Option<MetricSummary> {
    if values.is_empty() {
        return None;
    }

    let sum: f64 = values.iter().sum();
    let mean = sum / values.len() as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let std = if values.len() > 1 {
        let var =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    Some(MetricSummary {
        mean,
        median,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        sum,
    })
}

/// `1234567.8` → `1,234,568`.
pub fn format_grouped(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Headline form of a card value: `2.5M`, `12.3K`, `999`.
pub fn format_compact(value: f64) -> String {
    if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format_grouped(value)
    }
}

/// Zero when there is no base to compare against.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut acc = 0.0;
    for value in values {
        count += 1;
        acc += value;
    }
    if count == 0 { 0.0 } else { acc / count as f64 }
}
