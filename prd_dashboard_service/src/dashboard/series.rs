use std::{f64::consts::PI, str::FromStr};

use chrono::NaiveDate;
use rand::{Rng, SeedableRng, distr::weighted::WeightedIndex, rngs::StdRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::A, Category::B, Category::C];

    fn weight(self) -> f64 {
        match self {
            Category::A => 0.4,
            Category::B => 0.35,
            Category::C => 0.25,
        }
    }
}

impl FromStr for Category {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Category::A),
            "B" => Ok(Category::B),
            "C" => Ok(Category::C),
            _ => Err(DashboardError::UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Sales,
    Users,
    Revenue,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Sales, Metric::Users, Metric::Revenue];

    pub fn value(self, point: &DataPoint) -> f64 {
        match self {
            Metric::Sales => point.sales,
            Metric::Users => point.users,
            Metric::Revenue => point.revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub sales: f64,
    pub users: f64,
    pub revenue: f64,
    pub category: Category,
}

/// Which points a dashboard view looks at. `None` means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub categories: Option<Vec<Category>>,
}

impl Selection {
    fn includes(&self, point: &DataPoint) -> bool {
        self.start.is_none_or(|start| point.date >= start)
            && self.end.is_none_or(|end| point.date <= end)
            && self
                .categories
                .as_ref()
                .is_none_or(|cats| cats.contains(&point.category))
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    seed: u64,
    points: Vec<DataPoint>,
}

impl Dataset {
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn select(&self, selection: &Selection) -> Vec<&DataPoint> {
        self.points
            .iter()
            .filter(|p| selection.includes(p))
            .collect()
    }
}

/// Daily synthetic metrics for `start..=end`: a linear trend, yearly and
/// weekly seasonality and gaussian noise, clamped at zero.
pub fn generate_dataset(
    start: NaiveDate,
    end: NaiveDate,
    seed: Option<u64>,
) -> Result<Dataset, DashboardError> {
    if start > end {
        return Err(DashboardError::InvalidRange { start, end });
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let sales_noise = normal(50.0)?;
    let users_noise = normal(30.0)?;
    let revenue_noise = normal(200.0)?;
    let categories = WeightedIndex::new(Category::ALL.map(Category::weight))
        .map_err(|e| DashboardError::Sampling(e.to_string()))?;

    let n = (end - start).num_days() as usize + 1;
    let points = start
        .iter_days()
        .take(n)
        .enumerate()
        .map(|(i, date)| {
            let i = i as f64;
            let trend = if n > 1 {
                100.0 * i / (n - 1) as f64
            } else {
                0.0
            };
            let seasonal = 50.0 * (2.0 * PI * i / 365.0).sin();
            let weekly = 20.0 * (2.0 * PI * i / 7.0).sin();

            let sales = 1000.0 + trend + seasonal + weekly + rng.sample(sales_noise);
            let users = 500.0 + 0.5 * trend + 0.3 * seasonal + rng.sample(users_noise);
            let revenue = 5000.0 + 5.0 * trend + 2.0 * seasonal + rng.sample(revenue_noise);

            DataPoint {
                date,
                sales: sales.max(0.0),
                users: users.max(0.0),
                revenue: revenue.max(0.0),
                category: Category::ALL[rng.sample(&categories)],
            }
        })
        .collect();

    Ok(Dataset { seed, points })
}

fn normal(std_dev: f64) -> Result<Normal<f64>, DashboardError> {
    Normal::new(0.0, std_dev).map_err(|e| DashboardError::Sampling(e.to_string()))
}

/// Parses a comma separated category list such as `A,C`. An empty string
/// selects nothing.
pub fn parse_categories(raw: &str) -> Result<Vec<Category>, DashboardError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn one_point_per_day_inclusive() {
        let dataset = generate_dataset(date(2024, 1, 1), date(2024, 12, 31), Some(7)).unwrap();
        assert_eq!(dataset.points().len(), 366);
        assert_eq!(dataset.points()[0].date, date(2024, 1, 1));
        assert_eq!(dataset.points()[365].date, date(2024, 12, 31));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_dataset(date(2024, 1, 1), date(2024, 3, 1), Some(42)).unwrap();
        let b = generate_dataset(date(2024, 1, 1), date(2024, 3, 1), Some(42)).unwrap();
        assert_eq!(a.points(), b.points());
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn values_are_non_negative_and_near_baseline() {
        let dataset = generate_dataset(date(2024, 1, 1), date(2024, 12, 31), Some(1)).unwrap();
        for point in dataset.points() {
            assert!(point.sales >= 0.0 && point.users >= 0.0 && point.revenue >= 0.0);
            assert!(point.sales > 500.0 && point.sales < 1500.0);
        }
    }

    #[test]
    fn single_day_has_zero_trend() {
        let dataset = generate_dataset(date(2024, 5, 5), date(2024, 5, 5), Some(3)).unwrap();
        assert_eq!(dataset.points().len(), 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = generate_dataset(date(2024, 2, 1), date(2024, 1, 1), None).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn selection_filters_dates_and_categories() {
        let dataset = generate_dataset(date(2024, 1, 1), date(2024, 1, 31), Some(9)).unwrap();
        let selection = Selection {
            start: Some(date(2024, 1, 10)),
            end: Some(date(2024, 1, 20)),
            categories: Some(vec![Category::A]),
        };

        let selected = dataset.select(&selection);
        assert!(selected.iter().all(|p| p.category == Category::A));
        assert!(
            selected
                .iter()
                .all(|p| p.date >= date(2024, 1, 10) && p.date <= date(2024, 1, 20))
        );

        let none = Selection {
            categories: Some(Vec::new()),
            ..Selection::default()
        };
        assert!(dataset.select(&none).is_empty());
        assert_eq!(dataset.select(&Selection::default()).len(), 31);
    }

    #[test]
    fn parses_category_lists() {
        assert_eq!(
            parse_categories("a, C").unwrap(),
            vec![Category::A, Category::C]
        );
        assert!(parse_categories("").unwrap().is_empty());
        assert!(matches!(
            parse_categories("A,Z"),
            Err(DashboardError::UnknownCategory(_))
        ));
    }
}
