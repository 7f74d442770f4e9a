use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

pub const MAX_RANDOM_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

pub fn calculate(a: f64, b: f64, operation: Operation) -> Result<f64, DashboardError> {
    match operation {
        Operation::Add => Ok(a + b),
        Operation::Subtract => Ok(a - b),
        Operation::Multiply => Ok(a * b),
        Operation::Divide if b == 0.0 => Err(DashboardError::DivisionByZero),
        Operation::Divide => Ok(a / b),
    }
}

/// `count` integers drawn uniformly from `min..=max`.
pub fn random_numbers<R: Rng + ?Sized>(
    rng: &mut R,
    min: i64,
    max: i64,
    count: usize,
) -> Result<Vec<i64>, DashboardError> {
    if min > max {
        return Err(DashboardError::InvertedBounds { min, max });
    }
    if !(1..=MAX_RANDOM_COUNT).contains(&count) {
        return Err(DashboardError::CountOutOfRange {
            count,
            max: MAX_RANDOM_COUNT,
        });
    }
    Ok((0..count).map(|_| rng.random_range(min..=max)).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,
}

pub fn analyze_text(text: &str) -> TextStats {
    TextStats {
        word_count: text.split_whitespace().count(),
        char_count: text.chars().count(),
        sentence_count: text.split('.').filter(|s| !s.trim().is_empty()).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn calculator_operations() {
        assert_eq!(calculate(6.0, 3.0, Operation::Add).unwrap(), 9.0);
        assert_eq!(calculate(6.0, 3.0, Operation::Subtract).unwrap(), 3.0);
        assert_eq!(calculate(6.0, 3.0, Operation::Multiply).unwrap(), 18.0);
        assert_eq!(calculate(6.0, 3.0, Operation::Divide).unwrap(), 2.0);
        assert_eq!(
            calculate(1.0, 0.0, Operation::Divide),
            Err(DashboardError::DivisionByZero)
        );
    }

    #[test]
    fn random_numbers_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let numbers = random_numbers(&mut rng, 1, 6, 100).unwrap();
        assert_eq!(numbers.len(), 100);
        assert!(numbers.iter().all(|n| (1..=6).contains(n)));

        let same = random_numbers(&mut rng, 5, 5, 3).unwrap();
        assert_eq!(same, vec![5, 5, 5]);
    }

    #[test]
    fn random_numbers_validate_input() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            random_numbers(&mut rng, 10, 1, 5),
            Err(DashboardError::InvertedBounds { min: 10, max: 1 })
        );
        assert!(matches!(
            random_numbers(&mut rng, 1, 10, 0),
            Err(DashboardError::CountOutOfRange { .. })
        ));
        assert!(matches!(
            random_numbers(&mut rng, 1, 10, 101),
            Err(DashboardError::CountOutOfRange { .. })
        ));
    }

    #[test]
    fn analyzes_text() {
        let stats = analyze_text("Hello world. This is Rust.  ");
        assert_eq!(
            stats,
            TextStats {
                word_count: 5,
                char_count: 28,
                sentence_count: 2,
            }
        );
        assert_eq!(analyze_text("héllo").char_count, 5);
        assert_eq!(analyze_text("").sentence_count, 0);
    }
}
