//! Cost model: service-augmented travel times and drop penalties.
//!
//! The augmented cost of arc `i -> j` is the travel time plus the service
//! time at `j`, so the cumulative time at a node is its completion time.
//! Dropping a request costs `price * scale`, where `scale` is the sum of a
//! depot row of the travel matrix; the same scale converts penalties back
//! into revenue for reporting.

use crate::error::ValidationError;

/// Cost model output consumed by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub augmented: Vec<Vec<i64>>,
    /// Drop penalty per location; `None` marks a mandatory node.
    pub penalties: Vec<Option<i64>>,
    pub scale: i64,
}

impl CostModel {
    /// Builds the cost model and checks that every objective term fits `i64`.
    pub fn build(
        travel: &[Vec<i64>],
        service: &[i64],
        prices: &[Option<f64>],
        reference_row: usize,
    ) -> Result<Self, ValidationError> {
        let augmented = augment(travel, service)?;
        let scale = penalty_scale(travel, reference_row);
        let penalties = penalties(prices, scale)?;

        let mut total: i64 = 0;
        for value in augmented.iter().flatten().chain(penalties.iter().flatten()) {
            total = total.checked_add(*value).ok_or_else(|| {
                ValidationError::CostOverflow("total of arc costs and penalties".to_string())
            })?;
        }

        Ok(Self {
            augmented,
            penalties,
            scale,
        })
    }

    /// Converts a scaled penalty back into lost revenue.
    pub fn unscale(&self, penalty: i64) -> f64 {
        unscale(penalty, self.scale)
    }
}

/// Adds the destination's service time to every arc.
pub fn augment(travel: &[Vec<i64>], service: &[i64]) -> Result<Vec<Vec<i64>>, ValidationError> {
    travel
        .iter()
        .enumerate()
        .map(|(from, row)| {
            row.iter()
                .zip(service)
                .enumerate()
                .map(|(to, (time, svc))| {
                    time.checked_add(*svc).ok_or_else(|| {
                        ValidationError::CostOverflow(format!("arc {} -> {}", from, to))
                    })
                })
                .collect()
        })
        .collect()
}

/// Sum of the reference row, floored at 1 so unscaling never divides by zero.
pub fn penalty_scale(travel: &[Vec<i64>], reference_row: usize) -> i64 {
    travel
        .get(reference_row)
        .map(|row| row.iter().fold(0i64, |acc, value| acc.saturating_add(*value)))
        .unwrap_or(0)
        .max(1)
}

pub fn penalties(prices: &[Option<f64>], scale: i64) -> Result<Vec<Option<i64>>, ValidationError> {
    prices
        .iter()
        .enumerate()
        .map(|(index, price)| match price {
            None => Ok(None),
            Some(price) => {
                let value = (price * scale as f64).round();
                if !value.is_finite() || value >= i64::MAX as f64 || value < 0.0 {
                    return Err(ValidationError::CostOverflow(format!(
                        "penalty for location {} ({} x {})",
                        index, price, scale
                    )));
                }
                Ok(Some(value as i64))
            }
        })
        .collect()
}

pub fn unscale(penalty: i64, scale: i64) -> f64 {
    penalty as f64 / scale as f64
}
