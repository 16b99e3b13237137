//! Chunked travel-matrix acquisition.
//!
//! Providers cap the number of matrix elements per request, so the full
//! matrix is split into square origin/destination blocks that respect the
//! cap. Blocks are fetched in parallel and stitched back row-major. A failed
//! block fails the whole fetch; retrying is left to the caller.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::{Coordinate, TravelTimeProvider};

/// Element limit of common distance-matrix APIs.
pub const DEFAULT_MAX_ELEMENTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub origins: Range<usize>,
    pub destinations: Range<usize>,
}

impl Block {
    pub fn elements(&self) -> usize {
        self.origins.len() * self.destinations.len()
    }
}

/// Splits an `count x count` matrix into blocks of at most `max_elements`.
pub fn plan_blocks(count: usize, max_elements: usize) -> Vec<Block> {
    let side = ((max_elements as f64).sqrt().floor() as usize).max(1);
    let chunks: Vec<Range<usize>> = (0..count)
        .step_by(side)
        .map(|start| start..(start + side).min(count))
        .collect();

    let mut blocks = Vec::with_capacity(chunks.len() * chunks.len());
    for origins in &chunks {
        for destinations in &chunks {
            blocks.push(Block {
                origins: origins.clone(),
                destinations: destinations.clone(),
            });
        }
    }
    blocks
}

/// Fetches the full square matrix for `addresses`.
pub fn fetch_matrix<P>(
    provider: &P,
    addresses: &[Coordinate],
    max_elements: usize,
) -> Result<Vec<Vec<i64>>, ProviderError>
where
    P: TravelTimeProvider + Sync + ?Sized,
{
    let count = addresses.len();
    let blocks = plan_blocks(count, max_elements);
    debug!(addresses = count, blocks = blocks.len(), max_elements, "fetching travel matrix");

    let fetched: Vec<(Block, Vec<Vec<i64>>)> = blocks
        .into_par_iter()
        .map(|block| {
            let values = provider.durations(
                &addresses[block.origins.clone()],
                &addresses[block.destinations.clone()],
            )?;
            check_shape(&block, &values)?;
            Ok((block, values))
        })
        .collect::<Result<_, ProviderError>>()?;

    let mut matrix = vec![vec![0; count]; count];
    for (block, values) in fetched {
        for (row, origin) in values.into_iter().zip(block.origins.clone()) {
            matrix[origin][block.destinations.clone()].copy_from_slice(&row);
        }
    }
    Ok(matrix)
}

fn check_shape(block: &Block, values: &[Vec<i64>]) -> Result<(), ProviderError> {
    let expected = (block.origins.len(), block.destinations.len());
    let columns = values.first().map_or(0, |row| row.len());
    if values.len() != expected.0 || values.iter().any(|row| row.len() != expected.1) {
        return Err(ProviderError::Shape {
            expected,
            actual: (values.len(), columns),
        });
    }
    Ok(())
}
