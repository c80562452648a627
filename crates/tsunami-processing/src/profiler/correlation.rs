//! Pairwise Pearson correlation between numeric columns.

use polars::prelude::cov::pearson_corr;
use polars::prelude::*;

use crate::types::{CorrelationMatrix, CorrelationPair};

/// Pearson coefficient over rows where both values are present.
///
/// `None` with fewer than two complete pairs or when either side is constant.
pub(crate) fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    if xs.len() < 2 {
        return None;
    }

    let xs = Float64Chunked::from_vec(PlSmallStr::EMPTY, xs);
    let ys = Float64Chunked::from_vec(PlSmallStr::EMPTY, ys);
    pearson_corr(&xs, &ys)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0))
}

/// Full symmetric matrix; the diagonal is 1 for non-constant columns.
pub(crate) fn build_correlations(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let k = columns.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i].1, &columns[j].1);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Off-diagonal pairs sorted by absolute coefficient, strongest first.
pub(crate) fn strongest_pairs(matrix: &CorrelationMatrix, limit: usize) -> Vec<CorrelationPair> {
    let mut pairs = Vec::new();
    for i in 0..matrix.columns.len() {
        for j in (i + 1)..matrix.columns.len() {
            if let Some(r) = matrix.values[i][j] {
                pairs.push(CorrelationPair {
                    left: matrix.columns[i].clone(),
                    right: matrix.columns[j].clone(),
                    coefficient: r,
                });
            }
        }
    }
    pairs.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
    pairs.truncate(limit);
    pairs
}
