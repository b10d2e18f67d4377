//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) values are undefined.
//! Each mean is taken over its own window, so equal closes give an exact result.

use super::window_mean;

pub fn calculate_sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| (i + 1 >= window).then(|| window_mean(&values[i + 1 - window..=i])))
        .collect()
}
