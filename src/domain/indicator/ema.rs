//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! Warmup: first (n-1) values are undefined even though the recursion runs from index 0.

pub fn calculate_ema(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let k = 2.0 / (window as f64 + 1.0);
    let mut ema = 0.0;

    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { ema + k * (v - ema) };
        if i + 1 >= window {
            out.push(Some(ema));
        } else {
            out.push(None);
        }
    }

    out
}
