//! Bollinger Bands.
//!
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (window_dev × StdDev)
//! - Lower: Middle - (window_dev × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//! Warmup: first (n-1) values are undefined.

use super::window_mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

pub fn calculate_bollinger(values: &[f64], window: usize, window_dev: f64) -> Vec<Option<Band>> {
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        if window == 0 || i + 1 < window {
            out.push(None);
            continue;
        }

        let slice = &values[i + 1 - window..=i];
        let middle = window_mean(slice);
        let variance = slice
            .iter()
            .map(|v| {
                let diff = v - middle;
                diff * diff
            })
            .sum::<f64>()
            / window as f64;
        let stddev = variance.sqrt();

        out.push(Some(Band {
            lower: middle - window_dev * stddev,
            middle,
            upper: middle + window_dev * stddev,
        }));
    }

    out
}

pub fn calculate_lower_band(values: &[f64], window: usize, window_dev: f64) -> Vec<Option<f64>> {
    calculate_bollinger(values, window, window_dev)
        .into_iter()
        .map(|b| b.map(|b| b.lower))
        .collect()
}

pub fn calculate_upper_band(values: &[f64], window: usize, window_dev: f64) -> Vec<Option<f64>> {
    calculate_bollinger(values, window, window_dev)
        .into_iter()
        .map(|b| b.map(|b| b.upper))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup() {
        let bands = calculate_bollinger(&[10.0, 20.0, 30.0, 40.0], 3, 2.0);
        assert!(bands[0].is_none());
        assert!(bands[1].is_none());
        assert!(bands[2].is_some());
        assert!(bands[3].is_some());
    }

    #[test]
    fn bollinger_constant_values_collapse() {
        let bands = calculate_bollinger(&[100.0; 5], 3, 2.0);
        let b = bands[4].unwrap();
        assert_relative_eq!(b.lower, 100.0);
        assert_relative_eq!(b.middle, 100.0);
        assert_relative_eq!(b.upper, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bands = calculate_bollinger(&[10.0, 20.0, 30.0], 3, 2.0);
        let b = bands[2].unwrap();
        let middle: f64 = 20.0;
        let stddev = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(b.middle, middle);
        assert_relative_eq!(b.upper, middle + 2.0 * stddev, epsilon = 1e-10);
        assert_relative_eq!(b.lower, middle - 2.0 * stddev, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_two_point_window_is_exact() {
        let lower = calculate_lower_band(&[10.0, 10.0, 20.0, 10.0], 2, 1.0);
        let upper = calculate_upper_band(&[10.0, 10.0, 20.0, 10.0], 2, 1.0);
        assert_eq!(lower, vec![None, Some(10.0), Some(10.0), Some(10.0)]);
        assert_eq!(upper, vec![None, Some(10.0), Some(20.0), Some(20.0)]);
    }

    #[test]
    fn bollinger_symmetry() {
        let bands = calculate_bollinger(&[3.0, 9.0, 4.0, 7.0], 4, 1.5);
        let b = bands[3].unwrap();
        assert_relative_eq!(b.upper - b.middle, b.middle - b.lower, epsilon = 1e-12);
    }

    #[test]
    fn bollinger_window_0() {
        assert_eq!(calculate_bollinger(&[1.0, 2.0], 0, 2.0), vec![None, None]);
    }

    #[test]
    fn bollinger_flat_series_is_exact() {
        let prices = vec![0.1; 60];
        for window in 1..30 {
            for band in calculate_bollinger(&prices, window, 2.0).into_iter().flatten() {
                assert_eq!(band, Band { lower: 0.1, middle: 0.1, upper: 0.1 });
            }
        }
    }
}
