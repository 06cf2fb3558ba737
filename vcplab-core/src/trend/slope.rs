//! Least-squares regression slope.
//!
//! Ordinary least squares against x = 1..=N:
//!   slope = (N * sum(x*y) - sum(y) * sum(x)) / (N * sum(x^2) - sum(x)^2)
//! A degenerate denominator (N <= 1) yields 0.0, not an error; any NaN in
//! the input yields NaN.

/// Slope of the best-fit line through `values`.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, &y) in values.iter().enumerate() {
        if y.is_nan() {
            return f64::NAN;
        }
        let x = (i + 1) as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_y * sum_x) / denom
}

/// Rolling slope over a trailing window. NaN until the window fills; a
/// window containing NaN yields NaN.
pub fn rolling_slope(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }
    for i in (window - 1)..n {
        result[i] = least_squares_slope(&values[(i + 1 - window)..=i]);
    }
    result
}
