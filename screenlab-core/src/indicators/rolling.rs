//! Rolling window primitives: mean, max, min.
//!
//! Each function maps a value slice to a same-length output with NaN for the
//! first `window - 1` indices. A NaN anywhere inside a window makes that
//! window's output NaN rather than an approximation from the defined subset.

/// Rolling mean over a fixed trailing window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "rolling window must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < window {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_in_window = false;
    for &v in values.iter().take(window) {
        if v.is_nan() {
            nan_in_window = true;
        }
        sum += v;
    }

    if !nan_in_window {
        result[window - 1] = sum / window as f64;
    }

    for i in window..n {
        let leaving = values[i - window];
        let entering = values[i];
        sum = sum - leaving + entering;

        // The incremental sum is poisoned once a NaN has passed through it;
        // rescan the window whenever NaN enters, leaves, or was present.
        if entering.is_nan() || leaving.is_nan() || nan_in_window {
            nan_in_window = false;
            sum = 0.0;
            for &v in &values[(i + 1 - window)..=i] {
                if v.is_nan() {
                    nan_in_window = true;
                }
                sum += v;
            }
            if nan_in_window {
                continue;
            }
        }

        result[i] = sum / window as f64;
    }

    result
}

/// Rolling maximum over a fixed trailing window.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(values, window, Extreme::Max)
}

/// Rolling minimum over a fixed trailing window.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_extreme(values, window, Extreme::Min)
}

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

fn rolling_extreme(values: &[f64], window: usize, which: Extreme) -> Vec<f64> {
    assert!(window >= 1, "rolling window must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        let mut extreme = match which {
            Extreme::Max => f64::NEG_INFINITY,
            Extreme::Min => f64::INFINITY,
        };
        let mut has_nan = false;
        for &v in slice {
            if v.is_nan() {
                has_nan = true;
                break;
            }
            extreme = match which {
                Extreme::Max => extreme.max(v),
                Extreme::Min => extreme.min(v),
            };
        }
        if !has_nan {
            result[i] = extreme;
        }
    }

    result
}
