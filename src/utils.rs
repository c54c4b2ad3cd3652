use std::cmp::Ordering;

pub fn round_to_1_place(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round_to_2_places(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted(values);
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Percentile with linear interpolation between closest ranks.
pub fn percentile_interpolated(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted(values);
    let rank = percentile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    let fraction = rank - low as f64;

    sorted[low] + (sorted[high] - sorted[low]) * fraction
}

/// Nearest-rank percentile, no interpolation.
pub fn percentile_nearest_rank(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sorted = sorted(values);
    let index = (percentile.clamp(0.0, 1.0) * (sorted.len() - 1) as f64) as usize;

    sorted[index.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Least-squares line through `(index, value)` pairs.
pub fn fit_line(values: &[f64]) -> LineFit {
    let n = values.len() as f64;
    if values.is_empty() {
        return LineFit {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, value) in values.iter().enumerate() {
        let x_diff = i as f64 - x_mean;
        numerator += x_diff * (value - y_mean);
        denominator += x_diff * x_diff;
    }

    let slope = if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    LineFit {
        slope,
        intercept: y_mean - slope * x_mean,
    }
}

/// Coefficient of determination of `fit` over `values`.
/// `None` when the values have no variance to explain.
pub fn r_squared(values: &[f64], fit: &LineFit) -> Option<f64> {
    let y_mean = mean(values);
    let ss_tot: f64 = values.iter().map(|v| (v - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return None;
    }

    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v - fit.at(i as f64)).powi(2))
        .sum();

    Some(1.0 - ss_res / ss_tot)
}
