use serde::{Deserialize, Serialize};

/// Descriptive statistics over one parameter's numeric readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueStatistics {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ValueStatistics {
    /// Spread of the readings as a percentage of the mean. Zero when the mean
    /// is zero, so a flat-at-zero series never divides by zero.
    pub fn spread_percentage(&self) -> f64 {
        if self.mean == 0.0 {
            return 0.0;
        }
        self.std_dev / self.mean.abs() * 100.0
    }
}

pub fn describe(values: &[f64]) -> Option<ValueStatistics> {
    if values.is_empty() {
        return None;
    }

    let mean = mean(values);
    let std_dev = population_std(values, mean);
    let mut min = values[0];
    let mut max = values[0];
    for value in values {
        if *value < min {
            min = *value;
        }
        if *value > max {
            max = *value;
        }
    }

    Some(ValueStatistics {
        count: values.len(),
        mean,
        std_dev,
        min,
        max,
    })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor N, not N-1).
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient. `None` when the series are shorter than
/// two points, differ in length, or either one has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(covariance / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_reports_population_std() {
        let stats = describe(&[10.0, 11.0, 9.0]).expect("non-empty series");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 10.0);
        assert!((stats.std_dev - 0.816_496_580_927_726).abs() < 1e-12);
        assert_eq!(stats.min, 9.0);
        assert_eq!(stats.max, 11.0);
    }

    #[test]
    fn spread_is_relative_to_the_mean() {
        let stats = describe(&[10.0, 11.0, 9.0]).expect("non-empty series");
        assert!((stats.spread_percentage() - 8.164_965_809_277_26).abs() < 1e-9);
    }

    #[test]
    fn zero_mean_spread_is_zero() {
        let stats = describe(&[-1.0, 1.0]).expect("non-empty series");
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.spread_percentage(), 0.0);
    }

    #[test]
    fn describe_rejects_empty_input() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn pearson_detects_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        let r = pearson(&xs, &ys).expect("correlated series");
        assert!((r - 1.0).abs() < 1e-12);

        let inverted = [8.0, 6.0, 4.0, 2.0];
        let r = pearson(&xs, &inverted).expect("anti-correlated series");
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_guards_degenerate_series() {
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[3.0]).is_none());
        assert!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
    }
}
