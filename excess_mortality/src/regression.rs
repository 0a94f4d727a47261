//! Ordinary least-squares fit of a mortality average against the
//! vaccination coverage.

use log::debug;
use statrs::distribution::{ContinuousCDF, StudentsT};

use std::error::Error;
use std::fmt::Display;

use crate::config::{ComparisonRow, Period};

/// The outcome of a least-squares fit `y = slope * x + intercept`.
#[derive(PartialEq, Debug, Clone)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value of the hypothesis `slope == 0`.
    /// Missing when there are no residual degrees of freedom (two points).
    pub p_value: Option<f64>,
    /// Standard error of the slope, missing in the same cases as the p-value.
    pub slope_std_err: Option<f64>,
    pub num_points: usize,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Inputs for which no line can be fitted.
#[derive(PartialEq, Debug, Clone)]
pub enum RegressionError {
    /// All the x values are the same (or there are fewer than two points).
    NotEnoughDistinctX { num_points: usize },
    /// Some coordinates are NaN or infinite.
    NonFiniteInput,
}

impl Error for RegressionError {}

impl Display for RegressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegressionError::NotEnoughDistinctX { num_points } => write!(
                f,
                "cannot fit a line: fewer than two distinct x values among {} points",
                num_points
            ),
            RegressionError::NonFiniteInput => write!(f, "cannot fit a line on non-finite values"),
        }
    }
}

/// Fits the average of the given period against the selected vaccination
/// metric of each row.
pub fn regress(rows: &[ComparisonRow], period: Period) -> Result<Regression, RegressionError> {
    let points: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.vaccination_metric_value, r.average(period)))
        .collect();
    fit_line(&points)
}

/// Least-squares fit over `(x, y)` points.
pub fn fit_line(points: &[(f64, f64)]) -> Result<Regression, RegressionError> {
    let num_points = points.len();
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(RegressionError::NonFiniteInput);
    }
    if num_points < 2 {
        return Err(RegressionError::NotEnoughDistinctX { num_points });
    }

    let n = num_points as f64;
    let mean_x = points.iter().map(|(x, _)| *x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in points.iter() {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return Err(RegressionError::NotEnoughDistinctX { num_points });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = points
        .iter()
        .map(|(x, y)| {
            let r = y - (slope * x + intercept);
            r * r
        })
        .sum();
    // A flat set of y values is fitted exactly by the horizontal line.
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / syy).clamp(0.0, 1.0)
    };

    let (slope_std_err, p_value) = slope_significance(slope, ss_res, sxx, num_points);
    debug!(
        "fit_line: n: {} slope: {} intercept: {} r2: {} p: {:?}",
        num_points, slope, intercept, r_squared, p_value
    );

    Ok(Regression {
        slope,
        intercept,
        r_squared,
        p_value,
        slope_std_err,
        num_points,
    })
}

fn slope_significance(
    slope: f64,
    ss_res: f64,
    sxx: f64,
    num_points: usize,
) -> (Option<f64>, Option<f64>) {
    if num_points < 3 {
        return (None, None);
    }
    let dof = (num_points - 2) as f64;
    let std_err = (ss_res / dof / sxx).sqrt();
    if std_err == 0.0 {
        // Exact fit: the slope is either certainly zero or certainly not.
        let p = if slope == 0.0 { 1.0 } else { 0.0 };
        return (Some(0.0), Some(p));
    }
    let t = slope / std_err;
    let p_value = StudentsT::new(0.0, 1.0, dof)
        .ok()
        .map(|dist| (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0));
    (Some(std_err), p_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn exact_line() {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let reg = fit_line(&points).unwrap();
        assert_close(reg.slope, 2.0);
        assert_close(reg.intercept, 1.0);
        assert_close(reg.r_squared, 1.0);
        assert_eq!(reg.p_value, Some(0.0));
        assert_eq!(reg.num_points, 5);
        assert_close(reg.predict(10.0), 21.0);
    }

    #[test]
    fn two_points_have_no_p_value() {
        let reg = fit_line(&[(1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert_close(reg.slope, 2.0);
        assert_close(reg.intercept, 1.0);
        assert_eq!(reg.p_value, None);
        assert_eq!(reg.slope_std_err, None);
    }

    #[test]
    fn noisy_line() {
        let points = [(0.0, 1.0), (1.0, 0.0), (2.0, 3.0), (3.0, 2.0)];
        let reg = fit_line(&points).unwrap();
        assert_close(reg.slope, 0.6);
        assert_close(reg.intercept, 0.6);
        assert!(reg.r_squared > 0.0 && reg.r_squared < 1.0);
        let p = reg.p_value.unwrap();
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(
            fit_line(&[]),
            Err(RegressionError::NotEnoughDistinctX { num_points: 0 })
        );
        assert_eq!(
            fit_line(&[(1.0, 2.0)]),
            Err(RegressionError::NotEnoughDistinctX { num_points: 1 })
        );
        assert_eq!(
            fit_line(&[(1.0, 2.0), (1.0, 5.0), (1.0, 7.0)]),
            Err(RegressionError::NotEnoughDistinctX { num_points: 3 })
        );
        assert_eq!(
            fit_line(&[(1.0, f64::NAN), (2.0, 5.0)]),
            Err(RegressionError::NonFiniteInput)
        );
    }

    #[test]
    fn flat_line_is_exact() {
        let reg = fit_line(&[(1.0, 4.0), (2.0, 4.0), (3.0, 4.0)]).unwrap();
        assert_close(reg.slope, 0.0);
        assert_close(reg.intercept, 4.0);
        assert_close(reg.r_squared, 1.0);
        assert_eq!(reg.p_value, Some(1.0));
    }

    #[test]
    fn regress_uses_selected_period() {
        let rows: Vec<ComparisonRow> = (1..4)
            .map(|i| ComparisonRow {
                entity: format!("E{}", i),
                avg_before: 5.0,
                avg_after: 2.0 * i as f64 + 1.0,
                vaccination_metric_value: i as f64,
            })
            .collect();
        let after = regress(&rows, Period::After).unwrap();
        assert_close(after.slope, 2.0);
        assert_close(after.intercept, 1.0);
        let before = regress(&rows, Period::Before).unwrap();
        assert_close(before.slope, 0.0);
        assert_close(before.intercept, 5.0);
    }
}
