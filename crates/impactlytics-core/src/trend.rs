//! Classical additive seasonal decomposition.
//!
//! observed = trend + seasonal + residual, where the trend is a centered
//! moving average over one period. Edge points the moving average cannot
//! reach are filled by a least-squares line through the nearest defined
//! trend values.

use serde::Serialize;

/// Default period for daily data: one week.
pub const DAILY_PERIOD: usize = 7;

/// Number of trend points each edge extrapolation is fitted on.
const EXTRAPOLATION_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<Option<f64>>,
    pub residual: Vec<Option<f64>>,
}

impl Decomposition {
    fn undefined(len: usize) -> Self {
        Self {
            trend: vec![None; len],
            seasonal: vec![None; len],
            residual: vec![None; len],
        }
    }
}

/// Decompose `observed` with the given `period`.
///
/// Needs at least two full periods; shorter input yields all-`None` output.
pub fn decompose_additive(observed: &[f64], period: usize) -> Decomposition {
    let n = observed.len();
    if period < 2 || n < 2 * period {
        return Decomposition::undefined(n);
    }

    let mut trend = centered_moving_average(observed, period);
    extrapolate_edges(&mut trend);

    // Per-phase mean of the detrended series, re-centered to zero mean.
    let mut phase_sum = vec![0.0; period];
    let mut phase_count = vec![0usize; period];
    for (i, (x, t)) in observed.iter().zip(&trend).enumerate() {
        if let Some(t) = t {
            phase_sum[i % period] += x - t;
            phase_count[i % period] += 1;
        }
    }
    let phase_means: Vec<f64> = phase_sum
        .iter()
        .zip(&phase_count)
        .map(|(s, c)| if *c == 0 { 0.0 } else { s / *c as f64 })
        .collect();
    let centre = phase_means.iter().sum::<f64>() / period as f64;

    let seasonal: Vec<Option<f64>> = (0..n).map(|i| Some(phase_means[i % period] - centre)).collect();
    let residual = observed
        .iter()
        .zip(trend.iter().zip(&seasonal))
        .map(|(x, (t, s))| match (t, s) {
            (Some(t), Some(s)) => Some(x - t - s),
            _ => None,
        })
        .collect();

    Decomposition {
        trend,
        seasonal,
        residual,
    }
}

/// Convenience wrapper returning only the trend component.
pub fn trend_line(observed: &[f64], period: usize) -> Vec<Option<f64>> {
    decompose_additive(observed, period).trend
}

/// Two-sided moving average. Even periods use the `[0.5, 1, .., 1, 0.5] / period`
/// filter so the window stays centered.
fn centered_moving_average(observed: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;
    let n = observed.len();

    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let start = i - half;
            Some(
                weights
                    .iter()
                    .zip(&observed[start..start + weights.len()])
                    .map(|(w, x)| w * x)
                    .sum(),
            )
        })
        .collect()
}

/// Least-squares `(slope, intercept)` through points `(x, y)`.
fn fit_line(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    if points.len() < 2 {
        return (0.0, points.first().map(|p| p.1).unwrap_or(0.0));
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    (slope, mean_y - slope * mean_x)
}

/// Fill the undefined head and tail of the trend with fitted lines.
///
/// The head line is fitted on the first defined points; the tail line on the
/// points just before the last defined one.
fn extrapolate_edges(trend: &mut [Option<f64>]) {
    let defined: Vec<usize> = trend
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    let (Some(&front), Some(&back)) = (defined.first(), defined.last()) else {
        return;
    };

    let points = |from: usize, to: usize, trend: &[Option<f64>]| -> Vec<(f64, f64)> {
        (from..to)
            .filter_map(|i| trend[i].map(|v| (i as f64, v)))
            .collect()
    };

    let front_last = (front + EXTRAPOLATION_POINTS).min(back);
    let (k, m) = fit_line(&points(front, front_last.max(front + 1), trend));
    for (i, slot) in trend.iter_mut().enumerate().take(front) {
        *slot = Some(k * i as f64 + m);
    }

    let back_first = back.saturating_sub(EXTRAPOLATION_POINTS).max(front);
    let (k, m) = fit_line(&points(back_first, back.max(back_first + 1), trend));
    for (i, slot) in trend.iter_mut().enumerate().skip(back + 1) {
        *slot = Some(k * i as f64 + m);
    }
}
