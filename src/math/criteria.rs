//! Information criteria used to score and bound models.
//!
//! Both criteria are increasing in the residual sum of squares and in the
//! feature count. The bound estimator relies on that monotonicity: evaluating
//! a criterion at the extreme RSS with the opposite extreme feature count
//! brackets every intermediate model.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// RSS floor applied before taking the logarithm.
///
/// Exact fits would otherwise score `-inf` and swamp every other model.
pub const RSS_TOL: f64 = 1e-12;

/// Akaike Information Criterion.
pub fn aic(num_feat: usize, num_data: usize, rss: f64) -> f64 {
    2.0 * num_feat as f64 + num_data as f64 * rss.max(RSS_TOL).ln()
}

/// Small-sample corrected AIC.
///
/// The correction `(2k² + 2k) / (n - k - 1)` has its denominator clamped to 1
/// once `k >= n - 1`, which keeps the criterion finite and still increasing in `k`.
pub fn aicc(num_feat: usize, num_data: usize, rss: f64) -> f64 {
    let k = num_feat as f64;
    let denom = if num_feat + 1 >= num_data {
        1.0
    } else {
        (num_data - num_feat - 1) as f64
    };
    aic(num_feat, num_data, rss) + (2.0 * k * k + 2.0 * k) / denom
}

/// Criterion selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Aic,
    #[default]
    Aicc,
}

impl Criterion {
    pub fn eval(self, num_feat: usize, num_data: usize, rss: f64) -> f64 {
        match self {
            Criterion::Aic => aic(num_feat, num_data, rss),
            Criterion::Aicc => aicc(num_feat, num_data, rss),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Criterion::Aic => "AIC",
            Criterion::Aicc => "AICc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aic_matches_closed_form() {
        let expect = 10.0 + 10.0 * (1e-4f64).ln();
        assert!((aic(5, 10, 1e-4) - expect).abs() < 1e-12);
    }

    #[test]
    fn aic_floors_tiny_rss() {
        assert_eq!(aic(1, 4, 0.0), aic(1, 4, RSS_TOL));
        assert!(aic(1, 4, 0.0).is_finite());
    }

    #[test]
    fn aicc_adds_small_sample_correction() {
        // k=2, n=10: (8 + 4) / 7
        let expect = aic(2, 10, 3.0) + 12.0 / 7.0;
        assert!((aicc(2, 10, 3.0) - expect).abs() < 1e-12);
    }

    #[test]
    fn aicc_clamps_denominator_near_saturation() {
        // k = n - 1 and k = n both use denominator 1.
        assert!((aicc(3, 4, 1.0) - (aic(3, 4, 1.0) + 24.0)).abs() < 1e-12);
        assert!((aicc(4, 4, 1.0) - (aic(4, 4, 1.0) + 40.0)).abs() < 1e-12);
    }

    #[test]
    fn aicc_is_increasing_in_features_and_rss() {
        let n = 12;
        for k in 0..n + 2 {
            assert!(aicc(k + 1, n, 2.0) > aicc(k, n, 2.0), "not increasing at k={k}");
            assert!(aicc(k, n, 2.5) > aicc(k, n, 2.0));
        }
    }
}
