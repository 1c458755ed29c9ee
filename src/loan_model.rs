//! Loan-safety classifier: a two-feature logistic regression loaded from JSON.
//!
//! ```json
//! { "weights": [0.00004, -3.1], "intercept": 0.8 }
//! ```
//!
//! Features are `[total_income, debt_to_income_ratio]`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LoanSafetyModel {
    pub weights: [f64; 2],
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

impl LoanSafetyModel {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read loan safety model {}", path.display()))?;
        let model: Self = serde_json::from_str(&data)
            .with_context(|| format!("Invalid loan safety model {}", path.display()))?;
        if !model.intercept.is_finite() || model.weights.iter().any(|w| !w.is_finite()) {
            anyhow::bail!("Loan safety model {} has non-finite coefficients", path.display());
        }
        Ok(model)
    }

    /// Load the model if a path is configured. A missing or broken file only
    /// disables prediction.
    pub fn load_optional(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(model) => {
                tracing::info!("Loaded loan safety model from {}", path.display());
                Some(model)
            }
            Err(e) => {
                tracing::warn!("Loan safety prediction unavailable: {e:#}");
                None
            }
        }
    }

    pub fn probability(&self, total_income: f64, debt_to_income_ratio: f64) -> f64 {
        let z = self.intercept
            + self.weights[0] * total_income
            + self.weights[1] * debt_to_income_ratio;
        1.0 / (1.0 + (-z).exp())
    }

    /// `true` when the applicant is classified as safe to lend to.
    pub fn is_safe(&self, total_income: f64, debt_to_income_ratio: f64) -> bool {
        self.probability(total_income, debt_to_income_ratio) >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LoanSafetyModel {
        LoanSafetyModel {
            weights: [0.0001, -10.0],
            intercept: 0.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_high_income_low_ratio_is_safe() {
        assert!(model().is_safe(100_000.0, 0.2));
    }

    #[test]
    fn test_high_ratio_is_not_safe() {
        assert!(!model().is_safe(20_000.0, 0.9));
    }

    #[test]
    fn test_probability_at_decision_boundary() {
        let m = LoanSafetyModel {
            weights: [0.0, 0.0],
            intercept: 0.0,
            threshold: 0.5,
        };
        assert!((m.probability(1.0, 1.0) - 0.5).abs() < 1e-12);
        assert!(m.is_safe(1.0, 1.0));
    }

    #[test]
    fn test_load_from_json_with_default_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"weights": [0.5, -1.0], "intercept": 0.25}"#).unwrap();
        let m = LoanSafetyModel::load(&path).unwrap();
        assert_eq!(m.threshold, 0.5);
        assert_eq!(m.weights, [0.5, -1.0]);
    }

    #[test]
    fn test_missing_file_disables_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(LoanSafetyModel::load_optional(Some(&path)).is_none());
        assert!(LoanSafetyModel::load_optional(None).is_none());
    }
}
