//! Weight sets combining the sub-scores.

use crate::error::WeightConfigurationError;

/// Allowed deviation of a weight sum from 1.0.
const SUM_TOLERANCE: f64 = 1e-6;

/// Weights used when ortholog evidence is available.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightSet {
    pub busco: f64,
    pub completeness: f64,
    pub homology: f64,
    pub length: f64,
}

impl Default for WeightSet {
    fn default() -> Self {
        Self {
            busco: 0.4,
            completeness: 0.3,
            homology: 0.2,
            length: 0.1,
        }
    }
}

/// Weights used without ortholog evidence.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackWeightSet {
    pub completeness: f64,
    pub homology: f64,
    pub length: f64,
}

impl Default for FallbackWeightSet {
    fn default() -> Self {
        Self {
            completeness: 0.5,
            homology: 0.3,
            length: 0.2,
        }
    }
}

/// Which weight set is in use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeightProfile {
    /// Four terms including BUSCO.
    Full,
    /// Three terms, BUSCO excluded.
    Fallback,
}

/// Normalized weights; `busco` is zero in the fallback profile.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Weights {
    pub busco: f64,
    pub completeness: f64,
    pub homology: f64,
    pub length: f64,
}

/// Both weight sets after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedWeights {
    pub full: Weights,
    pub fallback: Weights,
}

impl ValidatedWeights {
    /// The weights to use, given whether any ortholog evidence was parsed.
    pub fn select(&self, has_ortholog_evidence: bool) -> (WeightProfile, Weights) {
        if has_ortholog_evidence {
            (WeightProfile::Full, self.full)
        } else {
            (WeightProfile::Fallback, self.fallback)
        }
    }
}

/// Check both weight sets and renormalize them to sum to 1.0.
///
/// # Errors
///
/// If a weight is negative or not finite, or all weights of a set are zero.
pub fn validate(
    full: &WeightSet,
    fallback: &FallbackWeightSet,
) -> Result<ValidatedWeights, WeightConfigurationError> {
    let f = normalize(
        "full",
        [
            ("busco", full.busco),
            ("completeness", full.completeness),
            ("homology", full.homology),
            ("length", full.length),
        ],
    )?;
    let b = normalize(
        "fallback",
        [
            ("completeness", fallback.completeness),
            ("homology", fallback.homology),
            ("length", fallback.length),
        ],
    )?;
    Ok(ValidatedWeights {
        full: Weights {
            busco: f[0],
            completeness: f[1],
            homology: f[2],
            length: f[3],
        },
        fallback: Weights {
            busco: 0.0,
            completeness: b[0],
            homology: b[1],
            length: b[2],
        },
    })
}

fn normalize<const N: usize>(
    set: &'static str,
    weights: [(&'static str, f64); N],
) -> Result<[f64; N], WeightConfigurationError> {
    for (name, value) in weights {
        if !value.is_finite() {
            return Err(WeightConfigurationError::NonFinite { set, name });
        }
        if value < 0.0 {
            return Err(WeightConfigurationError::Negative { set, name, value });
        }
    }
    let sum = weights.iter().map(|(_, value)| value).sum::<f64>();
    if sum <= 0.0 {
        return Err(WeightConfigurationError::ZeroSum { set, sum });
    }
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        tracing::warn!(
            "weights of the {} weight set sum to {}, renormalizing to 1.0",
            set,
            sum
        );
    }
    Ok(weights.map(|(_, value)| value / sum))
}

#[cfg(test)]
mod test {
    use super::{validate, FallbackWeightSet, WeightProfile, WeightSet};
    use crate::error::WeightConfigurationError;

    #[test]
    fn defaults_unchanged() -> Result<(), anyhow::Error> {
        let weights = validate(&WeightSet::default(), &FallbackWeightSet::default())?;

        let (profile, full) = weights.select(true);
        assert_eq!(profile, WeightProfile::Full);
        assert!((full.busco - 0.4).abs() < 1e-12);
        assert!((full.length - 0.1).abs() < 1e-12);

        let (profile, fallback) = weights.select(false);
        assert_eq!(profile, WeightProfile::Fallback);
        assert_eq!(fallback.busco, 0.0);
        assert!((fallback.completeness - 0.5).abs() < 1e-12);

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn renormalized() -> Result<(), anyhow::Error> {
        let full = WeightSet {
            busco: 4.0,
            completeness: 3.0,
            homology: 2.0,
            length: 1.0,
        };
        let weights = validate(&full, &FallbackWeightSet::default())?;

        let sum = weights.full.busco
            + weights.full.completeness
            + weights.full.homology
            + weights.full.length;
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((weights.full.busco - 0.4).abs() < 1e-12);
        assert!(logs_contain("weights of the full weight set sum to 10"));

        Ok(())
    }

    #[rstest::rstest]
    #[case(-0.1, "negative")]
    #[case(f64::NAN, "not a finite number")]
    #[case(f64::INFINITY, "not a finite number")]
    fn invalid_weight(#[case] homology: f64, #[case] message: &str) {
        let fallback = FallbackWeightSet {
            homology,
            ..Default::default()
        };
        let err = validate(&WeightSet::default(), &fallback).unwrap_err();
        assert!(err.to_string().contains(message), "{}", err);
    }

    #[test]
    fn zero_sum() {
        let full = WeightSet {
            busco: 0.0,
            completeness: 0.0,
            homology: 0.0,
            length: 0.0,
        };
        assert!(matches!(
            validate(&full, &FallbackWeightSet::default()),
            Err(WeightConfigurationError::ZeroSum { set: "full", .. })
        ));
    }
}
