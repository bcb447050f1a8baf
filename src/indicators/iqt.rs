use std::sync::OnceLock;

use crate::error::ComputationError;
use crate::indicators::types::{Indicator, IqtClass, IqtResult, ScoreRow};
use crate::indicators::utility::{mean, stddev};

/// Weights in canonical order I1..I10.
pub fn weights() -> [f64; 10] {
    Indicator::ALL.map(|i| i.weight())
}

/// `σ_w · N`: population standard deviation of the weights times the number
/// of indicators. Computed once; the weights are constants.
pub fn normalizer() -> f64 {
    static NORMALIZER: OnceLock<f64> = OnceLock::new();
    *NORMALIZER.get_or_init(|| {
        let w = weights();
        stddev(&w, mean(&w)) * w.len() as f64
    })
}

/// Weighted sum of the scores, each weight fetched by indicator identity,
/// divided by [`normalizer`].
pub fn compute(row: &ScoreRow) -> Result<f64, ComputationError> {
    let mut weighted_total = 0.0;
    for (indicator, score) in row.iter() {
        if score > 3 {
            return Err(ComputationError::NotOrdinal {
                indicator: indicator.code(),
                value: score.to_string(),
            });
        }
        weighted_total += f64::from(score) * indicator.weight();
    }

    let iqt = weighted_total / normalizer();
    if iqt.is_finite() {
        Ok(iqt)
    } else {
        Err(ComputationError::NonFinite)
    }
}

/// Converts an IQT value into its qualitative band.
///
/// | Range          | Class        |
/// |----------------|--------------|
/// | >= 3.0         | Excelente    |
/// | [2.0, 3.0)     | Bom          |
/// | [1.0, 2.0)     | Suficiente   |
/// | < 1.0 or NaN   | Insuficiente |
pub fn classify(iqt: f64) -> IqtClass {
    match iqt {
        v if v >= 3.0 => IqtClass::Excelente,
        v if v >= 2.0 => IqtClass::Bom,
        v if v >= 1.0 => IqtClass::Suficiente,
        _ => IqtClass::Insuficiente,
    }
}

/// Computes and classifies one row.
pub fn evaluate(row: ScoreRow) -> Result<IqtResult, ComputationError> {
    let iqt = compute(&row)?;
    let class = classify(iqt);
    Ok(IqtResult {
        scores: row,
        iqt,
        class,
        color: class.color(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteKey;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(3.5), IqtClass::Excelente);
        assert_eq!(classify(3.0), IqtClass::Excelente);
        assert_eq!(classify(2.999), IqtClass::Bom);
        assert_eq!(classify(2.0), IqtClass::Bom);
        assert_eq!(classify(1.5), IqtClass::Suficiente);
        assert_eq!(classify(1.0), IqtClass::Suficiente);
        assert_eq!(classify(0.999999), IqtClass::Insuficiente);
        assert_eq!(classify(-4.0), IqtClass::Insuficiente);
        assert_eq!(classify(f64::NAN), IqtClass::Insuficiente);
    }

    #[test]
    fn test_normalizer_uses_population_stddev() {
        // numpy.std([...]) * 10 for the priority weights
        assert!((normalizer() - 0.551128).abs() < 1e-6);
    }

    #[test]
    fn test_all_threes_is_excelente() {
        let row = ScoreRow::uniform(RouteKey::route("L1"), 3);
        let iqt = compute(&row).unwrap();
        assert!((iqt - 3.0 / normalizer()).abs() < 1e-12);
        assert_eq!(classify(iqt), IqtClass::Excelente);
    }

    #[test]
    fn test_all_zeros_is_insuficiente() {
        let result = evaluate(ScoreRow::uniform(RouteKey::route("L1"), 0)).unwrap();
        assert_eq!(result.iqt, 0.0);
        assert_eq!(result.class, IqtClass::Insuficiente);
        assert_eq!(result.color.hex(), "#e377c2");
    }

    #[test]
    fn test_weight_follows_indicator_not_position() {
        let mut row = ScoreRow::uniform(RouteKey::route("L1"), 0);
        row.punctuality = 1;
        let iqt = compute(&row).unwrap();
        assert!((iqt - 0.2269 / normalizer()).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_score_is_an_error() {
        let mut row = ScoreRow::uniform(RouteKey::route("L1"), 2);
        row.fare_trend = 9;
        assert!(matches!(
            compute(&row),
            Err(ComputationError::NotOrdinal { indicator: "I10", .. })
        ));
    }

    #[test]
    fn test_evaluate_twice_is_identical() {
        let row = ScoreRow::from_values(
            RouteKey::route("L1"),
            &[3.0, 2.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0],
        )
        .unwrap();
        assert_eq!(evaluate(row.clone()), evaluate(row));
    }
}
