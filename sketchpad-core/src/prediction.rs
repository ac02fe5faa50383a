//! Prediction results returned by the inference service.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{SketchError, SketchResult};

/// Number of output classes (digits 0-9).
pub const NUM_CLASSES: usize = 10;

/// A class index in `[0, NUM_CLASSES)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// The class index.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The digit value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Digit {
    type Error = SketchError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(v) if usize::from(v) < NUM_CLASSES => Ok(Self(v)),
            _ => Err(SketchError::InvalidPrediction(format!(
                "digit {value} outside 0..{NUM_CLASSES}"
            ))),
        }
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One probability per class, in class order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Probabilities([f64; NUM_CLASSES]);

impl Probabilities {
    /// All-zero vector, used before any prediction and when the service
    /// omits probabilities.
    #[must_use]
    pub fn zeros() -> Self {
        Self([0.0; NUM_CLASSES])
    }

    /// Build from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::InvalidPrediction`] if the slice does not hold
    /// exactly [`NUM_CLASSES`] finite values.
    pub fn from_slice(values: &[f64]) -> SketchResult<Self> {
        let array: [f64; NUM_CLASSES] = values.try_into().map_err(|_| {
            SketchError::InvalidPrediction(format!(
                "expected {NUM_CLASSES} probabilities, got {}",
                values.len()
            ))
        })?;

        if let Some(pos) = array.iter().position(|p| !p.is_finite()) {
            return Err(SketchError::InvalidPrediction(format!(
                "probability {pos} is not finite"
            )));
        }

        Ok(Self(array))
    }

    /// Probability for a class, `0.0` when out of range.
    #[must_use]
    pub fn get(&self, class: usize) -> f64 {
        self.0.get(class).copied().unwrap_or(0.0)
    }

    /// Iterate in class order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// Sum of all entries (ideally close to 1).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Default for Probabilities {
    fn default() -> Self {
        Self::zeros()
    }
}

/// The service's answer for one drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Winning class.
    pub digit: Digit,
    /// Per-class probabilities, if the service sent them.
    pub probabilities: Option<Probabilities>,
}

impl PredictionResult {
    /// Validate raw response fields.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::InvalidPrediction`] if the digit is out of
    /// range or the probability vector has the wrong shape.
    pub fn new(digit: i64, probabilities: Option<&[f64]>) -> SketchResult<Self> {
        let digit = Digit::try_from(digit)?;
        let probabilities = probabilities.map(Probabilities::from_slice).transpose()?;

        if let Some(p) = &probabilities {
            let total = p.total();
            if (total - 1.0).abs() > 0.05 {
                tracing::debug!("Probabilities for digit {digit} sum to {total:.3}");
            }
        }

        Ok(Self {
            digit,
            probabilities,
        })
    }

    /// Probabilities, or all zeros when absent.
    #[must_use]
    pub fn probabilities_or_zero(&self) -> Probabilities {
        self.probabilities.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_range() {
        assert_eq!(Digit::try_from(0).expect("zero").value(), 0);
        assert_eq!(Digit::try_from(9).expect("nine").index(), 9);
        assert!(Digit::try_from(10).is_err());
        assert!(Digit::try_from(-1).is_err());
        assert!(Digit::try_from(i64::MAX).is_err());
    }

    #[test]
    fn probabilities_length_is_enforced() {
        assert!(Probabilities::from_slice(&[0.1; 9]).is_err());
        assert!(Probabilities::from_slice(&[0.1; 11]).is_err());
        assert!(Probabilities::from_slice(&[0.1; NUM_CLASSES]).is_ok());
    }

    #[test]
    fn probabilities_must_be_finite() {
        let mut values = [0.0; NUM_CLASSES];
        values[4] = f64::NAN;
        assert!(Probabilities::from_slice(&values).is_err());
    }

    #[test]
    fn absent_probabilities_are_zero() {
        let result = PredictionResult::new(3, None).expect("valid");
        assert!(result.probabilities.is_none());
        assert!(result.probabilities_or_zero().iter().all(|p| p == 0.0));
    }

    #[test]
    fn digit_serializes_as_number() {
        let result = PredictionResult::new(7, None).expect("valid");
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["digit"], 7);
        assert!(json["probabilities"].is_null());
    }

    #[test]
    fn digit_deserializes_with_range_check() {
        let ok: Digit = serde_json::from_str("4").expect("in range");
        assert_eq!(ok.value(), 4);
        assert!(serde_json::from_str::<Digit>("12").is_err());
    }
}
