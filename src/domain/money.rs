use {
    super::error::PipelineError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Integer minor-unit (cents) amount. Gateways deliver decimal currency as
/// floating point; everything past the normalizer works in cents only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Cents(i64);

impl Cents {
    pub fn new(cents: i64) -> Result<Self, PipelineError> {
        if cents < 0 {
            return Err(PipelineError::Normalization(format!(
                "monetary amount cannot be negative, got: {cents}"
            )));
        }
        Ok(Self(cents))
    }

    /// The one rounding rule for the whole pipeline: scale by 100 and round
    /// to the nearest cent. Ties resolve through the f64 representation of
    /// the input (10.005 arrives as 10.00499.., so it rounds down). Every
    /// gateway value goes through this same function.
    pub fn from_decimal(value: f64) -> Result<Self, PipelineError> {
        if !value.is_finite() {
            return Err(PipelineError::Normalization(format!(
                "monetary amount is not a finite number: {value}"
            )));
        }
        Self::new((value * 100.0).round() as i64)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Cents) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read an optional monetary field from gateway JSON. Accepts a JSON number
/// or a numeric string (both "19.90" and "19,90" occur in the wild).
/// Absent or null fields yield `Ok(None)`, never zero.
pub fn cents_from_json(value: Option<&serde_json::Value>) -> Result<Option<Cents>, PipelineError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| {
                PipelineError::Normalization(format!("monetary amount out of range: {n}"))
            })?;
            Cents::from_decimal(v).map(Some)
        }
        serde_json::Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            if normalized.is_empty() {
                return Ok(None);
            }
            let v: f64 = normalized.parse().map_err(|_| {
                PipelineError::Normalization(format!("unparseable monetary amount: '{s}'"))
            })?;
            Cents::from_decimal(v).map(Some)
        }
        other => Err(PipelineError::Normalization(format!(
            "unexpected monetary value: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_whole_decimals_exactly() {
        assert_eq!(Cents::from_decimal(19.9).unwrap().value(), 1990);
        assert_eq!(Cents::from_decimal(199.9).unwrap().value(), 19990);
        assert_eq!(Cents::from_decimal(100.0).unwrap().value(), 10000);
        assert_eq!(Cents::from_decimal(0.01).unwrap().value(), 1);
    }

    #[test]
    fn trailing_cent_edge_follows_f64_representation() {
        // 10.005 has no exact f64 form; it arrives as 10.00499.. and the
        // fixed rule rounds it to 1000, consistently on every delivery.
        assert_eq!(Cents::from_decimal(10.005).unwrap().value(), 1000);
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        assert!(Cents::from_decimal(-1.0).is_err());
        assert!(Cents::from_decimal(f64::NAN).is_err());
        assert!(Cents::from_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn parses_numeric_strings_with_either_separator() {
        let dot = serde_json::json!("19.90");
        let comma = serde_json::json!("19,90");
        assert_eq!(cents_from_json(Some(&dot)).unwrap().unwrap().value(), 1990);
        assert_eq!(cents_from_json(Some(&comma)).unwrap().unwrap().value(), 1990);
    }

    #[test]
    fn absent_and_null_are_none() {
        assert_eq!(cents_from_json(None).unwrap(), None);
        assert_eq!(
            cents_from_json(Some(&serde_json::Value::Null)).unwrap(),
            None
        );
    }
}
