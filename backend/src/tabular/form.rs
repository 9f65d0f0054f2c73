use shared::{Embarked, Sex};
use std::collections::HashMap;
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Column order the survival model was trained with.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "Age", "C", "Fare", "Parch", "Pclass", "Q", "S", "SibSp", "female", "male",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Invalid value {value:?} for field {field}: {reason}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Typed view of the `/predict_web` submission.
///
/// Numeric fields default to zero when absent or blank. Embarkation ports
/// are checkboxes, so any subset may be present. Sex is a radio: `female`
/// present selects `Female`, anything else is `Male`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitanicForm {
    pub age: f64,
    pub pclass: i64,
    pub fare: f64,
    pub parch: i64,
    pub sib_sp: i64,
    pub embarked: Vec<Embarked>,
    pub sex: Sex,
}

impl TitanicForm {
    /// Only key presence matters for the categorical fields; their
    /// submitted values are ignored.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FormError> {
        let embarked = Embarked::iter()
            .filter(|port| fields.contains_key(port.column()))
            .collect();

        let sex = if fields.contains_key(Sex::Female.column()) {
            Sex::Female
        } else {
            Sex::Male
        };

        Ok(Self {
            age: parse_number(fields, "Age")?,
            pclass: parse_number(fields, "Pclass")?,
            fare: parse_number(fields, "Fare")?,
            parch: parse_number(fields, "Parch")?,
            sib_sp: parse_number(fields, "SibSp")?,
            embarked,
            sex,
        })
    }

    pub fn feature_record(&self) -> FeatureRecord {
        FeatureRecord {
            age: self.age,
            c: self.embarked.contains(&Embarked::Cherbourg),
            fare: self.fare,
            parch: self.parch,
            pclass: self.pclass,
            q: self.embarked.contains(&Embarked::Queenstown),
            s: self.embarked.contains(&Embarked::Southampton),
            sib_sp: self.sib_sp,
            female: self.sex == Sex::Female,
            male: self.sex == Sex::Male,
        }
    }
}

fn parse_number<T>(fields: &HashMap<String, String>, field: &'static str) -> Result<T, FormError>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    match fields.get(field).map(|v| v.trim()) {
        None | Some("") => Ok(T::default()),
        Some(raw) => raw.parse().map_err(|e: T::Err| FormError::InvalidNumber {
            field,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Single model input row, fields declared in `FEATURE_COLUMNS` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    pub age: f64,
    pub c: bool,
    pub fare: f64,
    pub parch: i64,
    pub pclass: i64,
    pub q: bool,
    pub s: bool,
    pub sib_sp: i64,
    pub female: bool,
    pub male: bool,
}

impl FeatureRecord {
    /// Numeric encoding handed to the model. Flags become 0.0 / 1.0.
    pub fn to_vector(&self) -> [f32; 10] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.age as f32,
            flag(self.c),
            self.fare as f32,
            self.parch as f32,
            self.pclass as f32,
            flag(self.q),
            flag(self.s),
            self.sib_sp as f32,
            flag(self.female),
            flag(self.male),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_form_submission() {
        let form = TitanicForm::from_fields(&fields(&[
            ("Age", "34"),
            ("Pclass", "3"),
            ("Fare", "7.8292"),
            ("Parch", "0"),
            ("SibSp", "0"),
            ("Q", "on"),
        ]))
        .unwrap();

        let record = form.feature_record();
        assert_eq!(
            record,
            FeatureRecord {
                age: 34.0,
                c: false,
                fare: 7.8292,
                parch: 0,
                pclass: 3,
                q: true,
                s: false,
                sib_sp: 0,
                female: false,
                male: true,
            }
        );
        let expected: [f32; 10] = [34.0, 0.0, 7.8292, 0.0, 3.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(record.to_vector(), expected);
    }

    #[test]
    fn absent_fields_default_to_zero_and_false() {
        let record = TitanicForm::from_fields(&HashMap::new())
            .unwrap()
            .feature_record();
        assert_eq!(record.age, 0.0);
        assert_eq!(record.pclass, 0);
        assert!(!record.c && !record.q && !record.s && !record.female);
    }

    #[test]
    fn presence_not_value_sets_flags() {
        let record = TitanicForm::from_fields(&fields(&[
            ("C", ""),
            ("S", "off"),
            ("female", "0"),
        ]))
        .unwrap()
        .feature_record();
        assert!(record.c && record.s && !record.q);
        assert!(record.female && !record.male);
    }

    #[test]
    fn blank_numbers_count_as_absent() {
        let form = TitanicForm::from_fields(&fields(&[("Age", "  "), ("Fare", " 12.5 ")])).unwrap();
        assert_eq!(form.age, 0.0);
        assert_eq!(form.fare, 12.5);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = TitanicForm::from_fields(&fields(&[("Pclass", "first")])).unwrap_err();
        assert!(matches!(
            err,
            FormError::InvalidNumber { field: "Pclass", ref value, .. } if value == "first"
        ));
    }

    #[test]
    fn integer_fields_reject_decimals() {
        assert!(TitanicForm::from_fields(&fields(&[("Parch", "1.5")])).is_err());
    }
}
