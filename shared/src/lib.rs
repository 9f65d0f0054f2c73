use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub ok: bool,
    pub filename: String,
    pub prediction: String,
    pub confidence: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// Port of embarkation. The string form is the one-hot column name the
/// survival model was trained with.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display, EnumString,
    IntoStaticStr,
)]
pub enum Embarked {
    #[strum(serialize = "C")]
    Cherbourg,
    #[strum(serialize = "Q")]
    Queenstown,
    #[strum(serialize = "S")]
    Southampton,
}

impl Embarked {
    pub fn column(self) -> &'static str {
        self.into()
    }
}

/// Passenger sex, encoded as the `female` / `male` one-hot columns.
/// `Male` is the default to mirror the pre-checked radio on the form.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, Display, EnumString,
    IntoStaticStr,
)]
pub enum Sex {
    #[strum(serialize = "female")]
    Female,
    #[default]
    #[strum(serialize = "male")]
    Male,
}

impl Sex {
    pub fn column(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn embarked_columns_follow_training_names() {
        let columns: Vec<String> = Embarked::iter().map(|p| p.to_string()).collect();
        assert_eq!(columns, vec!["C", "Q", "S"]);
        assert_eq!(Embarked::from_str("Q").unwrap(), Embarked::Queenstown);
    }

    #[test]
    fn sex_defaults_to_male() {
        assert_eq!(Sex::default(), Sex::Male);
        assert_eq!(Sex::Female.column(), "female");
    }
}
