use serde::Deserialize;
use std::path::Path;

use super::form::{FEATURE_COLUMNS, FeatureRecord};
use crate::error::ModelError;

/// A loaded survival model. Implementations are immutable after load.
pub trait TabularModel: Send + Sync {
    fn predict(&self, record: &FeatureRecord) -> Result<i64, ModelError>;
}

/// Binary linear classifier exported as JSON:
///
/// ```json
/// {"columns": ["Age", "C", ...], "coefficients": [...], "intercept": -0.4, "classes": [0, 1]}
/// ```
///
/// Predicts `classes[1]` when the decision value is positive, which is the
/// rule a fitted logistic regression applies.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub columns: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

impl LinearModel {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: LinearModel = serde_json::from_str(&raw).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.columns != FEATURE_COLUMNS {
            return Err(ModelError::ColumnMismatch {
                expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: self.columns.clone(),
            });
        }
        if self.coefficients.len() != FEATURE_COLUMNS.len() {
            return Err(ModelError::Invalid(format!(
                "expected {} coefficients, found {}",
                FEATURE_COLUMNS.len(),
                self.coefficients.len()
            )));
        }
        if self.classes.len() != 2 {
            return Err(ModelError::Invalid(format!(
                "expected 2 classes, found {}",
                self.classes.len()
            )));
        }
        Ok(())
    }

    pub fn decision_value(&self, record: &FeatureRecord) -> f64 {
        record
            .to_vector()
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| *x as f64 * w)
            .sum::<f64>()
            + self.intercept
    }
}

impl TabularModel for LinearModel {
    fn predict(&self, record: &FeatureRecord) -> Result<i64, ModelError> {
        let class = if self.decision_value(record) > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        };
        Ok(class)
    }
}

/// Picks a backend from the artifact extension: `.json` for the linear
/// model, `.pt` for TorchScript (torch builds only).
pub fn load(path: &Path) -> Result<Box<dyn TabularModel>, ModelError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(LinearModel::from_file(path)?)),
        #[cfg(feature = "torch")]
        Some("pt") => Ok(Box::new(crate::torch::TorchScriptTabular::load(path)?)),
        #[cfg(not(feature = "torch"))]
        Some("pt") => Err(ModelError::BackendUnavailable(
            "TorchScript models need the `torch` feature".into(),
        )),
        _ => Err(ModelError::Unsupported(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::form::TitanicForm;
    use std::io::Write;
    use tempfile::Builder;

    fn survival_model() -> LinearModel {
        LinearModel {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            // Women and first class survive, men in third class do not.
            coefficients: vec![-0.02, 0.3, 0.003, -0.1, -0.9, 0.1, -0.3, -0.3, 1.3, -1.3],
            intercept: 2.0,
            classes: vec![0, 1],
        }
    }

    #[test]
    fn predicts_one_of_the_two_classes() {
        let model = survival_model();
        let man = TitanicForm {
            age: 34.0,
            pclass: 3,
            fare: 7.8292,
            ..Default::default()
        };
        let woman = TitanicForm {
            age: 29.0,
            pclass: 1,
            fare: 80.0,
            sex: shared::Sex::Female,
            ..Default::default()
        };

        assert_eq!(model.predict(&man.feature_record()).unwrap(), 0);
        assert_eq!(model.predict(&woman.feature_record()).unwrap(), 1);
    }

    #[test]
    fn loads_json_artifact() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"columns": ["Age","C","Fare","Parch","Pclass","Q","S","SibSp","female","male"],
                "coefficients": [0,0,0,0,0,0,0,0,1,0], "intercept": -0.5}}"#
        )
        .unwrap();

        let model = load(file.path()).unwrap();
        let record = TitanicForm::default().feature_record();
        assert_eq!(model.predict(&record).unwrap(), 0);
    }

    #[test]
    fn bundled_sample_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../models/titanic.json");
        let model = load(&path).unwrap();
        let man = TitanicForm {
            age: 34.0,
            pclass: 3,
            fare: 7.8292,
            ..Default::default()
        };
        assert_eq!(model.predict(&man.feature_record()).unwrap(), 0);
    }

    #[test]
    fn rejects_reordered_columns() {
        let mut model = survival_model();
        model.columns.swap(0, 1);
        assert!(matches!(
            model.validate(),
            Err(ModelError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(
            load(Path::new("titanic.pkl")),
            Err(ModelError::Unsupported(_))
        ));
    }
}
