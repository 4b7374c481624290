use liblinear::util::TrainingInput;
use liblinear::{Builder, LibLinearModel, SolverType};
use linfa::dataset::{DatasetBase, Records};
use linfa::traits::{Fit, PredictInplace};
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::dataset::Label;
use crate::error::{Result, SpamError};
use crate::vectorizer::{FeatureMatrix, SparseVector};

/// Hyperparameters of the soft-margin linear SVM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvcParams {
    pub c: f64,
    pub tol: f64,
    pub fit_intercept: bool,
}

impl Default for LinearSvcParams {
    fn default() -> Self {
        LinearSvcParams {
            c: 1.0,
            tol: 1e-4,
            fit_intercept: true,
        }
    }
}

impl LinearSvcParams {
    pub fn c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    fn check(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(SpamError::InvalidTraining(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > 0.0) {
            return Err(SpamError::InvalidTraining(format!(
                "tolerance must be positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Fitted linear decision function `w·x + b`; positive means spam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvc {
    weights: Array1<f64>,
    intercept: f64,
}

impl LinearSvc {
    pub fn params() -> LinearSvcParams {
        LinearSvcParams::default()
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn decision_function(&self, x: &SparseVector) -> f64 {
        x.dot(&self.weights) + self.intercept
    }

    pub fn predict(&self, x: &SparseVector) -> Label {
        Label::from_decision(self.decision_function(x))
    }

    /// Labels every row of `x`.
    pub fn predict_all(&self, x: &FeatureMatrix) -> Array1<Label> {
        let mut y = self.default_target(x);
        self.predict_inplace(x, &mut y);
        y
    }
}

impl Fit<FeatureMatrix, Array1<Label>, SpamError> for LinearSvcParams {
    type Object = LinearSvc;

    /// Trains liblinear's L2-regularized squared-hinge dual solver and keeps
    /// the spam-side coefficients.
    fn fit(&self, dataset: &DatasetBase<FeatureMatrix, Array1<Label>>) -> Result<LinearSvc> {
        self.check()?;

        let x = &dataset.records;
        let y = &dataset.targets;
        if x.nsamples() != y.len() {
            return Err(SpamError::InvalidTraining(format!(
                "{} samples but {} targets",
                x.nsamples(),
                y.len()
            )));
        }
        if !Label::ALL.iter().all(|l| y.iter().any(|t| t == l)) {
            return Err(SpamError::InvalidTraining(
                "training data must contain both ham and spam".to_string(),
            ));
        }

        // liblinear feature indices start at 1
        let features: Vec<Vec<(u32, f64)>> = x
            .rows
            .iter()
            .map(|row| row.entries.iter().map(|&(i, v)| (i as u32 + 1, v)).collect())
            .collect();
        let labels: Vec<f64> = y.iter().map(|l| l.as_index() as f64).collect();
        let input = TrainingInput::from_sparse_features(labels, features)
            .map_err(|e| SpamError::InvalidTraining(e.to_string()))?;

        liblinear::toggle_liblinear_stdout_output(false);

        let mut builder = Builder::new();
        builder
            .problem()
            .input_data(input)
            .bias(if self.fit_intercept { 1.0 } else { -1.0 });
        builder
            .parameters()
            .solver_type(SolverType::L2R_L2LOSS_SVC_DUAL)
            .stopping_criterion(self.tol)
            .constraints_violation_cost(self.c);
        let model = builder
            .build_model()
            .map_err(|e| SpamError::InvalidTraining(e.to_string()))?;

        let spam = Label::Spam.as_index() as i32;
        let spam_idx = model
            .labels()
            .iter()
            .position(|&l| l == spam)
            .ok_or_else(|| SpamError::InvalidTraining("solver lost the spam class".to_string()))?
            as i32;

        let weights: Array1<f64> = (1..=x.nfeatures())
            .map(|j| model.feature_coefficient(j as i32, spam_idx))
            .collect();
        let intercept = if self.fit_intercept { model.label_bias(spam_idx) } else { 0.0 };

        debug!(
            "Linear SVM trained on {} samples, {} features, intercept {intercept:.4}",
            x.nsamples(),
            model.num_features()
        );

        Ok(LinearSvc { weights, intercept })
    }
}

impl PredictInplace<FeatureMatrix, Array1<Label>> for LinearSvc {
    fn predict_inplace(&self, x: &FeatureMatrix, y: &mut Array1<Label>) {
        assert_eq!(
            x.nsamples(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        for (row, target) in x.rows.iter().zip(y.iter_mut()) {
            *target = self.predict(row);
        }
    }

    fn default_target(&self, x: &FeatureMatrix) -> Array1<Label> {
        Array1::from_elem(x.nsamples(), Label::Ham)
    }
}
