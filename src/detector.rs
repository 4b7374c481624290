use log::info;

use crate::config::Config;
use crate::dataset::Label;
use crate::error::{Result, SpamError};
use crate::store::ArtifactStore;
use crate::svm::LinearSvc;
use crate::trainer::Trainer;
use crate::vectorizer::TfidfVectorizer;

/// Fitted vectorizer and classifier, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamDetector {
    model: LinearSvc,
    vectorizer: TfidfVectorizer,
}

impl SpamDetector {
    pub fn new(model: LinearSvc, vectorizer: TfidfVectorizer) -> Self {
        SpamDetector { model, vectorizer }
    }

    /// Loads the stored pair, or trains from the dataset when either file is absent.
    ///
    /// Corrupt artifacts are an error; they never trigger a retrain.
    pub fn load_or_train(config: &Config) -> Result<Self> {
        let store = ArtifactStore::from_config(config);
        if store.exists() {
            info!("📦 Loading model from {:?}", store.model_path());
            let (model, vectorizer) = store.load()?;
            return Ok(SpamDetector::new(model, vectorizer));
        }

        if !config.dataset_path.exists() {
            return Err(SpamError::DatasetNotFound(config.dataset_path.clone()));
        }
        info!("🧠 Artifacts missing, training from {:?}", config.dataset_path);
        let outcome = Trainer::new(config.clone()).run()?;
        Ok(outcome.detector)
    }

    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let (model, vectorizer) = store.load()?;
        Ok(SpamDetector::new(model, vectorizer))
    }

    pub fn save(&self, store: &ArtifactStore) -> Result<()> {
        store.save(&self.model, &self.vectorizer)
    }

    pub fn predict_label(&self, text: &str) -> Label {
        self.model.predict(&self.vectorizer.transform_one(text))
    }

    /// Signed distance to the separating hyperplane; positive leans spam.
    pub fn decision_score(&self, text: &str) -> f64 {
        self.model.decision_function(&self.vectorizer.transform_one(text))
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }
}
