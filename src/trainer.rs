use linfa::dataset::DatasetBase;
use linfa::traits::Fit;
use log::{debug, info};
use ndarray::Array1;

use crate::config::Config;
use crate::dataset::{Label, Message, load_dataset, stratified_split};
use crate::detector::SpamDetector;
use crate::error::Result;
use crate::metrics::Evaluation;
use crate::store::ArtifactStore;
use crate::svm::{LinearSvc, LinearSvcParams};
use crate::vectorizer::{TfidfVectorizer, VectorizerParams};

/// Everything a training run produces besides the files on disk.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub detector: SpamDetector,
    pub evaluation: Evaluation,
    pub train_size: usize,
    pub test_size: usize,
    pub dropped: usize,
}

/// One-shot batch job: load, split, fit, evaluate, persist.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: Config,
}

impl Trainer {
    pub fn new(config: Config) -> Self {
        Trainer { config }
    }

    /// Trains and evaluates without touching the artifact files.
    pub fn train(&self) -> Result<TrainingOutcome> {
        let config = &self.config;
        config.validate()?;

        info!("Loading dataset from {:?}", config.dataset_path);
        let dataset = load_dataset(&config.dataset_path)?;
        let split = stratified_split(&dataset.messages, config.test_ratio, config.seed);
        debug!("Split into {} train / {} test", split.train.len(), split.test.len());

        let (detector, evaluation) = self.fit_and_evaluate(&split.train, &split.test)?;
        info!("Held-out accuracy {:.4}", evaluation.accuracy());

        Ok(TrainingOutcome {
            detector,
            evaluation,
            train_size: split.train.len(),
            test_size: split.test.len(),
            dropped: dataset.dropped,
        })
    }

    /// Trains, then persists both artifacts. Any error aborts before anything is written.
    pub fn run(&self) -> Result<TrainingOutcome> {
        let outcome = self.train()?;
        outcome.detector.save(&ArtifactStore::from_config(&self.config))?;
        Ok(outcome)
    }

    /// Fits the vectorizer on `train` only, then the classifier, and scores `test`.
    pub fn fit_and_evaluate(&self, train: &[Message], test: &[Message]) -> Result<(SpamDetector, Evaluation)> {
        let vectorizer = TfidfVectorizer::fit(
            &texts(train),
            VectorizerParams {
                min_df: self.config.min_df,
                ngram_range: self.config.ngram_range,
            },
        )?;

        info!("Training linear SVM on {} messages", train.len());
        let data = DatasetBase::new(vectorizer.transform(&texts(train)), labels(train));
        let model: LinearSvc = LinearSvcParams::default().c(self.config.svm_c).fit(&data)?;

        let truth = labels(test);
        let predicted = model.predict_all(&vectorizer.transform(&texts(test)));
        let evaluation = Evaluation::new(&truth, &predicted);

        Ok((SpamDetector::new(model, vectorizer), evaluation))
    }
}

fn texts(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.text.as_str()).collect()
}

fn labels(messages: &[Message]) -> Array1<Label> {
    messages.iter().map(|m| m.label).collect()
}
