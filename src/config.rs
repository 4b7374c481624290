use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamError};

/// Paths and hyperparameters shared by the trainer, the store and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    /// Fraction of each class held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the stratified split and the solver's coordinate order.
    pub seed: u64,
    /// Minimum number of training documents a term must appear in.
    pub min_df: usize,
    /// Inclusive n-gram range, `(1, 2)` is unigrams plus bigrams.
    pub ngram_range: (usize, usize),
    /// Soft-margin penalty of the linear SVM.
    pub svm_c: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dataset_path: PathBuf::from("spam.csv"),
            model_path: PathBuf::from("spam_model.msgpack"),
            vectorizer_path: PathBuf::from("vectorizer.msgpack"),
            test_ratio: 0.2,
            seed: 42,
            min_df: 2,
            ngram_range: (1, 2),
            svm_c: 1.0,
        }
    }
}

impl Config {
    /// Default hyperparameters with every file placed under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Config {
            dataset_path: dir.join("spam.csv"),
            model_path: dir.join("spam_model.msgpack"),
            vectorizer_path: dir.join("vectorizer.msgpack"),
            ..Config::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(SpamError::InvalidTraining(format!(
                "test ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.min_df == 0 {
            return Err(SpamError::InvalidTraining(
                "min_df must be at least 1".to_string(),
            ));
        }
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(SpamError::InvalidTraining(format!(
                "invalid n-gram range ({lo}, {hi})"
            )));
        }
        if !(self.svm_c > 0.0) {
            return Err(SpamError::InvalidTraining(format!(
                "svm C must be positive, got {}",
                self.svm_c
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ngram_range, (1, 2));
        assert_eq!(config.min_df, 2);
    }

    #[test]
    fn in_dir_places_all_files_under_dir() {
        let config = Config::in_dir("/tmp/spam");
        assert_eq!(config.dataset_path, PathBuf::from("/tmp/spam/spam.csv"));
        assert_eq!(config.model_path, PathBuf::from("/tmp/spam/spam_model.msgpack"));
        assert_eq!(
            config.vectorizer_path,
            PathBuf::from("/tmp/spam/vectorizer.msgpack")
        );
    }

    #[test]
    fn rejects_bad_hyperparameters() {
        let bad = [
            Config { test_ratio: 0.0, ..Config::default() },
            Config { test_ratio: 1.0, ..Config::default() },
            Config { min_df: 0, ..Config::default() },
            Config { ngram_range: (2, 1), ..Config::default() },
            Config { ngram_range: (0, 1), ..Config::default() },
            Config { svm_c: 0.0, ..Config::default() },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(SpamError::InvalidTraining(_))
            ));
        }
    }
}
