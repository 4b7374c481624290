//! # spam-detector 📨🚫
//!
//! Label short messages as spam or ham with a linear SVM over TF-IDF features.
//!
//! Word unigrams and bigrams (English stop words removed, terms seen in at
//! least two training documents) are weighted with smoothed TF-IDF and fed to
//! a soft-margin linear SVM trained with `liblinear`, plugged into
//! [`linfa`]'s `Fit`/`PredictInplace` traits.
//!
//! ## Features
//! - CSV dataset loading with Latin-1 fallback and label normalization
//! - Stratified, seeded train/test split
//! - Accuracy, classification report and confusion matrix
//! - Model persistence with `rmp-serde` (MessagePack)
//! - Train-on-first-run bootstrap
//! - A toolkit-independent form state machine for interactive front-ends
//! - Benchmarkable with [Criterion](https://crates.io/crates/criterion)
//!
//! ## Example
//! ```no_run
//! use spam_detector::{Config, SpamDetector};
//! let detector = SpamDetector::load_or_train(&Config::default()).unwrap();
//! let label = detector.predict_label("Congratulations! You've won a free ticket!");
//! println!("Label: {label}");
//! ```

pub mod config;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod form;
pub mod metrics;
pub mod stop_words;
pub mod store;
pub mod svm;
pub mod trainer;
pub mod vectorizer;

pub use config::Config;
pub use dataset::{DatasetSplit, Label, LoadedDataset, Message, load_dataset, stratified_split};
pub use detector::SpamDetector;
pub use error::{Result, SpamError};
pub use form::{Badge, BadgeStyle, Classify, Effect, Form, FormEvent, FormState};
pub use metrics::{ClassMetrics, ConfusionMatrix, Evaluation};
pub use store::ArtifactStore;
pub use svm::{LinearSvc, LinearSvcParams};
pub use trainer::{Trainer, TrainingOutcome};
pub use vectorizer::{FeatureMatrix, SparseVector, TfidfVectorizer, VectorizerParams};
