use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use rmp_serde::{decode::from_read, encode::write_named};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, SpamError};
use crate::svm::LinearSvc;
use crate::vectorizer::TfidfVectorizer;

const FORMAT_VERSION: u32 = 1;
const MODEL_KIND: &str = "linear-svc";
const VECTORIZER_KIND: &str = "tfidf-vectorizer";

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format_version: u32,
    kind: &'a str,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    format_version: u32,
    kind: String,
    payload: T,
}

/// On-disk home of the fitted model and vectorizer, always used as a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    model_path: PathBuf,
    vectorizer_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_path: impl Into<PathBuf>, vectorizer_path: impl Into<PathBuf>) -> Self {
        ArtifactStore {
            model_path: model_path.into(),
            vectorizer_path: vectorizer_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ArtifactStore::new(&config.model_path, &config.vectorizer_path)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn vectorizer_path(&self) -> &Path {
        &self.vectorizer_path
    }

    /// True only when both files are present.
    pub fn exists(&self) -> bool {
        self.model_path.exists() && self.vectorizer_path.exists()
    }

    pub fn save(&self, model: &LinearSvc, vectorizer: &TfidfVectorizer) -> Result<()> {
        write_artifact(&self.model_path, MODEL_KIND, model)?;
        write_artifact(&self.vectorizer_path, VECTORIZER_KIND, vectorizer)?;
        info!(
            "Saved artifacts to {:?} and {:?}",
            self.model_path, self.vectorizer_path
        );
        Ok(())
    }

    pub fn load(&self) -> Result<(LinearSvc, TfidfVectorizer)> {
        let model: LinearSvc = read_artifact(&self.model_path, MODEL_KIND)?;
        let vectorizer: TfidfVectorizer = read_artifact(&self.vectorizer_path, VECTORIZER_KIND)?;

        if model.dim() != vectorizer.vocabulary_len() {
            return Err(SpamError::ArtifactCorrupt {
                path: self.model_path.clone(),
                reason: format!(
                    "model expects {} features but vectorizer has {} terms",
                    model.dim(),
                    vectorizer.vocabulary_len()
                ),
            });
        }

        info!("Loaded artifacts from {:?} and {:?}", self.model_path, self.vectorizer_path);
        Ok((model, vectorizer))
    }

    /// Deletes whichever of the two files exist.
    pub fn remove(&self) -> Result<()> {
        for path in [&self.model_path, &self.vectorizer_path] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

fn write_artifact<T: Serialize>(path: &Path, kind: &str, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        kind,
        payload,
    };
    write_named(&mut writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    if !path.exists() {
        return Err(SpamError::ArtifactMissing(path.to_path_buf()));
    }
    let corrupt = |reason: String| SpamError::ArtifactCorrupt {
        path: path.to_path_buf(),
        reason,
    };

    let reader = BufReader::new(File::open(path)?);
    let envelope: Envelope<T> = from_read(reader).map_err(|e| corrupt(e.to_string()))?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} is not supported (expected {FORMAT_VERSION})",
            envelope.format_version
        )));
    }
    if envelope.kind != kind {
        return Err(corrupt(format!("expected a {kind} artifact, found {}", envelope.kind)));
    }
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label;
    use crate::svm::LinearSvcParams;
    use crate::vectorizer::VectorizerParams;
    use linfa::dataset::DatasetBase;
    use linfa::traits::Fit;
    use ndarray::Array1;

    fn fit_with(params: VectorizerParams) -> (LinearSvc, TfidfVectorizer) {
        let texts = [
            "win a free prize now",
            "free prize claim today",
            "lunch at noon today",
            "see you at lunch",
        ];
        let labels = Array1::from(vec![Label::Spam, Label::Spam, Label::Ham, Label::Ham]);
        let vectorizer = TfidfVectorizer::fit(&texts, params).unwrap();
        let data = DatasetBase::new(vectorizer.transform(&texts), labels);
        let model = LinearSvcParams::default().fit(&data).unwrap();
        (model, vectorizer)
    }

    fn fitted() -> (LinearSvc, TfidfVectorizer) {
        fit_with(VectorizerParams::default())
    }

    #[test]
    fn save_then_load_restores_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("m/model.msgpack"), dir.path().join("v.msgpack"));
        let (model, vectorizer) = fitted();

        assert!(!store.exists());
        store.save(&model, &vectorizer).unwrap();
        assert!(store.exists());

        let (m, v) = store.load().unwrap();
        assert_eq!(m, model);
        assert_eq!(v, vectorizer);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.msgpack"), dir.path().join("v.msgpack"));
        let (model, vectorizer) = fitted();
        store.save(&model, &vectorizer).unwrap();
        fs::remove_file(store.vectorizer_path()).unwrap();

        assert!(matches!(store.load(), Err(SpamError::ArtifactMissing(_))));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.msgpack"), dir.path().join("v.msgpack"));
        fs::write(store.model_path(), b"not messagepack").unwrap();
        fs::write(store.vectorizer_path(), b"nor this").unwrap();

        assert!(matches!(store.load(), Err(SpamError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn swapped_files_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.msgpack");
        let b = dir.path().join("b.msgpack");
        let (model, vectorizer) = fitted();
        ArtifactStore::new(&a, &b).save(&model, &vectorizer).unwrap();

        let swapped = ArtifactStore::new(&b, &a);
        assert!(matches!(swapped.load(), Err(SpamError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn pair_from_different_fits_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.msgpack"), dir.path().join("v.msgpack"));
        let (model, _) = fitted();
        let (_, wider) = fit_with(VectorizerParams {
            min_df: 1,
            ..VectorizerParams::default()
        });
        assert_ne!(model.dim(), wider.vocabulary_len());

        store.save(&model, &wider).unwrap();
        match store.load() {
            Err(SpamError::ArtifactCorrupt { path, reason }) => {
                assert_eq!(path, store.model_path());
                assert!(reason.contains("features"));
            }
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn unknown_format_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.msgpack"), dir.path().join("v.msgpack"));
        let (model, vectorizer) = fitted();
        store.save(&model, &vectorizer).unwrap();

        let mut file = BufWriter::new(File::create(store.model_path()).unwrap());
        let future = EnvelopeRef {
            format_version: 2,
            kind: MODEL_KIND,
            payload: &model,
        };
        write_named(&mut file, &future).unwrap();
        file.flush().unwrap();
        drop(file);

        match store.load() {
            Err(SpamError::ArtifactCorrupt { path, reason }) => {
                assert_eq!(path, store.model_path());
                assert!(reason.contains("format version 2"));
            }
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn remove_deletes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("model.msgpack"), dir.path().join("v.msgpack"));
        let (model, vectorizer) = fitted();
        store.save(&model, &vectorizer).unwrap();
        store.remove().unwrap();
        assert!(!store.model_path().exists());
        assert!(!store.vectorizer_path().exists());
        store.remove().unwrap();
    }
}
