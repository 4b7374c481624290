use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spam_detector::{ArtifactStore, Config, Effect, Form, FormEvent, SpamDetector, Trainer};

const SAMPLES: [&str; 2] = [
    "Congratulations! You've won a free ticket!",
    "Hey, are we meeting tomorrow?",
];

#[derive(Parser)]
#[command(name = "spam-detector", version, about = "Spam/ham classifier over TF-IDF features")]
struct Cli {
    /// Labelled CSV dataset (columns v1/label and v2/text)
    #[arg(long, env = "SPAM_DATASET", global = true)]
    dataset: Option<PathBuf>,

    /// Where the fitted classifier is stored
    #[arg(long, env = "SPAM_MODEL", global = true)]
    model: Option<PathBuf>,

    /// Where the fitted vectorizer is stored
    #[arg(long, env = "SPAM_VECTORIZER", global = true)]
    vectorizer: Option<PathBuf>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, global = true)]
    test_ratio: Option<f64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive form (default)
    Shell,
    /// Train, print the evaluation, save artifacts, show sample predictions
    Evaluate,
    /// Label the given messages
    Predict {
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(path) = &self.dataset {
            config.dataset_path = path.clone();
        }
        if let Some(path) = &self.model {
            config.model_path = path.clone();
        }
        if let Some(path) = &self.vectorizer {
            config.vectorizer_path = path.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(ratio) = self.test_ratio {
            config.test_ratio = ratio;
        }
        config
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();

    let result = match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => shell(&config),
        Command::Evaluate => evaluate(&config),
        Command::Predict { texts } => predict(&config, &texts),
    };

    if let Err(err) = result {
        dialog("❌ Error", &format!("{err:#}"));
        std::process::exit(1);
    }
}

fn evaluate(config: &Config) -> Result<()> {
    println!("🧠 Training model from {:?}...", config.dataset_path);
    let outcome = Trainer::new(config.clone())
        .train()
        .context("training failed")?;

    if outcome.dropped > 0 {
        println!("🗑️  Dropped {} unusable rows", outcome.dropped);
    }
    println!(
        "📊 Trained on {} messages, tested on {}, {} terms in the vocabulary\n",
        outcome.train_size,
        outcome.test_size,
        outcome.detector.vectorizer().vocabulary_len()
    );
    println!("{}\n", outcome.evaluation);

    outcome
        .detector
        .save(&ArtifactStore::from_config(config))
        .context("could not save the artifacts")?;
    println!(
        "💾 Model and vectorizer saved as {:?} & {:?}",
        config.model_path, config.vectorizer_path
    );

    println!("\nExamples:");
    for text in SAMPLES {
        println!("{text:>45} → {}", outcome.detector.predict_label(text));
    }
    Ok(())
}

fn predict(config: &Config, texts: &[String]) -> Result<()> {
    let detector = SpamDetector::load_or_train(config).context("could not load the model")?;
    for text in texts {
        println!("{} {text}", detector.predict_label(text));
    }
    Ok(())
}

fn shell(config: &Config) -> Result<()> {
    let detector = SpamDetector::load_or_train(config).context("could not load the model")?;
    let mut form = Form::new(detector);

    println!("📨 Spam Detector");
    println!("Type a message and press Enter to check it. :clear resets, :quit exits.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;

        let command = line.trim().to_string();
        let events = match command.as_str() {
            ":quit" | ":q" | "exit" => break,
            ":check" => vec![FormEvent::Check],
            ":clear" => vec![FormEvent::Clear],
            _ => vec![FormEvent::Input(line), FormEvent::Check],
        };

        for event in events {
            match form.handle(event) {
                Effect::WarnInputRequired => dialog("⚠️ Input required", "Please type a message to check."),
                Effect::ShowResult(_) => println!("{}", form.badge()),
                Effect::Cleared => println!("🧹 Cleared"),
                Effect::None => {}
            }
        }
    }
    Ok(())
}

fn dialog(title: &str, body: &str) {
    let width = title.chars().count().max(body.chars().count()) + 2;
    eprintln!("┌{}┐", "─".repeat(width));
    eprintln!("│ {title:<w$} │", w = width - 2);
    eprintln!("│ {body:<w$} │", w = width - 2);
    eprintln!("└{}┘", "─".repeat(width));
}
