use std::fmt;

use linfa::dataset::Labels;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::dataset::Label;

/// 2×2 confusion matrix, rows are the true label and columns the prediction,
/// both in ham/spam order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Tallies the predictions made for each true class.
    pub fn new(truth: &Array1<Label>, predicted: &Array1<Label>) -> Self {
        let mut counts = [[0; 2]; 2];
        for actual in Label::ALL {
            let row: Array1<Label> = truth
                .iter()
                .zip(predicted.iter())
                .filter(|(t, _)| **t == actual)
                .map(|(_, p)| *p)
                .collect();
            let tally = row.label_count().pop().unwrap_or_default();
            for guess in Label::ALL {
                counts[actual.as_index()][guess.as_index()] = tally.get(&guess).copied().unwrap_or(0);
            }
        }
        ConfusionMatrix { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    pub fn class_metrics(&self, label: Label) -> ClassMetrics {
        let k = label.as_index();
        let tp = self.counts[k][k];
        let predicted = self.counts[0][k] + self.counts[1][k];
        let support = self.counts[k][0] + self.counts[k][1];

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassMetrics {
            label,
            precision,
            recall,
            f1,
            support,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub per_class: [ClassMetrics; 2],
}

impl Evaluation {
    pub fn new(truth: &Array1<Label>, predicted: &Array1<Label>) -> Self {
        let confusion = ConfusionMatrix::new(truth, predicted);
        let per_class = Label::ALL.map(|l| confusion.class_metrics(l));
        Evaluation {
            confusion,
            per_class,
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    /// Unweighted mean of precision, recall and F1 over both classes.
    pub fn macro_avg(&self) -> (f64, f64, f64) {
        let n = self.per_class.len() as f64;
        let sum = self
            .per_class
            .iter()
            .fold((0.0, 0.0, 0.0), |acc, m| (acc.0 + m.precision, acc.1 + m.recall, acc.2 + m.f1));
        (sum.0 / n, sum.1 / n, sum.2 / n)
    }

    /// Support-weighted mean of precision, recall and F1.
    pub fn weighted_avg(&self) -> (f64, f64, f64) {
        let total = self.confusion.total();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let total = total as f64;
        self.per_class.iter().fold((0.0, 0.0, 0.0), |acc, m| {
            let w = m.support as f64 / total;
            (acc.0 + w * m.precision, acc.1 + w * m.recall, acc.2 + w * m.f1)
        })
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.confusion.total();

        writeln!(f, "Accuracy: {:.4}", self.accuracy())?;
        writeln!(f)?;
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label.display_name(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>14} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy(), total)?;
        let (p, r, f1) = self.macro_avg();
        writeln!(f, "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}", "macro avg", p, r, f1, total)?;
        let (p, r, f1) = self.weighted_avg();
        writeln!(f, "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}", "weighted avg", p, r, f1, total)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        let [[tn, fp], [fn_, tp]] = self.confusion.counts;
        writeln!(f, "[[{tn:>5} {fp:>5}]")?;
        write!(f, " [{fn_:>5} {tp:>5}]]")
    }
}
