use serde::{Deserialize, Serialize};

/// One candidate label and its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassifyRequest<'a> {
    pub inputs: ClassifyInputs<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassifyInputs<'a> {
    pub image: &'a str,
    pub candidate_labels: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParallelScores {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

/// Zero-shot image classification responses come in three shapes depending
/// on the model and router version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ClassifyResponse {
    /// `{"labels": [...], "scores": [...]}`
    Parallel(ParallelScores),
    /// `[{"labels": [...], "scores": [...]}]`
    Batch(Vec<ParallelScores>),
    /// `[{"label": "...", "score": 0.9}, ...]`
    Ranked(Vec<LabelScore>),
}

impl ClassifyResponse {
    /// Flattens to label/score pairs, highest score first.
    pub(crate) fn into_ranked(self) -> Vec<LabelScore> {
        let mut ranked = match self {
            Self::Parallel(p) => zip_scores(p),
            Self::Batch(batch) => batch.into_iter().next().map(zip_scores).unwrap_or_default(),
            Self::Ranked(r) => r,
        };
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

fn zip_scores(p: ParallelScores) -> Vec<LabelScore> {
    p.labels
        .into_iter()
        .zip(p.scores)
        .map(|(label, score)| LabelScore { label, score })
        .collect()
}
