use anyhow::{anyhow, bail, Result};
use rust_bert::pipelines::sequence_classification::SequenceClassificationModel;
use rust_bert::pipelines::zero_shot_classification::ZeroShotClassificationModel;
use rust_bert::RustBertError;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

use super::record::{Sentiment, SentimentRecord};
use crate::error::ScoringError;
use crate::settings::{Ml, MlModel};

/// Candidate labels offered to the zero-shot model.
pub const SENTIMENT_LABELS: [&str; 3] = ["positive", "negative", "neutral"];

const MAX_INPUT_TOKENS: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

pub enum MlRequest {
    Classify {
        text: String,
        response_tx: mpsc::Sender<Option<Prediction>>,
    },
}

/// Handle to the classification model, which lives on its own thread.
#[derive(Clone)]
pub struct MlHandle {
    request_tx: mpsc::Sender<MlRequest>,
}

impl MlHandle {
    /// Starts the worker and blocks until the model has loaded, failed to
    /// load, or the configured load timeout has passed.
    pub fn spawn(config: &Ml) -> Result<Self> {
        let load_timeout = Duration::from_secs(config.load_timeout_secs);
        let (request_tx, request_rx) = mpsc::channel::<MlRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let worker_config = config.clone();
        thread::Builder::new()
            .name("sentiment-ml".into())
            .spawn(move || run_ml_worker(worker_config, request_rx, ready_tx))?;

        match ready_rx.recv_timeout(load_timeout) {
            Ok(Ok(())) => Ok(Self { request_tx }),
            Ok(Err(e)) => Err(anyhow!("model failed to load: {e}")),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                bail!("model did not load within {}s", load_timeout.as_secs())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => bail!("model worker exited during load"),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_sender(request_tx: mpsc::Sender<MlRequest>) -> Self {
        Self { request_tx }
    }

    pub fn classify(&self, text: &str) -> Result<Prediction, ScoringError> {
        let (response_tx, response_rx) = mpsc::channel();

        self.request_tx
            .send(MlRequest::Classify {
                text: text.to_string(),
                response_tx,
            })
            .map_err(|_| ScoringError::WorkerGone)?;

        response_rx
            .recv()
            .map_err(|_| ScoringError::WorkerGone)?
            .ok_or(ScoringError::NoPrediction)
    }

    pub fn score(&self, text: &str) -> Result<SentimentRecord, ScoringError> {
        let prediction = self.classify(text)?;
        record_from_prediction(&prediction)
    }
}

enum SentimentModel {
    ZeroShot {
        model: ZeroShotClassificationModel,
        template: String,
    },
    Sst2(SequenceClassificationModel),
}

impl SentimentModel {
    fn load(config: &Ml) -> Result<Self, RustBertError> {
        Ok(match config.model {
            MlModel::ZeroShot => Self::ZeroShot {
                model: ZeroShotClassificationModel::new(Default::default())?,
                template: config.hypothesis_template.clone(),
            },
            MlModel::Sst2 => Self::Sst2(SequenceClassificationModel::new(Default::default())?),
        })
    }

    fn predict(&self, text: &str) -> Option<Prediction> {
        let label = match self {
            Self::ZeroShot { model, template } => {
                let template = template.clone();
                model
                    .predict(
                        [text],
                        SENTIMENT_LABELS,
                        Some(Box::new(move |label: &str| hypothesis(&template, label))),
                        MAX_INPUT_TOKENS,
                    )
                    .map_err(|e| error!(error = %e, "zero-shot prediction failed"))
                    .ok()?
                    .into_iter()
                    .next()
            }
            Self::Sst2(model) => model.predict([text]).into_iter().next(),
        };

        label.map(|label| Prediction {
            label: label.text,
            confidence: label.score,
        })
    }
}

fn hypothesis(template: &str, label: &str) -> String {
    template.replace("{}", label)
}

fn run_ml_worker(
    config: Ml,
    request_rx: mpsc::Receiver<MlRequest>,
    ready_tx: mpsc::Sender<Result<(), String>>,
) {
    info!(model = ?config.model, "loading sentiment model");
    let start = Instant::now();

    let model = match SentimentModel::load(&config) {
        Ok(model) => model,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };

    info!(
        elapsed_secs = start.elapsed().as_secs_f32(),
        "sentiment model loaded"
    );
    if ready_tx.send(Ok(())).is_err() {
        // Loader gave up waiting; nobody will ever send requests.
        return;
    }

    for request in request_rx {
        let MlRequest::Classify { text, response_tx } = request;

        let prediction = model.predict(&text);
        if prediction.is_none() {
            error!("classifier returned no label");
        }
        let _ = response_tx.send(prediction);
    }
}

/// Maps the model's label space onto the three sentiment classes.
pub fn map_label(label: &str) -> Option<Sentiment> {
    match label.to_uppercase().as_str() {
        "LABEL_0" | "NEGATIVE" => Some(Sentiment::Negative),
        "LABEL_1" | "NEUTRAL" => Some(Sentiment::Neutral),
        "LABEL_2" | "POSITIVE" => Some(Sentiment::Positive),
        _ => None,
    }
}

/// The losing classes share `1 - confidence` equally. This is not a
/// calibrated three-way distribution.
pub fn record_from_prediction(prediction: &Prediction) -> Result<SentimentRecord, ScoringError> {
    let sentiment = map_label(&prediction.label)
        .ok_or_else(|| ScoringError::UnknownLabel(prediction.label.clone()))?;
    if !prediction.confidence.is_finite() {
        return Err(ScoringError::NonFinite);
    }

    let confidence = prediction.confidence.clamp(0.0, 1.0);
    let remainder = (1.0 - confidence) / 2.0;
    let class_score = |class: Sentiment| {
        if class == sentiment {
            confidence
        } else {
            remainder
        }
    };

    Ok(SentimentRecord {
        sentiment,
        sentiment_score: confidence,
        positive_score: class_score(Sentiment::Positive),
        negative_score: class_score(Sentiment::Negative),
        neutral_score: class_score(Sentiment::Neutral),
    })
}
