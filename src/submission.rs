//! Outbound side of a quiz attempt: the submission payload and the sinks
//! that receive it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Answers given to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub answers: BTreeSet<String>,
}

/// Final record of one attempt, handed to the grading service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub attempt_id: Uuid,
    pub quiz_id: String,
    /// One entry per question, in quiz order.
    pub answers: Vec<AnsweredQuestion>,
    pub time_spent_seconds: u64,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write submission to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode submission: {0}")]
    Json(#[from] serde_json::Error),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Receives the outcome of an attempt.
///
/// `submit` may fail; the attempt stays submitted either way and the caller
/// decides whether to deliver the same payload again.
#[allow(async_fn_in_trait)]
pub trait AttemptSink {
    async fn submit(&mut self, payload: &SubmissionPayload) -> Result<(), SinkError>;

    /// The learner left without submitting.
    fn cancelled(&mut self);
}

/// Writes each submitted payload as pretty JSON to a file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AttemptSink for JsonFileSink {
    async fn submit(&mut self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        let json = serde_json::to_string_pretty(payload)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })?;

        info!(
            attempt_id = %payload.attempt_id,
            path = %self.path.display(),
            "submission written"
        );
        Ok(())
    }

    fn cancelled(&mut self) {
        info!(path = %self.path.display(), "attempt cancelled, nothing written");
    }
}
