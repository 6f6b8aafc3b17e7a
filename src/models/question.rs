use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub code: Option<String>,
    pub kind: QuestionKind,
    pub options: Vec<QuestionOption>,
    /// Per-question limit in seconds. Zero means no limit.
    #[serde(default)]
    pub time_limit_seconds: Option<u64>,
    /// Answer key, when the descriptor ships one.
    #[serde(default)]
    pub correct: Option<BTreeSet<String>>,
}

impl Question {
    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit_seconds.filter(|limit| *limit > 0)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }
}
