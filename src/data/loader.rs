use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::{Quiz, ValidationError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid quiz: {0}")]
    Invalid(#[from] ValidationError),
}

pub fn load_quiz_from_json<P: AsRef<Path>>(path: P) -> Result<Quiz, LoadError> {
    let path = path.as_ref();

    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let quiz: Quiz = serde_json::from_str(&json_content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    quiz.validate()?;

    info!(
        quiz_id = %quiz.id,
        questions = quiz.total_questions(),
        path = %path.display(),
        "loaded quiz"
    );
    Ok(quiz)
}

/// Parses and validates a descriptor held in memory.
pub fn parse_quiz(json: &str) -> Result<Quiz, LoadError> {
    let quiz: Quiz = serde_json::from_str(json).map_err(|source| LoadError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    quiz.validate()?;
    Ok(quiz)
}
