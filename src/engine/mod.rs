pub mod achievements;
pub mod aggregation;
pub mod config;
pub mod gating;
pub mod metrics;
pub mod profile;
pub mod question;
pub mod rank;
pub mod scoring;
pub mod selector;
pub mod service;
pub mod types;

use thiserror::Error;

use crate::catalog::WordId;
use crate::store::StoreError;

pub use config::EngineConfig;
pub use profile::LearnerProfile;
pub use service::ProgressEngine;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("word {word_id} is not available in language {lang}")]
    UnknownWord { lang: String, word_id: WordId },
    #[error("cannot build question: {0}")]
    CannotBuildQuestion(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
