//! Selection-status encoding.
//!
//! A company's selection stage lives in a single `status_text` column. The
//! current encoding is `{"statuses": {<stage id>: <state>}}`; older rows may
//! hold a bare `{"offer": true}` object or free text. [`parse`] accepts all of
//! them and never fails. [`serialize`] always writes the current encoding, so
//! saving a legacy row migrates it.

mod codec;
mod predicates;

pub use codec::*;
pub use predicates::*;

use thiserror::Error;

use crate::models::StageKey;

/// Errors raised when turning user input into a stage selection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Unknown stage '{0}'. Valid stages: briefing, es, first, second, final, other, offer")]
    UnknownStage(String),
    #[error("Invalid state '{0}'. Use 予約 (reserved) or 済 (done)")]
    InvalidState(String),
    #[error("Stage '{0}' requires a state (予約 or 済)")]
    StateRequired(StageKey),
    #[error("Custom detail is only allowed for the 'other' stage, not '{0}'")]
    CustomNotAllowed(StageKey),
}
