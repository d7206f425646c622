// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

use thiserror::Error;

use crate::meta::MetaError;
use crate::splice::SpliceError;

/// Errors that abort a mutation attempt outright.
///
/// Oracle, normalization and host failures never show up here; those
/// attempts return the original calls instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error(transparent)]
    Splice(#[from] SpliceError),
}
