//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn absent single-record reads into `NotFound`.
//! - Emit one structured log event per write.

use crate::repo::{ErrorKind, RepoResult};
use log::{error, info, warn};

pub mod customer_service;
pub mod financing_service;
pub mod sale_service;
pub mod test_drive_service;

/// Logs the outcome of a write and passes the result through unchanged.
///
/// Validation/not-found failures log at `warn`; storage failures at `error`.
pub(crate) fn log_write<T>(
    event: &'static str,
    result: RepoResult<T>,
    describe: impl FnOnce(&T) -> String,
) -> RepoResult<T> {
    match &result {
        Ok(value) => info!(
            "event={event} module=service status=ok {}",
            describe(value)
        ),
        Err(err) => match err.kind() {
            ErrorKind::Storage => error!(
                "event={event} module=service status=error error_kind=storage error={err}"
            ),
            kind => warn!(
                "event={event} module=service status=rejected error_kind={} error={err}",
                kind_label(kind)
            ),
        },
    }
    result
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Validation => "validation",
        ErrorKind::Storage => "storage",
    }
}
