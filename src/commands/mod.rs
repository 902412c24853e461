//! Subcommand handlers.
//!
//! Handlers talk to the backend through the services on [`AppContext`],
//! notify the user about the outcome and return what they did so tests can
//! inspect it. Backend failures are notified here and then propagated unchanged
//! as [`ApiError`].

mod export;
mod history;
mod setup;
mod show;
mod transact;

pub use export::export;
pub use history::{HistoryOptions, HistoryPage, history};
pub use setup::setup;
pub use show::show;
pub use transact::transact;

use log::{error, warn};

use crate::context::AppContext;
use crate::http::{ApiError, ErrorCode};
use crate::notify::Severity;
use crate::runtime::Runtime;

/// Notifies a backend failure and converts it for propagation.
///
/// Rejected requests are warnings (the input needs fixing); everything else
/// already went through the retry budget and is an error.
pub(crate) fn report<R: Runtime>(ctx: &AppContext<R>, error: ApiError) -> anyhow::Error {
    let severity = match error.code() {
        ErrorCode::ClientError => {
            warn!("Request rejected by the backend: {}", error);
            Severity::Warning
        }
        _ if error.retryable() => {
            error!("Giving up after exhausting retries: {}", error);
            Severity::Error
        }
        _ => Severity::Error,
    };
    ctx.notifier.notify(error.message(), severity);
    anyhow::Error::new(error)
}

/// Balance/amount rendering: whole numbers without decimals, otherwise up to
/// four fraction digits.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    let text = format!("{:.4}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
