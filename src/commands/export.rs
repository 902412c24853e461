use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::report;
use crate::context::AppContext;
use crate::export::{collect_transactions, to_csv, today_file_name, transaction_columns};
use crate::notify::Severity;
use crate::runtime::Runtime;

/// Writes the active wallet's full history to `<output_dir>/transactions_<date>.csv`.
///
/// Returns the written path, or `None` when there was nothing to export.
#[tracing::instrument(skip(ctx))]
pub async fn export<R: Runtime>(ctx: &AppContext<R>, output_dir: &Path) -> Result<Option<PathBuf>> {
    let wallet_id = ctx.require_wallet_id()?;

    let rows = collect_transactions(ctx.transactions.as_ref(), &wallet_id)
        .await
        .map_err(|e| report(ctx, e))?;

    if rows.is_empty() {
        ctx.notifier.notify("No transactions to export", Severity::Info);
        return Ok(None);
    }

    let csv = to_csv(&rows, &transaction_columns());
    let path = output_dir.join(today_file_name());

    ctx.runtime
        .create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    ctx.runtime
        .write(&path, csv.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Exported {} transactions to {}", rows.len(), path.display());
    ctx.notifier.notify(
        &format!("Exported {} transactions to {}", rows.len(), path.display()),
        Severity::Success,
    );
    Ok(Some(path))
}
