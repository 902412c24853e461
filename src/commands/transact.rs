use anyhow::{Result, bail};

use super::{format_amount, report};
use crate::context::AppContext;
use crate::notify::Severity;
use crate::runtime::Runtime;
use crate::transactions::{CreateTransactionRequest, CreateTransactionResponse, TransactionType};

/// Credits or debits the active wallet and prints the new balance.
#[tracing::instrument(skip(ctx))]
pub async fn transact<R: Runtime>(
    ctx: &AppContext<R>,
    kind: TransactionType,
    amount: f64,
    description: &str,
) -> Result<CreateTransactionResponse> {
    if !amount.is_finite() {
        bail!("Amount must be a valid number");
    }
    let wallet_id = ctx.require_wallet_id()?;

    let request = CreateTransactionRequest {
        amount: kind.signed_amount(amount),
        description: description.trim().to_string(),
    };
    let response = ctx
        .transactions
        .create(&wallet_id, &request)
        .await
        .map_err(|e| report(ctx, e))?;

    let verb = match response.kind {
        TransactionType::Credit => "credited",
        TransactionType::Debit => "debited",
    };
    ctx.notifier.notify(
        &format!("Transaction {} successfully!", verb),
        Severity::Success,
    );
    println!("    balance {}", format_amount(response.balance));

    Ok(response)
}
