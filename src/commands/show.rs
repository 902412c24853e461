use anyhow::Result;

use super::{format_amount, report};
use crate::context::AppContext;
use crate::runtime::Runtime;
use crate::wallet::Wallet;

/// Fetches and prints the active wallet.
#[tracing::instrument(skip(ctx))]
pub async fn show<R: Runtime>(ctx: &AppContext<R>) -> Result<Wallet> {
    let wallet_id = ctx.require_wallet_id()?;
    let wallet = ctx
        .wallets
        .get_by_id(&wallet_id)
        .await
        .map_err(|e| report(ctx, e))?;

    println!("     wallet {}", wallet.name);
    println!("         id {}", wallet.id);
    println!("    balance {}", format_amount(wallet.balance));
    println!("    created {}", wallet.date);

    Ok(wallet)
}
