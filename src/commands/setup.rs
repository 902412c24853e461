use anyhow::Result;
use log::{info, warn};

use super::report;
use crate::context::AppContext;
use crate::notify::Severity;
use crate::runtime::Runtime;
use crate::wallet::{SetupWalletRequest, WALLET_ID_KEY, Wallet};

/// Creates the wallet and remembers it as the active one.
#[tracing::instrument(skip(ctx))]
pub async fn setup<R: Runtime>(ctx: &AppContext<R>, name: &str, balance: f64) -> Result<Wallet> {
    if let Some(existing) = ctx.wallet_id() {
        info!("Replacing active wallet {}", existing);
    }

    let request = SetupWalletRequest {
        name: name.trim().to_string(),
        balance,
    };
    let response = ctx
        .wallets
        .setup(&request)
        .await
        .map_err(|e| report(ctx, e))?;

    if !ctx.store().set(WALLET_ID_KEY, &response.id) {
        warn!("Wallet {} created but its id was not saved", response.id);
        ctx.notifier.notify(
            &format!(
                "Wallet created but could not be remembered locally (id {})",
                response.id
            ),
            Severity::Warning,
        );
    }

    ctx.notifier.notify(
        &format!("Wallet \"{}\" created successfully!", response.name),
        Severity::Success,
    );
    Ok(Wallet::from(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::http::{ErrorCode, Failure, classify};
    use crate::notify::MockNotifier;
    use crate::transactions::MockTransactionApi;
    use crate::wallet::{MockWalletApi, SetupWalletResponse};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_setup_persists_wallet_id() {
        let dir = tempdir().unwrap();

        let mut wallets = MockWalletApi::new();
        wallets
            .expect_setup()
            .withf(|r| r.name == "Savings" && r.balance == 50.0)
            .times(1)
            .returning(|r| {
                Ok(SetupWalletResponse {
                    id: "w1".to_string(),
                    balance: r.balance,
                    transaction_id: "t0".to_string(),
                    name: r.name.clone(),
                    date: "2024-01-01".to_string(),
                })
            });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq("Wallet \"Savings\" created successfully!"), eq(Severity::Success))
            .times(1)
            .return_const(());

        let ctx = context(
            dir.path().to_path_buf(),
            wallets,
            MockTransactionApi::new(),
            notifier,
        );
        let wallet = setup(&ctx, "  Savings ", 50.0).await.unwrap();

        assert_eq!(wallet.id, "w1");
        assert_eq!(ctx.wallet_id(), Some("w1".to_string()));
    }

    #[tokio::test]
    async fn test_setup_failure_is_notified_and_not_persisted() {
        let dir = tempdir().unwrap();

        let mut wallets = MockWalletApi::new();
        wallets.expect_setup().times(1).returning(|_| {
            Err(classify(&Failure::status(
                422,
                Some(serde_json::json!({"message": "Name already taken"})),
            )))
        });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .with(eq("Name already taken"), eq(Severity::Warning))
            .times(1)
            .return_const(());

        let ctx = context(
            dir.path().to_path_buf(),
            wallets,
            MockTransactionApi::new(),
            notifier,
        );
        let err = setup(&ctx, "Savings", 10.0).await.unwrap_err();

        let api_error = err.downcast_ref::<crate::http::ApiError>().unwrap();
        assert_eq!(api_error.code(), ErrorCode::ClientError);
        assert_eq!(ctx.wallet_id(), None);
    }
}
