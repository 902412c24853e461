//! Per-process application state, owned in one place and handed to commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::http::ApiClient;
use crate::notify::Notifier;
use crate::runtime::Runtime;
use crate::storage::StateStore;
use crate::transactions::{TransactionApi, TransactionService};
use crate::wallet::{WALLET_ID_KEY, WalletApi, WalletService};

pub struct AppContext<R: Runtime> {
    pub runtime: R,
    pub state_dir: PathBuf,
    pub wallets: Box<dyn WalletApi>,
    pub transactions: Box<dyn TransactionApi>,
    pub notifier: Box<dyn Notifier>,
}

impl<R: Runtime> AppContext<R> {
    /// Wires the backend services around a shared client.
    pub fn new(
        runtime: R,
        state_dir: PathBuf,
        client: ApiClient,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let client = Arc::new(client);
        Self {
            runtime,
            state_dir,
            wallets: Box::new(WalletService::new(Arc::clone(&client))),
            transactions: Box::new(TransactionService::new(client)),
            notifier,
        }
    }

    pub fn store(&self) -> StateStore<'_, R> {
        StateStore::new(&self.runtime, self.state_dir.clone())
    }

    /// The persisted wallet id, if a wallet has been set up.
    pub fn wallet_id(&self) -> Option<String> {
        self.store().get::<String>(WALLET_ID_KEY)
    }

    pub fn require_wallet_id(&self) -> Result<String> {
        self.wallet_id()
            .ok_or_else(|| anyhow!("No wallet found. Run `wallet setup --name <NAME>` first."))
    }
}
