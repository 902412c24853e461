//! Wallet creation and lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::{ApiClient, ApiError, RequestOptions, path_with_segment};

/// Storage key holding the active wallet id.
pub const WALLET_ID_KEY: &str = "walletId";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: String,
    pub balance: f64,
    pub name: String,
    pub date: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SetupWalletRequest {
    pub name: String,
    pub balance: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetupWalletResponse {
    pub id: String,
    pub balance: f64,
    /// Transaction recording the opening balance.
    pub transaction_id: String,
    pub name: String,
    pub date: String,
}

impl From<SetupWalletResponse> for Wallet {
    fn from(response: SetupWalletResponse) -> Self {
        Wallet {
            id: response.id,
            balance: response.balance,
            name: response.name,
            date: response.date,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn setup(&self, request: &SetupWalletRequest) -> Result<SetupWalletResponse, ApiError>;
    async fn get_by_id(&self, id: &str) -> Result<Wallet, ApiError>;
}

pub struct WalletService {
    client: Arc<ApiClient>,
}

impl WalletService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WalletApi for WalletService {
    #[tracing::instrument(skip(self))]
    async fn setup(&self, request: &SetupWalletRequest) -> Result<SetupWalletResponse, ApiError> {
        self.client
            .post("/wallet/setup", Some(request), &RequestOptions::new())
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Wallet, ApiError> {
        self.client
            .get(&path_with_segment("/wallet", id), &RequestOptions::new())
            .await
    }
}
