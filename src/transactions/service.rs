use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::normalize::normalize;
use super::types::{
    CreateTransactionRequest, CreateTransactionResponse, TransactionsQuery, TransactionsResponse,
};
use crate::http::{ApiClient, ApiError, RequestOptions, path_with_segment};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Records a credit (positive amount) or debit (negative amount).
    async fn create(
        &self,
        wallet_id: &str,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, ApiError>;

    /// Fetches one listing page, normalized.
    async fn list(&self, query: &TransactionsQuery) -> Result<TransactionsResponse, ApiError>;
}

pub struct TransactionService {
    client: Arc<ApiClient>,
}

impl TransactionService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransactionApi for TransactionService {
    #[tracing::instrument(skip(self, request))]
    async fn create(
        &self,
        wallet_id: &str,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, ApiError> {
        self.client
            .post(
                &path_with_segment("/transaction", wallet_id),
                Some(request),
                &RequestOptions::new(),
            )
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, query: &TransactionsQuery) -> Result<TransactionsResponse, ApiError> {
        let options = query
            .to_pairs()
            .into_iter()
            .fold(RequestOptions::new(), |options, (key, value)| {
                options.query(key, value)
            });

        let raw: Value = self.client.get("/transaction", &options).await?;
        let response = normalize(&raw);
        debug!(
            "Fetched {} transaction(s) for wallet {} (pagination {:?})",
            response.data.len(),
            query.wallet_id,
            response.pagination
        );
        Ok(response)
    }
}
