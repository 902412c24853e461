use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Page size used by the history listing and the export flow.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }

    /// Backend sign convention: credits positive, debits negative.
    pub fn signed_amount(&self, amount: f64) -> f64 {
        match self {
            TransactionType::Credit => amount.abs(),
            TransactionType::Debit => -amount.abs(),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One credit or debit event, with the balance right after it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub wallet_id: String,
    pub amount: f64,
    pub balance: f64,
    /// Older rows carry `null` or omit it entirely.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CreateTransactionRequest {
    pub amount: f64,
    pub description: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionResponse {
    pub balance: f64,
    pub amount: f64,
    pub description: String,
    pub transaction_id: String,
    pub wallet_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Amount,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Amount => "amount",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Listing query. Omitting both `skip` and `limit` asks the backend for
/// pagination metadata (the total `count`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionsQuery {
    pub wallet_id: String,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
}

impl TransactionsQuery {
    pub fn new(wallet_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            ..Self::default()
        }
    }

    /// Query for 1-based `page` of `limit` rows.
    pub fn page(mut self, page: u64, limit: u64) -> Self {
        self.skip = Some(page.saturating_sub(1).saturating_mul(limit));
        self.limit = Some(limit);
        self
    }

    pub fn window(mut self, skip: u64, limit: u64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }

    pub fn sorted(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by);
        self.sort_order = Some(sort_order);
        self
    }

    /// Query parameters in wire order; absent fields are left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("walletId", self.wallet_id.clone())];
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sortBy", sort_by.as_str().to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            pairs.push(("sortOrder", sort_order.as_str().to_string()));
        }
        pairs
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
    /// Total rows for the wallet under the current filter, when the backend
    /// reported it. Absent means unknown, not zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Pagination {
    /// Number of pages of `limit` rows, when the total is known.
    pub fn page_count(&self) -> Option<u64> {
        self.total_pages(self.limit)
    }

    /// Number of pages for an arbitrary page size.
    pub fn total_pages(&self, limit: u64) -> Option<u64> {
        let count = self.count?;
        if limit == 0 {
            return None;
        }
        Some(count.div_ceil(limit))
    }
}

/// Canonical listing shape. `data` is always present.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct TransactionsResponse {
    pub data: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}
