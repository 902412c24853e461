//! Transaction recording and history listing.

mod normalize;
mod service;
mod types;

pub use normalize::normalize;
pub use service::{TransactionApi, TransactionService};
#[cfg(test)]
pub use service::MockTransactionApi;
pub use types::{
    CreateTransactionRequest, CreateTransactionResponse, DEFAULT_PAGE_LIMIT, Pagination, SortBy,
    SortOrder, Transaction, TransactionType, TransactionsQuery, TransactionsResponse,
};
