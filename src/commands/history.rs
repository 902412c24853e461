use anyhow::Result;

use super::{format_amount, report};
use crate::context::AppContext;
use crate::runtime::Runtime;
use crate::transactions::{
    DEFAULT_PAGE_LIMIT, SortBy, SortOrder, Transaction, TransactionsQuery,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: SortBy::Date,
            sort_order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub page: u64,
    pub transactions: Vec<Transaction>,
    /// Total rows, when the backend reported it.
    pub total: Option<u64>,
    pub total_pages: Option<u64>,
}

/// Prints one page of the active wallet's history.
///
/// The page itself and the count metadata are separate backend calls and are
/// issued concurrently.
#[tracing::instrument(skip(ctx))]
pub async fn history<R: Runtime>(ctx: &AppContext<R>, options: HistoryOptions) -> Result<HistoryPage> {
    let wallet_id = ctx.require_wallet_id()?;
    let page = options.page.max(1);
    let limit = options.limit.max(1);

    let meta_query = TransactionsQuery::new(&wallet_id).sorted(options.sort_by, options.sort_order);
    let page_query = TransactionsQuery::new(&wallet_id)
        .page(page, limit)
        .sorted(options.sort_by, options.sort_order);

    let (meta, rows) = tokio::try_join!(
        ctx.transactions.list(&meta_query),
        ctx.transactions.list(&page_query)
    )
    .map_err(|e| report(ctx, e))?;

    let total = meta.pagination.and_then(|p| p.count);
    let total_pages = meta.pagination.and_then(|p| p.total_pages(limit));

    let result = HistoryPage {
        page,
        transactions: rows.data,
        total,
        total_pages,
    };
    print_page(&result);
    Ok(result)
}

fn print_page(page: &HistoryPage) {
    if page.transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<26} {:<6} {:>14} {:>14}  DESCRIPTION",
        "DATE", "TYPE", "AMOUNT", "BALANCE"
    );
    for tx in &page.transactions {
        println!(
            "{:<26} {:<6} {:>14} {:>14}  {}",
            tx.date,
            tx.kind,
            format_amount(tx.amount),
            format_amount(tx.balance),
            tx.description
        );
    }

    match (page.total_pages, page.total) {
        (Some(pages), Some(total)) => {
            println!("Page {} of {} ({} transactions)", page.page, pages.max(1), total)
        }
        _ => println!("Page {}", page.page),
    }
}
