//! CSV export of a wallet's transaction history.

use chrono::{NaiveDate, Utc};
use log::{debug, info};

use crate::http::ApiError;
use crate::transactions::{
    DEFAULT_PAGE_LIMIT, SortBy, SortOrder, Transaction, TransactionApi, TransactionsQuery,
};

/// One CSV column: header label plus how to read the cell from a row.
pub struct Column<T> {
    pub label: &'static str,
    pub value: fn(&T) -> Option<String>,
}

/// Columns written by the transaction export.
pub fn transaction_columns() -> Vec<Column<Transaction>> {
    vec![
        Column {
            label: "Date",
            value: |t| Some(t.date.clone()),
        },
        Column {
            label: "Type",
            value: |t| Some(t.kind.to_string()),
        },
        Column {
            label: "Amount",
            value: |t| Some(t.amount.to_string()),
        },
        Column {
            label: "Balance",
            value: |t| Some(t.balance.to_string()),
        },
        Column {
            label: "Description",
            value: |t| Some(t.description.clone()),
        },
    ]
}

/// Renders rows as comma-separated text, header first. Rows are joined with
/// `\n` and there is no trailing newline.
pub fn to_csv<T>(rows: &[T], columns: &[Column<T>]) -> String {
    let header = columns
        .iter()
        .map(|c| escape_field(c.label))
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header);
    for row in rows {
        let line = columns
            .iter()
            .map(|c| (c.value)(row).map(|v| escape_field(&v)).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

/// Quotes a field containing a comma, quote or newline, doubling inner quotes.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `transactions_YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("transactions_{}.csv", date.format("%Y-%m-%d"))
}

pub fn today_file_name() -> String {
    export_file_name(Utc::now().date_naive())
}

/// Collects every transaction of the wallet, newest first.
///
/// The first request omits the window so the backend reports the total
/// count; when that exceeds one default page the whole history is fetched in
/// a single call.
#[tracing::instrument(skip(api))]
pub async fn collect_transactions(
    api: &dyn TransactionApi,
    wallet_id: &str,
) -> Result<Vec<Transaction>, ApiError> {
    let first = api
        .list(&TransactionsQuery::new(wallet_id).sorted(SortBy::Date, SortOrder::Desc))
        .await?;

    if first.data.is_empty() {
        debug!("No transactions to export for wallet {}", wallet_id);
        return Ok(Vec::new());
    }

    match first.pagination.and_then(|p| p.count) {
        Some(count) if count > DEFAULT_PAGE_LIMIT => {
            info!("Fetching all {} transactions for export", count);
            let all = api
                .list(
                    &TransactionsQuery::new(wallet_id)
                        .window(0, count)
                        .sorted(SortBy::Date, SortOrder::Desc),
                )
                .await?;
            Ok(all.data)
        }
        _ => Ok(first.data),
    }
}
