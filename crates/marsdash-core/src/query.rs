//! Contract between the dashboard and whatever ledger engine backs it

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::time::DateRange;

/// One signed posting against an account, already in the reporting currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub payee: Option<String>,
}

/// Account balance right after a posting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance_after: Decimal,
}

impl BalancePoint {
    pub fn new(date: NaiveDate, balance_after: Decimal) -> Self {
        Self { date, balance_after }
    }
}

/// Postings for a set of accounts over an inclusive range
#[derive(Debug, Clone, PartialEq)]
pub struct PostingQuery {
    pub accounts: Vec<String>,
    pub range: DateRange,
}

impl PostingQuery {
    pub fn new(accounts: Vec<String>, range: DateRange) -> Self {
        Self { accounts, range }
    }

    pub fn matches(&self, posting: &Posting) -> bool {
        self.range.contains(&posting.date) && self.accounts.iter().any(|a| *a == posting.account)
    }
}

impl std::fmt::Display for PostingQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let accounts = self
            .accounts
            .iter()
            .map(|a| format!("'{}'", a))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "SELECT account, date, payee, number WHERE account IN ({}) AND date >= {} AND date <= {}",
            accounts, self.range.start, self.range.end
        )
    }
}

/// Read access to a ledger
pub trait LedgerQuery: Send + Sync {
    /// Every known account, sorted
    fn accounts(&self) -> Vec<String>;

    /// Postings matching `query`, in non-decreasing date order per account
    fn query_postings(&self, query: &PostingQuery) -> CoreResult<Vec<Posting>>;

    /// Cumulative balance after each posting of `account`, oldest first
    fn account_running_balance(&self, account: &str) -> CoreResult<Vec<BalancePoint>>;

    /// Date of the newest posting in the ledger
    fn last_posting_date(&self) -> Option<NaiveDate>;
}
