//! Assembles the dashboard payload from a ledger and the annotation log

use chrono::{Days, NaiveDate};
use marsdash_config::DashboardConfig;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, CoreResult};
use crate::format::{format_balance, format_description, format_transaction, Money};
use crate::grid::{build_grid, DayGrid};
use crate::overlay::{merge_overrides, validate_override, OverrideRecord};
use crate::query::{LedgerQuery, PostingQuery};
use crate::store::OverlayLog;
use crate::time::{last_day_of_month, tomorrow, DateRange};
use crate::timeline::AccountTimeline;

/// One account's cell as the grid shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub balance: Money,
    pub transaction: String,
    pub description: String,
}

/// `{"date": ..., "<account>": CellView, ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub cells: BTreeMap<String, CellView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub accounts: Vec<String>,
    pub rows: Vec<FormattedRow>,
    pub user_transactions: Vec<OverrideRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.rows.is_empty() && self.user_transactions.is_empty()
    }
}

/// Accounts shown for `range` together with their timelines
fn tracked_accounts(
    ledger: &dyn LedgerQuery,
    range: &DateRange,
    options: &DashboardConfig,
) -> CoreResult<(Vec<String>, HashMap<String, AccountTimeline>)> {
    let mut accounts = Vec::new();
    let mut timelines = HashMap::new();

    for account in ledger.accounts().into_iter().filter(|a| options.tracks(a)) {
        let timeline = AccountTimeline::new(ledger.account_running_balance(&account)?);
        let shown = timeline.points().iter().any(|p| {
            range.contains(&p.date) || (options.include_idle_accounts && p.date <= range.end)
        });
        if shown {
            accounts.push(account.clone());
            timelines.insert(account, timeline);
        }
    }
    accounts.sort();
    Ok((accounts, timelines))
}

fn format_grid(grid: &DayGrid, hide_zero: bool) -> Vec<FormattedRow> {
    grid.rows
        .iter()
        .map(|row| FormattedRow {
            date: row.date,
            cells: grid
                .accounts
                .iter()
                .zip(&row.cells)
                .map(|(account, cell)| {
                    let view = CellView {
                        balance: format_balance(cell.balance),
                        transaction: format_transaction(&cell.transactions, hide_zero),
                        description: format_description(&cell.description),
                    };
                    (account.clone(), view)
                })
                .collect(),
        })
        .collect()
}

/// Build the snapshot for a validated range
pub fn build_snapshot(
    ledger: &dyn LedgerQuery,
    overrides: Vec<OverrideRecord>,
    range: &DateRange,
    options: &DashboardConfig,
) -> CoreResult<Snapshot> {
    let (accounts, timelines) = tracked_accounts(ledger, range, options)?;

    let postings = if accounts.is_empty() {
        Vec::new()
    } else {
        ledger.query_postings(&PostingQuery::new(accounts.clone(), *range))?
    };

    let grid = build_grid(range, &accounts, &timelines, &postings);
    log::debug!(
        "Snapshot {}: {} accounts, {} postings",
        range,
        accounts.len(),
        postings.len()
    );

    Ok(Snapshot {
        accounts,
        rows: format_grid(&grid, options.hide_zero),
        user_transactions: merge_overrides(overrides),
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Snapshot for request parameters. A missing bound means nothing has been
/// asked yet and yields an empty snapshot.
pub async fn get_snapshot(
    ledger: &dyn LedgerQuery,
    overlay: &dyn OverlayLog,
    start: Option<&str>,
    end: Option<&str>,
    options: &DashboardConfig,
) -> CoreResult<Snapshot> {
    let (Some(start), Some(end)) = (present(start), present(end)) else {
        return Ok(Snapshot::default());
    };
    let range = DateRange::parse(start, end)?;
    let overrides = overlay.read_overrides().await?;
    build_snapshot(ledger, overrides, &range, options)
}

/// Merged view of the annotation log
pub async fn user_transactions(overlay: &dyn OverlayLog) -> CoreResult<Vec<OverrideRecord>> {
    Ok(merge_overrides(overlay.read_overrides().await?))
}

/// Validate a submitted annotation and append it. Nothing is written when
/// validation fails.
pub async fn save_override(overlay: &dyn OverlayLog, value: &Value) -> CoreResult<OverrideRecord> {
    let record = validate_override(value)?;
    overlay.append_override(&record).await?;
    log::info!("Saved annotation for {} {}", record.date, record.account);
    Ok(record)
}

/// From the day after the newest posting to the end of that day's month
pub fn default_range(ledger: &dyn LedgerQuery) -> CoreResult<DateRange> {
    let last = ledger.last_posting_date().ok_or(CoreError::NoTransactions)?;
    let start = last + Days::new(1);
    DateRange::new(start, last_day_of_month(start))
}

/// Balance as of `as_of` (default tomorrow) of every account whose name
/// contains `filter`, ignoring case
pub fn account_balances(
    ledger: &dyn LedgerQuery,
    filter: &str,
    as_of: Option<NaiveDate>,
) -> CoreResult<BTreeMap<String, Money>> {
    let as_of = as_of.unwrap_or_else(tomorrow);
    let needle = filter.trim().to_lowercase();

    let mut balances = BTreeMap::new();
    for account in ledger.accounts() {
        if !account.to_lowercase().contains(&needle) {
            continue;
        }
        let timeline = AccountTimeline::new(ledger.account_running_balance(&account)?);
        balances.insert(account, format_balance(timeline.balance_on(as_of)));
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{BalancePoint, Posting};
    use crate::store::JsonlOverlayLog;
    use crate::time::parse_date;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    /// Ledger double holding postings in memory
    #[derive(Default)]
    struct MemoryLedger {
        postings: Vec<Posting>,
        fail: bool,
    }

    impl MemoryLedger {
        fn with(mut self, date: &str, account: &str, amount: Decimal, payee: &str) -> Self {
            self.postings.push(Posting {
                date: parse_date(date).unwrap(),
                account: account.to_string(),
                amount,
                payee: Some(payee.to_string()).filter(|p| !p.is_empty()),
            });
            self
        }
    }

    impl LedgerQuery for MemoryLedger {
        fn accounts(&self) -> Vec<String> {
            let mut accounts: Vec<String> = self.postings.iter().map(|p| p.account.clone()).collect();
            accounts.sort();
            accounts.dedup();
            accounts
        }

        fn query_postings(&self, query: &PostingQuery) -> CoreResult<Vec<Posting>> {
            if self.fail {
                return Err(CoreError::UpstreamQuery {
                    query: query.to_string(),
                    message: "engine exploded".to_string(),
                });
            }
            Ok(self.postings.iter().filter(|p| query.matches(p)).cloned().collect())
        }

        fn account_running_balance(&self, account: &str) -> CoreResult<Vec<BalancePoint>> {
            let mut total = Decimal::ZERO;
            Ok(self
                .postings
                .iter()
                .filter(|p| p.account == account)
                .map(|p| {
                    total += p.amount;
                    BalancePoint::new(p.date, total)
                })
                .collect())
        }

        fn last_posting_date(&self) -> Option<NaiveDate> {
            self.postings.iter().map(|p| p.date).max()
        }
    }

    const MAIN: &str = "Assets:Checking:Main";

    fn options() -> DashboardConfig {
        DashboardConfig::default()
    }

    fn sample() -> MemoryLedger {
        MemoryLedger::default()
            .with("2024-01-01", MAIN, dec!(100.00), "Opening Balance Transfer")
            .with("2024-01-03", MAIN, dec!(50.00), "Employer")
            .with("2024-01-02", "Assets:Saving:Goal", dec!(10), "")
            .with("2024-01-02", "Expenses:Food", dec!(10), "Cafe")
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).unwrap()
    }

    #[test]
    fn test_snapshot_balances_scenario() {
        let snapshot = build_snapshot(&sample(), vec![], &range("2024-01-01", "2024-01-04"), &options()).unwrap();
        let balances: Vec<String> = snapshot
            .rows
            .iter()
            .map(|r| r.cells[MAIN].balance.to_string())
            .collect();
        assert_eq!(balances, vec!["100.00", "100.00", "150.00", "150.00"]);
        assert_eq!(snapshot.rows[0].cells[MAIN].description, "Opening Balance");
        assert_eq!(snapshot.rows[1].cells[MAIN].transaction, "");
        assert_eq!(snapshot.rows[2].cells[MAIN].transaction, "50.00");
    }

    #[test]
    fn test_snapshot_tracks_prefixed_accounts_with_postings_in_range() {
        let ledger = sample();
        let snapshot = build_snapshot(&ledger, vec![], &range("2024-01-01", "2024-01-04"), &options()).unwrap();
        assert_eq!(snapshot.accounts, vec![MAIN.to_string(), "Assets:Saving:Goal".to_string()]);

        // Nothing in range, nothing tracked
        let later = build_snapshot(&ledger, vec![], &range("2024-02-01", "2024-02-03"), &options()).unwrap();
        assert!(later.accounts.is_empty());
        assert_eq!(later.rows.len(), 3);
        assert!(later.rows[0].cells.is_empty());

        let mut idle = options();
        idle.include_idle_accounts = true;
        let later = build_snapshot(&ledger, vec![], &range("2024-02-01", "2024-02-03"), &idle).unwrap();
        assert_eq!(later.accounts.len(), 2);
        assert_eq!(later.rows[2].cells[MAIN].balance.to_string(), "150.00");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let overrides = vec![serde_json::from_value(json!({
            "date": "2024-01-01", "account": MAIN, "transaction": "99"
        }))
        .unwrap()];
        let ledger = MemoryLedger::default()
            .with("2024-01-01", MAIN, dec!(-20), "Shop")
            .with("2024-01-01", MAIN, dec!(5), "Shop refund");
        let snapshot = build_snapshot(&ledger, overrides, &range("2024-01-01", "2024-01-01"), &options()).unwrap();
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "accounts": [MAIN],
                "rows": [{
                    "date": "2024-01-01",
                    MAIN: {"balance": "-15.00", "transaction": "-20.00+5.00", "description": "Shop, Shop refund"}
                }],
                "user_transactions": [{"date": "2024-01-01", "account": MAIN, "transaction": "99", "description": ""}]
            })
        );
    }

    #[test]
    fn test_hide_zero() {
        let ledger = MemoryLedger::default().with("2024-01-01", MAIN, dec!(0), "Adjust");
        let mut hide = options();
        hide.hide_zero = true;
        let snapshot = build_snapshot(&ledger, vec![], &range("2024-01-01", "2024-01-01"), &hide).unwrap();
        assert_eq!(snapshot.rows[0].cells[MAIN].transaction, "");
    }

    #[test]
    fn test_upstream_failure_propagates() {
        let mut ledger = sample();
        ledger.fail = true;
        let err = build_snapshot(&ledger, vec![], &range("2024-01-01", "2024-01-04"), &options()).unwrap_err();
        match err {
            CoreError::UpstreamQuery { query, .. } => assert!(query.contains("Assets:Checking:Main")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_snapshot_absent_and_invalid_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = JsonlOverlayLog::new(dir.path().join("log.jsonl"));
        let ledger = sample();

        for (start, end) in [(None, None), (Some("2024-01-01"), None), (Some(" "), Some("2024-01-02"))] {
            let snapshot = get_snapshot(&ledger, &overlay, start, end, &options()).await.unwrap();
            assert!(snapshot.is_empty());
        }
        for (start, end) in [("2024-01-05", "2024-01-01"), ("2024-1-x", "2024-01-02")] {
            let err = get_snapshot(&ledger, &overlay, Some(start), Some(end), &options())
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidRange { .. }));
        }
    }

    #[tokio::test]
    async fn test_save_then_snapshot_returns_merged_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = JsonlOverlayLog::new(dir.path().join("log.jsonl"));
        let ledger = sample();

        save_override(&overlay, &json!({"date": "2024-01-01", "account": "A", "transaction": "50"}))
            .await
            .unwrap();
        save_override(&overlay, &json!({"date": "2024-01-01", "account": "A", "description": "rent"}))
            .await
            .unwrap();
        let err = save_override(&overlay, &json!({"date": "2024-01-01", "account": "A", "format": {"x": {}}}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        let snapshot = get_snapshot(&ledger, &overlay, Some("2024-01-01"), Some("2024-01-02"), &options())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&snapshot.user_transactions).unwrap(),
            json!([{"date": "2024-01-01", "account": "A", "transaction": "50", "description": "rent"}])
        );
        assert_eq!(overlay.read_overrides().await.unwrap().len(), 2);
        assert_eq!(user_transactions(&overlay).await.unwrap(), snapshot.user_transactions);
    }

    #[test]
    fn test_default_range_handles_leap_february() {
        let ledger = MemoryLedger::default().with("2024-02-15", MAIN, dec!(1), "x");
        let range = default_range(&ledger).unwrap();
        assert_eq!(range.start, parse_date("2024-02-16").unwrap());
        assert_eq!(range.end, parse_date("2024-02-29").unwrap());
    }

    #[test]
    fn test_default_range_after_month_end() {
        let ledger = MemoryLedger::default().with("2024-01-31", MAIN, dec!(1), "x");
        let range = default_range(&ledger).unwrap();
        assert_eq!(range.start, parse_date("2024-02-01").unwrap());
        assert_eq!(range.end, parse_date("2024-02-29").unwrap());
    }

    #[test]
    fn test_default_range_without_postings() {
        assert!(matches!(
            default_range(&MemoryLedger::default()),
            Err(CoreError::NoTransactions)
        ));
    }

    #[test]
    fn test_account_balances_filter() {
        let ledger = sample();
        let balances = account_balances(&ledger, "CHECKING", parse_date("2024-01-02").ok()).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[MAIN].to_string(), "100.00");

        let all = account_balances(&ledger, "", parse_date("2023-12-31").ok()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.values().all(Money::is_zero));

        let latest = account_balances(&ledger, "assets:", None).unwrap();
        assert_eq!(latest[MAIN].to_string(), "150.00");
    }
}
