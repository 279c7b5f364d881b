//! Core dashboard logic
//!
//! Turns ledger postings into a day-by-day grid of balances and movements
//! per account, merges it with the user's annotation log and renders the
//! snapshot the front end displays.

pub mod error;
pub mod format;
pub mod grid;
pub mod ledger;
pub mod overlay;
pub mod query;
pub mod snapshot;
pub mod store;
pub mod time;
pub mod timeline;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use format::{format_balance, format_description, format_transaction, Money};
pub use grid::{build_grid, DayCell, DayGrid, DayRow};
pub use ledger::{Ledger, LedgerSummary};
pub use overlay::{merge_overrides, validate_override, FormatField, OverrideRecord, StyleTag};
pub use query::{BalancePoint, LedgerQuery, Posting, PostingQuery};
pub use snapshot::{
    account_balances, build_snapshot, default_range, get_snapshot, save_override, user_transactions,
    CellView, FormattedRow, Snapshot,
};
pub use store::{JsonlOverlayLog, OverlayLog, OverlayRef};
pub use time::{last_day_of_month, parse_date, tomorrow, DateRange};
pub use timeline::{AccountTimeline, BalanceCursor};
