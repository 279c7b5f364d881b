//! Day × account grid of balances and daily postings

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use crate::query::Posting;
use crate::time::DateRange;
use crate::timeline::AccountTimeline;

/// One account on one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayCell {
    /// Carried-forward balance at the end of the day
    pub balance: Decimal,
    /// Every posting amount of the day, in ledger order
    pub transactions: Vec<Decimal>,
    pub description: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub date: NaiveDate,
    /// Indexed like `DayGrid::accounts`
    pub cells: Vec<DayCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGrid {
    pub accounts: Vec<String>,
    pub rows: Vec<DayRow>,
}

impl DayGrid {
    pub fn cell(&self, date: NaiveDate, account: &str) -> Option<&DayCell> {
        let column = self.accounts.iter().position(|a| a == account)?;
        let row = self.rows.iter().find(|r| r.date == date)?;
        row.cells.get(column)
    }
}

/// Short description of a payee: its first two words
pub fn payee_summary(payee: &str) -> Option<String> {
    let words: Vec<&str> = payee.split_whitespace().take(2).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Build one row per day of `range` with a cell for each of `accounts`.
///
/// Accounts without a timeline stay at zero. Postings outside the range or
/// for accounts not in `accounts` are ignored.
pub fn build_grid(
    range: &DateRange,
    accounts: &[String],
    timelines: &HashMap<String, AccountTimeline>,
    postings: &[Posting],
) -> DayGrid {
    let empty = AccountTimeline::default();
    let mut cursors: Vec<_> = accounts
        .iter()
        .map(|a| timelines.get(a).unwrap_or(&empty).cursor())
        .collect();

    let mut rows: Vec<DayRow> = range
        .days()
        .map(|date| DayRow {
            date,
            cells: cursors
                .iter_mut()
                .map(|cursor| DayCell {
                    balance: cursor.advance_to(date),
                    ..DayCell::default()
                })
                .collect(),
        })
        .collect();

    let columns: HashMap<&str, usize> = accounts
        .iter()
        .enumerate()
        .map(|(i, a)| (a.as_str(), i))
        .collect();

    for posting in postings {
        let (Some(offset), Some(&column)) = (range.offset_of(&posting.date), columns.get(posting.account.as_str()))
        else {
            continue;
        };
        let cell = &mut rows[offset].cells[column];
        cell.transactions.push(posting.amount);
        if let Some(summary) = posting.payee.as_deref().and_then(payee_summary) {
            cell.description.insert(summary);
        }
    }

    DayGrid {
        accounts: accounts.to_vec(),
        rows,
    }
}
