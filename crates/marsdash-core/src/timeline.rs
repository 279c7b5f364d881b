//! Carry-forward balance lookup for one account

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::query::BalancePoint;

/// Ordered balance history of one account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountTimeline {
    points: Vec<BalancePoint>,
}

impl AccountTimeline {
    /// Build a timeline. Points are stably sorted by date, so for equal dates
    /// the adapter's order is kept and the last one wins.
    pub fn new(mut points: Vec<BalancePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[BalancePoint] {
        &self.points
    }

    /// Number of points dated on or before `day`
    fn settled_before(&self, day: NaiveDate) -> usize {
        self.points.partition_point(|p| p.date <= day)
    }

    /// Balance as of the end of `day`, zero before the first posting
    pub fn balance_on(&self, day: NaiveDate) -> Decimal {
        match self.settled_before(day) {
            0 => Decimal::ZERO,
            n => self.points[n - 1].balance_after,
        }
    }

    /// Streaming lookup for ascending days
    pub fn cursor(&self) -> BalanceCursor<'_> {
        BalanceCursor {
            timeline: self,
            next: 0,
            last_day: None,
        }
    }
}

/// Forward-only view over a timeline; O(n) in total for ascending days
#[derive(Debug)]
pub struct BalanceCursor<'a> {
    timeline: &'a AccountTimeline,
    /// Index of the first point not yet consumed
    next: usize,
    last_day: Option<NaiveDate>,
}

impl BalanceCursor<'_> {
    pub fn advance_to(&mut self, day: NaiveDate) -> Decimal {
        if self.last_day.map_or(false, |last| day < last) {
            // Going backwards, re-seek
            self.next = self.timeline.settled_before(day);
        } else {
            let points = &self.timeline.points;
            while self.next < points.len() && points[self.next].date <= day {
                self.next += 1;
            }
        }
        self.last_day = Some(day);

        match self.next {
            0 => Decimal::ZERO,
            n => self.timeline.points[n - 1].balance_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn timeline() -> AccountTimeline {
        AccountTimeline::new(vec![
            BalancePoint::new(d(3), dec!(100)),
            BalancePoint::new(d(10), dec!(80)),
            BalancePoint::new(d(10), dec!(95)),
            BalancePoint::new(d(20), dec!(0)),
        ])
    }

    #[test]
    fn test_balance_before_first_posting_is_zero() {
        assert_eq!(timeline().balance_on(d(1)), Decimal::ZERO);
        assert_eq!(AccountTimeline::default().balance_on(d(15)), Decimal::ZERO);
    }

    #[test]
    fn test_same_day_last_point_wins() {
        assert_eq!(timeline().balance_on(d(10)), dec!(95));
    }

    #[test]
    fn test_balance_constant_between_postings() {
        let timeline = timeline();
        for day in 11..20 {
            assert_eq!(timeline.balance_on(d(day)), dec!(95));
        }
        assert_eq!(timeline.balance_on(d(20)), dec!(0));
        assert_eq!(timeline.balance_on(d(31)), dec!(0));
    }

    #[test]
    fn test_cursor_agrees_with_search() {
        let timeline = timeline();
        let mut cursor = timeline.cursor();
        for day in 1..=31 {
            assert_eq!(cursor.advance_to(d(day)), timeline.balance_on(d(day)), "day {}", day);
        }
    }

    #[test]
    fn test_cursor_reseeks_backwards() {
        let timeline = timeline();
        let mut cursor = timeline.cursor();
        assert_eq!(cursor.advance_to(d(25)), dec!(0));
        assert_eq!(cursor.advance_to(d(5)), dec!(100));
        assert_eq!(cursor.advance_to(d(12)), dec!(95));
    }

    #[test]
    fn test_unsorted_input_is_sorted_stably() {
        let timeline = AccountTimeline::new(vec![
            BalancePoint::new(d(5), dec!(2)),
            BalancePoint::new(d(1), dec!(1)),
            BalancePoint::new(d(5), dec!(3)),
        ]);
        assert_eq!(timeline.balance_on(d(4)), dec!(1));
        assert_eq!(timeline.balance_on(d(5)), dec!(3));
    }
}
