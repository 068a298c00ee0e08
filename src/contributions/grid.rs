use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::{record::EventRecord, view::ViewWindow};

/// A single day of the heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDayCell {
    pub date: NaiveDate,
    pub count: u64,
}

/// Intensity bucket of a cell. Thresholds follow the usual contribution graph shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContributionLevel {
    None,
    Low,
    Medium,
    High,
}

impl ContributionLevel {
    pub fn of(count: u64) -> Self {
        match count {
            0 => ContributionLevel::None,
            1..5 => ContributionLevel::Low,
            5..10 => ContributionLevel::Medium,
            _ => ContributionLevel::High,
        }
    }
}

impl CalendarDayCell {
    pub fn level(&self) -> ContributionLevel {
        ContributionLevel::of(self.count)
    }

    /// Hover text, e.g. `1 contribution on Jan 5`.
    pub fn describe(&self) -> String {
        let plural = if self.count == 1 { "" } else { "s" };
        format!(
            "{} contribution{plural} on {}",
            self.count,
            self.date.format("%b %-d")
        )
    }
}

/// Builds the gap-free, ascending sequence of days for `window` ending on `now`'s day.
/// Records sharing a day are summed, saturating at `u64::MAX`, and days without records get a
/// zero count.
pub fn build_grid(
    records: &[EventRecord],
    window: ViewWindow,
    now: NaiveDateTime,
) -> Vec<CalendarDayCell> {
    let period = window.period(now.date());

    let mut counts = HashMap::<NaiveDate, u64>::with_capacity(records.len());
    for record in records {
        let day = record.day();
        if period.contains(day) {
            let total = counts.entry(day).or_default();
            *total = total.saturating_add(record.count);
        }
    }

    period
        .days()
        .map(|date| CalendarDayCell {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate, NaiveDateTime};

    use crate::contributions::{aggregate::aggregate, record::EventRecord, view::ViewWindow};

    use super::{build_grid, CalendarDayCell, ContributionLevel};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(12, 0, 0).unwrap()
    }

    const WINDOWS: [ViewWindow; 3] = [ViewWindow::Week, ViewWindow::Month, ViewWindow::Year];

    #[test]
    fn week_scenario() {
        let records = [
            EventRecord::on_day(day(2024, 1, 1), 2),
            EventRecord::on_day(day(2024, 1, 2), 0),
            EventRecord::on_day(day(2024, 1, 5), 5),
        ];
        let grid = build_grid(&records, ViewWindow::Week, noon(2024, 1, 5));

        assert_eq!(grid.len(), 8);
        assert_eq!(grid.first().unwrap().date, day(2023, 12, 29));
        assert_eq!(grid.last().unwrap().date, day(2024, 1, 5));
        assert_eq!(
            grid.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![0, 0, 0, 2, 0, 0, 0, 5]
        );
        assert_eq!(grid.iter().map(|c| c.count).sum::<u64>(), 7);
    }

    #[test]
    fn same_day_records_are_summed() {
        let d = day(2024, 1, 3);
        let records = [
            EventRecord::on_day(d, 3),
            EventRecord::new(d.and_hms_opt(18, 15, 0).unwrap(), 4),
        ];
        let grid = build_grid(&records, ViewWindow::Week, noon(2024, 1, 5));
        let cells = grid.iter().filter(|c| c.date == d).collect::<Vec<_>>();
        assert_eq!(cells, vec![&CalendarDayCell { date: d, count: 7 }]);
    }

    #[test]
    fn lengths_follow_window() {
        let now = noon(2024, 3, 31);
        assert_eq!(build_grid(&[], ViewWindow::Week, now).len(), 8);
        // Feb 29th to Mar 31st inclusive.
        assert_eq!(build_grid(&[], ViewWindow::Month, now).len(), 32);
        assert_eq!(build_grid(&[], ViewWindow::Year, now).len(), 367);
    }

    #[test]
    fn grid_is_gap_free_and_ascending() {
        for window in WINDOWS {
            let grid = build_grid(&[], window, noon(2024, 7, 1));
            for pair in grid.windows(2) {
                assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
            }
            assert!(grid.iter().all(|c| c.count == 0));
        }
    }

    #[test]
    fn boundary_inclusion() {
        let now = noon(2024, 1, 8);
        let start = ViewWindow::Week.period(now.date()).start;
        let records = [
            EventRecord::on_day(start, 1),
            EventRecord::on_day(start.pred_opt().unwrap(), 9),
        ];
        let grid = build_grid(&records, ViewWindow::Week, now);
        assert_eq!(grid[0], CalendarDayCell { date: start, count: 1 });
        assert_eq!(grid.iter().map(|c| c.count).sum::<u64>(), 1);
    }

    #[test]
    fn totals_match_aggregate() {
        let now = noon(2024, 8, 20);
        let mut records = vec![];
        let mut current = day(2023, 6, 1);
        let mut count = 0;
        // Dense history with duplicates and records outside every window.
        while current <= day(2024, 9, 10) {
            records.push(EventRecord::on_day(current, count % 13));
            if count % 3 == 0 {
                records.push(EventRecord::new(current.and_hms_opt(21, 0, 0).unwrap(), 2));
            }
            current = current.checked_add_days(Days::new(1)).unwrap();
            count += 1;
        }

        for window in WINDOWS {
            let grid = build_grid(&records, window, now);
            let grid_total = grid.iter().map(|c| c.count).sum::<u64>();
            assert_eq!(grid_total, aggregate(&records, window, now), "{window}");
        }
    }

    #[test]
    fn is_idempotent() {
        let records = [EventRecord::on_day(day(2024, 1, 2), 1)];
        let first = build_grid(&records, ViewWindow::Month, noon(2024, 1, 5));
        let second = build_grid(&records, ViewWindow::Month, noon(2024, 1, 5));
        assert_eq!(first, second);
    }

    #[test]
    fn huge_same_day_counts_saturate() {
        let d = day(2024, 1, 3);
        let records = [
            EventRecord::on_day(d, u64::MAX / 2 + 1),
            EventRecord::on_day(d, u64::MAX / 2 + 1),
        ];
        let grid = build_grid(&records, ViewWindow::Week, noon(2024, 1, 5));
        let cell = grid.iter().find(|c| c.date == d).unwrap();
        assert_eq!(cell.count, u64::MAX);
        assert_eq!(cell.level(), ContributionLevel::High);
    }

    #[test]
    fn levels_and_descriptions() {
        assert_eq!(ContributionLevel::of(0), ContributionLevel::None);
        assert_eq!(ContributionLevel::of(4), ContributionLevel::Low);
        assert_eq!(ContributionLevel::of(5), ContributionLevel::Medium);
        assert_eq!(ContributionLevel::of(9), ContributionLevel::Medium);
        assert_eq!(ContributionLevel::of(10), ContributionLevel::High);

        let cell = CalendarDayCell {
            date: day(2024, 1, 5),
            count: 1,
        };
        assert_eq!(cell.describe(), "1 contribution on Jan 5");
        let cell = CalendarDayCell { count: 0, ..cell };
        assert_eq!(cell.describe(), "0 contributions on Jan 5");
    }
}
