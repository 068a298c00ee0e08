use std::fmt::Display;

use chrono::{Days, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lookback window selected for a panel. Cycles `week -> month -> year -> week`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewWindow {
    Week,
    Month,
    Year,
}

const VIEW_ORDER: [ViewWindow; 3] = [ViewWindow::Week, ViewWindow::Month, ViewWindow::Year];

impl ViewWindow {
    pub fn next(self) -> ViewWindow {
        let index = VIEW_ORDER
            .iter()
            .position(|v| *v == self)
            .unwrap_or_default();
        VIEW_ORDER[(index + 1) % VIEW_ORDER.len()]
    }

    /// Inclusive range of days covered by this window when it ends on `today`.
    ///
    /// The year window is a rolling twelve calendar months, not "since January 1st". Month
    /// arithmetic clamps to the end of shorter months, so March 31st looks back to February
    /// 28th/29th.
    pub fn period(self, today: NaiveDate) -> Period {
        let start = match self {
            ViewWindow::Week => today.checked_sub_days(Days::new(7)),
            ViewWindow::Month => today.checked_sub_months(Months::new(1)),
            ViewWindow::Year => today.checked_sub_months(Months::new(12)),
        }
        .unwrap_or(NaiveDate::MIN);
        Period { start, end: today }
    }

    /// Number of columns a renderer should lay the ascending day sequence into.
    pub fn columns(self) -> usize {
        match self {
            ViewWindow::Week | ViewWindow::Month => 7,
            ViewWindow::Year => 53,
        }
    }
}

impl Display for ViewWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewWindow::Week => write!(f, "week"),
            ViewWindow::Month => write!(f, "month"),
            ViewWindow::Year => write!(f, "year"),
        }
    }
}

/// Inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every day from start to end, both inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Renders the period the way panels caption it, e.g. `Jan 5, 2024 to Jan 12, 2024`.
    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%b %-d, %Y"),
            self.end.format("%b %-d, %Y")
        )
    }
}
