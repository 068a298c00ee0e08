//! Pure contribution logic. Everything here works on day-granular [record::EventRecord]s and a
//! [view::ViewWindow], performs no IO and keeps no state between calls.
//!
//!  - [aggregate::aggregate] sums counts inside a window.
//!  - [grid::build_grid] expands a window into one cell per calendar day.
//!  - [record] turns raw collaborator dates into records.
//!
//! Both entry points derive their range from [view::ViewWindow::period], so their totals always
//! agree.

pub mod aggregate;
pub mod grid;
pub mod record;
pub mod view;

pub use aggregate::{aggregate, period_label};
pub use grid::{build_grid, CalendarDayCell, ContributionLevel};
pub use record::{group_by_day, DayBoundary, EventRecord, InvalidDateError, RawRecord};
pub use view::{Period, ViewWindow};
