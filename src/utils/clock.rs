use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Represents an entity responsible for providing dates across application. Panels, caches and
/// the watch loop all ask the clock, so tests can pin "now" to a fixed moment.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);

    /// Wall-clock time in the reference zone. This is the `now` the contribution core expects.
    fn now_in(&self, zone: Tz) -> NaiveDateTime {
        self.time().with_timezone(&zone).naive_local()
    }

    fn today_in(&self, zone: Tz) -> NaiveDate {
        self.now_in(zone).date()
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock frozen at a single moment. Used for `--now` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[async_trait]
impl Clock for FixedClock {
    fn time(&self) -> DateTime<Utc> {
        self.0
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{Clock, FixedClock};

    #[test]
    fn reference_zone_shifts_the_day() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 10, 25, 6, 30, 0).unwrap());
        assert_eq!(
            clock.today_in(chrono_tz::America::Los_Angeles),
            NaiveDate::from_ymd_opt(2024, 10, 24).unwrap()
        );
        assert_eq!(
            clock.today_in(chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 10, 25).unwrap()
        );
    }
}
