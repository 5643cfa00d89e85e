use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

/// Represents an entity responsible for providing dates across application. The watcher stamps
/// notifications with it and the graph uses it to find "today", so tests can pin both.
#[cfg_attr(test, automock)]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
