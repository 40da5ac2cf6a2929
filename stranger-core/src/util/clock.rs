use chrono::{Local, NaiveDate};

/// Tells the ledger which calendar day it is.
pub trait Clock
where
    Self: Send + Sync + 'static,
{
    fn today(&self) -> NaiveDate;
}

/// The server's local calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
