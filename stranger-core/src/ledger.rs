use std::collections::HashMap;

use chrono::NaiveDate;

/// How many filtered searches a device started on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    pub count: u32,
    pub date: NaiveDate,
}

/// Tracks per-device daily usage of filtered searches.
///
/// The ledger has no locking of its own. It is only ever touched while the
/// engine lock is held, which makes [UsageLedger::check_and_consume] atomic
/// for every caller.
#[derive(Debug)]
pub struct UsageLedger {
    limit: u32,
    records: HashMap<String, UsageRecord>,
}

impl UsageLedger {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            records: Default::default(),
        }
    }

    /// Admits the device if it has searches left today, consuming one.
    /// A refused device keeps its count.
    pub fn check_and_consume(&mut self, device_id: &str, today: NaiveDate) -> bool {
        let record = self
            .records
            .entry(device_id.to_string())
            .or_insert(UsageRecord {
                count: 0,
                date: today,
            });

        if record.date != today {
            *record = UsageRecord {
                count: 0,
                date: today,
            };
        }

        if record.count >= self.limit {
            return false;
        }

        record.count += 1;
        true
    }

    /// Returns the device's count for today. Stale records count as zero.
    pub fn usage(&self, device_id: &str, today: NaiveDate) -> u32 {
        self.records
            .get(device_id)
            .filter(|r| r.date == today)
            .map(|r| r.count)
            .unwrap_or(0)
    }

    /// Drops every record that is not from today, returning how many were removed.
    pub fn evict_stale(&mut self, today: NaiveDate) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.date == today);

        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
