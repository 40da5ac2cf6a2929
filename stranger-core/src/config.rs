use std::time::Duration;

/// The configuration of the matchmaking engine
#[derive(Debug, Clone)]
pub struct Config {
    /// How many filtered searches a device may start per calendar day
    pub daily_filter_limit: u32,
    /// How often stale usage records are evicted from the ledger
    pub ledger_sweep_interval: Duration,
}

impl Config {
    /// The text sent to a partner when the other member of a room leaves
    pub const PARTNER_LEFT_NOTICE: &'static str = "The stranger has left the chat. 🚪";

    /// The text explaining a rejected filtered search
    pub fn limit_reached_notice(&self) -> String {
        format!(
            "🚫 Daily Limit Reached! You can only use specific gender filters {} times per day. Try 'Random Match'.",
            self.daily_filter_limit
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_filter_limit: 10,
            // Records only go stale at midnight, so hourly is plenty
            ledger_sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}
