// Month burn rate
//
// Projects end-of-month spend from what has been spent so far, assuming the
// daily average holds for the rest of the month.

use serde::Serialize;

use crate::aggregate::total_spent;
use crate::records::Transaction;
use crate::window::TimeWindows;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnRate {
    pub total_spent: f64,
    pub burn_rate_daily: f64,
    pub projected_end_month: f64,
    pub days_remaining: u32,
}

impl BurnRate {
    /// Burn rate for the month transactions as of `windows.today`.
    pub fn calculate(transactions: &[Transaction], windows: &TimeWindows) -> Self {
        let spent = total_spent(transactions);
        let day_of_month = windows.day_of_month();
        let days_remaining = windows.days_remaining();

        // day_of_month is 1-based, never zero
        let daily = spent / f64::from(day_of_month);
        let projected = spent + daily * f64::from(days_remaining);

        BurnRate {
            total_spent: round2(spent),
            burn_rate_daily: round2(daily),
            projected_end_month: round2(projected),
            days_remaining,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
