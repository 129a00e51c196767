use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::AccountStatus;

pub const BILLING_CYCLE_MONTHLY: &str = "monthly";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hestia_username: String,
    /// Initial credential handed to the customer; never echoed by listings
    #[serde(skip_serializing, default)]
    pub hestia_password: String,
    pub package_id: String,
    pub status: String,
    pub billing_cycle: String,
    pub monthly_price: Decimal,
    pub next_billing_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn status(&self) -> Option<AccountStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hestia_username: String,
    pub hestia_password: String,
    pub package_id: String,
    pub status: AccountStatus,
    pub monthly_price: Decimal,
    pub next_billing_date: NaiveDate,
}

/// `date` moved forward by whole calendar months, clamped to month end
pub fn advance_billing_date(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_date_clamps_to_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(advance_billing_date(jan31, 1), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(advance_billing_date(jan31, 12), NaiveDate::from_ymd_opt(2025, 1, 31));
    }
}
