use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::new_id;

/// A single amount spent during a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl Expense {
    pub fn new(title: impl Into<String>, amount: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            amount,
            date,
        }
    }
}
