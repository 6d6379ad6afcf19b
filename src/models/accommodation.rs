use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// Somewhere to stay between check-in and check-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: String,
    pub name: String,
    pub location: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

impl Accommodation {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            location: location.into(),
            check_in,
            check_out,
        }
    }
}
