use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// A planned activity at a place and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            location: location.into(),
            date_time,
        }
    }
}
