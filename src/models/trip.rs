use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{new_id, Accommodation, Activity, Expense, FlightInfo};
use crate::error::{Error, Result};

/// A trip and the plans embedded in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub title: String,
    pub location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub expenses: Vec<Expense>,
    pub flights: Vec<FlightInfo>,
    pub accommodations: Vec<Accommodation>,
    pub activities: Vec<Activity>,
}

/// One dated entry of a trip's plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItineraryItem<'a> {
    Flight(&'a FlightInfo),
    Stay(&'a Accommodation),
    Activity(&'a Activity),
}

impl ItineraryItem<'_> {
    pub fn starts_at(&self) -> DateTime<Utc> {
        match self {
            ItineraryItem::Flight(flight) => flight.departure_date,
            ItineraryItem::Stay(stay) => stay.check_in,
            ItineraryItem::Activity(activity) => activity.date_time,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ItineraryItem::Flight(flight) => &flight.id,
            ItineraryItem::Stay(stay) => &stay.id,
            ItineraryItem::Activity(activity) => &activity.id,
        }
    }
}

impl Trip {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            location: location.into(),
            start_date,
            end_date,
            image_url: None,
            expenses: Vec::new(),
            flights: Vec::new(),
            accommodations: Vec::new(),
            activities: Vec::new(),
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Reject trips that cannot be stored
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::invalid_input("trip id is empty"));
        }
        if self.title.trim().is_empty() {
            return Err(Error::invalid_input("trip title is empty"));
        }
        if self.end_date < self.start_date {
            return Err(Error::invalid_input(format!(
                "trip ends ({}) before it starts ({})",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    /// Sum of every expense amount
    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Expenses grouped by calendar day (UTC), days ascending, entries in
    /// stored order within a day
    pub fn expenses_by_day(&self) -> BTreeMap<NaiveDate, Vec<&Expense>> {
        let mut days: BTreeMap<NaiveDate, Vec<&Expense>> = BTreeMap::new();
        for expense in &self.expenses {
            days.entry(expense.date.date_naive()).or_default().push(expense);
        }
        days
    }

    /// Flights, stays and activities in start order
    pub fn itinerary(&self) -> Vec<ItineraryItem<'_>> {
        let mut items: Vec<ItineraryItem<'_>> = self
            .flights
            .iter()
            .map(ItineraryItem::Flight)
            .chain(self.accommodations.iter().map(ItineraryItem::Stay))
            .chain(self.activities.iter().map(ItineraryItem::Activity))
            .collect();
        items.sort_by_key(|item| item.starts_at());
        items
    }
}
