use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// A booked flight.
///
/// Only the flight number and departure date are known when the flight is
/// added. The remaining fields are filled in later from a flight-status lookup
/// and written back with `TripStore::update_flight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub id: String,
    pub flight_number: String,
    pub departure_date: DateTime<Utc>,
    pub airline: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub boarding_gate: Option<String>,
    pub departure_terminal: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
}

impl FlightInfo {
    pub fn new(flight_number: impl Into<String>, departure_date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            flight_number: flight_number.into(),
            departure_date,
            airline: None,
            departure_airport: None,
            arrival_airport: None,
            boarding_gate: None,
            departure_terminal: None,
            arrival_date: None,
        }
    }

    /// Whether a status lookup has filled in the route
    pub fn is_enriched(&self) -> bool {
        self.departure_airport.is_some() && self.arrival_airport.is_some()
    }
}
