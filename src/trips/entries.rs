//! Embedded entry kinds and their named operations

use super::TripStore;
use crate::error::Result;
use crate::mapper::{Decoded, DocumentMapper, ACCOMMODATIONS, ACTIVITIES, EXPENSES, FLIGHTS};
use crate::models::{Accommodation, Activity, Expense, FlightInfo};

/// A record embedded in one of a trip's arrays
pub trait TripEntry: DocumentMapper + Clone + Send + Sync + 'static {
    /// Trip field holding the array
    const FIELD: &'static str;

    fn id(&self) -> &str;
}

impl TripEntry for Expense {
    const FIELD: &'static str = EXPENSES;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TripEntry for FlightInfo {
    const FIELD: &'static str = FLIGHTS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TripEntry for Accommodation {
    const FIELD: &'static str = ACCOMMODATIONS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TripEntry for Activity {
    const FIELD: &'static str = ACTIVITIES;

    fn id(&self) -> &str {
        &self.id
    }
}

impl TripStore {
    pub async fn add_expense(&self, trip_id: &str, expense: &Expense) -> Result<()> {
        self.add_entry(trip_id, expense).await
    }

    pub async fn update_expense(&self, trip_id: &str, expense: &Expense) -> Result<()> {
        self.update_entry(trip_id, expense).await
    }

    pub async fn delete_expense(&self, trip_id: &str, expense_id: &str) -> Result<()> {
        self.remove_entry::<Expense>(trip_id, expense_id).await
    }

    pub async fn fetch_expenses(&self, trip_id: &str) -> Result<Decoded<Vec<Expense>>> {
        self.fetch_entries(trip_id).await
    }

    pub async fn add_flight(&self, trip_id: &str, flight: &FlightInfo) -> Result<()> {
        self.add_entry(trip_id, flight).await
    }

    /// Write back a flight, typically after its status details were filled in
    pub async fn update_flight(&self, trip_id: &str, flight: &FlightInfo) -> Result<()> {
        self.update_entry(trip_id, flight).await
    }

    pub async fn delete_flight(&self, trip_id: &str, flight_id: &str) -> Result<()> {
        self.remove_entry::<FlightInfo>(trip_id, flight_id).await
    }

    pub async fn fetch_flights(&self, trip_id: &str) -> Result<Decoded<Vec<FlightInfo>>> {
        self.fetch_entries(trip_id).await
    }

    pub async fn add_accommodation(
        &self,
        trip_id: &str,
        accommodation: &Accommodation,
    ) -> Result<()> {
        self.add_entry(trip_id, accommodation).await
    }

    pub async fn update_accommodation(
        &self,
        trip_id: &str,
        accommodation: &Accommodation,
    ) -> Result<()> {
        self.update_entry(trip_id, accommodation).await
    }

    pub async fn delete_accommodation(&self, trip_id: &str, accommodation_id: &str) -> Result<()> {
        self.remove_entry::<Accommodation>(trip_id, accommodation_id).await
    }

    pub async fn fetch_accommodations(&self, trip_id: &str) -> Result<Decoded<Vec<Accommodation>>> {
        self.fetch_entries(trip_id).await
    }

    pub async fn add_activity(&self, trip_id: &str, activity: &Activity) -> Result<()> {
        self.add_entry(trip_id, activity).await
    }

    pub async fn update_activity(&self, trip_id: &str, activity: &Activity) -> Result<()> {
        self.update_entry(trip_id, activity).await
    }

    pub async fn delete_activity(&self, trip_id: &str, activity_id: &str) -> Result<()> {
        self.remove_entry::<Activity>(trip_id, activity_id).await
    }

    pub async fn fetch_activities(&self, trip_id: &str) -> Result<Decoded<Vec<Activity>>> {
        self.fetch_entries(trip_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::config::ClientOptions;
    use crate::models::{Accommodation, Activity, FlightInfo, Trip};
    use crate::store::MemoryStore;
    use crate::trips::TripStore;

    #[tokio::test]
    async fn each_kind_lands_in_its_array() {
        let trips =
            TripStore::new(Arc::new(MemoryStore::new()), "u1", &ClientOptions::default()).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let trip = Trip::new("Paris", "Paris, France", start, start + Duration::days(4));
        trips.add_trip(&trip).await.unwrap();

        let mut flight = FlightInfo::new("AF1234", start + Duration::hours(9));
        let stay = Accommodation::new(
            "Hotel Lutetia",
            "Paris",
            start + Duration::hours(15),
            start + Duration::days(4),
        );
        let museum = Activity::new("Louvre", "Paris", start + Duration::days(1));

        trips.add_flight(&trip.id, &flight).await.unwrap();
        trips.add_accommodation(&trip.id, &stay).await.unwrap();
        trips.add_activity(&trip.id, &museum).await.unwrap();

        flight.airline = Some("Air France".into());
        flight.departure_airport = Some("JFK".into());
        flight.arrival_airport = Some("CDG".into());
        flight.boarding_gate = Some("B22".into());
        trips.update_flight(&trip.id, &flight).await.unwrap();

        let flights = trips.fetch_flights(&trip.id).await.unwrap().into_value().unwrap();
        assert_eq!(flights, vec![flight.clone()]);
        assert!(flights[0].is_enriched());

        let fetched = trips.fetch_trip(&trip.id).await.unwrap().into_value().unwrap();
        let itinerary = fetched.itinerary();
        let order: Vec<&str> = itinerary.iter().map(|item| item.id()).collect();
        assert_eq!(order, vec![flight.id.as_str(), stay.id.as_str(), museum.id.as_str()]);

        trips.delete_accommodation(&trip.id, &stay.id).await.unwrap();
        trips.delete_activity(&trip.id, &museum.id).await.unwrap();
        assert!(trips.fetch_accommodations(&trip.id).await.unwrap().value().unwrap().is_empty());
        assert!(trips.fetch_activities(&trip.id).await.unwrap().is_complete());
    }
}
