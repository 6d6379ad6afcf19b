//! Leaf entry and profile mappers

use super::fields::*;
use super::{DecodeError, Document, DocumentMapper};
use crate::models::{Accommodation, Activity, AuthUser, Expense, FlightInfo};

impl DocumentMapper for Expense {
    const KIND: &'static str = "expense";

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        put_str(&mut doc, "id", &self.id);
        put_str(&mut doc, "title", &self.title);
        put_decimal(&mut doc, "amount", &self.amount);
        put_time(&mut doc, "date", &self.date);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: required_id(doc, Self::KIND, "id")?,
            title: required_str(doc, Self::KIND, "title")?,
            amount: required_decimal(doc, Self::KIND, "amount")?,
            date: required_time(doc, Self::KIND, "date")?,
        })
    }
}

impl DocumentMapper for FlightInfo {
    const KIND: &'static str = "flight";

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        put_str(&mut doc, "id", &self.id);
        put_str(&mut doc, "flightNumber", &self.flight_number);
        put_time(&mut doc, "departureDate", &self.departure_date);
        put_opt_str(&mut doc, "airline", self.airline.as_ref());
        put_opt_str(&mut doc, "departureAirport", self.departure_airport.as_ref());
        put_opt_str(&mut doc, "arrivalAirport", self.arrival_airport.as_ref());
        put_opt_str(&mut doc, "boardingGate", self.boarding_gate.as_ref());
        put_opt_str(&mut doc, "departureTerminal", self.departure_terminal.as_ref());
        put_opt_time(&mut doc, "arrivalDate", self.arrival_date.as_ref());
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: required_id(doc, Self::KIND, "id")?,
            flight_number: required_str(doc, Self::KIND, "flightNumber")?,
            departure_date: required_time(doc, Self::KIND, "departureDate")?,
            airline: optional_str(doc, Self::KIND, "airline")?,
            departure_airport: optional_str(doc, Self::KIND, "departureAirport")?,
            arrival_airport: optional_str(doc, Self::KIND, "arrivalAirport")?,
            boarding_gate: optional_str(doc, Self::KIND, "boardingGate")?,
            departure_terminal: optional_str(doc, Self::KIND, "departureTerminal")?,
            arrival_date: optional_time(doc, Self::KIND, "arrivalDate")?,
        })
    }
}

impl DocumentMapper for Accommodation {
    const KIND: &'static str = "accommodation";

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        put_str(&mut doc, "id", &self.id);
        put_str(&mut doc, "name", &self.name);
        put_str(&mut doc, "location", &self.location);
        put_time(&mut doc, "checkInDate", &self.check_in);
        put_time(&mut doc, "checkOutDate", &self.check_out);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: required_id(doc, Self::KIND, "id")?,
            name: required_str(doc, Self::KIND, "name")?,
            location: required_str(doc, Self::KIND, "location")?,
            check_in: required_time(doc, Self::KIND, "checkInDate")?,
            check_out: required_time(doc, Self::KIND, "checkOutDate")?,
        })
    }
}

impl DocumentMapper for Activity {
    const KIND: &'static str = "activity";

    fn to_document(&self) -> Document {
        let mut doc = Document::new();
        put_str(&mut doc, "id", &self.id);
        put_str(&mut doc, "name", &self.name);
        put_str(&mut doc, "location", &self.location);
        put_time(&mut doc, "dateTime", &self.date_time);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self, DecodeError> {
        Ok(Self {
            id: required_id(doc, Self::KIND, "id")?,
            name: required_str(doc, Self::KIND, "name")?,
            location: required_str(doc, Self::KIND, "location")?,
            date_time: required_time(doc, Self::KIND, "dateTime")?,
        })
    }
}

/// Profile field holding the picture's public URL
pub const PROFILE_IMAGE_URL: &str = "profileImageURL";

/// Profile document; the user id is the document id, not a field
pub fn encode_profile(user: &AuthUser) -> Document {
    let mut doc = Document::new();
    put_str(&mut doc, "email", &user.email);
    put_opt_str(&mut doc, "displayName", user.display_name.as_ref());
    put_opt_str(&mut doc, PROFILE_IMAGE_URL, user.profile_image_url.as_ref());
    doc
}

pub fn decode_profile(user_id: &str, doc: &Document) -> Result<AuthUser, DecodeError> {
    Ok(AuthUser {
        id: user_id.to_string(),
        email: required_str(doc, "profile", "email")?,
        display_name: optional_str(doc, "profile", "displayName")?,
        profile_image_url: optional_str(doc, "profile", PROFILE_IMAGE_URL)?,
    })
}
