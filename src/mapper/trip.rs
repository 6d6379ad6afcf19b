//! Trip document mapper

use serde_json::Value;

use super::fields::*;
use super::{
    decode_entries, encode_entries, DecodeError, DecodeWarning, Decoded, Document,
    DocumentMapper, FieldProblem,
};
use crate::models::Trip;

/// Highest trip document layout this crate reads and the one it writes
pub const SCHEMA_VERSION: u64 = 1;

pub const EXPENSES: &str = "expenses";
pub const FLIGHTS: &str = "flightInfo";
pub const ACCOMMODATIONS: &str = "accommodations";
pub const ACTIVITIES: &str = "activities";

const KIND: &str = "trip";

/// Scalar fields only; used for updates that must leave the arrays alone
pub fn trip_scalar_fields(trip: &Trip) -> Document {
    let mut doc = Document::new();
    doc.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
    put_str(&mut doc, "id", &trip.id);
    put_str(&mut doc, "title", &trip.title);
    put_str(&mut doc, "location", &trip.location);
    put_time(&mut doc, "startDate", &trip.start_date);
    put_time(&mut doc, "endDate", &trip.end_date);
    put_opt_str(&mut doc, "imageURL", trip.image_url.as_ref());
    doc
}

pub fn encode_trip(trip: &Trip) -> Document {
    let mut doc = trip_scalar_fields(trip);
    doc.insert(EXPENSES.to_string(), encode_entries(&trip.expenses));
    doc.insert(FLIGHTS.to_string(), encode_entries(&trip.flights));
    doc.insert(ACCOMMODATIONS.to_string(), encode_entries(&trip.accommodations));
    doc.insert(ACTIVITIES.to_string(), encode_entries(&trip.activities));
    doc
}

/// Decode one trip document.
///
/// Bad scalars fail the whole trip. Bad nested entries are dropped and
/// reported, leaving a partial trip.
pub fn decode_trip(doc: &Document) -> Decoded<Trip> {
    match decode_scalars(doc) {
        Err(error) => {
            let id = doc.get("id").and_then(|v| v.as_str()).map(str::to_string);
            tracing::warn!(?id, %error, "dropping undecodable trip");
            Decoded::Failed(vec![DecodeWarning {
                index: 0,
                id,
                trip_id: None,
                error,
            }])
        }
        Ok(mut trip) => {
            let mut warnings = Vec::new();
            trip.expenses = nested(doc, EXPENSES, &mut warnings);
            trip.flights = nested(doc, FLIGHTS, &mut warnings);
            trip.accommodations = nested(doc, ACCOMMODATIONS, &mut warnings);
            trip.activities = nested(doc, ACTIVITIES, &mut warnings);
            let trip_id = trip.id.clone();
            Decoded::from_parts(trip, warnings).in_trip(&trip_id)
        }
    }
}

/// Decode a trip list. Fails only when there were documents and none decoded.
pub fn decode_trips<'a, I>(docs: I) -> Decoded<Vec<Trip>>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut trips = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = 0usize;

    for (index, doc) in docs.into_iter().enumerate() {
        seen += 1;
        match decode_trip(doc) {
            Decoded::Complete(trip) => trips.push(trip),
            Decoded::Partial { value, warnings: w } => {
                trips.push(value);
                warnings.extend(w);
            }
            Decoded::Failed(w) => warnings.extend(w.into_iter().map(|mut warning| {
                warning.index = index;
                warning
            })),
        }
    }

    if seen > 0 && trips.is_empty() {
        Decoded::Failed(warnings)
    } else {
        Decoded::from_parts(trips, warnings)
    }
}

fn decode_scalars(doc: &Document) -> Result<Trip, DecodeError> {
    if let Some(version) = optional_u64(doc, KIND, "schemaVersion")? {
        if version > SCHEMA_VERSION {
            return Err(DecodeError::new(
                KIND,
                "schemaVersion",
                FieldProblem::UnsupportedVersion(version),
            ));
        }
    }

    Ok(Trip {
        id: required_id(doc, KIND, "id")?,
        title: required_str(doc, KIND, "title")?,
        location: required_str(doc, KIND, "location")?,
        start_date: required_time(doc, KIND, "startDate")?,
        end_date: required_time(doc, KIND, "endDate")?,
        image_url: optional_str(doc, KIND, "imageURL")?,
        expenses: Vec::new(),
        flights: Vec::new(),
        accommodations: Vec::new(),
        activities: Vec::new(),
    })
}

fn nested<T: DocumentMapper>(
    doc: &Document,
    field: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Vec<T> {
    match doc.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => {
            let decoded = decode_entries::<T>(values);
            warnings.extend_from_slice(decoded.warnings());
            decoded.into_value().unwrap_or_default()
        }
        Some(_) => {
            warnings.push(DecodeWarning {
                index: 0,
                id: None,
                trip_id: None,
                error: DecodeError::new(KIND, field, FieldProblem::WrongType { expected: "array" }),
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Accommodation, Activity, Expense, FlightInfo};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn full_trip() -> Trip {
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 9, 0, 0).unwrap();
        let mut trip = Trip::new("Paris", "Paris, France", day(1), day(5))
            .with_image_url("https://img/paris.jpg");
        trip.expenses.push(Expense::new("Lunch", Decimal::new(2550, 2), day(2)));
        trip.flights.push(FlightInfo::new("QF1", day(1)));
        trip.accommodations.push(Accommodation::new("Hotel", "Paris", day(1), day(5)));
        trip.activities.push(Activity::new("Louvre", "Paris", day(3)));
        trip
    }

    #[test]
    fn trip_round_trip() {
        let trip = full_trip();
        let doc = encode_trip(&trip);
        assert_eq!(doc["schemaVersion"], json!(1));
        assert_eq!(decode_trip(&doc), Decoded::Complete(trip));

        for image_url in [None, Some(String::new())] {
            let mut trip = full_trip();
            trip.image_url = image_url;
            assert_eq!(decode_trip(&encode_trip(&trip)), Decoded::Complete(trip));
        }
    }

    #[test]
    fn trip_without_arrays_decodes_empty() {
        let mut doc = trip_scalar_fields(&full_trip());
        doc.remove("imageURL");
        let trip = decode_trip(&doc).into_result().unwrap();
        assert!(trip.expenses.is_empty());
        assert!(trip.image_url.is_none());
    }

    #[test]
    fn bad_nested_entry_gives_partial_trip() {
        let trip = full_trip();
        let mut doc = encode_trip(&trip);
        doc.get_mut(EXPENSES)
            .and_then(|v| v.as_array_mut())
            .unwrap()
            .push(json!({"id": "broken", "title": "no amount", "date": "2024-05-02T09:00:00Z"}));

        match decode_trip(&doc) {
            Decoded::Partial { value, warnings } => {
                assert_eq!(value, trip);
                assert_eq!(warnings.len(), 1);
                assert_eq!(warnings[0].index, 1);
                assert_eq!(warnings[0].id.as_deref(), Some("broken"));
                assert_eq!(warnings[0].trip_id.as_deref(), Some(trip.id.as_str()));
            }
            other => panic!("expected partial, got {:?}", other),
        }
    }

    #[test]
    fn list_warnings_name_the_trip_of_each_entry() {
        let first = full_trip();
        let second = full_trip();
        let mut broken = encode_trip(&second);
        broken.insert(FLIGHTS.to_string(), json!([{"id": "f9", "flightNumber": "QF9"}]));

        let decoded = decode_trips([&encode_trip(&first), &broken]);
        assert_eq!(decoded.value().unwrap().len(), 2);
        let warnings = decoded.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].trip_id.as_deref(), Some(second.id.as_str()));
        assert_eq!(warnings[0].id.as_deref(), Some("f9"));
        assert!(warnings[0].to_string().starts_with(&format!("trip {} #0 (f9)", second.id)));
    }

    #[test]
    fn non_array_field_is_reported() {
        let mut doc = encode_trip(&full_trip());
        doc.insert(ACTIVITIES.to_string(), json!("oops"));
        let decoded = decode_trip(&doc);
        assert_eq!(decoded.warnings()[0].error.field, ACTIVITIES);
        assert!(decoded.value().unwrap().activities.is_empty());
    }

    #[test]
    fn missing_scalar_fails_trip() {
        let mut doc = encode_trip(&full_trip());
        doc.remove("startDate");
        let decoded = decode_trip(&doc);
        assert!(decoded.is_failed());
        assert_eq!(decoded.warnings()[0].error.field, "startDate");
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut doc = encode_trip(&full_trip());
        doc.insert("schemaVersion".to_string(), json!(SCHEMA_VERSION + 1));
        assert_eq!(
            decode_trip(&doc).warnings()[0].error.problem,
            FieldProblem::UnsupportedVersion(SCHEMA_VERSION + 1)
        );
    }

    #[test]
    fn list_drops_bad_trips_and_keeps_indices() {
        let good = encode_trip(&full_trip());
        let mut bad = encode_trip(&full_trip());
        bad.remove("title");
        let decoded = decode_trips([&good, &bad, &good]);
        assert_eq!(decoded.value().unwrap().len(), 2);
        assert_eq!(decoded.warnings().len(), 1);
        assert_eq!(decoded.warnings()[0].index, 1);
        assert_eq!(decoded.warnings()[0].trip_id, None);

        assert!(decode_trips([&bad]).is_failed());
        assert!(decode_trips(std::iter::empty::<&Document>()).is_complete());
    }
}
