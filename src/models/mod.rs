//! Typed records for trips and everything embedded in them

mod accommodation;
mod activity;
mod expense;
mod flight;
mod trip;
mod user;

pub use accommodation::Accommodation;
pub use activity::Activity;
pub use expense::Expense;
pub use flight::FlightInfo;
pub use trip::{ItineraryItem, Trip};
pub use user::AuthUser;

/// Generate a fresh client-side identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
