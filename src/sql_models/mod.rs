pub mod itinerary;
pub mod message;
