pub mod account;
pub mod chat_session;
pub mod itinerary;
pub mod message;
