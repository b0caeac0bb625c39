pub mod budget;
pub mod context;
pub mod geo;
pub mod hitl;
pub mod itinerary;
pub mod modification;
pub mod resource;
pub mod state;
pub mod trip;
pub mod user;
pub mod weather;
