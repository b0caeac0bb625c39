/*
 * src/agent/agents/mod.rs
 *
 * The seven specialist agents the orchestration graph fans out to: one
 * weather/strategy pass, an itinerary planner, one attraction enricher,
 * three resource agents (accommodation/transport/dining) that run
 * concurrently, a budget critic that closes the retry loop, and a
 * finalizer that assembles everything into the persisted itinerary shape.
 */

pub mod accommodation;
pub mod attraction;
pub mod budget_critic;
pub mod dining;
pub mod finalizer;
pub mod itinerary_planner;
pub mod llm;
pub mod transport;
pub mod weather;
