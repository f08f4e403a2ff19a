//! Integration tests for the actor-based monitoring engine

#[path = "integration/helpers.rs"]
mod helpers;

#[path = "integration/monitoring_lifecycle.rs"]
mod monitoring_lifecycle;

#[path = "integration/stats_collection.rs"]
mod stats_collection;

#[path = "integration/event_stream.rs"]
mod event_stream;
