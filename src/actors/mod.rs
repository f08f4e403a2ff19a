//! Actor-based monitoring engine
//!
//! Each actor runs as an independent async task owning its state, driven by
//! an mpsc command channel and controlled through a cloneable handle.
//!
//! ## Architecture Overview
//!
//! ```text
//!                 ┌─────────────────┐
//!                 │  MonitorActor   │◄── Start / Stop / Status / Stats
//!                 └────────┬────────┘        (HTTP layer, CLI)
//!                          │ spawns, ticks
//!          ┌───────────────┼───────────────┐
//!          │               │               │
//!  ┌───────▼───────┐       │       ┌───────▼───────┐
//!  │  Checker-1    │       │       │  Checker-N    │
//!  │  (domain A)   │       │       │  (domain N)   │
//!  └───────┬───────┘       │       └───────┬───────┘
//!          │   reports (checked / alert)   │
//!          └───────────────┼───────────────┘
//!                          │
//!                ┌─────────▼──────────┐
//!                │     Event Bus      │──► SSE clients, console sink
//!                └────────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: request/response messages sent to an actor via mpsc,
//!    replies over oneshot channels
//! 2. **Reports**: checkers feed results back into the supervisor's inbox
//! 3. **Events**: completed checks and refreshed stats fan out on the bus
//!
//! Within one checker, checks are serialized by its inbox; across domains
//! they run fully in parallel — one task per domain, all triggered in the
//! same tick without waiting for each other.

pub mod checker;
pub mod console;
pub mod messages;
pub mod supervisor;
