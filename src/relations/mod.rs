//! Relationship maintenance
//!
//! Relationships are directed id sets on each document, kept roughly
//! bidirectional by queuing a reverse-edge write for every edge stored.
//! The expander follows those ids one hop to enrich a result set.

mod expand;
mod outbox;

pub use expand::*;
pub use outbox::*;
