//! JetStream-backed event source.

mod event_source;

pub use event_source::JetStreamEventSource;
