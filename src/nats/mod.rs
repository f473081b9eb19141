//! NATS connectivity

mod client;

pub use client::{stream_name, NatsClient};
