//! Live mode: a drop-oldest queue in front of the session pipeline.

pub mod consumer;
pub mod message;
pub mod queue;

pub use consumer::{LiveConsumer, LiveError};
pub use message::{ChartMessage, DecodeError};
pub use queue::LatestQueue;
