//! Live consumer: drives a session from the drop-oldest queue.

use std::sync::Arc;

use chrono::FixedOffset;
use thiserror::Error;
use tracing::{debug, trace};

use super::message::{ChartMessage, DecodeError};
use super::queue::LatestQueue;
use crate::domain::PlPoint;
use crate::engine::{EngineConfig, EngineError, SessionState};

/// Errors that stop the live consumer.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Consumer side of live mode.
///
/// Owns the session state exclusively; the producer only touches the queue.
/// There is no shutdown protocol: drop the task running [`LiveConsumer::run`]
/// to stop it.
pub struct LiveConsumer {
    queue: Arc<LatestQueue<ChartMessage>>,
    state: SessionState,
    offset: FixedOffset,
}

impl LiveConsumer {
    pub fn new(
        config: &EngineConfig,
        queue: Arc<LatestQueue<ChartMessage>>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            queue,
            state: SessionState::new(config),
            offset,
        }
    }

    /// Wait for the next message, step the session and return its PL point.
    pub async fn next_point(&mut self) -> Result<PlPoint, LiveError> {
        let msg = self.queue.dequeue().await;
        let bar = msg.to_bar(self.offset)?;
        let point = self.state.step(&bar)?;
        trace!(at = %point.timestamp, pl = point.current_pl, "live bar processed");
        Ok(point)
    }

    /// Process messages forever, handing each PL point to `on_point`.
    ///
    /// Returns only on error.
    pub async fn run<F>(&mut self, mut on_point: F) -> Result<(), LiveError>
    where
        F: FnMut(&PlPoint),
    {
        debug!(
            capacity = self.queue.capacity(),
            signal = self.state.signal_name(),
            "live consumer started"
        );
        loop {
            let point = self.next_point().await?;
            on_point(&point);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn queue(&self) -> &Arc<LatestQueue<ChartMessage>> {
        &self.queue
    }
}
