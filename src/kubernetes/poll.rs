// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded, cancellable polling for data the platform fills in asynchronously

use crate::config::PollConfig;
use std::future::Future;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why polling stopped without a value
#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    /// The overall budget ran out
    Timeout,
    /// The caller's cancellation token fired
    Cancelled,
    /// An attempt failed with an error that is not worth retrying
    Failed(E),
}

/// Call `attempt` every `config.interval` until it yields a value.
///
/// `Ok(None)` means "not ready yet". The first `Err` is returned immediately
/// as `PollError::Failed`. The whole loop, including an attempt in flight, is
/// bounded by `config.timeout` and aborted when `cancel` fires.
pub async fn poll_until<F, Fut, T, E>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + config.timeout;

    let polling = async {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => debug!(attempts, "Not ready yet, polling again"),
                Err(e) => return Err(PollError::Failed(e)),
            }
            sleep(config.interval).await;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(PollError::Cancelled),
        result = tokio::time::timeout_at(deadline, polling) => {
            result.unwrap_or(Err(PollError::Timeout))
        }
    }
}
