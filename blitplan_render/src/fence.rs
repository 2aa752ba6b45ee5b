// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Acquire fences on client buffers.

use core::fmt;
use core::time::Duration;

use crate::error::FenceError;

/// A producer-side fence that must signal before a buffer is read.
pub trait AcquireFence: fmt::Debug {
    /// Blocks until the fence signals, or `timeout` elapses when one is
    /// given.
    ///
    /// # Errors
    ///
    /// [`FenceError::Timeout`] when `timeout` elapsed, [`FenceError::Failed`]
    /// when the fence is broken.
    fn wait(&self, timeout: Option<Duration>) -> Result<(), FenceError>;
}

/// Waits for `fence`, bounded by `timeout` first.
///
/// A timeout is logged and followed by an unbounded wait.
///
/// # Errors
///
/// Any error other than the first timeout.
pub fn wait_for_fence(fence: &dyn AcquireFence, timeout: Duration) -> Result<(), FenceError> {
    match fence.wait(Some(timeout)) {
        Err(FenceError::Timeout) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis(),
                ?fence,
                "acquire fence did not signal in time, waiting without timeout"
            );
            fence.wait(None)
        }
        other => other,
    }
}
