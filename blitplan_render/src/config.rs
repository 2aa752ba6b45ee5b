// Copyright 2026 the Blitplan Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

use core::time::Duration;

use drm_fourcc::DrmFourcc;

/// How long the first acquire-fence wait may block before a warning.
pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Tunables for a [`Renderer`](crate::Renderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Bound on the first wait for a surface's acquire fence.
    ///
    /// When it elapses a warning is logged and the wait continues without a
    /// bound, so the producer's pixels are never read early.
    pub fence_timeout: Duration,
    /// Pixel format framebuffer captures are delivered in.
    pub read_format: DrmFourcc,
}

impl RendererConfig {
    /// The default configuration: a two second fence timeout and ARGB8888
    /// readback.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fence_timeout: DEFAULT_FENCE_TIMEOUT,
            read_format: DrmFourcc::Argb8888,
        }
    }

    /// Returns a copy with a different fence timeout.
    #[must_use]
    pub const fn with_fence_timeout(mut self, timeout: Duration) -> Self {
        self.fence_timeout = timeout;
        self
    }

    /// Returns a copy with a different readback format.
    #[must_use]
    pub const fn with_read_format(mut self, format: DrmFourcc) -> Self {
        self.read_format = format;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}
