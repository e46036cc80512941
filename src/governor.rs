//! Resource governor: caps imaging memory as a share of system memory.
//!
//! System memory is read once when the governor is constructed. When a
//! positive percentage is configured, the resulting byte cap is installed
//! process-wide behind a [`OnceLock`]. The first governor to install a cap
//! wins and later governors only read it. Construct composers from a single
//! thread if they carry different percentages.
//!
//! The cap is enforced through [`image::Limits::max_alloc`] on every decode
//! performed by the raster backend, and through
//! [`ResourceGovernor::check_allocation`] before every resize, montage canvas
//! and PDF page render.

use crate::config::EngineConfig;
use crate::error::ComposeError;
use std::sync::OnceLock;
use sysinfo::System;
use tracing::{debug, info, warn};

/// Share of system memory the engine may use when no cap is configured.
pub const DEFAULT_ENGINE_MEMORY_PERCENTAGE: u64 = 50;

static ENGINE_MEMORY_LIMIT: OnceLock<u64> = OnceLock::new();

/// Process-wide decoder memory cap in bytes, if one has been installed.
pub fn engine_memory_limit() -> Option<u64> {
    ENGINE_MEMORY_LIMIT.get().copied()
}

/// Read-only view of the memory budget the engine was configured with.
#[derive(Debug, Clone)]
pub struct ResourceGovernor {
    system_memory: u64,
    limit_memory_percentage: i32,
}

impl ResourceGovernor {
    /// Validate `config`, read system memory and install the memory cap.
    pub fn new(config: &EngineConfig) -> Result<Self, ComposeError> {
        config.validate()?;

        let mut system = System::new();
        system.refresh_memory();
        let system_memory = system.total_memory();

        Self::with_system_memory(config.limit_memory_percentage, system_memory)
    }

    /// Same as [`ResourceGovernor::new`] with an explicit system memory size.
    pub fn with_system_memory(
        limit_memory_percentage: i32,
        system_memory: u64,
    ) -> Result<Self, ComposeError> {
        if limit_memory_percentage < 0 {
            return Err(ComposeError::NegativeMemoryPercentage(
                limit_memory_percentage,
            ));
        }

        if limit_memory_percentage > 0 {
            let requested = percentage_of(system_memory, limit_memory_percentage as u64);
            let installed = *ENGINE_MEMORY_LIMIT.get_or_init(|| {
                info!(
                    percentage = limit_memory_percentage,
                    bytes = requested,
                    "Engine memory limit installed"
                );
                requested
            });
            if installed != requested {
                warn!(
                    requested,
                    installed, "Engine memory limit already installed; keeping the first value"
                );
            }
        } else {
            debug!("No memory limit configured; engine default applies");
        }

        Ok(Self {
            system_memory,
            limit_memory_percentage,
        })
    }

    /// Total system memory in bytes, as read at construction.
    pub fn system_memory(&self) -> u64 {
        self.system_memory
    }

    /// Memory the engine may use, in bytes.
    pub fn engine_memory(&self) -> u64 {
        engine_memory_limit().unwrap_or_else(|| {
            percentage_of(self.system_memory, DEFAULT_ENGINE_MEMORY_PERCENTAGE)
        })
    }

    /// The configured percentage (0 when the engine default is in effect).
    pub fn limit_memory_percentage(&self) -> i32 {
        self.limit_memory_percentage
    }

    /// Fail when a `width × height` buffer of `bytes_per_pixel` would not
    /// fit in [`ResourceGovernor::engine_memory`].
    pub fn check_allocation(
        &self,
        width: u32,
        height: u32,
        bytes_per_pixel: u8,
    ) -> Result<(), ComposeError> {
        let bytes = (width as u64)
            .saturating_mul(height as u64)
            .saturating_mul(bytes_per_pixel as u64);
        let limit = self.engine_memory();
        if limit > 0 && bytes > limit {
            warn!(width, height, bytes, limit, "Allocation over engine memory limit");
            return Err(ComposeError::ResourceLimitExceeded {
                width,
                height,
                bytes,
                limit,
            });
        }
        Ok(())
    }

    /// Decoder limits enforcing [`ResourceGovernor::engine_memory`].
    pub fn decode_limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        let budget = self.engine_memory();
        if budget > 0 {
            limits.max_alloc = Some(budget);
        }
        limits
    }
}

fn percentage_of(total: u64, pct: u64) -> u64 {
    ((total as u128 * pct as u128) / 100).min(u64::MAX as u128) as u64
}
