use std::path::PathBuf;

use crate::config::MemAvailConfig;
use crate::error::{Error, Result};
use crate::estimate::estimate_available_kb;
use crate::meminfo::read_meminfo;
use crate::zoneinfo::read_zoneinfo;

/// Resolved sources and page size for one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimator {
    zoneinfo: PathBuf,
    meminfo: PathBuf,
    page_size: u64,
}

impl Estimator {
    pub fn new(zoneinfo: impl Into<PathBuf>, meminfo: impl Into<PathBuf>, page_size: u64) -> Self {
        Self {
            zoneinfo: zoneinfo.into(),
            meminfo: meminfo.into(),
            page_size,
        }
    }

    /// Build from config, asking the system for the page size if the config
    /// leaves it unset.
    pub fn from_config(config: &MemAvailConfig) -> Result<Self> {
        let page_size = match config.page_size {
            Some(0) => return Err(Error::PageSize),
            Some(n) => n,
            None => system_page_size()?,
        };
        Ok(Self::new(&config.sources.zoneinfo, &config.sources.meminfo, page_size))
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Estimate available memory in kB from zoneinfo and meminfo.
    pub fn estimate_kb(&self) -> Result<u64> {
        let totals = read_zoneinfo(&self.zoneinfo)?;
        let snapshot = read_meminfo(&self.meminfo)?;
        Ok(estimate_available_kb(totals, self.page_size, &snapshot))
    }

    /// The kernel's `MemAvailable` when it reports one, else the estimate.
    /// zoneinfo is only read in the fallback case.
    pub fn available_kb(&self) -> Result<u64> {
        let snapshot = read_meminfo(&self.meminfo)?;
        if let Some(kb) = snapshot.kernel_available {
            return Ok(kb);
        }
        tracing::debug!("no MemAvailable in {}, estimating", self.meminfo.display());
        let totals = read_zoneinfo(&self.zoneinfo)?;
        Ok(estimate_available_kb(totals, self.page_size, &snapshot))
    }
}

/// Estimate available memory in kB from `/proc/zoneinfo` and `/proc/meminfo`
/// using the system page size.
pub fn compute_available_memory() -> Result<u64> {
    Estimator::from_config(&MemAvailConfig::default())?.estimate_kb()
}

/// Bytes per memory page, as reported by `sysconf(_SC_PAGESIZE)`.
#[cfg(unix)]
pub fn system_page_size() -> Result<u64> {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match u64::try_from(size) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::PageSize),
    }
}

#[cfg(not(unix))]
pub fn system_page_size() -> Result<u64> {
    Err(Error::PageSize)
}

/// Memory available for new allocations, in bytes (Linux only).
///
/// Uses the kernel's `MemAvailable` when /proc/meminfo has it and falls back
/// to estimating it from /proc/zoneinfo on older kernels.  Returns `None` on
/// non-Linux platforms or if /proc is unreadable (e.g. inside a container
/// with a restricted /proc).
#[cfg(target_os = "linux")]
pub fn available_bytes() -> Option<u64> {
    let kb = Estimator::from_config(&MemAvailConfig::default())
        .and_then(|est| est.available_kb())
        .map_err(|e| tracing::debug!("available memory unknown: {e}"))
        .ok()?;
    Some(kb.saturating_mul(1024))
}

#[cfg(not(target_os = "linux"))]
pub fn available_bytes() -> Option<u64> {
    None
}
