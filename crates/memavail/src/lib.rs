//! Estimate `MemAvailable` on kernels that predate it.
//!
//! Linux 3.14 added a `MemAvailable` line to `/proc/meminfo`: an estimate of
//! how much memory new workloads can get without pushing the system into
//! swap.  This crate recomputes the same figure from `/proc/zoneinfo` and
//! `/proc/meminfo`, following commit 34e431b0ae39 as refined by 84ad5802a33a.
//!
//! ```no_run
//! let kb = memavail::compute_available_memory()?;
//! println!("{kb} kB available");
//! # Ok::<(), memavail::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod estimate;
pub mod mem;
pub mod meminfo;
pub mod zoneinfo;

pub use error::{Error, Result};
pub use mem::{available_bytes, compute_available_memory, system_page_size, Estimator};
