//! The `MemAvailable` estimate from `si_mem_available()` as of Linux 4.6:
//! free memory minus reserves, plus the reclaimable part of the page cache
//! and of reclaimable slab.  The later "kernel releasable" term is not
//! included.

use crate::meminfo::MemSnapshot;
use crate::zoneinfo::ZoneTotals;

/// Convert a page count to kB, rounding down.
pub fn pages_to_kb(pages: u64, page_size: u64) -> u64 {
    let kb = u128::from(pages) * u128::from(page_size) / 1024;
    u64::try_from(kb).unwrap_or(u64::MAX)
}

/// Estimated memory available to new allocations, in kB.  Never negative.
pub fn estimate_available_kb(totals: ZoneTotals, page_size: u64, snapshot: &MemSnapshot) -> u64 {
    let wmark_low = i128::from(pages_to_kb(totals.wmark_low, page_size));
    let totalreserve = i128::from(pages_to_kb(totals.totalreserve, page_size));

    // Free memory can't be taken below the reserves without swapping.
    let mut available = i128::from(snapshot.mem_free) - totalreserve;

    // At least half the page cache, or the low watermark, has to stay.
    let pagecache = i128::from(snapshot.active_file) + i128::from(snapshot.inactive_file);
    available += pagecache - (pagecache / 2).min(wmark_low);

    // Same rule for reclaimable slab; some of it is in use.
    let slab = i128::from(snapshot.sreclaimable);
    available += slab - (slab / 2).min(wmark_low);

    let available = available.max(0);
    tracing::debug!(
        wmark_low_kb = %wmark_low,
        totalreserve_kb = %totalreserve,
        available_kb = %available,
        "estimated available memory"
    );
    u64::try_from(available).unwrap_or(u64::MAX)
}
