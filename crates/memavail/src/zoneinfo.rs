//! Watermark and reserve totals from `/proc/zoneinfo`.
//!
//! The file is a run of zone blocks, each starting with a `Node N, zone X`
//! header.  Per block we track the `high` watermark, the `managed` page count
//! and the largest `protection:` entry; `low` watermarks are summed directly.
//! A zone's reserve is `min(max_lowmem_reserve + high, managed)`, mirroring
//! `calculate_totalreserve_pages()` in `mm/page_alloc.c`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Sums over every zone, in pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneTotals {
    pub wmark_low: u64,
    pub totalreserve: u64,
}

/// Fields of the zone block currently being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneRecord {
    pub high: u64,
    pub managed: u64,
    pub max_lowmem_reserve: u64,
}

impl ZoneRecord {
    pub fn reserve(&self) -> u64 {
        self.max_lowmem_reserve
            .saturating_add(self.high)
            .min(self.managed)
    }
}

/// Line-at-a-time accumulator over zone blocks.
///
/// Feed every line with [`feed`](Self::feed), then call
/// [`finish`](Self::finish) to flush the last block.
#[derive(Debug, Default)]
pub struct ZoneAccumulator {
    totals: ZoneTotals,
    current: ZoneRecord,
}

impl ZoneAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        if line.starts_with("Node") {
            self.flush();
            return;
        }

        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            return;
        };
        if parts.next().is_none() {
            return;
        }
        // Everything after the key, so multi-token values stay intact.
        let Some(value) = line.trim_start().strip_prefix(key) else {
            return;
        };

        match key {
            "low" => match parse_count(value) {
                Some(n) => self.totals.wmark_low = self.totals.wmark_low.saturating_add(n),
                None => skipped(line),
            },
            "high" => match parse_count(value) {
                Some(n) => self.current.high = n,
                None => skipped(line),
            },
            "managed" => match parse_count(value) {
                Some(n) => self.current.managed = n,
                None => skipped(line),
            },
            "protection:" => match parse_protection(value) {
                Some(n) => self.current.max_lowmem_reserve = n,
                None => skipped(line),
            },
            _ => {}
        }
    }

    pub fn finish(mut self) -> ZoneTotals {
        self.flush();
        self.totals
    }

    fn flush(&mut self) {
        let zone = std::mem::take(&mut self.current);
        self.totals.totalreserve = self.totals.totalreserve.saturating_add(zone.reserve());
    }
}

/// Aggregate an in-memory sequence of zoneinfo lines.
pub fn scan_zones<I, S>(lines: I) -> ZoneTotals
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut acc = ZoneAccumulator::new();
    for line in lines {
        acc.feed(line.as_ref());
    }
    acc.finish()
}

/// Read and aggregate a zoneinfo file.  Any I/O failure, including one
/// part-way through the file, fails the whole read.
pub fn read_zoneinfo(path: &Path) -> Result<ZoneTotals> {
    let file = File::open(path).map_err(|e| Error::unavailable(path, e))?;
    let mut acc = ZoneAccumulator::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::unavailable(path, e))?;
        acc.feed(&line);
    }
    let totals = acc.finish();
    tracing::debug!(
        wmark_low = totals.wmark_low,
        totalreserve = totals.totalreserve,
        "read {}",
        path.display()
    );
    Ok(totals)
}

fn parse_count(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

/// `(0, 1822, 13975, 13975)` → 13975.  `None` if any entry is not a number.
fn parse_protection(value: &str) -> Option<u64> {
    let inner = value.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    let mut max: Option<u64> = None;
    for entry in inner.split(',') {
        let n: u64 = entry.trim().parse().ok()?;
        max = Some(max.map_or(n, |m| m.max(n)));
    }
    max
}

fn skipped(line: &str) {
    tracing::trace!("zoneinfo: ignoring malformed line {line:?}");
}
