//! Compressed empirical grade distributions
//!
//! A `GradeSeries` stores a sorted multiset of grade values as a
//! run-length-compressed cumulative distribution function: one
//! `(value, cumulative_count)` breakpoint per distinct value. For
//! class-sized populations this is much smaller than the raw sample while
//! still supporting O(log n) rank and quantile queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One breakpoint of a compressed CDF: `count` observations have a value
/// less than or equal to `value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdfPoint {
    pub value: f64,
    pub count: usize,
}

/// Wire form of a grade series as the server sends it.
///
/// The CDF arrives flat, values interleaved with cumulative counts:
/// `[value0, count0, value1, count1, ...]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesData {
    pub n: usize,
    #[serde(default)]
    pub cdf: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdfu: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
}

/// Invariant violations reported by [`GradeSeries::check`]
#[derive(Error, Debug)]
pub enum SeriesError {
    /// CDF values must strictly increase breakpoint over breakpoint
    #[error("cdf values not strictly increasing at index {index}")]
    UnorderedValue { index: usize },

    /// Cumulative counts must be positive and strictly increasing
    #[error("cdf counts not strictly increasing at index {index}")]
    UnorderedCount { index: usize },

    /// The final cumulative count must equal the population size
    #[error("cdf ends at count {last}, expected n = {n}")]
    CountMismatch { last: usize, n: usize },

    /// A non-empty population must have a CDF
    #[error("series has n = {n} but an empty cdf")]
    MissingCdf { n: usize },

    /// An empty population must have an empty CDF
    #[error("series has n = 0 but a non-empty cdf")]
    UnexpectedCdf,

    /// Per-user identity, when present, covers every observation
    #[error("cdfu has {len} entries, expected n = {n}")]
    CdfuLength { len: usize, n: usize },
}

/// Empirical distribution of grade values for one population slice
/// (e.g. all students, extension students).
///
/// Immutable after construction: [`filter`](GradeSeries::filter) and
/// [`truncate_below_percentile`](GradeSeries::truncate_below_percentile)
/// return new series, so instances are safe to share across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SeriesData", into = "SeriesData")]
pub struct GradeSeries {
    n: usize,
    cdf: Vec<CdfPoint>,
    cdfu: Option<Vec<u64>>,
    mean: Option<f64>,
    median: Option<f64>,
    stddev: Option<f64>,
    cutoff: Option<f64>,
}

impl From<SeriesData> for GradeSeries {
    fn from(d: SeriesData) -> Self {
        // Garbage in, garbage out: server data is not validated here.
        // `check` exists for tests and defensive assertions.
        let cdf = d
            .cdf
            .chunks_exact(2)
            .map(|pair| CdfPoint {
                value: pair[0],
                count: pair[1] as usize,
            })
            .collect();
        Self {
            n: d.n,
            cdf,
            cdfu: d.cdfu,
            mean: d.mean,
            median: d.median,
            stddev: d.stddev,
            cutoff: d.cutoff,
        }
    }
}

impl From<GradeSeries> for SeriesData {
    fn from(series: GradeSeries) -> Self {
        let mut cdf = Vec::with_capacity(series.cdf.len() * 2);
        for point in &series.cdf {
            cdf.push(point.value);
            cdf.push(point.count as f64);
        }
        Self {
            n: series.n,
            cdf,
            cdfu: series.cdfu,
            mean: series.mean,
            median: series.median,
            stddev: series.stddev,
            cutoff: series.cutoff,
        }
    }
}

impl GradeSeries {
    /// Build a series from the server's pre-aggregated wire form.
    ///
    /// Summary statistics are taken verbatim from the payload; absent
    /// fields stay `None`.
    pub fn from_data(d: SeriesData) -> Self {
        d.into()
    }

    /// Build a fresh series from an ascending sequence of values
    /// (ties allowed). Single linear pass; summary statistics are
    /// computed from scratch.
    pub fn from_sorted(values: &[f64]) -> Self {
        let mut cdf: Vec<CdfPoint> = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            match cdf.last_mut() {
                Some(last) if last.value == value => last.count = i + 1,
                _ => cdf.push(CdfPoint { value, count: i + 1 }),
            }
        }
        let mut series = Self {
            n: values.len(),
            cdf,
            cdfu: None,
            mean: None,
            median: None,
            stddev: None,
            cutoff: None,
        };
        series.assign_statistics();
        series
    }

    /// Convert back to the flat wire form.
    pub fn to_data(&self) -> SeriesData {
        self.clone().into()
    }

    /// Verify the data-model invariants.
    ///
    /// Intended for tests and defensive assertions, not production hot
    /// paths; query methods assume a well-formed series.
    pub fn check(&self) -> Result<(), SeriesError> {
        if self.n == 0 && !self.cdf.is_empty() {
            return Err(SeriesError::UnexpectedCdf);
        }
        if self.n > 0 && self.cdf.is_empty() {
            return Err(SeriesError::MissingCdf { n: self.n });
        }
        let mut prev: Option<&CdfPoint> = None;
        for (index, point) in self.cdf.iter().enumerate() {
            match prev {
                Some(prev) if point.value <= prev.value => {
                    return Err(SeriesError::UnorderedValue { index });
                }
                Some(prev) if point.count <= prev.count => {
                    return Err(SeriesError::UnorderedCount { index });
                }
                None if point.count == 0 => {
                    return Err(SeriesError::UnorderedCount { index });
                }
                _ => {}
            }
            prev = Some(point);
        }
        if let Some(last) = self.cdf.last() {
            if last.count != self.n {
                return Err(SeriesError::CountMismatch {
                    last: last.count,
                    n: self.n,
                });
            }
        }
        if let Some(cdfu) = &self.cdfu {
            if cdfu.len() != self.n {
                return Err(SeriesError::CdfuLength {
                    len: cdfu.len(),
                    n: self.n,
                });
            }
        }
        Ok(())
    }

    /// Number of observations
    pub fn n(&self) -> usize {
        self.n
    }

    /// Whether the population is empty
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// The compressed CDF breakpoints
    pub fn cdf(&self) -> &[CdfPoint] {
        &self.cdf
    }

    /// Per-observation user ids in ascending-value order, when known
    pub fn cdfu(&self) -> Option<&[u64]> {
        self.cdfu.as_deref()
    }

    /// Arithmetic mean, `None` for an empty population
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// Median, `None` for an empty population
    pub fn median(&self) -> Option<f64> {
        self.median
    }

    /// Sample standard deviation, `None` for an empty population
    pub fn stddev(&self) -> Option<f64> {
        self.stddev
    }

    /// Fractional percentile below which the server truncated this series
    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    /// Smallest recorded value.
    ///
    /// Empty series report `0.0` rather than NaN so the rendering layer's
    /// coordinate math stays finite; not a statistically meaningful value.
    pub fn min(&self) -> f64 {
        self.cdf.first().map_or(0.0, |point| point.value)
    }

    /// Largest recorded value (`0.0` for an empty series, as [`min`](Self::min)).
    pub fn max(&self) -> f64 {
        self.cdf.last().map_or(0.0, |point| point.value)
    }

    /// Number of observations with value ≤ `x`.
    pub fn count_at(&self, x: f64) -> usize {
        let idx = self.cdf.partition_point(|point| point.value <= x);
        if idx == 0 {
            0
        } else {
            self.cdf[idx - 1].count
        }
    }

    /// Fraction of observations with value ≤ `x` (`0.0` when empty).
    pub fn fraction_at(&self, x: f64) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.count_at(x) as f64 / self.n as f64
        }
    }

    /// Value at fractional rank `p` in `[0, 1]`, linearly interpolating
    /// between adjacent observations.
    ///
    /// `p` is clamped to `[0, 1]`; an empty series returns `0.0` (same
    /// rendering convention as [`min`](Self::min)).
    pub fn quantile(&self, p: f64) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let pos = p.clamp(0.0, 1.0) * (self.n - 1) as f64;
        let base = pos.floor() as usize;
        let frac = pos - base as f64;
        let lo = self.value_at_rank(base);
        if frac == 0.0 || base + 1 >= self.n {
            return lo;
        }
        let hi = self.value_at_rank(base + 1);
        if hi == lo {
            // Both ranks fall in the same run; nothing to interpolate.
            lo
        } else {
            lo + (hi - lo) * frac
        }
    }

    /// Keep only observations for which `predicate(value, user_id)` holds,
    /// returning a new series with statistics recomputed from scratch.
    ///
    /// The predicate runs once per observation in ascending-value order;
    /// the user-id argument is `None` when this series carries no `cdfu`.
    pub fn filter<F>(&self, mut predicate: F) -> GradeSeries
    where
        F: FnMut(f64, Option<u64>) -> bool,
    {
        let mut values = Vec::with_capacity(self.n);
        let mut users = self.cdfu.as_ref().map(|_| Vec::with_capacity(self.n));
        let mut rank = 0usize;
        for point in &self.cdf {
            while rank < point.count {
                let uid = self.cdfu.as_ref().and_then(|u| u.get(rank).copied());
                if predicate(point.value, uid) {
                    values.push(point.value);
                    if let (Some(users), Some(uid)) = (users.as_mut(), uid) {
                        users.push(uid);
                    }
                }
                rank += 1;
            }
        }
        if values.len() == self.n {
            // Nothing dropped; the unfiltered distribution is unchanged.
            return self.clone();
        }
        let mut series = Self::from_sorted(&values);
        series.cdfu = users;
        series.cutoff = self.cutoff;
        series
    }

    /// The grade value recorded for `uid`, if this series carries
    /// per-user identity and includes that user.
    pub fn value_of_user(&self, uid: u64) -> Option<f64> {
        let cdfu = self.cdfu.as_ref()?;
        let rank = cdfu.iter().position(|&u| u == uid)?;
        Some(self.value_at_rank(rank))
    }

    /// User ids whose value lies in `[lo, hi)`, in ascending-value order.
    /// Empty when this series carries no per-user identity.
    pub fn users_in_range(&self, lo: f64, hi: f64) -> Vec<u64> {
        let Some(cdfu) = self.cdfu.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut rank = 0usize;
        for point in &self.cdf {
            if point.value >= lo && point.value < hi {
                let hi_rank = point.count.min(cdfu.len());
                out.extend_from_slice(&cdfu[rank.min(hi_rank)..hi_rank]);
            }
            rank = point.count;
        }
        out
    }

    /// Drop CDF breakpoints whose cumulative count falls below
    /// `cutoff * n` and record the cutoff fraction.
    ///
    /// Cumulative counts of surviving breakpoints are unchanged, so the
    /// hidden mass stays folded into the first survivor. This mirrors the
    /// server-side truncation applied before low grades are shown to
    /// students; [`GradeKde`](crate::GradeKde) re-spreads the hidden mass
    /// when estimating a density.
    pub fn truncate_below_percentile(&self, cutoff: f64) -> GradeSeries {
        let threshold = cutoff * self.n as f64;
        let first = self
            .cdf
            .partition_point(|point| (point.count as f64) < threshold);
        let mut series = self.clone();
        series.cdf.drain(..first);
        series.cutoff = Some(cutoff);
        series
    }

    /// Step-function `(value, cumulative_fraction)` vertices for CDF
    /// rendering. A truncated series starts at its cutoff fraction
    /// instead of zero.
    pub fn plot_points(&self) -> Vec<(f64, f64)> {
        if self.cdf.is_empty() {
            return Vec::new();
        }
        let nr = 1.0 / self.n as f64;
        let mut points = Vec::with_capacity(self.cdf.len() * 2);
        let mut prev = self.cutoff.unwrap_or(0.0);
        points.push((self.cdf[0].value, prev));
        for (i, point) in self.cdf.iter().enumerate() {
            if i > 0 {
                // Horizontal run at the previous height
                points.push((point.value, prev));
            }
            prev = point.count as f64 * nr;
            points.push((point.value, prev));
        }
        points
    }

    /// Value of the 0-based `rank`-th observation. A malformed series
    /// (counts short of `n`) yields the last breakpoint rather than a
    /// panic; queries stay total.
    fn value_at_rank(&self, rank: usize) -> f64 {
        let idx = self.cdf.partition_point(|point| point.count <= rank);
        self.cdf
            .get(idx)
            .or_else(|| self.cdf.last())
            .map_or(0.0, |point| point.value)
    }

    /// Recompute mean, median, and stddev after a membership change.
    fn assign_statistics(&mut self) {
        if self.n == 0 {
            self.mean = None;
            self.median = None;
            self.stddev = None;
            return;
        }
        let nf = self.n as f64;
        let mut sum = 0.0;
        let mut prev = 0usize;
        for point in &self.cdf {
            sum += point.value * (point.count - prev) as f64;
            prev = point.count;
        }
        let mean = sum / nf;
        self.mean = Some(mean);
        self.median = Some(self.quantile(0.5));
        self.stddev = Some(if self.n > 1 {
            let mut sumsq = 0.0;
            let mut prev = 0usize;
            for point in &self.cdf {
                sumsq += (point.value - mean).powi(2) * (point.count - prev) as f64;
                prev = point.count;
            }
            (sumsq / (nf - 1.0)).sqrt()
        } else {
            0.0
        });
    }
}
