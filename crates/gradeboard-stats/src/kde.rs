//! Kernel density estimation for grade histograms
//!
//! `GradeKde` turns the run-length CDF of a [`GradeSeries`] into a smooth
//! probability-density curve with an Epanechnikov kernel. The convolution
//! is direct rather than FFT-based: populations are class-sized, and each
//! distinct value only touches the bins within one bandwidth of it.

use serde::{Deserialize, Serialize};

use crate::series::GradeSeries;

/// Value-axis bounds for a grade graph, supplied by the graph-geometry
/// descriptor of the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeDomain {
    pub min: f64,
    pub max: f64,
}

impl GradeDomain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Smoothed probability density over one grade series.
///
/// Immutable once constructed and a pure function of
/// `(series, domain, hfrac, nbins)`; recomputation means building a new
/// instance. Borrows its source series so consumers can recover `cdfu`
/// for highlighting.
#[derive(Debug, Clone)]
pub struct GradeKde<'a> {
    series: &'a GradeSeries,
    kde: Vec<f64>,
    maxp: f64,
    binwidth: f64,
}

impl<'a> GradeKde<'a> {
    /// Estimate a density over `nbins + 1` uniform bins spanning `domain`,
    /// with bandwidth `hfrac` expressed as a fraction of the domain width.
    pub fn new(
        series: &'a GradeSeries,
        domain: GradeDomain,
        hfrac: f64,
        nbins: usize,
    ) -> Self {
        let h = domain.width() * hfrac;
        let binwidth = domain.width() / nbins as f64;
        let mut bins = vec![0.0; nbins + 1];
        for (value, run) in cutoff_adjusted_runs(series, domain) {
            accumulate_kernel(&mut bins, domain.min, binwidth, h, value, run);
        }
        let mut maxp = 0.0f64;
        if series.n() > 0 {
            let nr = 1.0 / series.n() as f64;
            for bin in &mut bins {
                *bin *= nr;
                maxp = maxp.max(*bin);
            }
        }
        Self {
            series,
            kde: bins,
            maxp,
            binwidth,
        }
    }

    /// The source series this density was estimated from
    pub fn series(&self) -> &GradeSeries {
        self.series
    }

    /// Per-bin density values, `nbins + 1` entries
    pub fn kde(&self) -> &[f64] {
        &self.kde
    }

    /// Maximum density across bins (`0.0` for an empty population)
    pub fn maxp(&self) -> f64 {
        self.maxp
    }

    /// Width of one bin on the value axis
    pub fn binwidth(&self) -> f64 {
        self.binwidth
    }
}

/// Decode a series into `(value, run_length)` pairs, re-spreading any
/// cutoff-hidden mass as phantom observations.
///
/// A truncated series folds `floor(n * cutoff)` hidden observations into
/// its first breakpoint. For density estimation those are pulled back out
/// and smeared uniformly between `domain.min` and the true series minimum,
/// at midpoint positions. The smear is a visual convention, not a
/// statistical inference; the source series is untouched.
fn cutoff_adjusted_runs(series: &GradeSeries, domain: GradeDomain) -> Vec<(f64, usize)> {
    let mut runs = Vec::with_capacity(series.cdf().len());
    let mut hidden = 0usize;
    if let Some(cutoff) = series.cutoff() {
        if series.n() > 0 {
            hidden = (series.n() as f64 * cutoff).floor() as usize;
            let span = series.min() - domain.min;
            for i in 0..hidden {
                let x = domain.min + span * (i as f64 + 0.5) / hidden as f64;
                runs.push((x, 1));
            }
        }
    }
    let mut prev = hidden;
    for point in series.cdf() {
        let run = point.count.saturating_sub(prev);
        if run > 0 {
            runs.push((point.value, run));
        }
        prev = point.count;
    }
    runs
}

/// Add one value's Epanechnikov contribution, `run * 0.75/H * (1 - (d/H)^2)`
/// for bin-center distances `|d| <= H`, to the bins it can reach. The
/// affected bin range is computed from the bandwidth so distant bins are
/// never scanned.
fn accumulate_kernel(
    bins: &mut [f64],
    domain_min: f64,
    binwidth: f64,
    h: f64,
    value: f64,
    run: usize,
) {
    if !(h > 0.0) || !(binwidth > 0.0) {
        // Degenerate bandwidth or domain: the kernel has no support.
        return;
    }
    let nbins = bins.len() - 1;
    let offset = value - domain_min;
    let first = ((offset - h) / binwidth).floor().max(0.0);
    let last = (((offset + h) / binwidth).ceil() - 1.0).min(nbins as f64);
    if first > last {
        return;
    }
    let ih = 1.0 / h;
    let weight = run as f64;
    for bin in (first as usize)..=(last as usize) {
        let d = (bin as f64 * binwidth - offset) * ih;
        if d.abs() <= 1.0 {
            bins[bin] += 0.75 * ih * (1.0 - d * d) * weight;
        }
    }
}
