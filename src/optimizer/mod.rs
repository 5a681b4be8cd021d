//! Design-space search.
//!
//! Each topology runs the same pipeline:
//!
//! 1. **Init**: the request is already coerced; empty axes have collapsed onto
//!    their fixed values.
//! 2. **Filtering**: user selections are applied per catalog kind, FETs below
//!    the voltage-stress margin are dropped (and counted), and each kind is cut
//!    to a shortlist.
//! 3. **Sweeping**: a lazy Cartesian product over the swept axes and the
//!    shortlists. Every candidate is either scored or rejected with a
//!    [`RejectReason`].
//! 4. **Found / Infeasible**: the minimum-score candidate wins, first seen on
//!    ties. Without one the run ends in [`Outcome::Infeasible`], or in
//!    [`Outcome::Fallback`] when [`InfeasiblePolicy::Fallback`] is configured.
//! 5. **Formatting**: the winner gets its capacitor bank and heatsink and is
//!    flattened into a [`DesignReport`].

pub mod llc;
pub mod pfc;
mod report;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Fet;
use crate::input::ObjectiveWeights;
use crate::solver::RootFinder;

pub use llc::{LlcCandidate, LlcEvaluator, LlcOptimizer};
pub use pfc::{PfcCandidate, PfcEvaluator, PfcOptimizer};
pub use report::{sanitize, DesignReport, ReportValue};

/// Components of each kind kept for the sweep.
pub const DEFAULT_SHORTLIST: usize = 5;

/// Candidates below this efficiency (percent) are rejected.
pub const DEFAULT_MIN_EFFICIENCY: f64 = 85.0;

pub const DEFAULT_GAIN_MIN: f64 = 0.5;
pub const DEFAULT_GAIN_MAX: f64 = 2.0;

/// Peak flux may use this share of the core's saturation flux.
pub const DEFAULT_SATURATION_MARGIN: f64 = 0.8;

pub const DEFAULT_MAX_TURNS: u32 = 200;

/// FETs must be rated at this multiple of their switch stress.
pub const VOLTAGE_STRESS_MARGIN: f64 = 1.2;

pub const LLC_WAVEFORM_POINTS: usize = 1000;
pub const PFC_WAVEFORM_POINTS: usize = 200;

/// Volume charged per discrete FET package (mm³).
pub const FET_PACKAGE_VOLUME: f64 = 500.0;

/// What to return when no candidate survives the sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum InfeasiblePolicy {
    /// Return [`Outcome::Infeasible`] with the rejection statistics
    #[default]
    Report,
    /// Return the topology's fallback design alongside the statistics
    Fallback,
}

/// Run limits shared by both optimizers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    pub shortlist: usize,
    /// Minimum efficiency in percent
    pub min_efficiency: f64,
    pub gain_min: f64,
    pub gain_max: f64,
    pub saturation_margin: f64,
    pub max_turns: u32,
    pub policy: InfeasiblePolicy,
    pub llc_waveform_points: usize,
    pub pfc_waveform_points: usize,
    pub finder: RootFinder,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self {
            shortlist: DEFAULT_SHORTLIST,
            min_efficiency: DEFAULT_MIN_EFFICIENCY,
            gain_min: DEFAULT_GAIN_MIN,
            gain_max: DEFAULT_GAIN_MAX,
            saturation_margin: DEFAULT_SATURATION_MARGIN,
            max_turns: DEFAULT_MAX_TURNS,
            policy: InfeasiblePolicy::Report,
            llc_waveform_points: LLC_WAVEFORM_POINTS,
            pfc_waveform_points: PFC_WAVEFORM_POINTS,
            finder: RootFinder::new(),
        }
    }

    /// Shortlist size; at least one part per kind.
    pub fn with_shortlist(mut self, shortlist: usize) -> Self {
        self.shortlist = shortlist.max(1);
        self
    }

    pub fn with_min_efficiency(mut self, percent: f64) -> Self {
        self.min_efficiency = percent;
        self
    }

    pub fn with_gain_window(mut self, gain_min: f64, gain_max: f64) -> Self {
        self.gain_min = gain_min.min(gain_max);
        self.gain_max = gain_max.max(gain_min);
        self
    }

    pub fn with_saturation_margin(mut self, margin: f64) -> Self {
        self.saturation_margin = margin;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_policy(mut self, policy: InfeasiblePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_waveform_points(mut self, llc: usize, pfc: usize) -> Self {
        self.llc_waveform_points = llc;
        self.pfc_waveform_points = pfc;
        self
    }

    pub fn with_root_finder(mut self, finder: RootFinder) -> Self {
        self.finder = finder;
        self
    }

    fn gain_in_window(&self, gain: f64) -> bool {
        gain >= self.gain_min && gain <= self.gain_max
    }

    /// Turn-count limit first, then the saturation margin.
    fn check_winding(&self, turns: u32, b_peak: f64, b_sat: f64) -> std::result::Result<(), RejectReason> {
        if turns > self.max_turns {
            Err(RejectReason::TooManyTurns)
        } else if !(b_peak <= self.saturation_margin * b_sat) {
            Err(RejectReason::Saturation)
        } else {
            Ok(())
        }
    }

    fn check_efficiency(&self, efficiency_percent: f64) -> std::result::Result<(), RejectReason> {
        if efficiency_percent >= self.min_efficiency {
            Ok(())
        } else {
            Err(RejectReason::LowEfficiency)
        }
    }
}

/// Name reported for a part that could not be selected.
pub const NO_PART: &str = "none";

/// Keep FETs rated for `VOLTAGE_STRESS_MARGIN·stress`; the rest count as rejections.
fn rated_fets<'a>(kind: &str, fets: Vec<&'a Fet>, stress: f64, rejections: &mut Rejections) -> Vec<&'a Fet> {
    let required = VOLTAGE_STRESS_MARGIN * stress;
    let (kept, dropped): (Vec<&Fet>, Vec<&Fet>) = fets.into_iter().partition(|fet| fet.v_dss >= required);
    debug!(kind, required, kept = kept.len(), dropped = dropped.len(), "voltage pre-filter");
    rejections.record_many(RejectReason::VoltageRating, dropped.len());
    kept
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// FET rated below the voltage-stress margin
    VoltageRating,
    /// Tank gain outside the gain window
    GainOutOfRange,
    /// Peak flux above the saturation margin
    Saturation,
    /// Turn count above the limit
    TooManyTurns,
    /// Efficiency below the minimum
    LowEfficiency,
    /// No core reaches the area product
    NoCore,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::VoltageRating => "voltage_rating",
            RejectReason::GainOutOfRange => "gain_out_of_range",
            RejectReason::Saturation => "saturation",
            RejectReason::TooManyTurns => "too_many_turns",
            RejectReason::LowEfficiency => "low_efficiency",
            RejectReason::NoCore => "no_core",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection counts by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rejections {
    counts: BTreeMap<RejectReason, usize>,
}

impl Rejections {
    pub fn record(&mut self, reason: RejectReason) {
        self.record_many(reason, 1);
    }

    pub fn record_many(&mut self, reason: RejectReason, count: usize) {
        if count > 0 {
            *self.counts.entry(reason).or_insert(0) += count;
        }
    }

    pub fn count(&self, reason: RejectReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RejectReason, usize)> + '_ {
        self.counts.iter().map(|(r, c)| (*r, *c))
    }
}

/// Statistics of a search that found nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfeasibleReport {
    pub topology: &'static str,
    /// Combinations evaluated by the sweep
    pub visited: usize,
    pub rejections: Rejections,
}

impl fmt::Display for InfeasibleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no feasible {} design among {} combinations", self.topology, self.visited)?;
        for (reason, count) in self.rejections.iter() {
            write!(f, ", {reason}: {count}")?;
        }
        Ok(())
    }
}

/// Result of one optimizer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Found(DesignReport),
    Infeasible(InfeasibleReport),
    Fallback {
        design: DesignReport,
        infeasible: InfeasibleReport,
    },
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }

    /// The design, whether found or substituted.
    pub fn report(&self) -> Option<&DesignReport> {
        match self {
            Outcome::Found(report) | Outcome::Fallback { design: report, .. } => Some(report),
            Outcome::Infeasible(_) => None,
        }
    }

    pub fn infeasible(&self) -> Option<&InfeasibleReport> {
        match self {
            Outcome::Infeasible(report) | Outcome::Fallback { infeasible: report, .. } => Some(report),
            Outcome::Found(_) => None,
        }
    }

    /// Apply `policy` to a search that found nothing.
    fn from_infeasible(policy: InfeasiblePolicy, report: InfeasibleReport, fallback: impl FnOnce() -> DesignReport) -> Self {
        warn!(%report, "search found no feasible design");
        match policy {
            InfeasiblePolicy::Report => Outcome::Infeasible(report),
            InfeasiblePolicy::Fallback => Outcome::Fallback {
                design: fallback(),
                infeasible: report,
            },
        }
    }
}

/// Weighted objective: lower is better.
///
/// `w_eff·(100 − η%) + w_vol·(volume/10000 mm³) + w_cost·(cost/10)`.
pub fn score(weights: &ObjectiveWeights, efficiency_percent: f64, volume_mm3: f64, cost: f64) -> f64 {
    weights.efficiency * (100.0 - efficiency_percent)
        + weights.volume * (volume_mm3 / 10_000.0)
        + weights.cost * (cost / 10.0)
}

/// `P/(P + loss)` in percent; 0 when nothing is delivered.
pub fn efficiency_percent(p_out: f64, total_loss: f64) -> f64 {
    let p_in = p_out + total_loss;
    if p_in > 0.0 {
        p_out / p_in * 100.0
    } else {
        0.0
    }
}

/// Minimum-score tracker shared by the sweeps.
#[derive(Debug)]
struct Search<T> {
    best: Option<(f64, T)>,
    visited: usize,
    rejections: Rejections,
}

impl<T> Search<T> {
    fn new() -> Self {
        Self {
            best: None,
            visited: 0,
            rejections: Rejections::default(),
        }
    }

    /// Record one evaluated combination.
    fn offer(&mut self, result: std::result::Result<(f64, T), RejectReason>) {
        self.visited += 1;
        match result {
            Ok((score, candidate)) => {
                if self.best.as_ref().map_or(true, |(best, _)| score < *best) {
                    self.best = Some((score, candidate));
                }
            }
            Err(reason) => self.rejections.record(reason),
        }
    }

    fn finish(self, topology: &'static str) -> std::result::Result<T, InfeasibleReport> {
        match self.best {
            Some((_, candidate)) => Ok(candidate),
            None => Err(InfeasibleReport {
                topology,
                visited: self.visited,
                rejections: self.rejections,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_config_builders() {
        let config = OptimizerConfig::new()
            .with_shortlist(0)
            .with_gain_window(2.0, 0.5)
            .with_policy(InfeasiblePolicy::Fallback);
        assert_eq!(config.shortlist, 1);
        assert_eq!((config.gain_min, config.gain_max), (0.5, 2.0));
        assert!(config.gain_in_window(1.0));
        assert!(!config.gain_in_window(2.5));
        assert_eq!(config.policy, InfeasiblePolicy::Fallback);
        assert_eq!(OptimizerConfig::default().max_turns, DEFAULT_MAX_TURNS);
    }

    #[test]
    fn test_feasibility_checks() {
        let config = OptimizerConfig::new();
        assert_eq!(config.check_winding(201, 0.1, 0.4), Err(RejectReason::TooManyTurns));
        assert_eq!(config.check_winding(20, 0.33, 0.4), Err(RejectReason::Saturation));
        assert_eq!(config.check_winding(20, f64::NAN, 0.4), Err(RejectReason::Saturation));
        assert_eq!(config.check_winding(200, 0.32, 0.4), Ok(()));
        assert_eq!(config.check_efficiency(84.9), Err(RejectReason::LowEfficiency));
        assert_eq!(config.check_efficiency(85.0), Ok(()));
    }

    #[test]
    fn test_voltage_prefilter_counts_rejections() {
        let fets = [Fet::new("HV", 650.0, 0.1), Fet::new("LV", 100.0, 0.01), Fet::new("MID", 500.0, 0.1)];
        let mut rejections = Rejections::default();
        let kept = rated_fets("pfc", fets.iter().collect(), 400.0, &mut rejections);
        let names: Vec<_> = kept.iter().map(|f| f.part_number.as_str()).collect();
        assert_eq!(names, vec!["HV", "MID"]);
        assert_eq!(rejections.count(RejectReason::VoltageRating), 1);
    }

    #[test]
    fn test_score_and_efficiency() {
        let w = ObjectiveWeights::new(0.6, 0.3, 0.1);
        assert_relative_eq!(score(&w, 98.0, 12_470.0, 5.0), 0.6 * 2.0 + 0.3 * 1.247 + 0.1 * 0.5);
        assert_relative_eq!(efficiency_percent(500.0, 0.0), 100.0);
        assert_relative_eq!(efficiency_percent(90.0, 10.0), 90.0);
        assert_eq!(efficiency_percent(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_search_keeps_first_minimum() {
        let mut search = Search::new();
        search.offer(Ok((2.0, "a")));
        search.offer(Err(RejectReason::Saturation));
        search.offer(Ok((1.0, "b")));
        search.offer(Ok((1.0, "c")));
        assert_eq!(search.visited, 4);
        assert_eq!(search.finish("test"), Ok("b"));
    }

    #[test]
    fn test_infeasible_statistics() {
        let mut search: Search<()> = Search::new();
        search.offer(Err(RejectReason::LowEfficiency));
        search.offer(Err(RejectReason::LowEfficiency));
        search.rejections.record_many(RejectReason::VoltageRating, 3);
        search.rejections.record_many(RejectReason::NoCore, 0);
        let report = search.finish("pfc").unwrap_err();
        assert_eq!(report.visited, 2);
        assert_eq!(report.rejections.count(RejectReason::LowEfficiency), 2);
        assert_eq!(report.rejections.total(), 5);
        assert_eq!(report.rejections.count(RejectReason::NoCore), 0);
        let text = report.to_string();
        assert!(text.contains("low_efficiency: 2"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rejections"]["voltage_rating"], 3);
    }

    #[test]
    fn test_policy_outcomes() {
        let stats = InfeasibleReport {
            topology: "llc",
            visited: 0,
            rejections: Rejections::default(),
        };
        let reported = Outcome::from_infeasible(InfeasiblePolicy::Report, stats.clone(), DesignReport::new);
        assert!(reported.report().is_none());
        assert!(reported.infeasible().is_some());

        let substituted = Outcome::from_infeasible(InfeasiblePolicy::Fallback, stats, || {
            let mut r = DesignReport::new();
            r.scalar("BestQ", 0.4);
            r
        });
        assert!(!substituted.is_found());
        assert_eq!(substituted.report().and_then(|r| r.scalar_value("BestQ")), Some(0.4));
        let json = serde_json::to_value(&substituted).unwrap();
        assert_eq!(json["status"], "fallback");
    }
}
