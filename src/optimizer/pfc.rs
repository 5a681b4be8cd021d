//! Boost PFC converter search.
//!
//! The sweep walks switching frequency, boost inductance, the FET shortlist
//! and the inductor-core shortlist in that order. Each combination winds the
//! inductor for the design flux, checks the turn count and saturation, and
//! adds switch and inductor losses.

use tracing::{debug, info, warn};

use super::{
    efficiency_percent, rated_fets, score, DesignReport, OptimizerConfig, Outcome, RejectReason, Search,
    FET_PACKAGE_VOLUME, NO_PART,
};
use crate::catalog::{
    filter_selected, shortlist_cores, shortlist_fets, ComponentCatalog, Core, Fet, BUS_CAPACITORS, INDUCTOR_CORES,
};
use crate::input::PfcRequest;
use crate::models::capacitor::{
    bus_ripple_current, select_capacitors, CapacitorRequirement, DEFAULT_HOLDUP_VOLTAGE_RATIO, DEFAULT_RIPPLE_FRACTION,
};
use crate::models::magnetics::{
    pfc_inductor_currents, pfc_inductor_losses, turns_for_inductance, InductorLosses, PfcInductorCurrents,
    WindingSpec,
};
use crate::models::semiconductor::{pfc_switch_losses, BoostOperatingPoint, FetLosses};
use crate::models::thermal::{size_heatsink, DEFAULT_R_JC};
use crate::models::waveform::pfc_inductor_waveform;
use crate::sweep::product;

/// Efficiency reported by the fallback design (percent).
const FALLBACK_EFFICIENCY: f64 = 90.0;

/// Volume reported by the fallback design (mm³).
const FALLBACK_VOLUME: f64 = 1000.0;

/// A fully evaluated boost PFC design.
#[derive(Debug, Clone, PartialEq)]
pub struct PfcCandidate<'a> {
    pub f_sw: f64,
    pub inductance: f64,
    pub fet: &'a Fet,
    pub core: &'a Core,
    pub turns: u32,
    pub currents: PfcInductorCurrents,
    pub inductor: InductorLosses,
    pub fet_losses: FetLosses,
    pub total_loss: f64,
    /// Percent
    pub efficiency: f64,
    /// mm³
    pub volume: f64,
    pub cost: f64,
    pub score: f64,
}

impl PfcCandidate<'_> {
    /// Wound core volume, without the FET package.
    pub fn inductor_volume(&self) -> f64 {
        self.volume - FET_PACKAGE_VOLUME
    }
}

/// Scores PFC candidates for one request.
#[derive(Debug, Clone, Copy)]
pub struct PfcEvaluator<'a> {
    request: &'a PfcRequest,
    config: &'a OptimizerConfig,
}

impl<'a> PfcEvaluator<'a> {
    pub fn new(request: &'a PfcRequest, config: &'a OptimizerConfig) -> Self {
        Self { request, config }
    }

    /// Wire radius in mm, as used by the toroid volume.
    fn wire_radius_mm(&self) -> f64 {
        self.request.wire_diameter * 1e3 / 2.0
    }

    pub fn evaluate(
        &self,
        f_sw: f64,
        inductance: f64,
        fet: &'a Fet,
        core: &'a Core,
    ) -> Result<PfcCandidate<'a>, RejectReason> {
        let request = self.request;
        let envelope = &request.spec.envelope;
        let p_out = envelope.p_out;
        let v_out = envelope.v_out_nom;

        let currents = pfc_inductor_currents(p_out, request.efficiency, envelope.v_in_nom, v_out, inductance, f_sw);
        let turns = turns_for_inductance(inductance, currents.i_peak, request.design_flux, core.ae, core.al);
        if turns > self.config.max_turns {
            return Err(RejectReason::TooManyTurns);
        }

        let winding = WindingSpec {
            turns,
            wire_diameter: request.wire_diameter,
            temperature: request.winding_temperature,
        };
        let inductor = pfc_inductor_losses(core, &currents, &winding, inductance, f_sw, p_out);
        self.config.check_winding(turns, inductor.b_max, core.b_sat)?;

        let fet_losses = pfc_switch_losses(
            fet,
            &BoostOperatingPoint {
                i_in_rms: currents.i_in_rms,
                i_sw_avg: currents.i_in_rms,
                v_out,
                f_sw,
            },
        );

        let total_loss = fet_losses.total() + inductor.total();
        let efficiency = efficiency_percent(p_out, total_loss);
        self.config.check_efficiency(efficiency)?;

        let volume = FET_PACKAGE_VOLUME + core.volume_mm3(self.wire_radius_mm());
        let cost = fet.cost_or_default() + core.cost_or_default();

        Ok(PfcCandidate {
            f_sw,
            inductance,
            fet,
            core,
            turns,
            currents,
            inductor,
            fet_losses,
            total_loss,
            efficiency,
            volume,
            cost,
            score: score(&request.spec.weights, efficiency, volume, cost),
        })
    }
}

/// Boost PFC design-space optimizer over a shared catalog.
#[derive(Debug, Clone)]
pub struct PfcOptimizer<'a> {
    catalog: &'a ComponentCatalog,
    config: OptimizerConfig,
}

impl<'a> PfcOptimizer<'a> {
    pub fn new(catalog: &'a ComponentCatalog) -> Self {
        Self {
            catalog,
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn run(&self, request: &PfcRequest) -> Outcome {
        let config = &self.config;
        let envelope = &request.spec.envelope;
        info!(p_out = envelope.p_out, v_in_rms = envelope.v_in_nom, v_out = envelope.v_out_nom, "PFC search started");

        let mut search = Search::new();

        let fets = rated_fets(
            "boost",
            filter_selected("boost FET", self.catalog.load_fets(), &request.fets),
            envelope.v_out_nom,
            &mut search.rejections,
        );
        let fets = shortlist_fets(fets, config.shortlist);
        let cores = shortlist_cores(
            filter_selected("boost core", self.catalog.load_cores(INDUCTOR_CORES), &request.cores),
            config.shortlist,
        );

        let f_values = request.f_sw.values();
        let l_values = request.inductance.values();
        debug!(
            frequencies = f_values.len(),
            inductances = l_values.len(),
            fets = fets.len(),
            cores = cores.len(),
            "PFC design space"
        );

        let evaluator = PfcEvaluator::new(request, config);
        let combinations = product(product(product(f_values.iter().copied(), &l_values), &fets), &cores);
        for (((f_sw, &inductance), &fet), &core) in combinations {
            search.offer(
                evaluator
                    .evaluate(f_sw, inductance, fet, core)
                    .map(|candidate| (candidate.score, candidate)),
            );
        }

        match search.finish("pfc") {
            Ok(best) => {
                info!(
                    efficiency = best.efficiency,
                    total_loss = best.total_loss,
                    f_sw = best.f_sw,
                    inductance = best.inductance,
                    fet = %best.fet.part_number,
                    core = %best.core.name,
                    "PFC design found"
                );
                Outcome::Found(self.format(request, &best))
            }
            Err(stats) => Outcome::from_infeasible(config.policy, stats, || {
                fallback_report(request, config.pfc_waveform_points)
            }),
        }
    }

    fn format(&self, request: &PfcRequest, best: &PfcCandidate<'_>) -> DesignReport {
        let envelope = &request.spec.envelope;
        let p_out = envelope.p_out;
        let v_out = envelope.v_out_nom;
        let mut report = DesignReport::new();

        report
            .scalar("BestTotalEfficiency", best.efficiency)
            .scalar("BestTotalLoss", best.total_loss)
            .scalar("BestTotalVolume", best.volume)
            .scalar("BestPowerDensity", p_out / (best.volume / 1000.0))
            .scalar("BestL", best.inductance)
            .scalar("BestN", f64::from(best.turns))
            .scalar("Bestfs", best.f_sw)
            .scalar("BestDeltaI", best.currents.delta_i);

        let fet = &best.fet_losses;
        report
            .text("BestFet_Name", best.fet.part_number.as_str())
            .scalar("BestFet_Loss", fet.total())
            .scalar("BestFet_Conduction", fet.conduction)
            .scalar("BestFet_Switching", fet.switching_total())
            .scalar("BestFet_Gate", fet.gate);

        report
            .text("BestInd_Name", best.core.name.as_str())
            .scalar("BestInd_Loss", best.inductor.total())
            .scalar("BestInd_CoreLoss", best.inductor.core)
            .scalar("BestInd_CopperLoss", best.inductor.copper)
            .scalar("BestInd_Bmax", best.inductor.b_max)
            .scalar("BestInd_Volume", best.inductor_volume());

        let i_out = envelope.i_out();
        let requirement = CapacitorRequirement::new(p_out, v_out)
            .with_holdup(request.hold_up, DEFAULT_HOLDUP_VOLTAGE_RATIO * v_out)
            .with_ripple(2.0 * request.line_frequency, DEFAULT_RIPPLE_FRACTION)
            .with_ripple_current(bus_ripple_current(i_out));
        let caps = filter_selected(
            "bus capacitor",
            self.catalog.load_capacitors(BUS_CAPACITORS),
            &request.capacitors,
        );
        match select_capacitors(&requirement, caps) {
            Some(bank) => {
                report
                    .text("BestCap_Name", bank.part.part_number.as_str())
                    .scalar("BestCap_Count", f64::from(bank.count))
                    .scalar("BestCap_Value", bank.total_capacitance)
                    .scalar("BestCap_Voltage", bank.part.voltage);
            }
            None => {
                warn!(capacitance = requirement.capacitance(), "no bus capacitor qualifies");
                report.text("BestCap_Name", NO_PART);
            }
        }

        let heatsinks = filter_selected("heatsink", self.catalog.load_heatsinks(), &request.heatsinks);
        let r_jc = best.fet.r_th_jc.unwrap_or(DEFAULT_R_JC);
        match size_heatsink(fet.total(), request.tj_max, envelope.t_amb, r_jc, heatsinks, None) {
            Some(choice) => {
                report
                    .text("BestHeatsink_Name", choice.heatsink.name.as_str())
                    .scalar("BestHeatsink_Rsa", choice.r_sa_estimated)
                    .scalar("BestHeatsink_Tj", choice.junction_temperature);
            }
            None => {
                warn!(loss = fet.total(), "no heatsink qualifies for the boost switch");
                report.text("BestHeatsink_Name", NO_PART);
            }
        }

        let wave = pfc_inductor_waveform(
            best.currents.i_in_rms,
            best.currents.delta_i,
            best.f_sw,
            self.config.pfc_waveform_points,
        );
        report.series("t", wave.t).series("i_L", wave.i_l);

        debug!(entries = report.len(), "PFC report formatted");
        report
    }
}

/// Design substituted under [`super::InfeasiblePolicy::Fallback`]: the first
/// swept frequency and inductance at 90 % efficiency, with no parts chosen.
pub fn fallback_report(request: &PfcRequest, points: usize) -> DesignReport {
    let envelope = &request.spec.envelope;
    let p_out = envelope.p_out;
    let f_sw = request.f_sw.values().first().copied().unwrap_or(request.f_sw.fixed);
    let inductance = request
        .inductance
        .values()
        .first()
        .copied()
        .unwrap_or(request.inductance.fixed);
    let currents = pfc_inductor_currents(p_out, request.efficiency, envelope.v_in_nom, envelope.v_out_nom, inductance, f_sw);
    let wave = pfc_inductor_waveform(currents.i_in_rms, currents.delta_i, f_sw, points);

    let mut report = DesignReport::new();
    report
        .scalar("BestTotalEfficiency", FALLBACK_EFFICIENCY)
        .scalar("BestTotalLoss", p_out * (100.0 / FALLBACK_EFFICIENCY - 1.0))
        .scalar("BestTotalVolume", FALLBACK_VOLUME)
        .scalar("BestPowerDensity", p_out / (FALLBACK_VOLUME / 1000.0))
        .scalar("BestL", inductance)
        .scalar("Bestfs", f_sw)
        .scalar("BestDeltaI", currents.delta_i)
        .text("BestFet_Name", NO_PART)
        .text("BestInd_Name", NO_PART)
        .text("BestCap_Name", NO_PART)
        .text("BestHeatsink_Name", NO_PART)
        .series("t", wave.t)
        .series("i_L", wave.i_l);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{LossCoefficients, DEMO_BUNDLE};
    use crate::input::Selection;
    use crate::optimizer::InfeasiblePolicy;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn scenario() -> PfcRequest {
        PfcRequest::from_value(&json!({
            "V_in_RMS": 230,
            "outVol": 400,
            "outPow": 500,
            "mode1": 1, "fixedValue1": 65,
            "mode2": 1, "fixedValue2": 100,
            "AllSelectedFets": 1,
        }))
        .unwrap()
    }

    fn pq3230() -> Core {
        Core::new("PQ32/30", 161e-6, 140e-6, 11.97e-6, 66.7e-3)
            .with_b_sat(0.39)
            .with_loss(LossCoefficients::steinmetz(1.7, 1.46, 2.75))
    }

    fn coolmos() -> Fet {
        let mut fet = Fet::new("IPW65R045C7", 650.0, 0.045);
        fet.q_g = 93e-9;
        fet.q_rr = 10e-9;
        fet
    }

    #[test]
    fn test_evaluate_single_point() {
        let request = scenario();
        let config = OptimizerConfig::new();
        let evaluator = PfcEvaluator::new(&request, &config);
        let (core, fet) = (pq3230(), coolmos());
        let candidate = evaluator.evaluate(65e3, 100e-6, &fet, &core).unwrap();

        // I_peak = 3.20 A + 9.35 A/2 = 7.87 A → ⌈7.87e-4/(0.3·161e-6)⌉ = 17 turns
        assert_eq!(candidate.turns, 17);
        assert_relative_eq!(candidate.inductor.b_max, 0.2876, max_relative = 2e-3);
        assert_relative_eq!(candidate.currents.delta_i, 9.35, max_relative = 2e-3);
        assert!(candidate.efficiency > 97.0 && candidate.efficiency < 100.0);
        assert_relative_eq!(candidate.inductor_volume(), 11_970.0, max_relative = 1e-9);
        assert_relative_eq!(candidate.total_loss, candidate.fet_losses.total() + candidate.inductor.total());
    }

    #[test]
    fn test_winding_rejections() {
        let request = scenario();
        let config = OptimizerConfig::new();
        let evaluator = PfcEvaluator::new(&request, &config);
        let fet = coolmos();

        let low_saturation = pq3230().with_b_sat(0.3);
        let err = evaluator.evaluate(65e3, 100e-6, &fet, &low_saturation).unwrap_err();
        assert_eq!(err, RejectReason::Saturation);

        let sliver = Core::new("sliver", 1e-6, 10e-6, 1e-8, 10e-3).with_b_sat(0.5);
        let err = evaluator.evaluate(65e3, 100e-6, &fet, &sliver).unwrap_err();
        assert_eq!(err, RejectReason::TooManyTurns);

        let strict = OptimizerConfig::new().with_min_efficiency(99.9);
        let err = PfcEvaluator::new(&request, &strict)
            .evaluate(65e3, 100e-6, &fet, &pq3230())
            .unwrap_err();
        assert_eq!(err, RejectReason::LowEfficiency);
    }

    #[test]
    fn test_scenario_on_demo_catalog() {
        let catalog = ComponentCatalog::from_bundle_str(DEMO_BUNDLE).unwrap();
        let outcome = PfcOptimizer::new(&catalog).run(&scenario());
        let Outcome::Found(report) = &outcome else {
            panic!("expected a feasible design, got {outcome:?}");
        };
        let efficiency = report.scalar_value("BestTotalEfficiency").unwrap();
        assert!(efficiency > 95.0 && efficiency <= 100.0);
        assert_eq!(report.scalar_value("Bestfs"), Some(65e3));
        assert_relative_eq!(report.scalar_value("BestL").unwrap(), 100e-6, max_relative = 1e-12);
        assert_eq!(report.series_value("t").map(<[f64]>::len), Some(200));
        assert_eq!(report.series_value("i_L").map(<[f64]>::len), Some(200));
        let fet = catalog
            .fet_by_part_number(report.text_value("BestFet_Name").unwrap())
            .unwrap();
        assert!(fet.v_dss >= 480.0);
        assert!(report.text_value("BestInd_Name").is_some_and(|name| name != "none"));
        let volume = report.scalar_value("BestTotalVolume").unwrap();
        assert_relative_eq!(
            report.scalar_value("BestInd_Volume").unwrap(),
            volume - 500.0,
            max_relative = 1e-12
        );
        if let Some(voltage) = report.scalar_value("BestCap_Voltage") {
            assert!(voltage >= 400.0 / 0.8);
        }
    }

    #[test]
    fn test_only_underrated_fets_selected() {
        let catalog = ComponentCatalog::from_bundle_str(DEMO_BUNDLE).unwrap();
        let mut request = scenario();
        request.fets = Selection::named(["BSC034N10LS5"]);
        let outcome = PfcOptimizer::new(&catalog).run(&request);
        let stats = outcome.infeasible().unwrap();
        assert_eq!(stats.visited, 0);
        assert_eq!(stats.rejections.count(RejectReason::VoltageRating), 1);
    }

    #[test]
    fn test_fallback_uses_first_axis_values() {
        let catalog = ComponentCatalog::from_bundle_str(DEMO_BUNDLE).unwrap();
        let mut request = scenario();
        request.fets = Selection::named(["BSC034N10LS5"]);
        let config = OptimizerConfig::new().with_policy(InfeasiblePolicy::Fallback);
        let outcome = PfcOptimizer::new(&catalog).with_config(config).run(&request);
        let report = outcome.report().unwrap();
        assert_eq!(report.scalar_value("BestTotalEfficiency"), Some(90.0));
        assert_eq!(report.scalar_value("Bestfs"), Some(65e3));
        assert_relative_eq!(report.scalar_value("BestTotalLoss").unwrap(), 500.0 / 9.0, max_relative = 1e-12);
        assert_eq!(report.text_value("BestFet_Name"), Some(NO_PART));
        assert_eq!(report.series_value("t").map(<[f64]>::len), Some(200));
    }
}
