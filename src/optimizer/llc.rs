//! LLC resonant converter search.
//!
//! Tanks are designed once per `(Q, Ln)`. For each tank and switching
//! frequency the gain is checked and the transformer and resonant inductor
//! are sized; only then are the primary and secondary FET shortlists
//! expanded. A magnetics rejection therefore counts once for the whole FET
//! product it prunes.

use tracing::{debug, info, warn};

use super::{
    efficiency_percent, rated_fets, score, DesignReport, OptimizerConfig, Outcome, RejectReason, Search,
    FET_PACKAGE_VOLUME, NO_PART,
};
use crate::catalog::{
    filter_selected, shortlist_fets, ComponentCatalog, Core, Fet, INDUCTOR_CORES, OUTPUT_CAPACITORS,
    TRANSFORMER_CORES,
};
use crate::input::LlcRequest;
use crate::models::capacitor::{output_ripple_current, select_capacitors, CapacitorRequirement};
use crate::models::frequency_range::frequency_range_for_llc;
use crate::models::magnetics::{
    design_resonant_inductor, design_transformer, ResonantInductorDesign, ResonantInductorSpec, TransformerDesign,
    TransformerSpec,
};
use crate::models::parallel::{optimal_parallel_count, ParallelCurrents, ParallelOperatingPoint};
use crate::models::resonant::{magnetizing_current, resonant_current, voltage_gain};
use crate::models::semiconductor::{
    check_zvs, llc_primary_losses, llc_secondary_losses, min_dead_time, FetLosses, PrimaryOperatingPoint, ZvsCheck,
};
use crate::models::thermal::{size_heatsink, DEFAULT_R_JC};
use crate::models::waveform::llc_waveforms;
use crate::models::{design_resonant_tank, OutputStage, TankDesign};
use crate::sweep::product;

/// Winding temperature assumed for the transformer and resonant inductor (°C).
pub const WINDING_TEMPERATURE: f64 = 100.0;

/// Output capacitor loss as a share of the output power.
pub const CAPACITOR_LOSS_FRACTION: f64 = 0.005;

/// Allowed output voltage ripple as a share of the output voltage.
pub const OUTPUT_RIPPLE_FRACTION: f64 = 0.01;

/// Discrete FET packages on the board: a full bridge and a centre-tapped rectifier.
const FET_PACKAGES: f64 = 6.0;

const FALLBACK_WAVEFORM_POINTS: usize = 100;

/// One tank at one switching frequency, with its magnetics sized.
#[derive(Debug, Clone, PartialEq)]
pub struct LlcOperatingPoint<'a> {
    pub tank: TankDesign,
    pub f_sw: f64,
    pub gain: f64,
    pub currents: ParallelCurrents,
    pub transformer: TransformerDesign<'a>,
    pub inductor: ResonantInductorDesign<'a>,
}

/// A fully evaluated LLC design.
#[derive(Debug, Clone, PartialEq)]
pub struct LlcCandidate<'a> {
    pub point: LlcOperatingPoint<'a>,
    pub primary: &'a Fet,
    pub secondary: &'a Fet,
    pub zvs: ZvsCheck,
    pub dead_time: f64,
    pub primary_losses: FetLosses,
    pub secondary_losses: FetLosses,
    pub capacitor_loss: f64,
    pub total_loss: f64,
    /// Percent
    pub efficiency: f64,
    /// mm³
    pub volume: f64,
    pub cost: f64,
    pub score: f64,
}

impl LlcCandidate<'_> {
    /// Transformer loss over all paralleled transformers.
    pub fn transformer_loss(&self) -> f64 {
        self.point.currents.ptrf as f64 * self.point.transformer.total_loss()
    }
}

/// Scores LLC candidates for one request.
#[derive(Debug, Clone)]
pub struct LlcEvaluator<'a> {
    request: &'a LlcRequest,
    config: &'a OptimizerConfig,
    /// Loss-corrected turns ratio of the whole stage
    pub turns_ratio: u32,
    /// Transformers in parallel
    pub ptrf: usize,
    transformer_cores: Vec<&'a Core>,
    inductor_cores: Vec<&'a Core>,
}

impl<'a> LlcEvaluator<'a> {
    pub fn new(
        request: &'a LlcRequest,
        config: &'a OptimizerConfig,
        transformer_cores: Vec<&'a Core>,
        inductor_cores: Vec<&'a Core>,
    ) -> Self {
        let envelope = &request.spec.envelope;
        let stage = OutputStage::from_envelope(envelope, request.assumed_efficiency);
        let ptrf = request
            .parallel_transformers
            .unwrap_or_else(|| optimal_parallel_count(envelope.p_out))
            .max(1);
        Self {
            request,
            config,
            turns_ratio: stage.turns_ratio,
            ptrf,
            transformer_cores,
            inductor_cores,
        }
    }

    /// Tank for one `(Q, Ln)` target at the stage turns ratio.
    pub fn tank(&self, q: f64, ln: f64) -> TankDesign {
        design_resonant_tank(
            &self.config.finder,
            &self.request.spec.envelope,
            f64::from(self.turns_ratio),
            q,
            ln,
        )
    }

    /// Gain check and magnetics for one tank at `f_sw`.
    pub fn operating_point(&self, tank: &TankDesign, f_sw: f64) -> Result<LlcOperatingPoint<'a>, RejectReason> {
        let gain = voltage_gain(f_sw, tank.f0, tank.q, tank.ln);
        if !self.config.gain_in_window(gain) {
            return Err(RejectReason::GainOutOfRange);
        }

        let envelope = &self.request.spec.envelope;
        let currents = ParallelOperatingPoint {
            n: self.turns_ratio,
            v_out: envelope.v_out_nom,
            i_out: envelope.i_out(),
            lm: tank.lm,
            f_sw,
            f0: tank.f0,
            ptrf: self.ptrf,
        }
        .currents();

        let transformer_spec = TransformerSpec::new(
            currents.power_each,
            f_sw,
            currents.lm_eff,
            currents.i_lm_max,
            f64::from(currents.n_eff),
        )
        .with_currents(currents.i_lr_rms, currents.i_sec_rms)
        .with_limits(self.request.b_max, self.request.j_max, self.request.ku)
        .with_temperature(WINDING_TEMPERATURE);
        let transformer = design_transformer(&transformer_spec, self.transformer_cores.iter().copied())
            .ok_or(RejectReason::NoCore)?;
        self.config
            .check_winding(transformer.n_primary, transformer.b_peak, transformer.core.b_sat)?;

        let paralleled = currents.ptrf as f64;
        let inductor_spec = ResonantInductorSpec {
            lr: tank.lr,
            i_peak: paralleled * currents.i_lr_max,
            i_rms: paralleled * currents.i_lr_rms,
            f_sw,
            p_out: envelope.p_out,
            b_max: self.request.b_max,
            j_max: self.request.j_max,
            ku: self.request.ku,
            temperature: WINDING_TEMPERATURE,
        };
        let inductor = design_resonant_inductor(&inductor_spec, self.inductor_cores.iter().copied())
            .ok_or(RejectReason::NoCore)?;
        self.config
            .check_winding(inductor.turns, inductor.b_peak, inductor.core.b_sat)?;

        Ok(LlcOperatingPoint {
            tank: *tank,
            f_sw,
            gain,
            currents,
            transformer,
            inductor,
        })
    }

    /// Semiconductor losses, totals and score for one FET pair.
    pub fn evaluate(
        &self,
        point: &LlcOperatingPoint<'a>,
        primary: &'a Fet,
        secondary: &'a Fet,
    ) -> Result<LlcCandidate<'a>, RejectReason> {
        let envelope = &self.request.spec.envelope;
        let currents = &point.currents;
        let paralleled = currents.ptrf as f64;
        let v_dc = envelope.v_in_max;

        let c_eq = 2.0 * primary.c_oss;
        let zvs = check_zvs(point.tank.lm, point.tank.lr, paralleled * currents.i_lr_max, c_eq, v_dc);
        let dead_time = min_dead_time(c_eq, v_dc, paralleled * currents.i_lm_max, point.tank.lm);

        let primary_losses = llc_primary_losses(
            primary,
            &PrimaryOperatingPoint {
                i_lr_rms: paralleled * currents.i_lr_rms,
                i_lr_max: paralleled * currents.i_lr_max,
                i_lm_max: paralleled * currents.i_lm_max,
                v_dc,
                f_sw: point.f_sw,
                zvs: zvs.achieved,
            },
        );
        let secondary_losses =
            llc_secondary_losses(secondary, currents.i_sec_rms, envelope.v_out_nom, point.f_sw).scaled(paralleled);

        let capacitor_loss = CAPACITOR_LOSS_FRACTION * envelope.p_out;
        let total_loss = primary_losses.total()
            + secondary_losses.total()
            + paralleled * point.transformer.total_loss()
            + point.inductor.total_loss()
            + capacitor_loss;
        let efficiency = efficiency_percent(envelope.p_out, total_loss);
        self.config.check_efficiency(efficiency)?;

        let volume = paralleled * point.transformer.core.volume_mm3(0.0)
            + point.inductor.core.volume_mm3(0.0)
            + FET_PACKAGES * FET_PACKAGE_VOLUME;
        let cost = 4.0 * primary.cost_or_default()
            + 2.0 * paralleled * secondary.cost_or_default()
            + paralleled * point.transformer.core.cost_or_default()
            + point.inductor.core.cost_or_default();

        Ok(LlcCandidate {
            point: point.clone(),
            primary,
            secondary,
            zvs,
            dead_time,
            primary_losses,
            secondary_losses,
            capacitor_loss,
            total_loss,
            efficiency,
            volume,
            cost,
            score: score(&self.request.spec.weights, efficiency, volume, cost),
        })
    }
}

/// LLC design-space optimizer over a shared catalog.
#[derive(Debug, Clone)]
pub struct LlcOptimizer<'a> {
    catalog: &'a ComponentCatalog,
    config: OptimizerConfig,
}

impl<'a> LlcOptimizer<'a> {
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

    /// Search the request's design space.
    pub fn run(&self, request: &LlcRequest) -> Outcome {
        let config = &self.config;
        let envelope = &request.spec.envelope;
        info!(p_out = envelope.p_out, v_in = envelope.v_in_nom, v_out = envelope.v_out_nom, "LLC search started");

        let mut search = Search::new();

        let fets = self.catalog.load_fets();
        let primaries = rated_fets(
            "primary",
            filter_selected("primary FET", fets, &request.primary_fets),
            envelope.v_in_max,
            &mut search.rejections,
        );
        let secondaries = rated_fets(
            "secondary",
            filter_selected("secondary FET", fets, &request.secondary_fets),
            2.0 * envelope.v_out_max,
            &mut search.rejections,
        );
        let primaries = shortlist_fets(primaries, config.shortlist);
        let secondaries = shortlist_fets(secondaries, config.shortlist);

        let transformer_cores = filter_selected(
            "transformer core",
            self.catalog.load_cores(TRANSFORMER_CORES),
            &request.transformer_cores,
        );
        let inductor_cores = filter_selected(
            "inductor core",
            self.catalog.load_cores(INDUCTOR_CORES),
            &request.inductor_cores,
        );

        let evaluator = LlcEvaluator::new(request, config, transformer_cores, inductor_cores);

        let q_values = request.q.values();
        let ln_values = request.ln.values();
        let f_values = request.f_sw.values();
        let tanks: Vec<TankDesign> = product(q_values.iter().copied(), &ln_values)
            .map(|(q, &ln)| evaluator.tank(q, ln))
            .collect();
        let fet_pairs: Vec<(&Fet, &Fet)> = product(primaries.iter().copied(), &secondaries)
            .map(|(primary, &secondary)| (primary, secondary))
            .collect();
        debug!(
            tanks = tanks.len(),
            frequencies = f_values.len(),
            fet_pairs = fet_pairs.len(),
            n = evaluator.turns_ratio,
            ptrf = evaluator.ptrf,
            "LLC design space"
        );

        for (tank, &f_sw) in product(tanks.iter(), &f_values) {
            match evaluator.operating_point(tank, f_sw) {
                Err(reason) => search.offer(Err(reason)),
                Ok(point) => {
                    for &(primary, secondary) in &fet_pairs {
                        search.offer(
                            evaluator
                                .evaluate(&point, primary, secondary)
                                .map(|candidate| (candidate.score, candidate)),
                        );
                    }
                }
            }
        }

        match search.finish("llc") {
            Ok(best) => {
                info!(
                    efficiency = best.efficiency,
                    total_loss = best.total_loss,
                    f_sw = best.point.f_sw,
                    primary = %best.primary.part_number,
                    secondary = %best.secondary.part_number,
                    "LLC design found"
                );
                Outcome::Found(self.format(request, &best))
            }
            Err(stats) => Outcome::from_infeasible(config.policy, stats, fallback_report),
        }
    }

    /// Size the output capacitors and heatsink, then flatten into a report.
    fn format(&self, request: &LlcRequest, best: &LlcCandidate<'_>) -> DesignReport {
        let envelope = &request.spec.envelope;
        let point = &best.point;
        let tank = &point.tank;
        let p_out = envelope.p_out;
        let mut report = DesignReport::new();

        report
            .scalar("BestQ", tank.q)
            .scalar("BestLn", tank.ln)
            .scalar("Bestfo", tank.f0)
            .scalar("Bestfs", point.f_sw)
            .scalar("Bestfs_min", tank.f_sw_min)
            .scalar("Bestfs_max", tank.f_sw_max)
            .scalar("BestLr", tank.lr)
            .scalar("BestCr", tank.cr)
            .scalar("BestLm", tank.lm)
            .scalar("BestN", f64::from(point.currents.n_eff))
            .scalar("BestPtrf", point.currents.ptrf as f64)
            .scalar("BestGain", point.gain)
            .scalar("BestImag", magnetizing_current(envelope.v_in_nom, tank.lm, point.f_sw))
            .scalar("BestIres", resonant_current(p_out, envelope.v_in_nom, tank.m_nom));

        let range = frequency_range_for_llc(
            envelope.v_in_min,
            envelope.v_in_max,
            envelope.v_out_nom,
            f64::from(point.currents.n_eff),
            tank.q,
            tank.ln,
            tank.f0,
        );
        let validation = range.validate();
        for warning in &validation.warnings {
            warn!(%warning, f_sw_min = range.f_sw_min, f_sw_max = range.f_sw_max, "frequency range check");
        }
        report
            .scalar("BestFreqRange_Min", range.f_sw_min)
            .scalar("BestFreqRange_Max", range.f_sw_max)
            .scalar("BestFreqRange_Percent", validation.range_percent);

        let primary = &best.primary_losses;
        let secondary = &best.secondary_losses;
        report
            .text("BestPriFet_Name", best.primary.part_number.as_str())
            .scalar("BestPriFet_Loss", primary.total())
            .scalar("BestPriFet_Conduction", primary.conduction)
            .scalar("BestPriFet_Switching", primary.switching_total())
            .scalar("BestPriFet_Gate", primary.gate)
            .text("BestSecFet_Name", best.secondary.part_number.as_str())
            .scalar("BestSecFet_Loss", secondary.total())
            .scalar("BestSecFet_Conduction", secondary.conduction)
            .scalar("BestSecFet_Gate", secondary.gate)
            .scalar("BestSecFet_Diode", secondary.body_diode + secondary.reverse_recovery)
            .scalar("BestZvs", if best.zvs.achieved { 1.0 } else { 0.0 })
            .scalar("BestZvsMargin", best.zvs.margin_percent)
            .scalar("BestDeadTime", best.dead_time);

        let transformer = &point.transformer;
        let paralleled = point.currents.ptrf as f64;
        report
            .text("BestTrf_Name", transformer.core.name.as_str())
            .scalar("BestTrf_Loss", best.transformer_loss())
            .scalar("BestTrf_CoreLoss", paralleled * transformer.core_loss)
            .scalar("BestTrf_CopperLoss", paralleled * transformer.copper_loss)
            .scalar("BestTrf_Np", f64::from(transformer.n_primary))
            .scalar("BestTrf_Ns", f64::from(transformer.n_secondary))
            .scalar("BestTrf_Bpeak", transformer.b_peak)
            .scalar("BestTrf_Volume", paralleled * transformer.core.volume_mm3(0.0));

        let inductor = &point.inductor;
        report
            .text("BestInd_Name", inductor.core.name.as_str())
            .scalar("BestInd_Loss", inductor.total_loss())
            .scalar("BestInd_CoreLoss", inductor.core_loss)
            .scalar("BestInd_CopperLoss", inductor.copper_loss)
            .scalar("BestInd_Turns", f64::from(inductor.turns))
            .scalar("BestInd_Bpeak", inductor.b_peak)
            .scalar("BestInd_Volume", inductor.core.volume_mm3(0.0));

        let requirement = CapacitorRequirement::new(p_out, envelope.v_out_nom)
            .without_holdup()
            .with_ripple(2.0 * point.f_sw, OUTPUT_RIPPLE_FRACTION)
            .with_ripple_current(output_ripple_current(envelope.i_out()));
        let caps = filter_selected(
            "output capacitor",
            self.catalog.load_capacitors(OUTPUT_CAPACITORS),
            &request.output_caps,
        );
        report.scalar("BestCap_Loss", best.capacitor_loss);
        match select_capacitors(&requirement, caps) {
            Some(bank) => {
                report
                    .text("BestCap_Name", bank.part.part_number.as_str())
                    .scalar("BestCap_Count", f64::from(bank.count))
                    .scalar("BestCap_Value", bank.total_capacitance)
                    .scalar("BestCap_Voltage", bank.part.voltage);
            }
            None => {
                warn!(capacitance = requirement.capacitance(), "no output capacitor qualifies");
                report.text("BestCap_Name", NO_PART);
            }
        }

        let heatsinks = filter_selected("heatsink", self.catalog.load_heatsinks(), &request.heatsinks);
        let r_jc = best.primary.r_th_jc.unwrap_or(DEFAULT_R_JC);
        match size_heatsink(primary.total(), request.tj_max, envelope.t_amb, r_jc, heatsinks, None) {
            Some(choice) => {
                report
                    .text("BestHeatsink_Name", choice.heatsink.name.as_str())
                    .scalar("BestHeatsink_Rsa", choice.r_sa_estimated)
                    .scalar("BestHeatsink_Tj", choice.junction_temperature);
            }
            None => {
                warn!(loss = primary.total(), "no heatsink qualifies for the primary bridge");
                report.text("BestHeatsink_Name", NO_PART);
            }
        }

        report
            .scalar("BestTotalLoss", best.total_loss)
            .scalar("BestTotalEfficiency", best.efficiency)
            .scalar("BestTotalVolume", best.volume)
            .scalar("BestPowerDensity", p_out / (best.volume / 1000.0));

        let waves = llc_waveforms(
            tank.lr,
            tank.cr,
            tank.lm,
            envelope.v_in_nom,
            point.f_sw,
            self.config.llc_waveform_points,
        );
        report
            .series("t1", waves.t1)
            .series("t2", waves.t2)
            .series("Ilrp", waves.ilrp)
            .series("id1", waves.id1);

        debug!(entries = report.len(), "LLC report formatted");
        report
    }
}

/// Fixed reference design substituted under [`super::InfeasiblePolicy::Fallback`].
pub fn fallback_report() -> DesignReport {
    const FALLBACK_FET: &str = "BSC034N10LS5";
    let zeros = || vec![0.0; FALLBACK_WAVEFORM_POINTS];
    let mut report = DesignReport::new();
    report
        .scalar("BestQ", 0.4)
        .scalar("BestLn", 5.0)
        .scalar("Bestfo", 100e3)
        .scalar("Bestfs_min", 80e3)
        .scalar("Bestfs_max", 120e3)
        .scalar("BestLr", 100e-6)
        .scalar("BestCr", 100e-9)
        .scalar("BestLm", 500e-6)
        .text("BestPriFet_Name", FALLBACK_FET)
        .scalar("BestPriFet_Loss", 5.0)
        .text("BestSecFet_Name", FALLBACK_FET)
        .scalar("BestSecFet_Loss", 3.0)
        .scalar("BestTrf_Loss", 2.0)
        .scalar("BestInd_Loss", 1.0)
        .scalar("BestCap_Loss", 0.5)
        .scalar("BestTotalLoss", 11.5)
        .scalar("BestTotalEfficiency", 90.0)
        .scalar("BestTotalVolume", 1000.0)
        .scalar("BestPowerDensity", 0.1)
        .series("t1", zeros())
        .series("t2", zeros())
        .series("Ilrp", zeros())
        .series("id1", zeros());
    report
}
