use crate::core::curve::CurveSolver;
use crate::core::diode_model::{derive_with_correction, DiodeModel, TemperatureCorrection};
use crate::core::mpp::{extract, MppResult};
use crate::core::parameters::ParameterSet;
use crate::core::solvers::{MethodId, SolverSettings};
use crate::errors::{DomainError, PvModelError};
use crate::statistics::median_duration;
use indexmap::IndexMap;
use itertools::iproduct;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum BenchmarkOutcome {
    Completed { mpp: MppResult, unresolved: usize },
    Failed(String),
}

/// Timing and result of one (sample count, method) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkRecord {
    pub method: MethodId,
    pub sample_count: usize,
    pub elapsed: Duration,
    pub outcome: BenchmarkOutcome,
}

impl BenchmarkRecord {
    pub fn mpp(&self) -> Option<&MppResult> {
        match &self.outcome {
            BenchmarkOutcome::Completed { mpp, .. } => Some(mpp),
            BenchmarkOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, BenchmarkOutcome::Failed(_))
    }
}

/// Sample counts 10, 20, ... 1000.
pub fn default_sample_counts() -> Vec<usize> {
    (10..=1000).step_by(10).collect()
}

#[derive(Clone, Debug)]
pub struct MethodBenchmark {
    settings: SolverSettings,
    temperature_correction: TemperatureCorrection,
    repeats: usize,
}

impl Default for MethodBenchmark {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

impl MethodBenchmark {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            temperature_correction: Default::default(),
            repeats: 1,
        }
    }

    /// Time each cell this many times and record the median. Values below one count as one.
    pub fn with_repeats(self, repeats: usize) -> Self {
        Self {
            repeats: repeats.max(1),
            ..self
        }
    }

    pub fn with_temperature_correction(self, temperature_correction: TemperatureCorrection) -> Self {
        Self {
            temperature_correction,
            ..self
        }
    }

    /// Time a full curve solve plus MPP extraction for every combination of sample count
    /// and method, sample count outermost. A cell that fails is recorded as such and the
    /// remaining cells still run.
    pub fn run(
        &self,
        params: &ParameterSet,
        irradiance: f64,
        temperature: f64,
        methods: &[MethodId],
        sample_counts: &[usize],
    ) -> Result<Vec<BenchmarkRecord>, DomainError> {
        let model =
            derive_with_correction(params, irradiance, temperature, self.temperature_correction)?;

        Ok(iproduct!(sample_counts, methods)
            .map(|(&sample_count, &method)| self.run_cell(&model, method, sample_count))
            .collect())
    }

    fn run_cell(&self, model: &DiodeModel, method: MethodId, sample_count: usize) -> BenchmarkRecord {
        let mut timings = Vec::with_capacity(self.repeats);
        let mut outcome = BenchmarkOutcome::Failed("not run".to_string());

        for _ in 0..self.repeats {
            let start = Instant::now();
            let result = self.solve_and_extract(model, method, sample_count);
            timings.push(start.elapsed());

            match result {
                Ok((mpp, unresolved)) => {
                    outcome = BenchmarkOutcome::Completed { mpp, unresolved };
                }
                Err(e) => {
                    warn!(%method, sample_count, "benchmark cell failed: {e}");
                    outcome = BenchmarkOutcome::Failed(e.to_string());
                    break;
                }
            }
        }

        let elapsed = median_duration(&timings).unwrap_or_default();
        debug!(
            %method,
            sample_count,
            elapsed_s = elapsed.as_secs_f64(),
            "benchmark cell complete"
        );

        BenchmarkRecord {
            method,
            sample_count,
            elapsed,
            outcome,
        }
    }

    fn solve_and_extract(
        &self,
        model: &DiodeModel,
        method: MethodId,
        sample_count: usize,
    ) -> Result<(MppResult, usize), PvModelError> {
        let params = model.params();
        let curve = CurveSolver::new(method, self.settings)?.solve(
            model,
            params.open_circuit_voltage(),
            params.short_circuit_current(),
            sample_count,
        )?;
        let mpp = extract(&curve)?;

        Ok((mpp, curve.unresolved_count()))
    }
}

/// Benchmark with default settings and a single timing per cell.
pub fn run(
    params: &ParameterSet,
    irradiance: f64,
    temperature: f64,
    methods: &[MethodId],
    sample_counts: &[usize],
) -> Result<Vec<BenchmarkRecord>, DomainError> {
    MethodBenchmark::default().run(params, irradiance, temperature, methods, sample_counts)
}

/// Group records by method, keeping the order in which methods first appear.
pub fn by_method(records: &[BenchmarkRecord]) -> IndexMap<MethodId, Vec<&BenchmarkRecord>> {
    let mut grouped: IndexMap<MethodId, Vec<&BenchmarkRecord>> = IndexMap::new();
    for record in records {
        grouped.entry(record.method).or_default().push(record);
    }

    grouped
}
