#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod dataset;
pub mod errors;
pub mod input;
pub mod output;
mod statistics;


#[macro_use]
extern crate is_close;

pub use crate::core::benchmark::{BenchmarkOutcome, BenchmarkRecord, MethodBenchmark};
pub use crate::core::curve::{Curve, CurvePoint, CurveSolver};
pub use crate::core::diode_model::{derive, DiodeModel, ResidualFunction, TemperatureCorrection};
pub use crate::core::mpp::{extract, MppResult};
pub use crate::core::parameters::ParameterSet;
pub use crate::core::solvers::{MethodId, SolverSettings};
pub use crate::errors::PvModelError;

use crate::core::diode_model::derive_with_correction;
use crate::dataset::{DatasetGenerator, DatasetRow};
use crate::input::{ingest_for_processing, ModelInput};
use crate::output::Output;
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Read;
use std::time::Duration;
use tracing::info;

pub const CURVE_OUTPUT_KEY: &str = "curve";
pub const BENCHMARK_OUTPUT_KEY: &str = "benchmark";

/// Solve one curve of the configured panel at irradiance `irradiance` (W/m2) and cell
/// temperature `temperature` (K), write it under [`CURVE_OUTPUT_KEY`] and return its maximum
/// power point.
pub fn run_curve(
    input: impl Read,
    output: impl Output,
    method: MethodId,
    irradiance: f64,
    temperature: f64,
    samples: usize,
) -> Result<MppResult, anyhow::Error> {
    let input = ingest_for_processing(input)?;
    let params = input.parameter_set()?;

    let model =
        derive_with_correction(&params, irradiance, temperature, input.temperature_correction)?;
    let settings = input.solver_settings_or(SolverSettings::default());
    let curve = CurveSolver::new(method, settings)?.solve(
        &model,
        params.open_circuit_voltage(),
        params.short_circuit_current(),
        samples,
    )?;

    if !output.is_noop() {
        write_rows_output_file(
            &output,
            CURVE_OUTPUT_KEY,
            dataset::rows(model.condition(), &curve),
        )?;
    }

    Ok(extract(&curve)?)
}

/// Time every method over every sample count and write the records under
/// [`BENCHMARK_OUTPUT_KEY`].
pub fn run_benchmark(
    input: impl Read,
    output: impl Output,
    methods: &[MethodId],
    sample_counts: &[usize],
    irradiance: f64,
    temperature: f64,
    repeats: usize,
) -> Result<Vec<BenchmarkRecord>, anyhow::Error> {
    let input = ingest_for_processing(input)?;
    let params = input.parameter_set()?;

    let records = benchmark_for_input(&input)
        .with_repeats(repeats)
        .run(&params, irradiance, temperature, methods, sample_counts)?;

    if !output.is_noop() {
        write_benchmark_output_file(&output, BENCHMARK_OUTPUT_KEY, &records)?;
    }

    Ok(records)
}

/// Generate one curve file per (temperature, irradiance) condition, temperatures in
/// Celsius. Returns the number of conditions written.
pub fn run_dataset(
    input: impl Read,
    output: impl Output,
    method: MethodId,
    samples: usize,
    temperatures_c: &[f64],
    irradiances: &[f64],
) -> Result<usize, anyhow::Error> {
    let input = ingest_for_processing(input)?;
    let mut generator = DatasetGenerator::new(input.parameter_set()?)
        .with_method(method)
        .with_samples(samples)
        .with_temperature_correction(input.temperature_correction);
    if let Some(settings) = input.solver {
        generator = generator.with_settings(settings);
    }

    let mut written = 0;
    for condition in generator.generate(temperatures_c, irradiances) {
        let condition = condition?;
        if !output.is_noop() {
            write_rows_output_file(&output, &condition.location_key(), condition.rows())?;
        }
        written += 1;
    }

    Ok(written)
}

fn benchmark_for_input(input: &ModelInput) -> MethodBenchmark {
    MethodBenchmark::new(input.solver_settings_or(SolverSettings::default()))
        .with_temperature_correction(input.temperature_correction)
}

fn write_rows_output_file(
    output: &impl Output,
    output_key: &str,
    rows: impl Iterator<Item = DatasetRow>,
) -> Result<(), anyhow::Error> {
    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[derive(Serialize)]
struct BenchmarkRow<'a> {
    method: String,
    n: usize,
    elapsed_s: f64,
    #[serde(rename = "Vmpp")]
    voltage: Option<f64>,
    #[serde(rename = "Impp")]
    current: Option<f64>,
    #[serde(rename = "Pmax")]
    power: Option<f64>,
    unresolved: Option<usize>,
    failure: Option<&'a str>,
}

impl<'a> From<&'a BenchmarkRecord> for BenchmarkRow<'a> {
    fn from(record: &'a BenchmarkRecord) -> Self {
        let (mpp, unresolved, failure) = match &record.outcome {
            BenchmarkOutcome::Completed { mpp, unresolved } => (Some(mpp), Some(*unresolved), None),
            BenchmarkOutcome::Failed(message) => (None, None, Some(message.as_str())),
        };

        Self {
            method: record.method.to_string(),
            n: record.sample_count,
            elapsed_s: record.elapsed.as_secs_f64(),
            voltage: mpp.map(|mpp| mpp.voltage),
            current: mpp.map(|mpp| mpp.current),
            power: mpp.map(|mpp| mpp.power),
            unresolved,
            failure,
        }
    }
}

fn write_benchmark_output_file(
    output: &impl Output,
    output_key: &str,
    records: &[BenchmarkRecord],
) -> Result<(), anyhow::Error> {
    info!("writing out to {output_key}");
    let writer = output.writer_for_location_key(output_key)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    for record in records {
        writer.serialize(BenchmarkRow::from(record))?;
    }
    writer.flush()?;

    Ok(())
}

/// Total elapsed time of each method across all of its cells, in first-seen method order.
pub fn total_elapsed_by_method(records: &[BenchmarkRecord]) -> Vec<(MethodId, Duration)> {
    crate::core::benchmark::by_method(records)
        .into_iter()
        .map(|(method, records)| (method, records.iter().map(|record| record.elapsed).sum()))
        .collect()
}
