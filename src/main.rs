extern crate pvmodel;

use clap::{Args, Parser, Subcommand};
use pvmodel::core::benchmark::default_sample_counts;
use pvmodel::dataset::{default_irradiances, default_temperatures_c};
use pvmodel::output::{FileOutput, SinkOutput, DEFAULT_FILE_TEMPLATE};
use pvmodel::{run_benchmark, run_curve, run_dataset, total_elapsed_by_method, MethodId};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct PvModelArgs {
    #[command(subcommand)]
    command: Command,
    /// JSON model input; the reference panel is used when omitted
    #[arg(long, short, global = true)]
    input_file: Option<PathBuf>,
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one I-V curve and print its maximum power point
    Curve {
        #[command(flatten)]
        condition: ConditionArgs,
        #[arg(long, short, default_value = "brent", value_parser = parse_method)]
        method: MethodId,
        #[arg(long, short = 'n', default_value_t = 1000)]
        samples: usize,
        /// write the curve as CSV into this directory
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Time every root-finding method over a range of sweep resolutions
    Benchmark {
        #[command(flatten)]
        condition: ConditionArgs,
        /// comma separated; all methods when omitted
        #[arg(long, value_delimiter = ',', value_parser = parse_method)]
        methods: Vec<MethodId>,
        /// comma separated; 10, 20, ... 1000 when omitted
        #[arg(long, value_delimiter = ',')]
        sample_counts: Vec<usize>,
        #[arg(long, default_value_t = 1)]
        repeats: usize,
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Write one curve file per (temperature, irradiance) condition
    Dataset {
        /// comma separated, in Celsius; 15 to 45 when omitted
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        temperatures: Vec<f64>,
        /// comma separated, in W/m2; 300 to 1000 when omitted
        #[arg(long, value_delimiter = ',')]
        irradiances: Vec<f64>,
        #[arg(long, short, default_value = "brent", value_parser = parse_method)]
        method: MethodId,
        #[arg(long, short = 'n', default_value_t = 1000)]
        samples: usize,
        #[arg(long, short)]
        output_dir: PathBuf,
        #[arg(long, default_value = DEFAULT_FILE_TEMPLATE)]
        file_template: String,
    },
}

#[derive(Args, Clone, Debug)]
struct ConditionArgs {
    /// W/m2
    #[arg(long, short = 'g', default_value_t = 1000.)]
    irradiance: f64,
    /// cell temperature in K
    #[arg(long, short = 't', default_value_t = 298.)]
    temperature: f64,
}

fn parse_method(name: &str) -> Result<MethodId, String> {
    MethodId::parse(name).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let args = PvModelArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let input = model_input(args.input_file.as_ref())?;

    match args.command {
        Command::Curve {
            condition,
            method,
            samples,
            output_dir,
        } => {
            let mpp = match output_dir {
                Some(directory) => run_curve(
                    input,
                    &FileOutput::new(directory, DEFAULT_FILE_TEMPLATE.to_string()),
                    method,
                    condition.irradiance,
                    condition.temperature,
                    samples,
                )?,
                None => run_curve(
                    input,
                    SinkOutput,
                    method,
                    condition.irradiance,
                    condition.temperature,
                    samples,
                )?,
            };
            println!(
                "Vmpp = {:.4} V, Impp = {:.4} A, Pmax = {:.4} W",
                mpp.voltage, mpp.current, mpp.power
            );
        }
        Command::Benchmark {
            condition,
            methods,
            sample_counts,
            repeats,
            output_dir,
        } => {
            let methods = if methods.is_empty() {
                MethodId::all()
            } else {
                methods
            };
            let sample_counts = if sample_counts.is_empty() {
                default_sample_counts()
            } else {
                sample_counts
            };
            let records = match output_dir {
                Some(directory) => run_benchmark(
                    input,
                    &FileOutput::new(directory, "{}.csv".to_string()),
                    &methods,
                    &sample_counts,
                    condition.irradiance,
                    condition.temperature,
                    repeats,
                )?,
                None => run_benchmark(
                    input,
                    SinkOutput,
                    &methods,
                    &sample_counts,
                    condition.irradiance,
                    condition.temperature,
                    repeats,
                )?,
            };
            for (method, elapsed) in total_elapsed_by_method(&records) {
                println!("{method}: {:.6} s", elapsed.as_secs_f64());
            }
        }
        Command::Dataset {
            temperatures,
            irradiances,
            method,
            samples,
            output_dir,
            file_template,
        } => {
            let temperatures = if temperatures.is_empty() {
                default_temperatures_c()
            } else {
                temperatures
            };
            let irradiances = if irradiances.is_empty() {
                default_irradiances()
            } else {
                irradiances
            };
            let written = run_dataset(
                input,
                &FileOutput::new(output_dir, file_template),
                method,
                samples,
                &temperatures,
                &irradiances,
            )?;
            info!("generated data for {written} conditions");
        }
    }

    Ok(())
}

fn model_input(input_file: Option<&PathBuf>) -> anyhow::Result<Box<dyn Read>> {
    Ok(match input_file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(&b"{}"[..]),
    })
}
