//! hrds CLI - query a blended raster stack.

mod points;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hrds::{Point, StackConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hrds", version, about = "Blend rasters of differing resolution into one surface")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the stack value at one or more points
    Query {
        /// Stack configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Points as X,Y
        #[arg(required = true, value_parser = points::parse_point, allow_hyphen_values = true)]
        points: Vec<Point>,
    },

    /// Evaluate every point in a file, in parallel
    Sample {
        /// Stack configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// File with one "x y" point per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the buffer raster for a raster
    Buffer {
        /// Source raster
        raster: PathBuf,

        /// Falloff distance in the raster's map units
        #[arg(short, long)]
        distance: f64,

        /// Output raster (defaults to <stem>_buffer.<ext> next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_stack(config: &Path) -> Result<hrds::RasterStack> {
    let config = StackConfig::from_file(config)
        .with_context(|| format!("reading stack config {}", config.display()))?;
    let stack = config.build_stack().context("building raster stack")?;
    info!(layers = stack.layer_count(), "raster stack ready");
    Ok(stack)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query { config, points } => {
            let stack = load_stack(&config)?;
            for p in points {
                let value = stack
                    .get_val(p)
                    .with_context(|| format!("querying ({}, {})", p.x, p.y))?;
                println!("{} {} {}", p.x, p.y, value);
            }
        }
        Commands::Sample {
            config,
            input,
            output,
        } => {
            let stack = load_stack(&config)?;
            let file = File::open(&input)
                .with_context(|| format!("opening points file {}", input.display()))?;
            let pts: Vec<Point> = points::read_points(BufReader::new(file))?;
            info!(points = pts.len(), "sampling");

            let values: Vec<Option<f64>> = stack
                .get_vals(&pts)
                .into_iter()
                .map(|r| r.map_err(|e| warn!("{}", e)).ok())
                .collect();
            let failed = values.iter().filter(|v| v.is_none()).count();
            if failed > 0 {
                warn!(failed, "some points could not be sampled");
            }

            let out: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(&path).with_context(|| format!("creating {}", path.display()))?,
                )),
                None => Box::new(BufWriter::new(std::io::stdout().lock())),
            };
            points::write_values(out, &pts, &values)?;
        }
        Commands::Buffer {
            raster,
            distance,
            output,
        } => {
            let output = output.unwrap_or_else(|| hrds_buffer::buffer_path_for(&raster));
            hrds_buffer::generate_buffer(&raster, distance, &output)
                .with_context(|| format!("creating buffer for {}", raster.display()))?;
            info!(output = %output.display(), "buffer written");
        }
    }

    Ok(())
}
