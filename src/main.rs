use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use forecast_index::config::{DEFAULT_BUCKET_COUNT, DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_LOAD_FACTOR};
use forecast_index::logger::initialize_logger;
use forecast_index::reader::load_forecasts;
use forecast_index::repl::Repl;
use forecast_index::table::{TablePrinter, DEFAULT_COLUMNS, DEFAULT_COLUMN_WIDTH};
use forecast_index::{ChainedHashMap, HashMapConfig, KeyedMap, RedBlackTreeMap, WeatherRecord};
use log::info;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Chained hash map
    Hash,
    /// Red-black tree map
    Tree,
}

/// Look up multi-day forecasts by "city,state".
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Forecast CSV with a header line
    data: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Backend::Hash)]
    backend: Backend,

    /// Initial bucket count (hash backend)
    #[arg(long, default_value_t = DEFAULT_BUCKET_COUNT)]
    bucket_count: usize,

    /// Load factor that triggers growth (hash backend)
    #[arg(long, default_value_t = DEFAULT_MAX_LOAD_FACTOR)]
    load_factor: f64,

    /// Bucket multiplier applied on growth (hash backend)
    #[arg(long, default_value_t = DEFAULT_GROWTH_FACTOR)]
    growth_factor: f64,

    #[arg(short = 'w', long, default_value_t = DEFAULT_COLUMN_WIDTH)]
    column_width: usize,
}

fn serve<M>(forecasts: &mut M, args: &Args) -> Result<()>
where
    M: KeyedMap<String, Vec<WeatherRecord>>,
{
    load_forecasts(&args.data, forecasts)
        .with_context(|| format!("loading forecasts from {}", args.data.display()))?;

    let printer = TablePrinter::new(args.column_width, DEFAULT_COLUMNS.to_vec());
    let repl = Repl::new(&*forecasts, printer);
    repl.run(io::stdin().lock(), io::stdout().lock())
        .context("lookup loop failed")
}

fn main() -> Result<()> {
    initialize_logger();
    let args = Args::parse();

    match args.backend {
        Backend::Hash => {
            let config = HashMapConfig::new(args.bucket_count, args.load_factor, args.growth_factor);
            let mut forecasts: ChainedHashMap<String, Vec<WeatherRecord>> =
                ChainedHashMap::with_config(config).context("invalid hash map configuration")?;
            serve(&mut forecasts, &args)?;
            info!(
                "hash backend finished with {} buckets at load {:.2}",
                forecasts.bucket_count(),
                forecasts.load_factor()
            );
        }
        Backend::Tree => {
            let mut forecasts: RedBlackTreeMap<String, Vec<WeatherRecord>> = RedBlackTreeMap::new();
            serve(&mut forecasts, &args)?;
        }
    }
    Ok(())
}
