use clap::Parser;
use interface_monitor::configuration::{CliArgs, Config};
use interface_monitor::seeder::{self, DEFAULT_BATCH_SIZE};
use interface_monitor::storage;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "seed")]
#[command(version)]
#[command(about = "Replace the record store contents with random interface executions")]
struct Args {
    #[command(flatten)]
    common: CliArgs,

    /// Number of records to generate
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Records per insert batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seed for reproducible data
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(&args.common) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .format_target(false)
    .init();

    let storage = match storage::open(&config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Unable to open storage: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Seeding {} records", args.count);
    match seeder::seed(storage.as_ref(), &mut rng, args.count, args.batch_size).await {
        Ok(report) => {
            info!("Total records: {}", report.total);
            info!("Success records: {}", report.success);
            info!("Failure records: {}", report.failure);
        }
        Err(e) => {
            error!("Error seeding data: {}", e);
            std::process::exit(1);
        }
    }
}
