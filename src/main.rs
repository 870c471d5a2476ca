use clap::Parser;
use interface_monitor::configuration::{CliArgs, Config};
use interface_monitor::interfaces::service::InterfaceService;
use interface_monitor::storage;
use interface_monitor::web_interface::WebServer;
use log::{error, info};

#[derive(Parser)]
#[command(name = "interface-monitor")]
#[command(version)]
#[command(about = "Monitoring backend for HR system integration runs")]
struct Args {
    #[command(flatten)]
    common: CliArgs,
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

    info!(
        "Starting interface-monitor v{} with {:?} storage",
        env!("CARGO_PKG_VERSION"),
        config.storage.backend
    );

    let storage = match storage::open(&config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Unable to open storage: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let service = InterfaceService::new(storage, config.query.clone());
    let server = WebServer::new(service, config.cors.clone());

    if let Err(e) = server.start(config.socket_addr()).await {
        error!("Web server stopped: {}, exiting...", e);
        std::process::exit(1);
    }
}
