use clap::Parser;
use env_logger::Env;
use log::{error, info};
use portwatch::configuration::config::{load_env_files, Args, Config};
use portwatch::controller::{shutdown_signal, Controller};
use portwatch::network::ProcNetSource;
use portwatch::notification::SmtpNotifier;
use portwatch::session_tracker::SessionTracker;
use portwatch::storage::database_storage::DatabaseStorage;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
              portwatch v{} - connection session monitor
==============================================================================
",
        env!("CARGO_PKG_VERSION")
    );

    // .env values must be in the environment before clap reads it
    for path in load_env_files() {
        info!("Loaded environment from {}", path.display());
    }

    info!("Importing configuration");
    let args = Args::parse();
    let config = Config::load(&args).unwrap_or_else(|e| {
        error!("Unable to import configuration: {}", e);
        std::process::exit(1);
    });
    info!("Configuration imported successfully");

    let shutdown = shutdown_signal::install().unwrap_or_else(|e| {
        error!("Unable to register stop signal handlers: {}", e);
        std::process::exit(1);
    });

    let notifier = SmtpNotifier::new(&config.smtp, config.notify_timeout).unwrap_or_else(|e| {
        error!("Unable to configure notifications: {}", e);
        std::process::exit(1);
    });

    let storage = DatabaseStorage::open(&config.db_path).await.unwrap_or_else(|e| {
        error!(
            "Unable to open session database {}: {}",
            config.db_path.display(),
            e
        );
        std::process::exit(1);
    });

    let tracker = SessionTracker::new(storage, notifier, config.port, config.notify_timeout);
    let mut controller = Controller::new(&config, ProcNetSource::new(), tracker);

    if let Err(e) = controller.run(shutdown).await {
        error!("Error occured in the controller: {}, exiting...", e);
        std::process::exit(1);
    }
    controller.tracker().storage().close().await;
}
