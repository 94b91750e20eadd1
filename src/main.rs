use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use image_loader::application::{CacheMaintenanceUseCase, LoadImagesUseCase};
use image_loader::infrastructure::{
    AppConfig, CliArgs, Command, ConfigLoad, DiskImageCache, Fetcher, HttpTransport,
    ImageDecoder, ImageLoader, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<(ConfigLoad, StorageManager)> {
    let storage = match &args.overrides.config {
        Some(path) => StorageManager::at(path.clone()),
        None => StorageManager::new()?,
    };
    let loaded = storage.load_config()?;
    Ok((loaded, storage))
}

fn report_config_load(loaded: &ConfigLoad, storage: &StorageManager) {
    let path = storage.config_path().display();
    match loaded {
        ConfigLoad::Parsed(_) => info!(path = %path, "Loaded configuration"),
        ConfigLoad::Created(_) => info!(path = %path, "Created default configuration"),
        ConfigLoad::Fallback(_, e) => {
            warn!(path = %path, error = %e, "Failed to parse config file, using defaults");
        }
    }
}

async fn create_loader(config: &AppConfig) -> Result<ImageLoader> {
    let disk_cache = DiskImageCache::new(config.effective_cache_dir(), config.disk_cache_max_bytes)
        .await
        .wrap_err("failed to open disk cache")?;
    let transport = HttpTransport::new().wrap_err("failed to create HTTP transport")?;

    Ok(ImageLoader::new(
        config.loader_config(),
        Arc::new(disk_cache),
        Fetcher::new(Arc::new(transport)),
        Arc::new(ImageDecoder::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let (loaded, storage) = load_config(&args)?;
    let mut config = loaded.config().clone();
    config.merge_with_args(args.overrides.clone());

    init_logging(&config)?;

    info!(version = image_loader::VERSION, "Starting {}", image_loader::NAME);
    report_config_load(&loaded, &storage);

    let loader = create_loader(&config).await?;

    match args.command {
        Command::Load { urls } => {
            let report = LoadImagesUseCase::new(loader.clone())
                .execute(&urls, &config.load)
                .await;
            for entry in &report.entries {
                println!("{entry}");
            }
            println!("{}", report.summary());
            println!("memory cache: {}", loader.memory_cache_stats());
            if !report.all_succeeded() {
                bail!("{} image(s) failed to load", report.summary().failed);
            }
        }
        Command::Clear => {
            CacheMaintenanceUseCase::new(loader)
                .clear()
                .await
                .wrap_err("failed to clear caches")?;
            println!("caches cleared");
        }
        Command::Contains { url } => {
            let status = CacheMaintenanceUseCase::new(loader).status(&url).await;
            println!("{status}");
        }
    }

    Ok(())
}
