mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use egui::Vec2;
use log::{error, info};

use cardsort_dashboard::backend::BackendClient;
use cardsort_dashboard::config::{AppConfig, ConfigFile, LanguageStore, MemoryLanguageStore};
use cardsort_dashboard::notification::{AudibleCue, Silent};
use cardsort_dashboard::runtime::{TranslationSource, spawn_backend};
use cardsort_dashboard::{Dashboard, DashboardError};
use ui::LiveDashboardApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file, defaults to the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the live dashboard
    Live {
        /// Backend base url, e.g. http://sorter.local:8000
        #[arg(short, long)]
        server: Option<String>,

        /// Local translations file instead of the backend's
        #[arg(short, long)]
        translations: Option<PathBuf>,
    },
    /// Ask the backend to export all processed cards and print the CSV path
    Export {
        #[arg(short, long)]
        server: Option<String>,
    },
}

fn open_config(path: Option<PathBuf>) -> (AppConfig, Box<dyn LanguageStore>) {
    let opened = match path {
        Some(path) => ConfigFile::open(path),
        None => ConfigFile::open_default(),
    };
    match opened {
        Ok(config_file) => {
            let config = config_file.config.clone();
            let store: Box<dyn LanguageStore> = Box::new(config_file);
            (config, store)
        }
        Err(e) => {
            error!("Could not read config, using defaults: {}", e);
            let config = AppConfig::default();
            let store: Box<dyn LanguageStore> =
                Box::new(MemoryLanguageStore::with_language(&config.language));
            (config, store)
        }
    }
}

fn notification_cue(config: &AppConfig) -> Box<dyn AudibleCue> {
    if !config.notification_sound {
        return Box::new(Silent);
    }
    #[cfg(feature = "sound")]
    {
        Box::new(cardsort_dashboard::notification::cue::Tone::default())
    }
    #[cfg(not(feature = "sound"))]
    {
        Box::new(cardsort_dashboard::notification::TerminalBell)
    }
}

fn live(
    config_path: Option<PathBuf>,
    server: Option<String>,
    translations: Option<PathBuf>,
) -> Result<(), DashboardError> {
    let (mut config, store) = open_config(config_path);
    if let Some(server) = server {
        config.server_url = server;
    }
    let translation_source = translations
        .map(TranslationSource::File)
        .unwrap_or(TranslationSource::Backend);

    let handles = spawn_backend(
        &config.server_url,
        translation_source,
        config.reconnect_delay(),
    )?;
    let dashboard = Dashboard::new(store);
    let cue = notification_cue(&config);

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(720., 420.))
        .with_min_inner_size(Vec2::new(520., 360.));

    if let Err(e) = eframe::run_native(
        "Card Sort Control",
        native_options,
        Box::new(move |cc| Ok(Box::new(LiveDashboardApp::new(handles, dashboard, cue, cc)))),
    ) {
        error!("Could not start dashboard window: {}", e);
    }
    Ok(())
}

fn export(config_path: Option<PathBuf>, server: Option<String>) -> Result<(), DashboardError> {
    let (config, _) = open_config(config_path);
    let server_url = server.unwrap_or(config.server_url);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DashboardError::RuntimeStart { source: e })?;
    let result = runtime.block_on(BackendClient::new(&server_url).export_all())?;
    info!("CSV export finished");
    println!("{}", result.csv_path);
    Ok(())
}

fn main() {
    let cli = Args::parse();
    if cfg!(debug_assertions) || cli.verbose {
        colog::init();
    }

    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        error!("Could not set Ctrl-C handler: {}", e);
    }

    let result = match cli.command {
        Commands::Live {
            server,
            translations,
        } => live(cli.config, server, translations),
        Commands::Export { server } => export(cli.config, server),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
