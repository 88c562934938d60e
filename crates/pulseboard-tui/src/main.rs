mod demo;
mod input;
mod render;
mod runtime;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use pulseboard_core::config::DashboardConfig;
use pulseboard_core::logging::{init_logging, LogTarget};
use pulseboard_core::{Gateway, HttpGateway, JsonFileStore, Store};

use crate::runtime::run_app;
use crate::ui::App;

#[derive(Parser, Debug)]
#[command(name = "pulseboard", about = "Terminal dashboard for a personal AI assistant")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run against built-in sample data instead of a worker
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // The terminal belongs to the UI; logs only go to PULSEBOARD_LOG_FILE
    init_logging("pulseboard", LogTarget::Silent);
    let args = Args::parse();
    let config = DashboardConfig::resolve(args.config.as_deref())?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ui::restore_terminal();
        eprintln!("\n\n=== PANIC ===");
        eprintln!("{}", panic_info);
        eprintln!("=============\n");
        original_hook(panic_info);
    }));

    let store = Arc::new(Store::new(Arc::new(JsonFileStore::new(config.data_dir()))));

    if args.demo {
        let gateway = Arc::new(demo::demo_gateway());
        run(store, gateway, &config, true).await
    } else {
        let gateway = Arc::new(HttpGateway::from_config(&config));
        run(store, gateway, &config, false).await
    }
}

async fn run<G: Gateway>(
    store: Arc<Store>,
    gateway: Arc<G>,
    config: &DashboardConfig,
    demo: bool,
) -> Result<()> {
    let worker_url = if demo {
        Some("(demo)".to_string())
    } else {
        config.worker_url.clone()
    };
    let (mut app, events) =
        App::new(store, gateway, config.poll_interval(), worker_url, demo).await?;
    let mut terminal = ui::init_terminal()?;

    let result = run_app(&mut terminal, &mut app, events).await;

    app.quit();
    ui::restore_terminal()?;

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }
    Ok(())
}
