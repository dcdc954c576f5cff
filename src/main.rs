use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod criterion;
mod domain;
mod filter;
mod inputter;
mod model;
mod plot;
mod ui;

use controller::Controller;
use domain::{SiftConfig, SiftError};
use model::{Model, Status};
use ui::SiftUI;

/// A tui based tabular data filter and plot viewer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset to explore (csv, parquet or arrow ipc).
    #[arg(default_value = "data/strain_nml_sample.csv")]
    path: String,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), SiftError> {
    init_tracing()?;

    let args = Args::parse();
    let path = shellexpand::full(&args.path).map_err(|e| SiftError::LoadingFailed(e.to_string()))?;

    let config = SiftConfig::default()
        .with_event_poll_time(100)
        .with_max_column_width(32)
        .with_page_size(10);

    let mut model = Model::load(PathBuf::from(path.as_ref()), config.clone())?;
    let mut ui = SiftUI::new(&config);
    let controller = Controller::new(&config);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}

// The terminal itself belongs to the ui, so traces go to a file, and only
// when RUST_LOG asks for them.
fn init_tracing() -> Result<(), SiftError> {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return Ok(());
    };
    let logfile = std::fs::File::create("sift.log")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(logfile))
                .with_ansi(false),
        )
        .init();
    Ok(())
}
