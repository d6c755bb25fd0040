use clap::Parser;
use color_eyre::Result;

use taskflow::cli::{self, AddArgs, Cli, Commands, EditArgs};
use taskflow::{logging, open_stores, utils, Config, Profile, TaskController};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(&utils::expand_path(path))?,
        None => Config::load_with_profile(profile)?,
    };
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Logging is best effort; a read-only data dir should not stop the app
    if let Some(data_dir) = utils::get_data_dir(profile) {
        if let Err(e) = logging::init(&data_dir) {
            eprintln!("Warning: could not open log file: {}", e);
        }
    }
    tracing::info!(?profile, backend = ?config.backend, "starting taskflow");

    let (task_store, category_store) = open_stores(&config)?;
    let mut controller = TaskController::new(task_store, category_store);
    let today = utils::today();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = taskflow::tui::App::new(config, controller, today)?;
            taskflow::tui::run_event_loop(app)?;
        }
        Commands::List { route, search } => {
            cli::load(&mut controller)?;
            cli::handle_list(&mut controller, &route, search, today)?;
        }
        Commands::Add { title, description, priority, category, due } => {
            cli::load(&mut controller)?;
            let args = AddArgs { title, description, priority, category, due };
            cli::handle_add(&mut controller, args, today)?;
        }
        Commands::Edit { id, title, description, priority, category, due, clear_due } => {
            cli::load(&mut controller)?;
            let args = EditArgs { id, title, description, priority, category, due, clear_due };
            cli::handle_edit(&mut controller, args, today)?;
        }
        Commands::Toggle { id } => {
            cli::load(&mut controller)?;
            cli::handle_toggle(&mut controller, id)?;
        }
        Commands::Delete { id, yes } => {
            cli::load(&mut controller)?;
            cli::handle_delete(&mut controller, id, yes)?;
        }
        Commands::Stats => {
            cli::load(&mut controller)?;
            cli::handle_stats(&controller, today)?;
        }
        Commands::Categories { recount } => {
            cli::load(&mut controller)?;
            cli::handle_categories(&mut controller, recount)?;
        }
    }

    tracing::info!("exiting");
    Ok(())
}
