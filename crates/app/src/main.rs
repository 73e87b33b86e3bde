mod args;
mod commands;
mod study;

use services::{AppServices, Clock};

use crate::args::{Args, Backend, Command, DB_URL_ENV, prepare_sqlite_file, print_usage};

async fn open_services(backend: &Backend) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    match backend {
        Backend::Memory => {
            log::info!("using in-memory storage; nothing will be kept");
            Ok(AppServices::in_memory(clock))
        }
        Backend::Sqlite(db_url) => {
            // Open + migrate SQLite here so the library crates never touch the filesystem layout.
            prepare_sqlite_file(db_url)?;
            Ok(AppServices::new_sqlite(db_url, clock).await?)
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), std::env::var(DB_URL_ENV).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let services = open_services(&parsed.backend).await?;
    let mut stdout = std::io::stdout().lock();

    match parsed.command {
        Command::Progress(command) => commands::run_progress(&services, command, &mut stdout).await,
        Command::Queue(command) => commands::run_queue(&services, command, &mut stdout).await,
        Command::Study { module_path } => {
            let module = study::load_module(&module_path)?;
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            study::run_study(&services, module, input, &mut stdout).await?;
            Ok(())
        }
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
