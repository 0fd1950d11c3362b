// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use payment_tracker::{
    year_options, DeleteOutcome, DirectoryExportSink, ExportSink, GridView, LedgerStore, Month,
    StorageBackend, SummaryView, TerminalPrompt, Tracker, TrackerConfig, TrackerError, UserPrompt,
};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Track which months each person has paid for", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[clap(short, long, default_value = "payment-tracker.toml")]
    config: PathBuf,

    /// Override the ledger location from the configuration
    #[clap(short, long)]
    data: Option<PathBuf>,

    /// Override the storage backend (sqlite, json, memory)
    #[clap(short, long)]
    storage: Option<StorageBackend>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive grid (default)
    Tui,
    /// Print the grid and summary for a year
    Show {
        #[clap(short, long)]
        year: Option<i32>,
    },
    /// Add a person to a year
    Add {
        name: String,
        #[clap(short, long)]
        year: Option<i32>,
    },
    /// Remove a person (and all their payments) from a year
    Delete {
        name: String,
        #[clap(short, long)]
        year: Option<i32>,
        /// Skip the confirmation question
        #[clap(long)]
        yes: bool,
    },
    /// Flip the paid flag of one month
    Toggle {
        name: String,
        month: Month,
        #[clap(short, long)]
        year: Option<i32>,
    },
    /// Write the CSV report for a year
    Export {
        #[clap(short, long)]
        year: Option<i32>,
        /// Directory for the report (defaults to export_dir from the config)
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
    /// List selectable years and the years holding data
    Years,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TrackerConfig::load(&args.config)?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(storage) = args.storage {
        config.storage = storage;
    }

    let command = args.command.unwrap_or(Command::Tui);
    init_logging(&config, matches!(command, Command::Tui))?;

    let today = Local::now().date_naive();
    let store = config.open_store()?;
    let mut tracker = match Tracker::open(store, today) {
        Ok(tracker) => tracker,
        Err(e) => fail(&mut TerminalPrompt::new(false), e),
    };

    match command {
        Command::Tui => run_ui_mode(&mut tracker, &config, today),
        Command::Show { year } => {
            select_year(&mut tracker, year);
            print_grid(&tracker.grid(today));
            println!();
            print_summary(&tracker.summary());
            Ok(())
        }
        Command::Add { name, year } => {
            select_year(&mut tracker, year);
            let mut prompt = TerminalPrompt::new(false);
            match tracker.add_person(&name) {
                Ok(added) => {
                    prompt.notify(&format!("✓ Added {} to {}", added, tracker.selected_year()));
                    Ok(())
                }
                Err(e) => fail(&mut prompt, e),
            }
        }
        Command::Delete { name, year, yes } => {
            select_year(&mut tracker, year);
            let name = name.trim();
            let mut prompt = TerminalPrompt::new(yes);
            match tracker.delete_person(name, &mut prompt) {
                Ok(DeleteOutcome::Deleted) => {
                    prompt.notify(&format!("✓ Deleted {} from {}", name, tracker.selected_year()));
                    Ok(())
                }
                Ok(DeleteOutcome::NotFound) => {
                    prompt.notify(&format!("{} is not tracked in {}", name, tracker.selected_year()));
                    Ok(())
                }
                Ok(DeleteOutcome::Cancelled) => Ok(()),
                Err(e) => fail(&mut prompt, e),
            }
        }
        Command::Toggle { name, month, year } => {
            select_year(&mut tracker, year);
            let name = name.trim();
            let mut prompt = TerminalPrompt::new(false);
            if !tracker
                .ledger()
                .year(tracker.selected_year())
                .map_or(false, |record| record.contains(name))
            {
                prompt.notify(&format!(
                    "{} is not tracked in {}. Add them first.",
                    name,
                    tracker.selected_year()
                ));
                std::process::exit(1);
            }
            match tracker.toggle_payment(name, month) {
                Ok(status) => {
                    prompt.notify(&format!("{} {}: {}", name, month, status.label()));
                    Ok(())
                }
                Err(e) => fail(&mut prompt, e),
            }
        }
        Command::Export { year, out } => {
            select_year(&mut tracker, year);
            let mut prompt = TerminalPrompt::new(false);
            let mut sink = DirectoryExportSink::new(out.unwrap_or_else(|| config.export_dir.clone()));
            match tracker.export().and_then(|report| sink.deliver(&report)) {
                Ok(path) => {
                    prompt.notify(&format!("✓ Report written to {}", path.display()));
                    Ok(())
                }
                Err(e) => fail(&mut prompt, e),
            }
        }
        Command::Years => {
            let stored: Vec<i32> = tracker.ledger().years().collect();
            for year in year_options(today) {
                let marker = if year == tracker.selected_year() { "→" } else { " " };
                let persons = tracker.ledger().person_count(year);
                println!("{} {}  {} person(s)", marker, year, persons);
            }
            let outside: Vec<String> = stored
                .iter()
                .filter(|y| !year_options(today).contains(*y))
                .map(|y| y.to_string())
                .collect();
            if !outside.is_empty() {
                println!("Also stored: {}", outside.join(", "));
            }
            Ok(())
        }
    }
}

fn init_logging(config: &TrackerConfig, tui: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match (&config.log_file, tui) {
        (Some(path), _) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // The terminal UI owns the screen; without a log file logs are dropped
        (None, true) => builder.with_writer(std::io::sink).init(),
        (None, false) => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Report a tracker failure to the user and stop
fn fail(prompt: &mut dyn UserPrompt, err: TrackerError) -> ! {
    prompt.notify(&format!("❌ {}", err));
    std::process::exit(1);
}

fn select_year<S: LedgerStore>(tracker: &mut Tracker<S>, year: Option<i32>) {
    if let Some(year) = year {
        tracker.switch_year(year);
    }
}

fn print_grid(grid: &GridView) {
    println!("Payments {}", grid.year);

    let rows = grid.rows();
    if grid.is_empty() {
        println!("{}", payment_tracker::view::EMPTY_GRID_MESSAGE);
        return;
    }

    let name_width = rows
        .iter()
        .map(|r| r.person_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Person".len());

    let mut header = format!("{:<width$}", "Person", width = name_width);
    for h in &grid.headers {
        let label = if h.is_current {
            format!("*{}", h.month.short_name())
        } else {
            h.month.short_name().to_string()
        };
        header.push_str(&format!(" {:>4}", label));
    }
    println!("{}", header);

    for row in rows {
        let mut line = format!("{:<width$}", row.person_name, width = name_width);
        for cell in &row.cells {
            line.push_str(&format!(" {:>4}", if cell.paid { "✔" } else { "✘" }));
        }
        println!("{}", line);
    }
}

fn print_summary(summary: &SummaryView) {
    println!("Summary");
    for line in summary.lines() {
        println!("  {}", line);
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode<S: LedgerStore>(
    tracker: &mut Tracker<S>,
    config: &TrackerConfig,
    today: NaiveDate,
) -> Result<()> {
    let mut app = ui::App::new(tracker, today, DirectoryExportSink::new(&config.export_dir));
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode<S: LedgerStore>(
    _tracker: &mut Tracker<S>,
    _config: &TrackerConfig,
    _today: NaiveDate,
) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: show, add, delete, toggle, export");
    std::process::exit(1);
}
