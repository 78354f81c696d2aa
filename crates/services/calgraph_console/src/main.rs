// --- File: crates/services/calgraph_console/src/main.rs ---
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use calgraph_common::services::CalendarService;
use calgraph_common::{config_error, logging, Context};
use calgraph_config::env_vars::get_config_env_var;
use calgraph_config::{ensure_dotenv_loaded, load_config, load_config_from};
use calgraph_graph::{CalendarClient, CalendarSettings, GraphCalendarService};
use clap::Parser;
use inquire::InquireError;
use tracing::{info, Level};

mod actions;
mod error;
mod menu;
mod prompt;

use error::ConsoleError;
use menu::{render_menu, MenuChoice};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Check availability, book and move events, and get meeting suggestions on Microsoft Graph"
)]
struct Cli {
    /// INI configuration file. Repeat to layer files; later ones win.
    /// Defaults to config.cfg then config.dev.cfg.
    #[arg(long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,

    /// Log level for calgraph (error, warn, info, debug, trace). Logs go to stderr.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<Level>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    ensure_dotenv_loaded();

    let level = cli
        .log_level
        .or_else(|| get_config_env_var("log.level").and_then(|v| v.parse().ok()));
    match level {
        Some(level) => logging::init_with_level(level),
        None => logging::init(),
    }

    println!("Calendar Graph Console\n");
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ConsoleError> {
    let loaded = if cli.config.is_empty() {
        load_config()
    } else {
        load_config_from(&cli.config)
    };
    let config = logging::log_result(loaded, "Configuration loaded", "Configuration rejected")
        .map_err(config_error)?;

    let settings = CalendarSettings::from_config(&config.graph)?;
    let service =
        GraphCalendarService::from_config(&config).context("Failed to set up the Graph client")?;
    let client = CalendarClient::new(service, settings);
    info!("Using schedule time zone {}", client.settings().time_zone);

    let mut out = std::io::stdout();
    actions::greet_user(&client, &mut out).await?;

    loop {
        write!(out, "{}", render_menu())?;
        out.flush()?;

        let input = match prompt::prompt_menu_choice() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                writeln!(out, "Goodbye...")?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let Some(choice) = MenuChoice::parse(&input) else {
            writeln!(out, "Invalid choice!\n")?;
            continue;
        };
        if choice == MenuChoice::Exit {
            writeln!(out, "Goodbye...")?;
            return Ok(());
        }

        if let Err(err) = dispatch(&client, choice, &mut out).await {
            logging::log_error(&err, choice.label());
            actions::report_error(&err, &mut out)?;
        }
    }
}

async fn dispatch<S: CalendarService>(
    client: &CalendarClient<S>,
    choice: MenuChoice,
    out: &mut impl Write,
) -> Result<(), ConsoleError> {
    match choice {
        MenuChoice::Exit => Ok(()),
        MenuChoice::DisplayAccessToken => actions::display_access_token(client, out).await,
        MenuChoice::CheckAvailability => {
            let email = actions::user_email(client).await?;
            let start = prompt::prompt_date_time("Start datetime:")?;
            let end = prompt::prompt_date_time("End datetime:")?;
            writeln!(out, "You chose: {} to {}\n", start, end)?;
            actions::check_availability(client, &email, start, end, out).await
        }
        MenuChoice::CreateAndUpdateEvent => {
            let email = actions::user_email(client).await?;
            let start = prompt::prompt_date_time("Start datetime:")?;
            let end = prompt::prompt_date_time("End datetime:")?;
            let title = prompt::prompt_title()?;
            writeln!(out, "You chose: {} to {} with title {}\n", start, end, title)?;
            actions::create_and_move_event(client, &email, start, end, &title, out).await
        }
        MenuChoice::PreviewWeek => actions::preview_week(client, out).await,
        MenuChoice::SuggestFreeTimes => {
            let email = actions::user_email(client).await?;
            let start = prompt::prompt_date_time("Start of window datetime:")?;
            let end = prompt::prompt_date_time("End of window datetime:")?;
            writeln!(out, "You chose: {} to {}\n", start, end)?;
            actions::suggest_free_times(client, &email, start, end, out).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_repeated_config_and_level() {
        let cli = Cli::try_parse_from([
            "calgraph",
            "--config",
            "base.cfg",
            "--config",
            "local.cfg",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config, vec![PathBuf::from("base.cfg"), PathBuf::from("local.cfg")]);
        assert_eq!(cli.log_level, Some(Level::DEBUG));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["calgraph"]).unwrap();
        assert!(cli.config.is_empty());
        assert_eq!(cli.log_level, None);
    }
}
