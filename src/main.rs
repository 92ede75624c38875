use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use wxdash_core::{AppError, Config};
use wxdash_ui::{initialize_dashboard_services, view, AppGateway, DashboardModel, DashboardSignal};
use wxdash_weather::parse_locale;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(version, about = "7-day weather forecast dashboard", long_about = None)]
struct Args {
    /// Location to select at startup (defaults to dashboard.default_location)
    #[arg(short, long)]
    location: Option<String>,

    /// Date locale such as en_GB (defaults to dashboard.locale, then LC_ALL/LANG)
    #[arg(long)]
    locale: Option<String>,

    /// Config file to use instead of the per-user one
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Location(String),
    Locations,
    Login,
    Logout,
    Refresh,
    Show,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "location" | "loc" if !rest.is_empty() => Command::Location(rest.to_string()),
            "locations" | "loc" | "location" => Command::Locations,
            "login" => Command::Login,
            "logout" => Command::Logout,
            "refresh" | "r" => Command::Refresh,
            "show" | "" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

const HELP: &str = "\
Commands:
  location <name>   select a location
  locations         list supported locations
  login             sign in
  logout            sign out
  refresh           reload the forecast for the current location
  show              redraw the dashboard
  help              show this help
  quit              exit";

/// Load config and build the dashboard. Failures carry a user-facing message.
fn start(args: Args) -> Result<DashboardModel<AppGateway>, AppError> {
    let (mut config, _) = Config::load_validated(args.config.as_deref())?;
    if let Some(locale) = args.locale {
        config.dashboard.locale = Some(locale);
    }
    let locale = parse_locale(&config.dashboard.effective_locale());
    let initial_location = args
        .location
        .unwrap_or_else(|| config.dashboard.default_location.clone());

    let services = initialize_dashboard_services(&config)?;
    Ok(DashboardModel::new(services, &initial_location, locale))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize core
    wxdash_core::init()?;

    let mut model = match start(args) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    tracing::info!("wxdash started");
    println!("wxdash - type 'help' for commands");

    // Read stdin on its own thread so async results keep flowing while idle
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    model.mount();

    loop {
        match line_rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => match Command::parse(&line) {
                Some(Command::Quit) => break,
                Some(Command::Help) => println!("{}", HELP),
                Some(Command::Show) => print!("{}", view::render(&model)),
                Some(Command::Locations) => println!("{}", model.locations().join(", ")),
                Some(Command::Location(name)) => model.select_location(&name),
                Some(Command::Login) => {
                    println!("Signing in...");
                    model.login();
                }
                Some(Command::Logout) => model.logout(),
                Some(Command::Refresh) => model.refresh(),
                None => println!("Unknown command: {} (type 'help')", line.trim()),
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            // stdin closed
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        model.poll_channel();
        present(&mut model);
    }

    tracing::info!("wxdash exiting");
    Ok(())
}

/// Print notifications and redraw when the dashboard changed.
fn present<G: wxdash_auth::AuthGateway>(model: &mut DashboardModel<G>) {
    let mut redraw = false;
    for signal in model.take_signals() {
        match signal {
            DashboardSignal::Notification(message) => println!("! {}", message),
            DashboardSignal::SessionChanged(_)
            | DashboardSignal::SelectionChanged(_)
            | DashboardSignal::LoadingChanged(_)
            | DashboardSignal::ForecastChanged => redraw = true,
        }
    }
    if redraw {
        print!("{}", view::render(model));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use wxdash_core::ConfigError;

    #[test]
    fn parse_commands() {
        assert_eq!(
            Command::parse("location  New York "),
            Some(Command::Location("New York".to_string()))
        );
        assert_eq!(Command::parse("location"), Some(Command::Locations));
        assert_eq!(Command::parse("LOGIN"), Some(Command::Login));
        assert_eq!(Command::parse(""), Some(Command::Show));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "wxdash".to_string(),
            "--config".to_string(),
            dir.path().join("absent.toml").display().to_string(),
        ]);

        let err = start(args).err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::NotFound(_))));
        assert_eq!(
            err.user_message(),
            "Configuration file not found. Check the --config path."
        );
    }

    #[test]
    fn args_accept_location_and_locale() {
        let args = Args::parse_from(["wxdash", "--location", "London", "--locale", "en_GB"]);
        assert_eq!(args.location.as_deref(), Some("London"));
        assert_eq!(args.locale.as_deref(), Some("en_GB"));
        assert!(args.config.is_none());
    }
}
