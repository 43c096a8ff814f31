pub mod calendar;
pub mod context;
pub mod dates;
pub mod export;
pub mod process;
pub mod session;
pub mod settings;
pub mod statistics;
pub mod widget;

use std::path::PathBuf;

use anyhow::Result;
use calendar::{process_calendar_command, CalendarCommand};
use chrono::Local;
use clap::{Parser, Subcommand};
use context::AppContext;
use dates::{parse_day, DateStyle, DATE_HELP, DATE_STYLE_HELP};
use export::process_export_command;
use process::{current_executable, kill_previous_servers, restart_server};
use session::{process_session_command, process_status_command, SessionAction};
use settings::{process_settings_command, SettingsCommand};
use statistics::{process_stats_command, StatsCommand};
use tracing::level_filters::LevelFilter;
use widget::{process_widget_command, WidgetCommand};

use crate::{
    daemon::{start_daemon, start_watch},
    utils::{
        dir::resolve_application_path,
        logging::{enable_logging, CLI_PREFIX},
        time::YearMonth,
    },
};

#[derive(Parser, Debug)]
#[command(name = "workhours", version, long_about = None)]
#[command(about = "Tracks work sessions, non-working days and earnings", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon that keeps the widget up to date")]
    Init,
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve,
    #[command(about = "Stop currently running daemon.")]
    Stop,
    #[command(about = "Start work for today, or continue an unfinished session")]
    Start,
    #[command(about = "Pause current session")]
    Pause,
    #[command(about = "Resume paused session")]
    Resume,
    #[command(about = "Finish current session")]
    Finish,
    #[command(about = "Show session of a day")]
    Status {
        #[arg(long, short, help = DATE_HELP)]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = DATE_STYLE_HELP)]
        date_style: DateStyle,
    },
    #[command(about = "Follow the session in the console until ctrl-c")]
    Watch,
    #[command(about = "Compact status with start/stop and pause/resume buttons")]
    Widget {
        #[command(subcommand)]
        command: Option<WidgetCommand>,
    },
    #[command(about = "Non-working days of a month")]
    Calendar {
        #[arg(long, short, help = "Month in YYYY-MM format. Current month by default")]
        month: Option<YearMonth>,
        #[command(subcommand)]
        command: Option<CalendarCommand>,
    },
    #[command(about = "Statistics of a day, a week or a month")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "Export a month into a CSV table")]
    Export {
        #[arg(long, short, help = "Month in YYYY-MM format. Current month by default")]
        month: Option<YearMonth>,
        #[arg(long, short, help = "Directory for the file. <application dir>/exports by default")]
        out: Option<PathBuf>,
    },
    #[command(about = "Hourly rates and account")]
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = resolve_application_path(args.dir.as_deref())?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init => {
            restart_server(&dir)?;
            println!("Daemon started");
            Ok(())
        }
        Commands::Stop => {
            let stopped = kill_previous_servers(&current_executable()?)?;
            println!("Stopped {stopped} daemons");
            Ok(())
        }
        Commands::Serve => start_daemon(dir).await,
        Commands::Watch => start_watch(dir, std::io::stdout()).await,
        Commands::Start => {
            let context = AppContext::open(dir).await?;
            process_session_command(&context, SessionAction::Start).await
        }
        Commands::Pause => {
            let context = AppContext::open(dir).await?;
            process_session_command(&context, SessionAction::Pause).await
        }
        Commands::Resume => {
            let context = AppContext::open(dir).await?;
            process_session_command(&context, SessionAction::Resume).await
        }
        Commands::Finish => {
            let context = AppContext::open(dir).await?;
            process_session_command(&context, SessionAction::Finish).await
        }
        Commands::Status { date, date_style } => {
            let context = AppContext::open(dir).await?;
            let now = context.clock().time().with_timezone(&Local);
            let date = parse_day(date.as_deref(), date_style, now)?;
            process_status_command(&context, date).await
        }
        Commands::Widget { command } => {
            let context = AppContext::open(dir).await?;
            process_widget_command(&context, command).await
        }
        Commands::Calendar { month, command } => {
            let context = AppContext::open(dir).await?;
            process_calendar_command(&context, month, command).await
        }
        Commands::Stats { command } => {
            let context = AppContext::open(dir).await?;
            process_stats_command(&context, command).await
        }
        Commands::Export { month, out } => {
            let context = AppContext::open(dir).await?;
            process_export_command(&context, month, out).await
        }
        Commands::Settings { command } => {
            let context = AppContext::open(dir).await?;
            process_settings_command(&context, command).await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Args, Commands};

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_options_go_after_subcommands() {
        let args = Args::parse_from([
            "workhours",
            "calendar",
            "--month",
            "2025-04",
            "--dir",
            "/tmp/w",
        ]);
        assert_eq!(args.dir.as_deref(), Some(std::path::Path::new("/tmp/w")));
        assert!(matches!(
            args.commands,
            Commands::Calendar { month: Some(_), .. }
        ));
    }

    #[test]
    fn negative_offsets() {
        let args = Args::parse_from(["workhours", "stats", "week", "--offset", "-2"]);
        assert!(matches!(args.commands, Commands::Stats { .. }));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(Args::try_parse_from(["workhours", "export", "--month", "2025-13"]).is_err());
    }
}
