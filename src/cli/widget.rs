use anyhow::Result;
use clap::Subcommand;

use crate::widget::{pause_toggle, read_widget, toggle, ActionOutcome, WidgetView, WIDGET_FILE};

use super::{
    context::AppContext,
    process::{current_executable, is_server_running},
};

#[derive(Subcommand, Debug, Clone)]
pub enum WidgetCommand {
    #[command(about = "Show the widget")]
    Show {
        #[arg(long, help = "Print what the daemon last wrote into widget.json")]
        cached: bool,
    },
    #[command(about = "Primary button: start or stop work")]
    Toggle,
    #[command(about = "Secondary button: pause or resume work")]
    PauseToggle,
}

pub async fn process_widget_command(
    context: &AppContext,
    command: Option<WidgetCommand>,
) -> Result<()> {
    let manager = &context.manager;
    let today = manager.today();
    match command.unwrap_or(WidgetCommand::Show { cached: false }) {
        WidgetCommand::Show { cached: true } => {
            if !is_server_running(&current_executable()?)? {
                println!("Daemon is not running, the widget may be outdated");
            }
            println!("{}", read_widget(&context.dir.join(WIDGET_FILE)).await?);
            return Ok(());
        }
        WidgetCommand::Show { cached: false } => {}
        WidgetCommand::Toggle => match toggle(manager, today).await? {
            ActionOutcome::Stopped(report) => println!("Work of {} finished", report.date),
            _ => println!("Work started"),
        },
        WidgetCommand::PauseToggle => match pause_toggle(manager, today).await? {
            ActionOutcome::Paused => println!("Paused"),
            _ => println!("Resumed"),
        },
    }

    let report = manager.live_report(today).await?;
    println!("{}", WidgetView::render(report.as_ref(), manager.clock().time()));
    Ok(())
}
