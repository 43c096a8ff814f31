use anyhow::Result;
use clap::Subcommand;

use crate::{storage::settings::Settings, utils::format::format_money};

use super::context::AppContext;

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    #[command(about = "Print current settings")]
    Show,
    #[command(about = "Hourly rate of working days")]
    SetWeekdayRate { rate: f64 },
    #[command(about = "Hourly rate of non-working days")]
    SetWeekendRate { rate: f64 },
    #[command(about = "Email of the account the data belongs to")]
    SetEmail { email: String },
    #[command(about = "Forget the account email")]
    ClearEmail,
}

pub async fn process_settings_command(
    context: &AppContext,
    command: Option<SettingsCommand>,
) -> Result<()> {
    let store = &context.settings;
    let settings = match command.unwrap_or(SettingsCommand::Show) {
        SettingsCommand::Show => store.load().await?,
        SettingsCommand::SetWeekdayRate { rate } => store.set_weekday_rate(rate).await?,
        SettingsCommand::SetWeekendRate { rate } => store.set_weekend_rate(rate).await?,
        SettingsCommand::SetEmail { email } => store.set_user_email(Some(email)).await?,
        SettingsCommand::ClearEmail => store.set_user_email(None).await?,
    };
    print!("{}", describe_settings(&settings));
    Ok(())
}

pub fn describe_settings(settings: &Settings) -> String {
    format!(
        "Weekday rate\t{}\nWeekend rate\t{}\nAccount\t{}\n",
        format_money(settings.weekday_rate),
        format_money(settings.weekend_rate),
        settings.user_email.as_deref().unwrap_or("not set")
    )
}
