use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;

use crate::{calendar::MonthData, utils::time::YearMonth};

use super::context::AppContext;

#[derive(Subcommand, Debug, Clone)]
pub enum CalendarCommand {
    #[command(about = "Show the month, non-working days are highlighted")]
    Show,
    #[command(about = "Mark a day as working or non-working")]
    Toggle { day: u32 },
    #[command(about = "Mark weekends of the month as non-working, once per month")]
    Init,
}

pub async fn process_calendar_command(
    context: &AppContext,
    month: Option<YearMonth>,
    command: Option<CalendarCommand>,
) -> Result<()> {
    let today = context.clock().today();
    let month = month.unwrap_or_else(|| YearMonth::from_date(today));
    match command.unwrap_or(CalendarCommand::Show) {
        CalendarCommand::Show => {}
        CalendarCommand::Toggle { day } => {
            let selected = context.calendar.toggle_day(month, day).await?;
            let kind = if selected { "non-working" } else { "working" };
            println!("{month}-{day:02} is a {kind} day");
        }
        CalendarCommand::Init => {
            if !context.calendar.initialize_weekend_days(month).await? {
                println!("Weekends of {month} were already initialized");
            }
        }
    }
    let data = context.calendar.month_data(month).await?;
    print!("{}", render_month(&data, Some(today), true));
    Ok(())
}

/// Monday-first grid of the month. Without colors non-working days are marked with `*`.
pub fn render_month(data: &MonthData, today: Option<NaiveDate>, colored: bool) -> String {
    let mut out = format!("{:^20}\n", data.month.first_day().format("%B %Y").to_string());
    out.push_str("Mo Tu We Th Fr Sa Su\n");

    let offset = data.month.first_day().weekday().num_days_from_monday() as usize;
    let mut cells = vec!["   ".to_string(); offset];
    for &day in &data.days {
        let selected = data.is_selected(day);
        let text = format!("{day:>2}");
        let cell = if colored {
            let mut style = Style::new();
            if selected {
                style = style.fg(Colour::Red);
            }
            if today.is_some_and(|t| data.month.day(day) == Some(t)) {
                style = style.bold().underline();
            }
            format!("{} ", style.paint(text))
        } else {
            format!("{text}{}", if selected { '*' } else { ' ' })
        };
        cells.push(cell);
    }

    for week in cells.chunks(7) {
        out.push_str(week.concat().trim_end());
        out.push('\n');
    }
    out
}
