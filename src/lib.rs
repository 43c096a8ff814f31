//! Work hours tracker. Work sessions of a day are started, paused and finished from the
//! terminal, a background daemon follows the running session and keeps a widget file up to date.
//! Non-working days, hourly rates, statistics and exports are built on top of the stored reports.

pub mod calendar;
pub mod cli;
pub mod daemon;
pub mod events;
pub mod fs;
pub mod session;
pub mod statistics;
pub mod storage;
pub mod utils;
pub mod widget;
