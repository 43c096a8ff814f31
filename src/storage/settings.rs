use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    fs::operations::{read_locked_json, update_locked_json},
    utils::time::YearMonth,
};

pub const DEFAULT_WEEKDAY_RATE: f64 = 500.0;
pub const DEFAULT_WEEKEND_RATE: f64 = 750.0;

/// Hourly pay. Work on selected days is paid with the weekend rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub weekday: f64,
    pub weekend: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            weekday: DEFAULT_WEEKDAY_RATE,
            weekend: DEFAULT_WEEKEND_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub weekday_rate: f64,
    pub weekend_rate: f64,
    /// Label of the account the data belongs to. Only displayed.
    pub user_email: Option<String>,
    pub first_launch: bool,
    /// Months whose weekends were already marked as selected days.
    pub initialized_months: BTreeSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weekday_rate: DEFAULT_WEEKDAY_RATE,
            weekend_rate: DEFAULT_WEEKEND_RATE,
            user_email: None,
            first_launch: true,
            initialized_months: BTreeSet::new(),
        }
    }
}

impl Settings {
    pub fn rates(&self) -> Rates {
        Rates {
            weekday: self.weekday_rate,
            weekend: self.weekend_rate,
        }
    }

    pub fn is_month_initialized(&self, month: YearMonth) -> bool {
        self.initialized_months.contains(&month.to_string())
    }
}

/// `settings.json` of the application directory. Every update is a locked read-modify-write,
/// so the daemon and the cli never lose each other's changes.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn load(&self) -> Result<Settings> {
        read_locked_json(&self.path).await
    }

    pub async fn update(&self, update: impl FnOnce(&mut Settings)) -> Result<Settings> {
        update_locked_json(&self.path, update).await
    }

    pub async fn set_weekday_rate(&self, rate: f64) -> Result<Settings> {
        validate_rate(rate)?;
        info!("Changing weekday rate to {rate}");
        self.update(|s| s.weekday_rate = rate).await
    }

    pub async fn set_weekend_rate(&self, rate: f64) -> Result<Settings> {
        validate_rate(rate)?;
        info!("Changing weekend rate to {rate}");
        self.update(|s| s.weekend_rate = rate).await
    }

    pub async fn set_user_email(&self, email: Option<String>) -> Result<Settings> {
        if let Some(email) = &email {
            if !email.contains('@') {
                anyhow::bail!("{email} doesn't look like an email");
            }
        }
        self.update(|s| s.user_email = email).await
    }
}

fn validate_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0. {
        anyhow::bail!("Rate should be a non-negative number, got {rate}");
    }
    Ok(())
}
