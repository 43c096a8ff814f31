use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Pause, TimeReport};

/// The struct used for storing reports on the disk. One line of a monthly report file.
/// Timestamps are epoch milliseconds.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TimeReportEntity {
    pub date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(with = "duration_ser")]
    pub work_time: Duration,
    #[serde(default)]
    pub pauses: Vec<PauseEntity>,
}

/// Stored as a `[start, end]` pair, `end` is `null` for an open pause.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
pub struct PauseEntity(
    #[serde(with = "chrono::serde::ts_milliseconds")] pub DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")] pub Option<DateTime<Utc>>,
);

mod duration_ser {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = i64::deserialize(deserializer)?;
        Ok(Duration::milliseconds(ms))
    }
}

impl From<&TimeReport> for TimeReportEntity {
    fn from(report: &TimeReport) -> Self {
        TimeReportEntity {
            date: report.date,
            start: report.start,
            end: report.end,
            work_time: report.work_time,
            pauses: report
                .pauses
                .iter()
                .map(|pause| PauseEntity(pause.start, pause.end))
                .collect(),
        }
    }
}

impl From<TimeReportEntity> for TimeReport {
    fn from(
        TimeReportEntity {
            date,
            start,
            end,
            work_time,
            pauses,
        }: TimeReportEntity,
    ) -> Self {
        TimeReport {
            date,
            start,
            end,
            work_time,
            pauses: pauses
                .into_iter()
                .map(|PauseEntity(start, end)| Pause { start, end })
                .collect(),
        }
    }
}

/// Days of one month the user marked as non-working.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct SelectedDaysEntity {
    #[serde(default)]
    pub days: BTreeSet<u32>,
}
