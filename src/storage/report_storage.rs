use std::{
    collections::BTreeMap,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::{
    fs::operations::seek_line_backwards,
    session::TimeReport,
    utils::time::{month_to_record_name, YearMonth},
};

use super::entities::TimeReportEntity;

/// Interface for abstracting storage of time reports. There is at most one report per date,
/// saving a report for a date that already has one replaces it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportStorage: Send + Sync {
    async fn save_report(&self, report: &TimeReport) -> Result<()>;

    async fn get_report_by_date(&self, date: NaiveDate) -> Result<Option<TimeReport>>;

    /// Reports of a month ordered by date.
    async fn get_reports_by_month(&self, month: YearMonth) -> Result<Vec<TimeReport>>;
}

#[async_trait]
impl<T> ReportStorage for T
where
    T: Deref + Send + Sync,
    T::Target: ReportStorage,
{
    async fn save_report(&self, report: &TimeReport) -> Result<()> {
        self.deref().save_report(report).await
    }

    async fn get_report_by_date(&self, date: NaiveDate) -> Result<Option<TimeReport>> {
        self.deref().get_report_by_date(date).await
    }

    async fn get_reports_by_month(&self, month: YearMonth) -> Result<Vec<TimeReport>> {
        self.deref().get_reports_by_month(month).await
    }
}

/// The main realization of [ReportStorage].
///  - There is a directory with monthly report files.
///  - Every save is a JSON line. When the previous line belongs to the same date it's
///    overwritten, otherwise the new line is appended.
///  - Readers keep the last line for every date, so stale duplicates are harmless.
pub struct ReportStorageImpl {
    report_dir: PathBuf,
}

impl ReportStorageImpl {
    pub fn new(report_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&report_dir)?;

        Ok(Self { report_dir })
    }

    fn month_path(&self, month: YearMonth) -> PathBuf {
        self.report_dir.join(month_to_record_name(month))
    }

    async fn read_month(&self, month: YearMonth) -> Result<BTreeMap<NaiveDate, TimeReport>> {
        async fn extract(
            path: &Path,
        ) -> std::result::Result<BTreeMap<NaiveDate, TimeReport>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let mut reader = BufReader::new(file);
            let reports = parse_lines(path, &mut reader).await;
            reader.into_inner().unlock_async().await?;
            reports
        }

        match extract(&self.month_path(month)).await {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parses every line of a month file. Lines that aren't valid reports are skipped, the rest of
/// the file still counts.
async fn parse_lines(
    path: &Path,
    reader: &mut BufReader<File>,
) -> std::result::Result<BTreeMap<NaiveDate, TimeReport>, std::io::Error> {
    let mut reports = BTreeMap::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(reports);
        }
        let Ok(v) = std::str::from_utf8(&line) else {
            warn!("During parsing in path {path:?} found a line that isn't valid UTF-8");
            continue;
        };
        if v.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TimeReportEntity>(v) {
            Ok(entity) => {
                reports.insert(entity.date, TimeReport::from(entity));
            }
            Err(e) => {
                // ignore illegal values. Might happen after shutdowns
                warn!(
                    "During parsing in path {:?} found illegal json string {}:  {e}",
                    path,
                    v.trim_end()
                )
            }
        }
    }
}

#[async_trait]
impl ReportStorage for ReportStorageImpl {
    async fn save_report(&self, report: &TimeReport) -> Result<()> {
        let path = self.month_path(YearMonth::from_date(report.date));
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = write_report(&mut file, TimeReportEntity::from(report)).await;
        file.unlock_async().await?;
        debug!("Saved report for {}", report.date);
        result
    }

    async fn get_report_by_date(&self, date: NaiveDate) -> Result<Option<TimeReport>> {
        let mut reports = self.read_month(YearMonth::from_date(date)).await?;
        Ok(reports.remove(&date))
    }

    async fn get_reports_by_month(&self, month: YearMonth) -> Result<Vec<TimeReport>> {
        Ok(self.read_month(month).await?.into_values().collect())
    }
}

/// Tries to read out the last line, leaving the cursor at its beginning. Bytes that aren't
/// UTF-8 are replaced, such a line never parses as a report.
async fn extract_line_backwards(file: &mut File) -> Result<String> {
    seek_line_backwards(file, &mut vec![0; 1024]).await?;
    let mut last_line = Vec::new();
    file.read_to_end(&mut last_line).await?;
    file.seek(std::io::SeekFrom::Current(-(last_line.len() as i64)))
        .await?;
    Ok(String::from_utf8_lossy(&last_line).into_owned())
}

async fn write_report(file: &mut File, entity: TimeReportEntity) -> Result<()> {
    // 1. Get last line from the file.
    // 2. If it describes the same date (or is corrupted) it gets replaced.
    // 3. Otherwise the new line goes after it.
    file.seek(std::io::SeekFrom::End(0)).await?;

    let last_line = extract_line_backwards(file).await?;

    let replace = if last_line.trim().is_empty() {
        true
    } else {
        match serde_json::from_str::<TimeReportEntity>(last_line.trim_end()) {
            Ok(previous) => previous.date == entity.date,
            Err(e) => {
                // Might happen due to shutdown cutting of the write into a file.
                warn!("Last report line was corrupted {e}");
                true
            }
        }
    };

    if !replace {
        file.seek(std::io::SeekFrom::End(0)).await?;
    }

    let mut buffer = serde_json::to_vec(&entity)?;
    buffer.push(b'\n');

    file.write_all(&buffer).await?;
    let end = file.stream_position().await?;
    file.set_len(end).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        session::{Pause, TimeReport, WorkSession},
        storage::report_storage::{ReportStorage, ReportStorageImpl},
        utils::time::YearMonth,
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap()
    }

    fn completed(day: u32, hours: i64) -> TimeReport {
        let mut session = WorkSession::create(date(day), at(day, 9));
        session.stop(at(day, 9) + Duration::hours(hours)).unwrap()
    }

    fn lines_in(dir: &std::path::Path, month: &str) -> usize {
        std::fs::read_to_string(dir.join(month))
            .unwrap()
            .lines()
            .count()
    }

    #[tokio::test]
    async fn missing_month_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;
        assert_eq!(storage.get_report_by_date(date(1)).await?, None);
        assert!(storage
            .get_reports_by_month(YearMonth::new(2025, 4).unwrap())
            .await?
            .is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn repeated_saves_of_a_day_overwrite_last_line() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;

        let mut session = WorkSession::create(date(7), at(7, 9));
        storage.save_report(&session.to_report(at(7, 9))).await?;
        session.pause(at(7, 11)).unwrap();
        storage.save_report(&session.to_report(at(7, 11))).await?;
        session.resume(at(7, 12)).unwrap();
        storage.save_report(&session.to_report(at(7, 12))).await?;
        let report = session.stop(at(7, 17)).unwrap();
        storage.save_report(&report).await?;

        assert_eq!(lines_in(dir.path(), "2025-04"), 1);
        let stored = storage.get_report_by_date(date(7)).await?.unwrap();
        assert_eq!(stored, report);
        assert_eq!(stored.pauses, vec![Pause::closed(at(7, 11), at(7, 12))]);
        assert_eq!(stored.work_time, Duration::hours(7));
        Ok(())
    }

    #[tokio::test]
    async fn shorter_replacement_leaves_no_garbage() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;

        let mut long = completed(7, 8);
        long.pauses = (0..5)
            .map(|i| {
                let moment = at(7, 10) + Duration::minutes(i);
                Pause::closed(moment, moment)
            })
            .collect();
        storage.save_report(&long).await?;
        let short = completed(7, 1);
        storage.save_report(&short).await?;

        assert_eq!(lines_in(dir.path(), "2025-04"), 1);
        assert_eq!(storage.get_report_by_date(date(7)).await?, Some(short));
        Ok(())
    }

    #[tokio::test]
    async fn different_days_are_appended_and_sorted() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;

        storage.save_report(&completed(8, 6)).await?;
        storage.save_report(&completed(3, 8)).await?;
        storage.save_report(&completed(8, 7)).await?;

        let reports = storage
            .get_reports_by_month(YearMonth::new(2025, 4).unwrap())
            .await?;
        assert_eq!(
            reports.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![date(3), date(8)]
        );
        assert_eq!(reports[1].work_time, Duration::hours(7));
        Ok(())
    }

    #[tokio::test]
    async fn months_are_stored_separately() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;

        storage.save_report(&completed(30, 8)).await?;
        let mut may = WorkSession::create(
            NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap(),
        );
        let may = may
            .stop(Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap())
            .unwrap();
        storage.save_report(&may).await?;

        assert_eq!(lines_in(dir.path(), "2025-04"), 1);
        assert_eq!(lines_in(dir.path(), "2025-05"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;
        storage.save_report(&completed(1, 8)).await?;

        let path = dir.path().join("2025-04");
        let mut content = std::fs::read_to_string(&path)?;
        content.push_str("{\"date\":\"2025-04-0");
        std::fs::write(&path, content)?;

        assert!(storage.get_report_by_date(date(1)).await?.is_some());

        // The cut line is replaced by the next save.
        storage.save_report(&completed(2, 8)).await?;
        assert_eq!(lines_in(dir.path(), "2025-04"), 2);
        assert!(storage.get_report_by_date(date(2)).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_hide_later_reports() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;
        storage.save_report(&completed(1, 8)).await?;
        storage.save_report(&completed(2, 6)).await?;

        let path = dir.path().join("2025-04");
        let content = std::fs::read(&path)?;
        let second_line = content.iter().position(|b| *b == b'\n').unwrap() + 1;
        let mut broken = content[..second_line].to_vec();
        broken.extend_from_slice(b"{\"date\":\xff\xfe\x80}\n");
        broken.extend_from_slice(&content[second_line..]);
        std::fs::write(&path, broken)?;
        storage.save_report(&completed(3, 7)).await?;

        let reports = storage
            .get_reports_by_month(YearMonth::new(2025, 4).unwrap())
            .await?;
        assert_eq!(
            reports.iter().map(|r| r.date).collect::<Vec<_>>(),
            vec![date(1), date(2), date(3)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn invalid_utf8_last_line_is_replaced() -> Result<()> {
        let dir = tempdir()?;
        let storage = ReportStorageImpl::new(dir.path().to_owned())?;
        storage.save_report(&completed(1, 8)).await?;

        let path = dir.path().join("2025-04");
        let mut content = std::fs::read(&path)?;
        content.extend_from_slice(b"\xff\xfe");
        std::fs::write(&path, content)?;
        storage.save_report(&completed(2, 8)).await?;

        assert_eq!(lines_in(dir.path(), "2025-04"), 2);
        assert!(storage.get_report_by_date(date(2)).await?.is_some());
        Ok(())
    }
}
