use std::collections::BTreeMap;

use serde::Serialize;

use super::day::DataDay;
use super::hour::DataHour;
use super::month::{DataMonth, MonthSet};

/// Flattened view of a DataMonth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthReport {
    pub name: String,
    pub start_time_s: i64,
    pub end_time_s: i64,
    pub n_days: u32,
    pub n_frames: u64,
    pub frames_per_day: BTreeMap<u32, u64>,
}

impl From<&DataMonth> for MonthReport {
    fn from(month: &DataMonth) -> Self {
        Self {
            name: month.name().to_string(),
            start_time_s: month.start_time_s(),
            end_time_s: month.span().end_time_s(),
            n_days: month.n_days(),
            n_frames: month.n_frames(),
            frames_per_day: month.frames_per_day().counts().clone(),
        }
    }
}

/// Flattened view of a DataDay, without its hours
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub name: String,
    pub start_time_s: i64,
    pub end_time_s: i64,
    pub n_hours: u32,
    pub n_frames: u64,
    pub frames_per_hour: BTreeMap<u32, u64>,
}

impl From<&DataDay> for DayReport {
    fn from(day: &DataDay) -> Self {
        Self {
            name: day.name().to_string(),
            start_time_s: day.start_time_s(),
            end_time_s: day.span().end_time_s(),
            n_hours: day.n_hours(),
            n_frames: day.n_frames(),
            frames_per_hour: day.frames_per_hour().counts().clone(),
        }
    }
}

/// Flattened view of a DataHour, including the per-frame series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourReport {
    pub name: String,
    pub start_time_s: i64,
    pub n_minutes: u32,
    pub n_frames: u64,
    pub frames_per_minute: BTreeMap<u32, u64>,
    pub start_times: Vec<u32>,
    pub acq_times: Vec<f64>,
    pub n_pixels: Vec<u16>,
}

impl From<&DataHour> for HourReport {
    fn from(hour: &DataHour) -> Self {
        Self {
            name: hour.name().to_string(),
            start_time_s: hour.start_time_s(),
            n_minutes: hour.n_minutes(),
            n_frames: hour.n_frames(),
            frames_per_minute: hour.frames_per_minute().counts().clone(),
            start_times: hour.start_times().to_vec(),
            acq_times: hour.acq_times().to_vec(),
            n_pixels: hour.n_pixels().to_vec(),
        }
    }
}

/// Reports for every month of the set, keyed `YYYY-MM`
pub fn month_reports(months: &MonthSet) -> BTreeMap<String, MonthReport> {
    months
        .months()
        .map(|month| (month.name().to_string(), MonthReport::from(month)))
        .collect()
}

pub fn day_report(day: &DataDay) -> DayReport {
    DayReport::from(day)
}

/// Reports for every hour of the day, keyed `YYYY-MM-DD-HHMMSS`
pub fn hour_reports(day: &DataDay) -> BTreeMap<String, HourReport> {
    day.hours()
        .iter()
        .map(|hour| (hour.name().to_string(), HourReport::from(hour)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_record::FrameRecord;
    use crate::month_table::MonthBoundaryTable;
    use crate::time_series::FrameSink;

    const DAY_START: i64 = 1325376000;

    fn frame(t: i64, pixels: u32) -> FrameRecord {
        FrameRecord::condense(t as f64, 0.05, pixels).unwrap()
    }

    #[test]
    fn test_month_reports() {
        let mut months = MonthBoundaryTable::default().month_set().unwrap();
        months.accept(&frame(DAY_START + 5, 10)).unwrap();
        months.accept(&frame(DAY_START + 86400 * 3, 10)).unwrap();
        months.seal();

        let reports = month_reports(&months);
        assert_eq!(reports.len(), 14);
        let january = &reports["2012-01"];
        assert_eq!(january.n_days, 31);
        assert_eq!(january.n_frames, 2);
        assert_eq!(january.frames_per_day[&1], 1);
        assert_eq!(january.frames_per_day[&4], 1);
        assert_eq!(reports["2012-02"].n_frames, 0);
        assert_eq!(months.n_frames(), 2);
    }

    #[test]
    fn test_day_and_hour_reports() {
        let mut day = DataDay::new(DAY_START, DAY_START + 86399).unwrap();
        day.add_frame(&frame(DAY_START + 3661, 42)).unwrap();
        day.add_frame(&frame(DAY_START + 3600, 7)).unwrap();

        let report = day_report(&day);
        assert_eq!(report.name, "2012-01-01");
        assert_eq!(report.frames_per_hour[&1], 2);
        assert_eq!(report.frames_per_hour.values().sum::<u64>(), report.n_frames);

        let hours = hour_reports(&day);
        assert_eq!(hours.len(), 24);
        let hour = &hours["2012-01-01-010000"];
        assert_eq!(hour.n_pixels, vec![42, 7]);
        assert_eq!(hour.frames_per_minute[&1], 1);
        assert_eq!(hour.frames_per_minute[&0], 1);

        // The buckets are only borrowed
        assert_eq!(day.n_frames(), 2);
    }

    #[test]
    fn test_report_json_keys() {
        let day = DataDay::new(DAY_START, DAY_START + 86399).unwrap();
        let json = serde_json::to_value(day_report(&day)).unwrap();
        assert_eq!(json["name"], "2012-01-01");
        assert_eq!(json["frames_per_hour"]["23"], 0);
    }
}
