use std::collections::BTreeMap;
use std::path::Path;

use time::{Date, Month, Time};

use super::calendar::{parse_timestamp_label, timestamp_label, utc};
use super::error::{CalendarError, MonthTableError};
use super::month::{DataMonth, MonthSet};

/// Month start times of the archived 2012 run, `YYYY-MM-01-000000` -> epoch seconds
const DEFAULT_MONTH_STARTS: [(&str, i64); 15] = [
    ("2012-01-01-000000", 1325376000),
    ("2012-02-01-000000", 1328054400),
    ("2012-03-01-000000", 1330560000),
    ("2012-04-01-000000", 1333238400),
    ("2012-05-01-000000", 1335830400),
    ("2012-06-01-000000", 1338508800),
    ("2012-07-01-000000", 1341100800),
    ("2012-08-01-000000", 1343779200),
    ("2012-09-01-000000", 1346457600),
    ("2012-10-01-000000", 1349049600),
    ("2012-11-01-000000", 1351728000),
    ("2012-12-01-000000", 1354320000),
    ("2013-01-01-000000", 1356998400),
    ("2013-02-01-000000", 1359676800),
    ("2013-03-01-000000", 1362096000),
];

/// MonthBoundaryTable holds the start time of each month of a run.
///
/// The table is loaded once at the start of a run and handed to whatever
/// needs month spans; each month ends one second before the next boundary,
/// so the final boundary only closes the month before it. The YAML form is
/// a plain mapping:
///
/// ```yml
/// 2012-01-01-000000: 1325376000
/// 2012-02-01-000000: 1328054400
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBoundaryTable {
    boundaries: BTreeMap<String, i64>,
}

impl Default for MonthBoundaryTable {
    /// The table bundled with the profiler
    fn default() -> Self {
        Self {
            boundaries: DEFAULT_MONTH_STARTS
                .iter()
                .map(|(label, start)| (label.to_string(), *start))
                .collect(),
        }
    }
}

impl MonthBoundaryTable {
    /// Create a validated table from label -> start time pairs
    pub fn new(boundaries: BTreeMap<String, i64>) -> Result<Self, MonthTableError> {
        let table = Self { boundaries };
        table.validate()?;
        Ok(table)
    }

    /// Read a table from a YAML file
    pub fn read_table_file(path: &Path) -> Result<Self, MonthTableError> {
        if !path.exists() {
            return Err(MonthTableError::BadFilePath(path.to_path_buf()));
        }
        let yaml_str = std::fs::read_to_string(path)?;
        Self::new(serde_yaml::from_str::<BTreeMap<String, i64>>(&yaml_str)?)
    }

    /// Load the table at `path`, or the bundled table if there is none
    pub fn load(path: Option<&Path>) -> Result<Self, MonthTableError> {
        match path {
            Some(p) => Self::read_table_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Compute the boundaries from `first` through `last` (inclusive) with
    /// the usual Gregorian calendar rules, in UTC.
    pub fn from_calendar(first: (i32, Month), last: (i32, Month)) -> Result<Self, MonthTableError> {
        let mut boundaries = BTreeMap::new();
        let mut date = Date::from_calendar_date(first.0, first.1, 1).map_err(CalendarError::from)?;
        let last = Date::from_calendar_date(last.0, last.1, 1).map_err(CalendarError::from)?;
        while date <= last {
            let start = date.midnight().assume_utc().unix_timestamp();
            boundaries.insert(timestamp_label(start)?, start);
            date = next_month_start(date)?;
        }
        Self::new(boundaries)
    }

    /// Check there are at least two boundaries, that every label names the
    /// same UTC instant as its value, and that each boundary is the midnight
    /// starting the calendar month after the previous boundary.
    pub fn validate(&self) -> Result<(), MonthTableError> {
        if self.boundaries.len() < 2 {
            return Err(MonthTableError::TooFewBoundaries(self.boundaries.len()));
        }
        let mut previous: Option<(&String, i64)> = None;
        for (label, start) in self.boundaries.iter() {
            let labelled = parse_timestamp_label(label)?;
            if labelled != *start {
                return Err(MonthTableError::LabelMismatch(
                    label.clone(),
                    labelled,
                    *start,
                ));
            }
            let moment = utc(*start)?;
            if moment.day() != 1 || moment.time() != Time::MIDNIGHT {
                return Err(MonthTableError::NotMonthStart(label.clone()));
            }
            if let Some((previous_label, previous_start)) = previous {
                if *start <= previous_start {
                    return Err(MonthTableError::NotChronological(label.clone()));
                }
                let expected = next_month_start(utc(previous_start)?.date())?;
                if moment.date() != expected {
                    return Err(MonthTableError::MonthGap(
                        previous_label.clone(),
                        label.clone(),
                    ));
                }
            }
            previous = Some((label, *start));
        }
        Ok(())
    }

    pub fn boundaries(&self) -> &BTreeMap<String, i64> {
        &self.boundaries
    }

    /// Build a DataMonth for each consecutive pair of boundaries
    pub fn months(&self) -> Result<Vec<DataMonth>, MonthTableError> {
        let starts: Vec<i64> = self.boundaries.values().copied().collect();
        let mut months = Vec::with_capacity(starts.len().saturating_sub(1));
        for pair in starts.windows(2) {
            months.push(DataMonth::new(pair[0], pair[1] - 1)?);
        }
        Ok(months)
    }

    pub fn month_set(&self) -> Result<MonthSet, MonthTableError> {
        Ok(MonthSet::new(self.months()?))
    }
}

/// First day of the month after `date`
fn next_month_start(date: Date) -> Result<Date, CalendarError> {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };
    Ok(Date::from_calendar_date(year, month, 1)?)
}
