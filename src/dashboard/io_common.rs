use chrono::{Duration, NaiveDate};
use std::path::Path;

use crate::dashboard::*;

// Accepted spellings of the key columns.
pub const MORTALITY_ENTITY_COLUMNS: &[&str] = &["Entity", "Country"];
pub const MORTALITY_DAY_COLUMNS: &[&str] = &["Day"];
pub const MORTALITY_SCORE_COLUMNS: &[&str] = &["p_proj_all_ages"];
pub const VACCINATION_LOCATION_COLUMNS: &[&str] = &["location"];
pub const VACCINATION_DATE_COLUMNS: &[&str] = &["date"];

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Parses `YYYY-MM-DD` or `YYYY/MM/DD`. A time part after the date is ignored.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day_part = s.get(0..10).unwrap_or(s);
    if s.len() > 10 && !matches!(s.as_bytes()[10], b'T' | b' ') {
        return None;
    }
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day_part, "%Y/%m/%d"))
        .ok()
}

// 9999-12-31, the last day Excel can represent.
const EXCEL_MAX_SERIAL: f64 = 2958465.0;

/// Excel stores dates as a number of days since 1899-12-30.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// An empty cell is a missing value. Anything else must be a finite number.
pub fn parse_optional_number(content: &str, origin: &str, lineno: u64) -> DashResult<Option<f64>> {
    let s = content.trim();
    if s.is_empty() {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(Some(x)),
        _ => ParsingNumberSnafu {
            content,
            origin,
            lineno,
        }
        .fail(),
    }
}

/// Finds the position of the first header matching one of the names.
pub fn find_column<S: AsRef<str>>(headers: &[S], names: &[&str], origin: &str) -> DashResult<usize> {
    for name in names.iter() {
        if let Some(idx) = headers.iter().position(|h| h.as_ref().trim() == *name) {
            return Ok(idx);
        }
    }
    MissingColumnSnafu {
        column: names.join("|"),
        origin,
    }
    .fail()
}

/// Column positions of the excess mortality table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MortalityColumns {
    pub entity: usize,
    pub day: usize,
    pub p_score: usize,
}

impl MortalityColumns {
    pub fn from_headers<S: AsRef<str>>(headers: &[S], origin: &str) -> DashResult<MortalityColumns> {
        Ok(MortalityColumns {
            entity: find_column(headers, MORTALITY_ENTITY_COLUMNS, origin)?,
            day: find_column(headers, MORTALITY_DAY_COLUMNS, origin)?,
            p_score: find_column(headers, MORTALITY_SCORE_COLUMNS, origin)?,
        })
    }
}

/// Column positions of the vaccination table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VaccinationColumns {
    pub location: usize,
    pub date: usize,
    pub people_vaccinated: usize,
    pub people_fully_vaccinated: usize,
}

impl VaccinationColumns {
    pub fn from_headers<S: AsRef<str>>(
        headers: &[S],
        origin: &str,
    ) -> DashResult<VaccinationColumns> {
        Ok(VaccinationColumns {
            location: find_column(headers, VACCINATION_LOCATION_COLUMNS, origin)?,
            date: find_column(headers, VACCINATION_DATE_COLUMNS, origin)?,
            people_vaccinated: find_column(
                headers,
                &[VaccinationMetric::PeopleVaccinated.column_name()],
                origin,
            )?,
            people_fully_vaccinated: find_column(
                headers,
                &[VaccinationMetric::PeopleFullyVaccinated.column_name()],
                origin,
            )?,
        })
    }
}
