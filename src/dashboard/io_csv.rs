// Primitives for reading CSV files.

use std::io::Read;

use chrono::NaiveDate;
use csv::{Reader, StringRecord};

use crate::dashboard::{
    io_common::{
        parse_day, parse_optional_number, simplify_file_name, MortalityColumns,
        VaccinationColumns,
    },
    *,
};

pub fn read_mortality_csv(path: &str) -> DashResult<Vec<MortalityRecord>> {
    let rdr = open(path)?;
    read_mortality_records(rdr, &simplify_file_name(path))
}

pub fn read_vaccination_csv(path: &str) -> DashResult<Vec<VaccinationRecord>> {
    let rdr = open(path)?;
    read_vaccination_records(rdr, &simplify_file_name(path))
}

fn open(path: &str) -> DashResult<Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })
}

fn get_headers<R: Read>(rdr: &mut Reader<R>, origin: &str) -> DashResult<Vec<String>> {
    let headers = rdr
        .headers()
        .context(CsvLineParseSnafu { origin, lineno: 1u64 })?;
    debug!("get_headers: {}: {:?}", origin, headers);
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

fn get_field<'a>(line: &'a StringRecord, idx: usize, origin: &str, lineno: u64) -> DashResult<&'a str> {
    line.get(idx)
        .context(LineTooShortSnafu { origin, lineno })
}

fn get_date(line: &StringRecord, idx: usize, origin: &str, lineno: u64) -> DashResult<NaiveDate> {
    let s = get_field(line, idx, origin, lineno)?;
    parse_day(s).context(ParsingDateSnafu {
        content: s,
        origin,
        lineno,
    })
}

/// Reads the excess mortality table. The first line is the header.
pub fn read_mortality_records<R: Read>(
    mut rdr: Reader<R>,
    origin: &str,
) -> DashResult<Vec<MortalityRecord>> {
    let headers = get_headers(&mut rdr, origin)?;
    let cols = MortalityColumns::from_headers(&headers, origin)?;

    let mut res: Vec<MortalityRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = (idx + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { origin, lineno })?;
        let entity = get_field(&line, cols.entity, origin, lineno)?.to_string();
        let date = get_date(&line, cols.day, origin, lineno)?;
        let p_score =
            parse_optional_number(get_field(&line, cols.p_score, origin, lineno)?, origin, lineno)?;
        res.push(MortalityRecord {
            entity,
            date,
            p_score,
        });
    }
    debug!("read_mortality_records: {}: {} records", origin, res.len());
    Ok(res)
}

/// Reads the vaccination table. The first line is the header.
pub fn read_vaccination_records<R: Read>(
    mut rdr: Reader<R>,
    origin: &str,
) -> DashResult<Vec<VaccinationRecord>> {
    let headers = get_headers(&mut rdr, origin)?;
    let cols = VaccinationColumns::from_headers(&headers, origin)?;

    let mut res: Vec<VaccinationRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = (idx + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { origin, lineno })?;
        let location = get_field(&line, cols.location, origin, lineno)?.to_string();
        let date = get_date(&line, cols.date, origin, lineno)?;
        let people_vaccinated_per_hundred = parse_optional_number(
            get_field(&line, cols.people_vaccinated, origin, lineno)?,
            origin,
            lineno,
        )?;
        let people_fully_vaccinated_per_hundred = parse_optional_number(
            get_field(&line, cols.people_fully_vaccinated, origin, lineno)?,
            origin,
            lineno,
        )?;
        res.push(VaccinationRecord {
            location,
            date,
            people_vaccinated_per_hundred,
            people_fully_vaccinated_per_hundred,
        });
    }
    debug!("read_vaccination_records: {}: {} records", origin, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(s: &str) -> Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(s.as_bytes())
    }

    #[test]
    fn mortality_rows() {
        let data = "Entity,Code,Day,p_proj_all_ages,p_proj_0_14\n\
                    Testland,TST,2021-09-30,12.5,1\n\
                    Testland,TST,2021-10-01,,\n";
        let records = read_mortality_records(reader(data), "test").unwrap();
        assert_eq!(
            records,
            vec![
                MortalityRecord {
                    entity: "Testland".to_string(),
                    date: NaiveDate::from_ymd_opt(2021, 9, 30).unwrap(),
                    p_score: Some(12.5),
                },
                MortalityRecord {
                    entity: "Testland".to_string(),
                    date: NaiveDate::from_ymd_opt(2021, 10, 1).unwrap(),
                    p_score: None,
                },
            ]
        );
    }

    #[test]
    fn mortality_country_header() {
        let data = "Country,Day,p_proj_all_ages\nChile,2021-01-01,3\n";
        let records = read_mortality_records(reader(data), "test").unwrap();
        assert_eq!(records[0].entity, "Chile");
    }

    #[test]
    fn mortality_errors() {
        let missing = "Entity,Day,p_scores\nA,2021-01-01,3\n";
        assert!(matches!(
            read_mortality_records(reader(missing), "test"),
            Err(DashboardError::MissingColumn { .. })
        ));
        let bad_date = "Entity,Day,p_proj_all_ages\nA,2021-01-01,3\nA,yesterday,3\n";
        assert!(matches!(
            read_mortality_records(reader(bad_date), "test"),
            Err(DashboardError::ParsingDate { lineno: 3, .. })
        ));
        let bad_number = "Entity,Day,p_proj_all_ages\nA,2021-01-01,three\n";
        assert!(matches!(
            read_mortality_records(reader(bad_number), "test"),
            Err(DashboardError::ParsingNumber { lineno: 2, .. })
        ));
        let ragged = "Entity,Day,p_proj_all_ages\nA,2021-01-01\n";
        assert!(matches!(
            read_mortality_records(reader(ragged), "test"),
            Err(DashboardError::CsvLineParse { lineno: 2, .. })
        ));
    }

    #[test]
    fn vaccination_rows() {
        let data = "location,iso_code,date,people_vaccinated_per_hundred,people_fully_vaccinated_per_hundred\n\
                    Testland,TST,2021-03-01,8.5,\n\
                    Testland,TST,2021-12-01,70,60\n";
        let records = read_vaccination_records(reader(data), "test").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location, "Testland");
        assert_eq!(records[0].people_vaccinated_per_hundred, Some(8.5));
        assert_eq!(records[0].people_fully_vaccinated_per_hundred, None);
        assert_eq!(records[1].people_fully_vaccinated_per_hundred, Some(60.0));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            read_mortality_csv("/nonexistent/mortality.csv"),
            Err(DashboardError::CsvOpen { .. })
        ));
    }
}
