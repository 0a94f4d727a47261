use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::NaiveDate;

use crate::dashboard::{
    io_common::{excel_serial_to_date, parse_day, parse_optional_number, simplify_file_name, MortalityColumns},
    *,
};

pub fn read_mortality_excel(path: &str, worksheet: Option<&str>) -> DashResult<Vec<MortalityRecord>> {
    let wrange = get_range(path, worksheet)?;
    mortality_from_range(&wrange, &simplify_file_name(path))
}

fn get_range(path: &str, worksheet: Option<&str>) -> DashResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn cell_content(cell: &DataType) -> String {
    format!("{:?}", cell)
}

fn read_text(cell: &DataType, lineno: u64) -> DashResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: cell_content(cell),
        }
        .fail(),
    }
}

fn read_date(cell: &DataType, origin: &str, lineno: u64) -> DashResult<NaiveDate> {
    let date = match cell {
        DataType::String(s) => parse_day(s),
        DataType::DateTime(f) | DataType::Float(f) => excel_serial_to_date(*f),
        DataType::Int(i) => excel_serial_to_date(*i as f64),
        _ => None,
    };
    date.context(ParsingDateSnafu {
        content: cell_content(cell),
        origin,
        lineno,
    })
}

fn read_number(cell: &DataType, origin: &str, lineno: u64) -> DashResult<Option<f64>> {
    match cell {
        DataType::Empty => Ok(None),
        DataType::Float(f) if f.is_finite() => Ok(Some(*f)),
        DataType::Int(i) => Ok(Some(*i as f64)),
        DataType::String(s) => parse_optional_number(s, origin, lineno),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: cell_content(cell),
        }
        .fail(),
    }
}

/// Reads the excess mortality table from a worksheet whose first row is the header.
pub fn mortality_from_range(wrange: &Range<DataType>, origin: &str) -> DashResult<Vec<MortalityRecord>> {
    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu {})?;
    debug!("mortality_from_range: header: {:?}", header);
    let headers: Vec<String> = header
        .iter()
        .map(|c| match c {
            DataType::String(s) => s.clone(),
            _ => String::new(),
        })
        .collect();
    let cols = MortalityColumns::from_headers(&headers, origin)?;

    let mut res: Vec<MortalityRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = (idx + 2) as u64;
        let cell = move |i: usize| row.get(i).context(LineTooShortSnafu { origin, lineno });
        let entity_cell = cell(cols.entity)?;
        // Trailing blank rows are common at the end of a sheet.
        if *entity_cell == DataType::Empty {
            debug!("mortality_from_range: skipping empty row {}", lineno);
            continue;
        }
        res.push(MortalityRecord {
            entity: read_text(entity_cell, lineno)?,
            date: read_date(cell(cols.day)?, origin, lineno)?,
            p_score: read_number(cell(cols.p_score)?, origin, lineno)?,
        });
    }
    Ok(res)
}
