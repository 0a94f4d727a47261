use crate::dashboard::{io_csv::read_vaccination_records, *};

/// The vaccination dataset published by Our World in Data.
pub const DEFAULT_VACCINATIONS_URL: &str = "https://raw.githubusercontent.com/owid/covid-19-data/refs/heads/master/public/data/vaccinations/vaccinations.csv";

/// Downloads the vaccination table. Any transport error or non-success
/// status fails the run; there is no retry.
pub fn fetch_vaccinations(url: &str) -> DashResult<Vec<VaccinationRecord>> {
    info!("Attempting to download vaccination file {:?}", url);
    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .context(FetchingSnafu { url })?;
    let body = response.bytes().context(FetchingSnafu { url })?;
    info!("Downloaded {} bytes from {:?}", body.len(), url);

    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(&body[..]);
    read_vaccination_records(rdr, url)
}
