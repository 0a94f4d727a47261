use log::{debug, info, warn};

use excess_mortality::cache::{ComparisonCache, Sources};
use excess_mortality::regression::{regress, Regression, RegressionError};
use excess_mortality::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use text_diff::print_diff;

use crate::dashboard::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_remote;
mod render;

pub use io_remote::DEFAULT_VACCINATIONS_URL;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook has no worksheet"))]
    EmptyExcel {},
    #[snafu(display("Worksheet {name:?} not found"))]
    MissingWorksheet { name: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {origin}"))]
    CsvLineParse {
        source: csv::Error,
        origin: String,
        lineno: u64,
    },
    #[snafu(display("Line {lineno} of {origin} is too short"))]
    LineTooShort { origin: String, lineno: u64 },
    #[snafu(display("Column {column:?} not found in {origin}"))]
    MissingColumn { column: String, origin: String },
    #[snafu(display("Could not understand the date {content:?} (line {lineno} of {origin})"))]
    ParsingDate {
        content: String,
        origin: String,
        lineno: u64,
    },
    #[snafu(display("Could not understand the number {content:?} (line {lineno} of {origin})"))]
    ParsingNumber {
        content: String,
        origin: String,
        lineno: u64,
    },
    #[snafu(display("Error downloading {url}"))]
    Fetching { source: reqwest::Error, url: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown provider {provider:?} for the {what} source"))]
    UnknownProvider { provider: String, what: String },
    #[snafu(display("No {what} source specified"))]
    MissingSource { what: String },
    #[snafu(display("Invalid vaccination metric"))]
    ParsingMetric { source: UnknownMetric },
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashboardError>;

/// Where the excess mortality comes from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MortalityInput {
    Csv(String),
    Xlsx {
        path: String,
        worksheet: Option<String>,
    },
}

/// Where the vaccinations come from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VaccinationInput {
    Csv(String),
    Url(String),
}

/// A validated description of a run.
#[derive(PartialEq, Debug, Clone)]
pub struct DashboardPlan {
    pub title: String,
    pub mortality: MortalityInput,
    pub vaccination: VaccinationInput,
    pub params: ComparisonParams,
    pub entity: Option<String>,
    pub show_raw_data: bool,
    pub add_regression_line: bool,
    pub output_path: Option<String>,
}

/// The serialized form of a comparison row, as shown in the raw table.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "avgAfter")]
    pub avg_after: f64,
    #[serde(rename = "avgBefore")]
    pub avg_before: f64,
    pub entity: String,
    #[serde(rename = "vaccinationMetricValue")]
    pub vaccination_metric_value: f64,
}

impl From<&ComparisonRow> for RawRow {
    fn from(r: &ComparisonRow) -> Self {
        RawRow {
            avg_after: r.avg_after,
            avg_before: r.avg_before,
            entity: r.entity.clone(),
            vaccination_metric_value: r.vaccination_metric_value,
        }
    }
}

/// The state kept by the presentation layer between two interactions:
/// the loaded sources and the comparisons already computed from them.
pub struct Dashboard {
    sources: Sources,
    cache: ComparisonCache,
}

impl Dashboard {
    pub fn new(sources: Sources) -> Dashboard {
        Dashboard {
            sources,
            cache: ComparisonCache::new(),
        }
    }

    pub fn load(plan: &DashboardPlan) -> DashResult<Dashboard> {
        let mortality = load_mortality(&plan.mortality)?;
        let vaccination = load_vaccination(&plan.vaccination)?;
        Ok(Dashboard::new(Sources::new(mortality, vaccination)))
    }

    /// The comparison table for the given parameters.
    pub fn view(&mut self, params: &ComparisonParams) -> &[ComparisonRow] {
        self.cache.get_or_compute(&self.sources, params)
    }

    /// Replaces the vaccination source, for example after downloading a
    /// newer version. The cached comparisons are dropped.
    pub fn reload_vaccination(&mut self, input: &VaccinationInput) -> DashResult<()> {
        let records = load_vaccination(input)?;
        self.sources.replace_vaccination(records);
        Ok(())
    }

    pub fn cache(&self) -> &ComparisonCache {
        &self.cache
    }
}

fn load_mortality(input: &MortalityInput) -> DashResult<Vec<MortalityRecord>> {
    let records = match input {
        MortalityInput::Csv(path) => {
            info!("Attempting to read mortality file {:?}", path);
            io_csv::read_mortality_csv(path)
        }
        MortalityInput::Xlsx { path, worksheet } => {
            info!("Attempting to read mortality workbook {:?}", path);
            io_excel::read_mortality_excel(path, worksheet.as_deref())
        }
    }?;
    info!("Read {} mortality records", records.len());
    Ok(records)
}

fn load_vaccination(input: &VaccinationInput) -> DashResult<Vec<VaccinationRecord>> {
    let records = match input {
        VaccinationInput::Csv(path) => {
            info!("Attempting to read vaccination file {:?}", path);
            io_csv::read_vaccination_csv(path)
        }
        VaccinationInput::Url(url) => io_remote::fetch_vaccinations(url),
    }?;
    info!("Read {} vaccination records", records.len());
    Ok(records)
}

/// Checks the configuration and turns it into a plan.
pub fn validate_config(config: &DashboardConfig) -> DashResult<DashboardPlan> {
    let ms = config
        .mortality_source
        .as_ref()
        .context(MissingSourceSnafu { what: "mortality" })?;
    let mortality = match ms.provider.as_deref() {
        None | Some("csv") => MortalityInput::Csv(ms.file_path.clone()),
        Some("xlsx") | Some("excel") => MortalityInput::Xlsx {
            path: ms.file_path.clone(),
            worksheet: ms.worksheet_name.clone(),
        },
        Some(x) => {
            return UnknownProviderSnafu {
                provider: x,
                what: "mortality",
            }
            .fail();
        }
    };

    let vaccination = match &config.vaccination_source {
        None => VaccinationInput::Url(DEFAULT_VACCINATIONS_URL.to_string()),
        Some(vs) => match (vs.provider.as_deref(), &vs.file_path, &vs.url) {
            (Some("csv") | None, Some(p), _) => VaccinationInput::Csv(p.clone()),
            (Some("csv"), None, _) => {
                whatever!("The vaccination source uses the csv provider but has no filePath")
            }
            (Some("url") | None, _, Some(u)) => VaccinationInput::Url(u.clone()),
            (Some("url") | None, _, None) => {
                VaccinationInput::Url(DEFAULT_VACCINATIONS_URL.to_string())
            }
            (Some(x), _, _) => {
                return UnknownProviderSnafu {
                    provider: x,
                    what: "vaccination",
                }
                .fail();
            }
        },
    };

    let cutoff = match &config.cutoff_date {
        Some(s) => io_common::parse_day(s).context(ParsingDateSnafu {
            content: s,
            origin: "the configuration",
            lineno: 0u64,
        })?,
        None => ComparisonParams::default_cutoff(),
    };
    let metric = match &config.vaccination_metric {
        Some(s) => s.parse::<VaccinationMetric>().context(ParsingMetricSnafu {})?,
        None => VaccinationMetric::default(),
    };

    let os = config.output_settings.clone().unwrap_or_default();
    Ok(DashboardPlan {
        title: os
            .title
            .unwrap_or_else(|| "Excess mortality and vaccination".to_string()),
        mortality,
        vaccination,
        params: ComparisonParams::new(cutoff, metric),
        entity: config.entity.clone().filter(|e| !e.is_empty()),
        show_raw_data: config.show_raw_data.unwrap_or(false),
        add_regression_line: config.add_regression_line.unwrap_or(false),
        output_path: os.output_path.filter(|p| !p.is_empty()),
    })
}

/// Logs the detail panel of the selected entity.
fn describe_entity(rows: &[ComparisonRow], entity: &str, metric: VaccinationMetric) {
    match rows.iter().find(|r| r.entity == entity) {
        Some(r) => {
            info!("Selected Entity: {}", r.entity);
            info!("Average Before: {:.2}", r.avg_before);
            info!("Average After: {:.2}", r.avg_after);
            info!("{}: {:.2}", metric.label(), r.vaccination_metric_value);
        }
        None => {
            warn!(
                "Entity {:?} is not part of the comparison (missing from a source or incomplete)",
                entity
            );
        }
    }
}

fn write_output(path: &str, contents: &str) -> DashResult<()> {
    if path == "stdout" {
        println!("{}", contents);
    } else {
        info!("Writing summary to {:?}", path);
        fs::write(path, contents).context(WritingOutputSnafu { path })?;
    }
    Ok(())
}

/// Loads the sources and computes the pretty-printed JSON summary of the run.
/// The raw table, when requested, goes to the log only.
pub fn compute_summary(plan: &DashboardPlan) -> DashResult<String> {
    info!("plan: {:?}", plan);
    let mut dashboard = Dashboard::load(plan)?;
    let rows: Vec<ComparisonRow> = dashboard.view(&plan.params).to_vec();
    if rows.is_empty() {
        warn!("No entity has complete data for {:?}", plan.params);
    }

    if let Some(entity) = &plan.entity {
        describe_entity(&rows, entity, plan.params.metric);
    }

    let regression: Option<Result<Regression, RegressionError>> = if plan.add_regression_line {
        let r = regress(&rows, Period::After);
        match &r {
            Ok(reg) => info!(
                "Regression: slope: {:.4} intercept: {:.4} R2: {:.4} p-value: {:?}",
                reg.slope, reg.intercept, reg.r_squared, reg.p_value
            ),
            Err(e) => warn!("No regression line: {}", e),
        }
        Some(r)
    } else {
        None
    };

    if plan.show_raw_data {
        info!(
            "Comparison table:\n{}",
            render::format_raw_table(&rows, plan.params.metric)
        );
    }

    // Assemble the final json
    let result_js = render::build_summary_js(plan, &rows, regression.as_ref());
    serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})
}

pub fn run_dashboard(plan: &DashboardPlan, check_summary_path: Option<String>) -> DashResult<()> {
    let pretty_js_stats = compute_summary(plan)?;
    debug!("summary: {}", pretty_js_stats);

    // Only the summary goes to stdout, so that it stays valid JSON.
    match &plan.output_path {
        Some(p) => write_output(p, &pretty_js_stats)?,
        None => write_output("stdout", &pretty_js_stats)?,
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

/// Reads a configuration file and resolves the paths it contains.
pub fn read_config_file(config_path: &str) -> DashResult<DashboardConfig> {
    let config_p = Path::new(config_path);
    let config_str =
        fs::read_to_string(config_path).context(OpeningJsonSnafu { path: config_path })?;
    let config: DashboardConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    let root_p = config_p
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;
    Ok(config.resolve_paths(root_p))
}

pub fn print_error(e: &DashboardError) {
    eprintln!("An error occured {}", e);
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        eprintln!("  caused by: {}", s);
        source = std::error::Error::source(s);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}
