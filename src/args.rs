use clap::Parser;

/// Compares the excess mortality before and after a cutoff date with the peak vaccination coverage.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the sources and the options of the run.
    /// For more information about the file format, read the manual of the excess_mortality crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, vaxmort will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The excess mortality file. Setting this option overrides the source that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub mortality: Option<String>,

    /// (default csv) The type of the excess mortality file: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first sheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) A local copy of the vaccination file. If neither this option nor --vaccinations-url
    /// is set, the vaccinations are downloaded from the default location.
    #[clap(long, value_parser)]
    pub vaccinations: Option<String>,

    /// (url) Where to download the vaccination file from.
    #[clap(long, value_parser)]
    pub vaccinations_url: Option<String>,

    /// (default 2021-09-30) The last day of the 'before' period, as YYYY-MM-DD.
    #[clap(long, value_parser)]
    pub cutoff: Option<String>,

    /// (default people_vaccinated_per_hundred) The coverage metric: people_vaccinated_per_hundred or
    /// people_fully_vaccinated_per_hundred.
    #[clap(long, value_parser)]
    pub metric: Option<String>,

    /// (optional) The entity to describe in detail.
    #[clap(short, long, value_parser)]
    pub entity: Option<String>,

    /// If passed as an argument, the full comparison table is included in the summary and logged as text.
    #[clap(long, takes_value = false)]
    pub raw: bool,

    /// If passed as an argument, a regression line of the 'after' average is fitted.
    #[clap(long, takes_value = false)]
    pub regression: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
