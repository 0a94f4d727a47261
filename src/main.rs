mod args;
mod dashboard;

use clap::Parser;
use log::{debug, LevelFilter};

use crate::args::Args;
use crate::dashboard::config_reader::*;
use crate::dashboard::*;

/// Builds the configuration of the run: the configuration file if any, then
/// the command line flags on top of it.
fn config_from_args(args: &Args) -> DashResult<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => DashboardConfig::default(),
    };

    if let Some(path) = &args.mortality {
        let previous = config.mortality_source.take();
        config.mortality_source = Some(MortalitySource {
            provider: args
                .input_type
                .clone()
                .or_else(|| previous.as_ref().and_then(|ms| ms.provider.clone())),
            file_path: path.clone(),
            worksheet_name: args
                .excel_worksheet_name
                .clone()
                .or_else(|| previous.and_then(|ms| ms.worksheet_name)),
        });
    } else if let Some(ms) = config.mortality_source.as_mut() {
        if args.input_type.is_some() {
            ms.provider = args.input_type.clone();
        }
        if args.excel_worksheet_name.is_some() {
            ms.worksheet_name = args.excel_worksheet_name.clone();
        }
    }

    if let Some(path) = &args.vaccinations {
        config.vaccination_source = Some(VaccinationSource {
            provider: Some("csv".to_string()),
            file_path: Some(path.clone()),
            url: None,
        });
    } else if let Some(url) = &args.vaccinations_url {
        config.vaccination_source = Some(VaccinationSource {
            provider: Some("url".to_string()),
            file_path: None,
            url: Some(url.clone()),
        });
    }

    if args.cutoff.is_some() {
        config.cutoff_date = args.cutoff.clone();
    }
    if args.metric.is_some() {
        config.vaccination_metric = args.metric.clone();
    }
    if args.entity.is_some() {
        config.entity = args.entity.clone();
    }
    if args.raw {
        config.show_raw_data = Some(true);
    }
    if args.regression {
        config.add_regression_line = Some(true);
    }
    if args.out.is_some() {
        let mut os = config.output_settings.take().unwrap_or_default();
        os.output_path = args.out.clone();
        config.output_settings = Some(os);
    }
    Ok(config)
}

fn run(args: &Args) -> DashResult<()> {
    let config = config_from_args(args)?;
    debug!("config: {:?}", config);
    let plan = validate_config(&config)?;
    run_dashboard(&plan, args.reference.clone())
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        print_error(&e);
        std::process::exit(1);
    }
}
