use crate::dashboard::*;

use serde_json::Value as JSValue;
use std::path::Path;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MortalitySource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VaccinationSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub url: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "mortalitySource")]
    pub mortality_source: Option<MortalitySource>,
    #[serde(rename = "vaccinationSource")]
    pub vaccination_source: Option<VaccinationSource>,
    #[serde(rename = "cutoffDate")]
    pub cutoff_date: Option<String>,
    #[serde(rename = "vaccinationMetric")]
    pub vaccination_metric: Option<String>,
    pub entity: Option<String>,
    #[serde(rename = "showRawData")]
    pub show_raw_data: Option<bool>,
    #[serde(rename = "addRegressionLine")]
    pub add_regression_line: Option<bool>,
}

impl DashboardConfig {
    /// Makes the relative paths of the configuration relative to `root`
    /// (the directory of the configuration file) instead of the current
    /// directory. `stdout` is left untouched.
    pub fn resolve_paths(self, root: &Path) -> DashboardConfig {
        let resolve = |p: String| -> String {
            if p == "stdout" || Path::new(&p).is_absolute() {
                p
            } else {
                root.join(p).display().to_string()
            }
        };
        DashboardConfig {
            output_settings: self.output_settings.map(|os| OutputSettings {
                title: os.title,
                output_path: os.output_path.map(resolve),
            }),
            mortality_source: self.mortality_source.map(|ms| MortalitySource {
                file_path: resolve(ms.file_path),
                ..ms
            }),
            vaccination_source: self.vaccination_source.map(|vs| VaccinationSource {
                file_path: vs.file_path.map(resolve),
                ..vs
            }),
            ..self
        }
    }
}

pub fn read_summary(path: String) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}
