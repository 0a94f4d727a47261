// ********* Input data structures ***********

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// One day of excess mortality for one entity.
///
/// The p-score is the percentage deviation of the observed deaths from the
/// projected baseline. It is missing when the source cell was empty.
#[derive(PartialEq, Debug, Clone)]
pub struct MortalityRecord {
    pub entity: String,
    pub date: NaiveDate,
    pub p_score: Option<f64>,
}

/// Cumulative vaccination coverage for one location on one day.
#[derive(PartialEq, Debug, Clone)]
pub struct VaccinationRecord {
    pub location: String,
    pub date: NaiveDate,
    pub people_vaccinated_per_hundred: Option<f64>,
    pub people_fully_vaccinated_per_hundred: Option<f64>,
}

// ******** Output data structures *********

/// The highest coverage ever recorded for a location.
#[derive(PartialEq, Debug, Clone)]
pub struct PeakVaccination {
    pub location: String,
    pub max_vaccinated_per_hundred: Option<f64>,
    pub max_fully_vaccinated_per_hundred: Option<f64>,
}

impl PeakVaccination {
    pub fn value(&self, metric: VaccinationMetric) -> Option<f64> {
        match metric {
            VaccinationMetric::PeopleVaccinated => self.max_vaccinated_per_hundred,
            VaccinationMetric::PeopleFullyVaccinated => self.max_fully_vaccinated_per_hundred,
        }
    }
}

/// The mean p-score of an entity on each side of the cutoff.
/// A side without any observation has no average.
#[derive(PartialEq, Debug, Clone)]
pub struct EntityAverages {
    pub entity: String,
    pub avg_before: Option<f64>,
    pub avg_after: Option<f64>,
}

/// A fully populated row of the comparison table.
#[derive(PartialEq, Debug, Clone)]
pub struct ComparisonRow {
    pub entity: String,
    pub avg_before: f64,
    pub avg_after: f64,
    pub vaccination_metric_value: f64,
}

impl ComparisonRow {
    pub fn average(&self, period: Period) -> f64 {
        match period {
            Period::Before => self.avg_before,
            Period::After => self.avg_after,
        }
    }
}

/// The two sides of the cutoff date.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Period {
    /// All the days up to and including the cutoff.
    Before,
    /// All the days strictly after the cutoff.
    After,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::Before => "before",
            Period::After => "after",
        }
    }
}

// ********* Configuration **********

/// The coverage metric used for the join, the filtering and the ordering.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum VaccinationMetric {
    /// At least one dose.
    PeopleVaccinated,
    /// Complete initial protocol.
    PeopleFullyVaccinated,
}

impl VaccinationMetric {
    /// The name of the column carrying this metric in the vaccination source.
    pub fn column_name(&self) -> &'static str {
        match self {
            VaccinationMetric::PeopleVaccinated => "people_vaccinated_per_hundred",
            VaccinationMetric::PeopleFullyVaccinated => "people_fully_vaccinated_per_hundred",
        }
    }

    /// A human readable label, for axis titles.
    pub fn label(&self) -> &'static str {
        match self {
            VaccinationMetric::PeopleVaccinated => "People Vaccinated per Hundred",
            VaccinationMetric::PeopleFullyVaccinated => "People Fully Vaccinated per Hundred",
        }
    }
}

impl Default for VaccinationMetric {
    fn default() -> Self {
        VaccinationMetric::PeopleVaccinated
    }
}

impl Display for VaccinationMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnknownMetric(pub String);

impl Error for UnknownMetric {}

impl Display for UnknownMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown vaccination metric: {:?}", self.0)
    }
}

impl FromStr for VaccinationMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "people_vaccinated_per_hundred" | "vaccinated" | "partial" => {
                Ok(VaccinationMetric::PeopleVaccinated)
            }
            "people_fully_vaccinated_per_hundred" | "fully_vaccinated" | "full" => {
                Ok(VaccinationMetric::PeopleFullyVaccinated)
            }
            x => Err(UnknownMetric(x.to_string())),
        }
    }
}

/// The parameters of one comparison. They are also the key of the cache.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ComparisonParams {
    pub cutoff: NaiveDate,
    pub metric: VaccinationMetric,
}

impl ComparisonParams {
    /// The end of September 2021, when most of the rollouts had reached
    /// their plateau.
    pub fn default_cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 9, 30).unwrap_or(NaiveDate::MIN)
    }

    pub fn new(cutoff: NaiveDate, metric: VaccinationMetric) -> ComparisonParams {
        ComparisonParams { cutoff, metric }
    }
}

impl Default for ComparisonParams {
    fn default() -> Self {
        ComparisonParams {
            cutoff: ComparisonParams::default_cutoff(),
            metric: VaccinationMetric::default(),
        }
    }
}
