pub use crate::cache::Sources;
pub use crate::config::*;

use chrono::NaiveDate;

/// A builder for assembling the sources one observation at a time.
///
/// ```
/// use chrono::NaiveDate;
/// pub use excess_mortality::builder::Builder;
/// pub use excess_mortality::ComparisonParams;
///
/// let day = |m, d| NaiveDate::from_ymd_opt(2021, m, d).unwrap();
/// let mut builder = Builder::new();
/// builder.add_mortality("Testland", day(1, 3), Some(10.0));
/// builder.add_mortality("Testland", day(5, 3), Some(20.0));
/// builder.add_mortality("Testland", day(12, 3), Some(30.0));
/// builder.add_vaccination("Testland", day(12, 1), Some(70.0), None);
///
/// let rows = builder.compare(&ComparisonParams::default());
/// assert_eq!(rows[0].avg_before, 15.0);
/// assert_eq!(rows[0].avg_after, 30.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _sources: Sources,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Starts from existing sources.
    pub fn sources(self, sources: Sources) -> Builder {
        Builder { _sources: sources }
    }

    /// Adds one day of excess mortality.
    ///
    /// p_score: the excess mortality in percent of the baseline, or `None`
    /// if it was not reported for this day.
    pub fn add_mortality(&mut self, entity: &str, date: NaiveDate, p_score: Option<f64>) {
        self.add_mortality_2(MortalityRecord {
            entity: entity.to_string(),
            date,
            p_score,
        })
    }

    pub fn add_mortality_2(&mut self, record: MortalityRecord) {
        self._sources.push_mortality(record);
    }

    /// Adds one day of cumulative vaccination coverage.
    pub fn add_vaccination(
        &mut self,
        location: &str,
        date: NaiveDate,
        people_vaccinated_per_hundred: Option<f64>,
        people_fully_vaccinated_per_hundred: Option<f64>,
    ) {
        self.add_vaccination_2(VaccinationRecord {
            location: location.to_string(),
            date,
            people_vaccinated_per_hundred,
            people_fully_vaccinated_per_hundred,
        })
    }

    pub fn add_vaccination_2(&mut self, record: VaccinationRecord) {
        self._sources.push_vaccination(record);
    }

    /// Computes the comparison without caching.
    pub fn compare(&self, params: &ComparisonParams) -> Vec<ComparisonRow> {
        crate::compare(
            self._sources.mortality(),
            self._sources.vaccination(),
            params,
        )
    }

    pub fn build(self) -> Sources {
        self._sources
    }
}
