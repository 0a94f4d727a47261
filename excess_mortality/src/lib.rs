mod config;
use chrono::NaiveDate;
use log::{debug, info};

use std::collections::HashMap;

pub use crate::config::*;

pub mod builder;
pub mod cache;
pub mod manual;
pub mod regression;

// **** Private structures ****

// Running sum for one side of the cutoff.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
struct PartitionSum {
    total: f64,
    count: u64,
}

impl PartitionSum {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    // An empty partition has no mean. It is never zero.
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / (self.count as f64))
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
struct EntityPartitions {
    before: PartitionSum,
    after: PartitionSum,
}

/// Reduces the vaccination series to the peak coverage of each location.
///
/// Missing and non-finite observations are ignored. A location that never reports a metric
/// keeps a missing value for it. Locations are returned in the order of their
/// first appearance.
pub fn peak_vaccination(records: &[VaccinationRecord]) -> Vec<PeakVaccination> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut peaks: Vec<PeakVaccination> = Vec::new();
    for r in records.iter() {
        let idx = *positions.entry(r.location.as_str()).or_insert_with(|| {
            peaks.push(PeakVaccination {
                location: r.location.clone(),
                max_vaccinated_per_hundred: None,
                max_fully_vaccinated_per_hundred: None,
            });
            peaks.len() - 1
        });
        let peak = &mut peaks[idx];
        peak.max_vaccinated_per_hundred = max_opt(
            peak.max_vaccinated_per_hundred,
            r.people_vaccinated_per_hundred,
        );
        peak.max_fully_vaccinated_per_hundred = max_opt(
            peak.max_fully_vaccinated_per_hundred,
            r.people_fully_vaccinated_per_hundred,
        );
    }
    debug!(
        "peak_vaccination: {} records -> {} locations",
        records.len(),
        peaks.len()
    );
    peaks
}

fn max_opt(current: Option<f64>, observed: Option<f64>) -> Option<f64> {
    match (current, observed.filter(|x| x.is_finite())) {
        (Some(c), Some(o)) => Some(c.max(o)),
        (None, o) => o,
        (c, None) => c,
    }
}

/// Splits the mortality series of every entity at the cutoff and averages
/// each side.
///
/// A row dated exactly on the cutoff belongs to the "before" side.
/// Missing or non-finite p-scores do not count towards either mean.
pub fn partition_averages(records: &[MortalityRecord], cutoff: NaiveDate) -> Vec<EntityAverages> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<(&str, EntityPartitions)> = Vec::new();
    for r in records.iter() {
        let idx = *positions.entry(r.entity.as_str()).or_insert_with(|| {
            partitions.push((r.entity.as_str(), EntityPartitions::default()));
            partitions.len() - 1
        });
        if let Some(p_score) = r.p_score.filter(|x| x.is_finite()) {
            let (_, parts) = &mut partitions[idx];
            if r.date <= cutoff {
                parts.before.add(p_score);
            } else {
                parts.after.add(p_score);
            }
        }
    }

    partitions
        .into_iter()
        .map(|(entity, parts)| {
            debug!(
                "partition_averages: {}: before: {:?} after: {:?}",
                entity, parts.before, parts.after
            );
            EntityAverages {
                entity: entity.to_string(),
                avg_before: parts.before.mean(),
                avg_after: parts.after.mean(),
            }
        })
        .collect()
}

/// Builds the comparison table for the given parameters.
///
/// Arguments:
/// * `mortality` the daily excess mortality of each entity
/// * `vaccination` the daily cumulative coverage of each location
/// * `params` the cutoff date and the coverage metric
///
/// The entities are matched to the locations by exact name. Entities that
/// are not present on both sides, or that miss one of the two averages or the
/// selected metric, are not returned. The rows are sorted by increasing
/// metric, keeping the order of the mortality source between ties.
pub fn compare(
    mortality: &[MortalityRecord],
    vaccination: &[VaccinationRecord],
    params: &ComparisonParams,
) -> Vec<ComparisonRow> {
    info!(
        "compare: processing {} mortality records and {} vaccination records, cutoff: {}, metric: {}",
        mortality.len(),
        vaccination.len(),
        params.cutoff,
        params.metric
    );
    let peaks = peak_vaccination(vaccination);
    let averages = partition_averages(mortality, params.cutoff);
    let rows = join_averages(&averages, &peaks, params.metric);
    info!(
        "compare: {} entities, {} locations, {} rows retained",
        averages.len(),
        peaks.len(),
        rows.len()
    );
    rows
}

/// Inner join on the entity name, then drops the incomplete rows and orders
/// the result by the metric.
pub fn join_averages(
    averages: &[EntityAverages],
    peaks: &[PeakVaccination],
    metric: VaccinationMetric,
) -> Vec<ComparisonRow> {
    let by_location: HashMap<&str, &PeakVaccination> =
        peaks.iter().map(|p| (p.location.as_str(), p)).collect();

    let mut rows: Vec<ComparisonRow> = Vec::new();
    for avg in averages.iter() {
        let peak = match by_location.get(avg.entity.as_str()) {
            Some(p) => p,
            None => {
                debug!("join_averages: no vaccination data for {:?}", avg.entity);
                continue;
            }
        };
        match (avg.avg_before, avg.avg_after, peak.value(metric)) {
            (Some(avg_before), Some(avg_after), Some(vaccination_metric_value)) => {
                rows.push(ComparisonRow {
                    entity: avg.entity.clone(),
                    avg_before,
                    avg_after,
                    vaccination_metric_value,
                });
            }
            x => {
                debug!("join_averages: dropping {:?}: {:?}", avg.entity, x);
            }
        }
    }

    // sort_by is stable: ties keep the order of the mortality source.
    rows.sort_by(|a, b| {
        a.vaccination_metric_value
            .total_cmp(&b.vaccination_metric_value)
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mort(entity: &str, date: NaiveDate, p_score: Option<f64>) -> MortalityRecord {
        MortalityRecord {
            entity: entity.to_string(),
            date,
            p_score,
        }
    }

    fn vacc(
        location: &str,
        date: NaiveDate,
        partial: Option<f64>,
        full: Option<f64>,
    ) -> VaccinationRecord {
        VaccinationRecord {
            location: location.to_string(),
            date,
            people_vaccinated_per_hundred: partial,
            people_fully_vaccinated_per_hundred: full,
        }
    }

    fn params() -> ComparisonParams {
        ComparisonParams::new(day(2021, 9, 30), VaccinationMetric::PeopleVaccinated)
    }

    #[test]
    fn testland_averages() {
        init();
        let mortality = vec![
            mort("Testland", day(2021, 1, 3), Some(10.0)),
            mort("Testland", day(2021, 5, 3), Some(20.0)),
            mort("Testland", day(2021, 12, 3), Some(30.0)),
        ];
        let vaccination = vec![vacc("Testland", day(2021, 12, 1), Some(70.0), Some(60.0))];
        let rows = compare(&mortality, &vaccination, &params());
        assert_eq!(
            rows,
            vec![ComparisonRow {
                entity: "Testland".to_string(),
                avg_before: 15.0,
                avg_after: 30.0,
                vaccination_metric_value: 70.0,
            }]
        );
    }

    #[test]
    fn cutoff_day_belongs_before() {
        let averages = partition_averages(
            &[
                mort("A", day(2021, 9, 30), Some(1.0)),
                mort("A", day(2021, 10, 1), Some(5.0)),
            ],
            day(2021, 9, 30),
        );
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].avg_before, Some(1.0));
        assert_eq!(averages[0].avg_after, Some(5.0));
    }

    #[test]
    fn empty_partition_is_missing() {
        let averages = partition_averages(
            &[
                mort("Early", day(2021, 1, 1), Some(4.0)),
                mort("Late", day(2022, 1, 1), Some(8.0)),
                mort("Blank", day(2022, 1, 1), None),
            ],
            day(2021, 9, 30),
        );
        assert_eq!(
            averages,
            vec![
                EntityAverages {
                    entity: "Early".to_string(),
                    avg_before: Some(4.0),
                    avg_after: None
                },
                EntityAverages {
                    entity: "Late".to_string(),
                    avg_before: None,
                    avg_after: Some(8.0)
                },
                EntityAverages {
                    entity: "Blank".to_string(),
                    avg_before: None,
                    avg_after: None
                },
            ]
        );
    }

    #[test]
    fn missing_scores_are_skipped_in_mean() {
        let averages = partition_averages(
            &[
                mort("A", day(2021, 1, 1), Some(2.0)),
                mort("A", day(2021, 1, 2), None),
                mort("A", day(2021, 1, 3), Some(4.0)),
            ],
            day(2021, 9, 30),
        );
        assert_eq!(averages[0].avg_before, Some(3.0));
    }

    #[test]
    fn peak_takes_maximum_of_observed_values() {
        let peaks = peak_vaccination(&[
            vacc("A", day(2021, 1, 1), Some(10.0), None),
            vacc("A", day(2021, 6, 1), Some(50.0), Some(30.0)),
            vacc("A", day(2021, 7, 1), None, Some(45.0)),
            vacc("B", day(2021, 1, 1), None, None),
        ]);
        assert_eq!(
            peaks,
            vec![
                PeakVaccination {
                    location: "A".to_string(),
                    max_vaccinated_per_hundred: Some(50.0),
                    max_fully_vaccinated_per_hundred: Some(45.0),
                },
                PeakVaccination {
                    location: "B".to_string(),
                    max_vaccinated_per_hundred: None,
                    max_fully_vaccinated_per_hundred: None,
                },
            ]
        );
    }

    #[test]
    fn inner_join_drops_unmatched_entities() {
        init();
        let mortality = vec![
            mort("Both", day(2021, 1, 1), Some(1.0)),
            mort("Both", day(2022, 1, 1), Some(2.0)),
            mort("MortalityOnly", day(2021, 1, 1), Some(1.0)),
            mort("MortalityOnly", day(2022, 1, 1), Some(2.0)),
        ];
        let vaccination = vec![
            vacc("Both", day(2021, 6, 1), Some(10.0), Some(5.0)),
            vacc("VaccinationOnly", day(2021, 6, 1), Some(10.0), Some(5.0)),
        ];
        let rows = compare(&mortality, &vaccination, &params());
        let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["Both"]);
        for r in rows.iter() {
            assert!(mortality.iter().any(|m| m.entity == r.entity));
            assert!(vaccination.iter().any(|v| v.location == r.entity));
        }
    }

    #[test]
    fn names_are_matched_exactly() {
        let mortality = vec![
            mort("Czechia", day(2021, 1, 1), Some(1.0)),
            mort("Czechia", day(2022, 1, 1), Some(2.0)),
        ];
        let vaccination = vec![vacc("Czech Republic", day(2021, 6, 1), Some(10.0), None)];
        assert!(compare(&mortality, &vaccination, &params()).is_empty());
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let mortality = vec![
            mort("NoAfter", day(2021, 1, 1), Some(1.0)),
            mort("NoBefore", day(2022, 1, 1), Some(1.0)),
            mort("NoMetric", day(2021, 1, 1), Some(1.0)),
            mort("NoMetric", day(2022, 1, 1), Some(1.0)),
            mort("Complete", day(2021, 1, 1), Some(1.0)),
            mort("Complete", day(2022, 1, 1), Some(1.0)),
        ];
        let vaccination = vec![
            vacc("NoAfter", day(2021, 6, 1), Some(10.0), None),
            vacc("NoBefore", day(2021, 6, 1), Some(10.0), None),
            vacc("NoMetric", day(2021, 6, 1), None, Some(3.0)),
            vacc("Complete", day(2021, 6, 1), Some(10.0), None),
        ];
        let rows = compare(&mortality, &vaccination, &params());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, "Complete");
        assert!(rows
            .iter()
            .all(|r| r.avg_before.is_finite() && r.avg_after.is_finite()));
    }

    #[test]
    fn sorted_by_metric_and_stable() {
        let mut mortality = Vec::new();
        for name in ["C", "A", "B", "D"] {
            mortality.push(mort(name, day(2021, 1, 1), Some(1.0)));
            mortality.push(mort(name, day(2022, 1, 1), Some(2.0)));
        }
        let vaccination = vec![
            vacc("A", day(2021, 6, 1), Some(50.0), None),
            vacc("B", day(2021, 6, 1), Some(20.0), None),
            vacc("C", day(2021, 6, 1), Some(50.0), None),
            vacc("D", day(2021, 6, 1), Some(80.0), None),
        ];
        let rows = compare(&mortality, &vaccination, &params());
        let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        // C comes before A in the mortality source.
        assert_eq!(entities, vec!["B", "C", "A", "D"]);
        assert!(rows
            .windows(2)
            .all(|w| w[0].vaccination_metric_value <= w[1].vaccination_metric_value));
    }

    #[test]
    fn changing_metric_keeps_averages() {
        let mut mortality = Vec::new();
        for (name, before, after) in [("A", 1.0, 3.0), ("B", 5.0, 7.0), ("C", 2.0, 2.0)] {
            mortality.push(mort(name, day(2021, 1, 1), Some(before)));
            mortality.push(mort(name, day(2022, 1, 1), Some(after)));
        }
        let vaccination = vec![
            vacc("A", day(2021, 6, 1), Some(10.0), Some(90.0)),
            vacc("B", day(2021, 6, 1), Some(20.0), Some(80.0)),
            vacc("C", day(2021, 6, 1), Some(30.0), None),
        ];
        let partial = compare(&mortality, &vaccination, &params());
        let full = compare(
            &mortality,
            &vaccination,
            &ComparisonParams::new(day(2021, 9, 30), VaccinationMetric::PeopleFullyVaccinated),
        );

        let names = |rows: &[ComparisonRow]| -> Vec<String> {
            rows.iter().map(|r| r.entity.clone()).collect()
        };
        assert_eq!(names(&partial), vec!["A", "B", "C"]);
        assert_eq!(names(&full), vec!["B", "A"]);
        for r in full.iter() {
            let p = partial.iter().find(|p| p.entity == r.entity).unwrap();
            assert_eq!(p.avg_before, r.avg_before);
            assert_eq!(p.avg_after, r.avg_after);
        }
    }

    #[test]
    fn non_finite_values_are_missing() {
        init();
        let mortality = vec![
            mort("A", day(2021, 1, 1), Some(2.0)),
            mort("A", day(2021, 2, 1), Some(f64::NAN)),
            mort("A", day(2022, 1, 1), Some(4.0)),
            mort("A", day(2022, 2, 1), Some(f64::INFINITY)),
            mort("NanAfter", day(2021, 1, 1), Some(1.0)),
            mort("NanAfter", day(2022, 1, 1), Some(f64::NAN)),
            mort("NanPeak", day(2021, 1, 1), Some(1.0)),
            mort("NanPeak", day(2022, 1, 1), Some(1.0)),
            mort("B", day(2021, 1, 1), Some(1.0)),
            mort("B", day(2022, 1, 1), Some(1.0)),
        ];
        let vaccination = vec![
            vacc("A", day(2021, 6, 1), Some(60.0), None),
            vacc("A", day(2021, 7, 1), Some(f64::NAN), None),
            vacc("NanAfter", day(2021, 6, 1), Some(10.0), None),
            vacc("NanPeak", day(2021, 6, 1), Some(f64::NAN), None),
            vacc("B", day(2021, 6, 1), Some(20.0), None),
        ];
        let rows = compare(&mortality, &vaccination, &params());
        assert_eq!(
            rows,
            vec![
                ComparisonRow {
                    entity: "B".to_string(),
                    avg_before: 1.0,
                    avg_after: 1.0,
                    vaccination_metric_value: 20.0,
                },
                ComparisonRow {
                    entity: "A".to_string(),
                    avg_before: 2.0,
                    avg_after: 4.0,
                    vaccination_metric_value: 60.0,
                },
            ]
        );
    }

    #[test]
    fn empty_inputs_give_empty_table() {
        assert!(compare(&[], &[], &ComparisonParams::default()).is_empty());
    }
}
