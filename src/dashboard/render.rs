use serde_json::json;
use serde_json::Value as JSValue;

use crate::dashboard::*;

fn chart_title(metric: VaccinationMetric) -> String {
    format!("Average Before and After by Entity/{}", metric.label())
}

fn series_to_json(rows: &[ComparisonRow], period: Period) -> JSValue {
    let points: Vec<JSValue> = rows
        .iter()
        .map(|r| json!({"entity": r.entity, "x": r.vaccination_metric_value, "y": r.average(period)}))
        .collect();
    json!({"name": period.label(), "points": points})
}

fn detail_to_json(rows: &[ComparisonRow], entity: Option<&str>) -> JSValue {
    match entity.and_then(|e| rows.iter().find(|r| r.entity == e)) {
        Some(r) => json!(RawRow::from(r)),
        None => JSValue::Null,
    }
}

fn regression_to_json(
    rows: &[ComparisonRow],
    regression: Option<&Result<Regression, RegressionError>>,
) -> JSValue {
    match regression {
        None => JSValue::Null,
        Some(Err(e)) => json!({"error": e.to_string()}),
        Some(Ok(reg)) => {
            // The line spans the observed coverage range.
            let xs = rows.iter().map(|r| r.vaccination_metric_value);
            let x_min = xs.clone().fold(f64::INFINITY, f64::min);
            let x_max = xs.fold(f64::NEG_INFINITY, f64::max);
            json!({
                "intercept": reg.intercept,
                "line": [
                    {"x": x_min, "y": reg.predict(x_min)},
                    {"x": x_max, "y": reg.predict(x_max)},
                ],
                "numPoints": reg.num_points,
                "pValue": reg.p_value,
                "rSquared": reg.r_squared,
                "slope": reg.slope,
                "slopeStdErr": reg.slope_std_err,
            })
        }
    }
}

/// The summary of a run: chart series, detail panel, raw data and
/// regression, in a form directly usable by a charting front end.
pub fn build_summary_js(
    plan: &DashboardPlan,
    rows: &[ComparisonRow],
    regression: Option<&Result<Regression, RegressionError>>,
) -> JSValue {
    let metric = plan.params.metric;
    let raw_data = if plan.show_raw_data {
        json!(rows.iter().map(RawRow::from).collect::<Vec<RawRow>>())
    } else {
        JSValue::Null
    };
    json!({
        "chart": {
            "series": [
                series_to_json(rows, Period::Before),
                series_to_json(rows, Period::After),
            ],
            "title": chart_title(metric),
            "xLabel": metric.label(),
            "yLabel": "Average",
        },
        "config": {
            "cutoffDate": plan.params.cutoff.format("%Y-%m-%d").to_string(),
            "entity": plan.entity,
            "title": plan.title,
            "vaccinationMetric": metric.column_name(),
        },
        "detail": detail_to_json(rows, plan.entity.as_deref()),
        "rawData": raw_data,
        "regression": regression_to_json(rows, regression),
    })
}

/// A plain text rendering of the comparison table.
pub fn format_raw_table(rows: &[ComparisonRow], metric: VaccinationMetric) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.entity.chars().count())
        .chain(std::iter::once("Entity".len()))
        .max()
        .unwrap_or(0);
    let mut lines: Vec<String> = vec![format!(
        "{:<name_width$}  {:>10}  {:>10}  {}",
        "Entity",
        "avg_before",
        "avg_after",
        metric.column_name(),
    )];
    for r in rows.iter() {
        lines.push(format!(
            "{:<name_width$}  {:>10.2}  {:>10.2}  {:.2}",
            r.entity, r.avg_before, r.avg_after, r.vaccination_metric_value,
        ));
    }
    lines.join("\n")
}
