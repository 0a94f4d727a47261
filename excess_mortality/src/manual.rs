/*!

This is the long-form manual for `excess_mortality` and `vaxmort`.

## What is computed

For every entity, the daily excess mortality p-scores are split at a cutoff date.
The days up to and including the cutoff form the `before` period, the
following days form the `after` period. Each period is averaged separately;
days without a p-score are ignored, and a period without any day has no
average at all (it is never treated as zero).

The vaccination series is reduced to the highest coverage ever reported by
each location, for both metrics:
* `people_vaccinated_per_hundred` (at least one dose, the default)
* `people_fully_vaccinated_per_hundred`

The two tables are joined on the exact name of the entity. Entities missing
from one of the sources, or missing one of the averages or the selected
metric, are left out. The result is sorted by increasing coverage.

Names are not reconciled between the two sources: an entity spelled
differently in each (`Czechia` and `Czech Republic` for example) will not
appear in the result.

## Input formats

### Excess mortality

The file must have a header row with at least the following columns:

| column            | content                                  |
|-------------------|------------------------------------------|
| `Entity`          | the name of the entity (or `Country`)    |
| `Day`             | the date, `YYYY-MM-DD`                   |
| `p_proj_all_ages` | the p-score against the projected baseline, may be empty |

This is the layout of the `excess-mortality-p-scores-projected-baseline.csv`
export of Our World in Data. Two providers are supported:
* `csv` (default)
* `xlsx` the same table in an Excel worksheet. Dates may be stored as text
or as Excel dates.

### Vaccinations

The file must have a header row with at least `location`, `date`,
`people_vaccinated_per_hundred` and `people_fully_vaccinated_per_hundred`.
Two providers are supported:
* `csv` a local copy
* `url` (default) the file is downloaded, by default from the Our World in
Data repository.

## Configuration

A run can be described with a JSON file passed with `--config`:

```json
{
  "outputSettings": { "title": "Excess mortality and vaccination", "outputPath": "summary.json" },
  "mortalitySource": { "provider": "csv", "filePath": "excess-mortality.csv" },
  "vaccinationSource": { "provider": "csv", "filePath": "vaccinations.csv" },
  "cutoffDate": "2021-09-30",
  "vaccinationMetric": "people_vaccinated_per_hundred",
  "entity": "Chile",
  "showRawData": false,
  "addRegressionLine": true
}
```

Relative paths are resolved from the directory of the configuration file.
The command line flags take precedence over the configuration.

## Regression

With `--regression`, an ordinary least-squares line of the `after` average
against the coverage is fitted. The summary reports the slope, the intercept,
the coefficient of determination and the p-value of the slope. When fewer than
two distinct coverage values remain, no line is drawn.

*/
