//! Interview duration derivation and range check.

use chrono::TimeDelta;

use crate::coerce::{self, to_datetime, to_timedelta};
use crate::config::{DurationRule, DurationSource};
use crate::table::{Subset, Table, TableError};

/// Derives one duration per row. Unparsable values and rows missing either
/// timestamp become `None`.
pub fn derive_durations(
    table: &Table,
    source: &DurationSource,
) -> Result<Vec<Option<TimeDelta>>, TableError> {
    match source {
        DurationSource::Column { column, unit } => {
            let column = table.column(column)?;
            Ok(column.iter().map(|raw| to_timedelta(raw, *unit)).collect())
        }
        DurationSource::StartEnd { start, end } => {
            let start = table.column(start)?;
            let end = table.column(end)?;
            Ok(start
                .iter()
                .zip(end.iter())
                .map(|(s, e)| Some(to_datetime(e)? - to_datetime(s)?))
                .collect())
        }
    }
}

/// Bounds beyond the `TimeDelta` range saturate to its limits.
fn minutes_to_span(minutes: f64) -> TimeDelta {
    let millis = (minutes * 60_000.0).round();
    TimeDelta::try_milliseconds(millis as i64).unwrap_or(if millis < 0.0 {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// Rows whose duration lies strictly outside `[min, max]`. Rows without a
/// derivable duration are never flagged.
#[tracing::instrument(skip(table), fields(rows = table.n_rows()))]
pub fn duration_check<'a>(
    table: &'a Table,
    rule: &DurationRule,
) -> Result<Subset<'a>, TableError> {
    let lower = minutes_to_span(rule.min_minutes);
    let upper = minutes_to_span(rule.max_minutes);

    let flagged = derive_durations(table, &rule.source)?
        .iter()
        .enumerate()
        .filter_map(|(row, duration)| match duration {
            Some(d) if *d < lower || *d > upper => Some(row),
            _ => None,
        })
        .collect();

    Ok(Subset::new(table, flagged))
}

/// Durations in seconds, for plotting over submission order.
pub fn duration_seconds(durations: &[Option<TimeDelta>]) -> Vec<Option<f64>> {
    durations
        .iter()
        .map(|d| d.map(coerce::seconds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::DurationUnit;

    fn column_rule(min: f64, max: f64) -> DurationRule {
        DurationRule {
            source: DurationSource::Column {
                column: "Duration".into(),
                unit: DurationUnit::Minutes,
            },
            min_minutes: min,
            max_minutes: max,
        }
    }

    fn durations(values: &[Option<&str>]) -> Table {
        Table::new(
            vec!["Duration"],
            values.iter().map(|v| vec![v.map(str::to_string)]).collect(),
        )
    }

    #[test]
    fn test_out_of_range_rows_flagged() {
        let table = durations(&[Some("00:03:00"), Some("00:30:00"), Some("02:00:00")]);
        let flagged = duration_check(&table, &column_rule(5.0, 60.0)).unwrap();
        assert_eq!(flagged.row_numbers(), vec![1, 3]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let table = durations(&[Some("00:05:00"), Some("01:00:00"), Some("01:00:01")]);
        let flagged = duration_check(&table, &column_rule(5.0, 60.0)).unwrap();
        assert_eq!(flagged.row_numbers(), vec![3]);
    }

    #[test]
    fn test_unparsable_durations_not_flagged() {
        let table = durations(&[Some("garbage"), None, Some("00:01:00")]);
        let flagged = duration_check(&table, &column_rule(5.0, 60.0)).unwrap();
        assert_eq!(flagged.row_numbers(), vec![3]);
    }

    #[test]
    fn test_variant_lower_bound() {
        let table = durations(&[Some("00:03:00"), Some("00:01:30")]);
        let flagged = duration_check(&table, &column_rule(2.0, 60.0)).unwrap();
        assert_eq!(flagged.row_numbers(), vec![2]);
    }

    #[test]
    fn test_extreme_bounds_saturate() {
        let table = durations(&[Some("00:03:00"), Some("100 days 00:00:00")]);
        let flagged = duration_check(&table, &column_rule(-1e300, 1e300)).unwrap();
        assert!(flagged.is_empty());

        let flagged = duration_check(&table, &column_rule(-1e300, 10.0)).unwrap();
        assert_eq!(flagged.row_numbers(), vec![2]);
    }

    #[test]
    fn test_start_end_durations() {
        let table = Table::new(
            vec!["start", "end"],
            vec![
                vec![Some("2023-06-27 10:00:00".into()), Some("2023-06-27 10:01:00".into())],
                vec![Some("2023-06-27 10:00:00".into()), Some("2023-06-27 10:20:00".into())],
                vec![Some("not a date".into()), Some("2023-06-27 10:20:00".into())],
                vec![Some("2023-06-27 10:00:00".into()), None],
            ],
        );
        let rule = DurationRule {
            source: DurationSource::StartEnd {
                start: "start".into(),
                end: "end".into(),
            },
            min_minutes: 2.0,
            max_minutes: 60.0,
        };

        let derived = derive_durations(&table, &rule.source).unwrap();
        assert_eq!(
            duration_seconds(&derived),
            vec![Some(60.0), Some(1200.0), None, None]
        );
        assert_eq!(duration_check(&table, &rule).unwrap().row_numbers(), vec![1]);
    }

    #[test]
    fn test_missing_duration_column() {
        let table = Table::new(vec!["Status"], vec![]);
        assert!(matches!(
            duration_check(&table, &column_rule(5.0, 60.0)),
            Err(TableError::MissingColumn(_))
        ));
    }
}
