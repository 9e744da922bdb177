use serde::Serialize;

use crate::analyzers::utility::{mean, quantile, sample_stddev, sorted};
use crate::coerce::to_numeric;
use crate::table::{Table, TableError};

/// Summary statistics of one numeric variable. Statistics are `None` when
/// there are no values (and `std` when there is only one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub variable: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn from_values(variable: &str, values: &[f64]) -> Self {
        let sorted = sorted(values);
        let avg = (!values.is_empty()).then(|| mean(values));
        Describe {
            variable: variable.to_string(),
            count: values.len(),
            mean: avg,
            std: avg.and_then(|m| sample_stddev(values, m)),
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Non-missing numeric values of `variable`; non-numeric cells are dropped.
pub fn numeric_values(table: &Table, variable: &str) -> Result<Vec<f64>, TableError> {
    Ok(table
        .column(variable)?
        .iter()
        .filter_map(to_numeric)
        .collect())
}

pub fn describe(table: &Table, variables: &[&str]) -> Result<Vec<Describe>, TableError> {
    variables
        .iter()
        .map(|name| Ok(Describe::from_values(name, &numeric_values(table, name)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_scores() {
        let table = Table::new(
            vec!["letters_score"],
            ["10", "20", "abc", "30", "40"]
                .iter()
                .map(|v| vec![Some(v.to_string())])
                .chain(std::iter::once(vec![None]))
                .collect(),
        );
        let stats = describe(&table, &["letters_score"]).unwrap();
        let s = &stats[0];

        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(25.0));
        assert_eq!(s.min, Some(10.0));
        assert_eq!(s.q25, Some(17.5));
        assert_eq!(s.median, Some(25.0));
        assert_eq!(s.q75, Some(32.5));
        assert_eq!(s.max, Some(40.0));
        assert!((s.std.unwrap() - 12.909944487358056).abs() < 1e-9);
    }

    #[test]
    fn test_describe_empty_and_single() {
        let empty = Describe::from_values("x", &[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);

        let single = Describe::from_values("x", &[7.0]);
        assert_eq!(single.mean, Some(7.0));
        assert_eq!(single.std, None);
        assert_eq!(single.q75, Some(7.0));
    }

    #[test]
    fn test_serialized_quartile_names() {
        let json = serde_json::to_value(Describe::from_values("x", &[1.0, 2.0])).unwrap();
        assert_eq!(json["50%"], 1.5);
        assert!(json.get("median").is_none());
    }
}
