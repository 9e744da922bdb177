//! GPS coordinate validity.

use serde::Serialize;

use crate::coerce::to_numeric;
use crate::table::{Subset, Table, TableError};

/// A plottable coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    /// 1-based row number in the source table.
    pub row: usize,
    pub lat: f64,
    pub lon: f64,
}

/// Numeric latitude/longitude per row, `None` where coercion failed.
pub fn coordinates(
    table: &Table,
    latitude: &str,
    longitude: &str,
) -> Result<Vec<(Option<f64>, Option<f64>)>, TableError> {
    let lat = table.column(latitude)?;
    let lon = table.column(longitude)?;
    Ok(lat
        .iter()
        .zip(lon.iter())
        .map(|(lat, lon)| (to_numeric(lat), to_numeric(lon)))
        .collect())
}

/// Rows where latitude or longitude is missing after numeric coercion.
#[tracing::instrument(skip(table), fields(rows = table.n_rows()))]
pub fn location_check<'a>(
    table: &'a Table,
    latitude: &str,
    longitude: &str,
) -> Result<Subset<'a>, TableError> {
    let flagged = coordinates(table, latitude, longitude)?
        .iter()
        .enumerate()
        .filter(|(_, (lat, lon))| lat.is_none() || lon.is_none())
        .map(|(row, _)| row)
        .collect();
    Ok(Subset::new(table, flagged))
}

/// Every row with both coordinates present, for the map view.
pub fn valid_points(
    table: &Table,
    latitude: &str,
    longitude: &str,
) -> Result<Vec<GeoPoint>, TableError> {
    Ok(coordinates(table, latitude, longitude)?
        .into_iter()
        .enumerate()
        .filter_map(|(row, pair)| match pair {
            (Some(lat), Some(lon)) => Some(GeoPoint {
                row: row + 1,
                lat,
                lon,
            }),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["Latitude", "Longitude"],
            vec![
                vec![Some("13.5".into()), Some("-89.1".into())],
                vec![None, Some("-89.1".into())],
                vec![Some("abc".into()), Some("-89.1".into())],
                vec![Some("13.6".into()), Some("".into())],
            ],
        )
    }

    #[test]
    fn test_null_or_non_numeric_flagged() {
        let table = table();
        let flagged = location_check(&table, "Latitude", "Longitude").unwrap();
        assert_eq!(flagged.row_numbers(), vec![2, 3, 4]);
    }

    #[test]
    fn test_valid_points() {
        let points = valid_points(&table(), "Latitude", "Longitude").unwrap();
        assert_eq!(
            points,
            vec![GeoPoint {
                row: 1,
                lat: 13.5,
                lon: -89.1
            }]
        );
    }

    #[test]
    fn test_missing_longitude_column() {
        let table = Table::new(vec!["Latitude"], vec![]);
        assert!(location_check(&table, "Latitude", "Longitude").is_err());
    }
}
