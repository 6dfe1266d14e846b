//! Group parsed rows into one series per `(type, label)` pair.

use crate::parser::SampleRow;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SeriesKey {
    pub sensor_type: String,
    pub label: String,
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.sensor_type, self.label)
    }
}

/// Temperatures for one sensor, as `(ordinal, temp)` pairs in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: SeriesKey,
    pub points: Vec<(usize, f64)>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Groups are returned in order of first appearance; points are never
/// reordered or transformed.
pub fn aggregate(rows: &[SampleRow]) -> Vec<Series> {
    let mut index: HashMap<SeriesKey, usize> = HashMap::new();
    let mut series: Vec<Series> = Vec::new();

    for row in rows {
        let key = SeriesKey {
            sensor_type: row.sensor_type.clone(),
            label: row.label.clone(),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            series.push(Series {
                key,
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[slot].points.push((row.ordinal, row.temp));
    }

    tracing::debug!(
        rows = rows.len(),
        series = series.len(),
        "aggregated session rows"
    );
    series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: &str, l: &str, temp: f64, ordinal: usize) -> SampleRow {
        SampleRow {
            sensor_type: t.to_string(),
            label: l.to_string(),
            temp,
            ordinal,
        }
    }

    fn key(t: &str, l: &str) -> SeriesKey {
        SeriesKey {
            sensor_type: t.to_string(),
            label: l.to_string(),
        }
    }

    #[test]
    fn groups_by_type_and_label() {
        let rows = vec![
            row("A", "x", 10.0, 0),
            row("B", "y", 20.0, 1),
            row("A", "x", 30.0, 2),
        ];
        let series = aggregate(&rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, key("A", "x"));
        assert_eq!(series[0].points, vec![(0, 10.0), (2, 30.0)]);
        assert_eq!(series[1].key, key("B", "y"));
        assert_eq!(series[1].points, vec![(1, 20.0)]);

        let total: usize = series.iter().map(Series::len).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn order_is_first_appearance_not_sorted() {
        let rows = vec![
            row("NVME", "Composite", 30.0, 0),
            row("CPU", "Tctl", 40.0, 1),
            row("AMD", "edge", 50.0, 2),
        ];
        let keys: Vec<String> = aggregate(&rows).iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["NVME-Composite", "CPU-Tctl", "AMD-edge"]);
    }

    #[test]
    fn same_label_different_type_are_distinct() {
        let rows = vec![row("CPU", "temp1", 1.0, 0), row("GPU", "temp1", 2.0, 1)];
        assert_eq!(aggregate(&rows).len(), 2);
    }

    #[test]
    fn ordinals_within_series_stay_in_file_order() {
        let rows: Vec<_> = (0..50)
            .map(|i| row(if i % 3 == 0 { "CPU" } else { "GPU" }, "s", i as f64, i))
            .collect();
        for s in aggregate(&rows) {
            assert!(s.points.windows(2).all(|w| w[0].0 <= w[1].0));
        }
    }

    #[test]
    fn empty_rows_give_no_series() {
        assert!(aggregate(&[]).is_empty());
    }
}
