use crate::derive::trajectory::parse_trajectory;
use crate::derive::{MetricTable, is_missing};
use crate::input::PunctualityRow;

/// A trip "has a recorded time" if any of the actual-time columns is filled.
fn has_recorded_time(row: &PunctualityRow) -> bool {
    [
        row.chegada_ao_ponto.as_deref(),
        row.partida_real.as_deref(),
        row.chegada_real.as_deref(),
    ]
    .into_iter()
    .any(|cell| !is_missing(cell))
}

/// Share of trips with a recorded time, per route and direction.
pub fn derive_punctuality(rows: &[PunctualityRow]) -> MetricTable {
    let mut table = MetricTable::new(PunctualityRow::SOURCE);

    for (idx, row) in rows.iter().enumerate() {
        match parse_trajectory(&row.trajeto) {
            Ok(key) => {
                let hit = if has_recorded_time(row) { 1.0 } else { 0.0 };
                table.push(key, hit);
            }
            Err(e) => table.reject(idx, None, e),
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::RouteMetric;
    use crate::route::{Direction, RouteKey};

    fn row(trajeto: &str, chegada: &str, partida: &str, real: &str) -> PunctualityRow {
        PunctualityRow {
            data: Some("01/01/2024".into()),
            trajeto: trajeto.into(),
            chegada_ao_ponto: Some(chegada.into()),
            partida_real: Some(partida.into()),
            chegada_real: Some(real.into()),
        }
    }

    #[test]
    fn test_dash_is_missing_not_zero() {
        let rows = vec![
            row("1702 - Sentido Mangues (ida)", "05:34:26", "00:42:00", "05:52:00"),
            row("1702 - Sentido Mangues (volta)", "-", "-", "-"),
        ];
        let table = derive_punctuality(&rows);

        assert_eq!(
            table.value(&RouteKey::new("1702", Some(Direction::Outbound))),
            Some(1.0)
        );
        assert_eq!(
            table.value(&RouteKey::new("1702", Some(Direction::Return))),
            Some(0.0)
        );
        assert_eq!(table.value(&RouteKey::route("1702")), Some(0.5));
    }

    #[test]
    fn test_any_single_time_counts() {
        let rows = vec![
            row("10 - A (ida)", "-", "-", "06:00:00"),
            row("10 - A (ida)", "-", "06:00:00", "-"),
            row("10 - A (ida)", "", "", ""),
            row("10 - A (ida)", "-", "-", "-"),
        ];
        let table = derive_punctuality(&rows);
        assert_eq!(table.value(&RouteKey::route("10")), Some(0.5));
    }

    #[test]
    fn test_unparseable_trajectory_is_reported() {
        let rows = vec![row("sem descrição", "05:00:00", "-", "-")];
        let table = derive_punctuality(&rows);
        assert!(table.is_empty());
        assert_eq!(table.issues.len(), 1);
        assert_eq!(table.issues[0].source, "punctuality_log");
    }
}
