//! Join of qualifying and race results

use crate::{MergedRecord, QualifyingRecord, RaceResultRecord};
use std::collections::{HashMap, HashSet};

type JoinKey<'a> = (&'a str, &'a str, &'a str);

/// Inner join on (race, driver, team)
///
/// Rows without a partner on the other side are dropped. Duplicate keys are
/// not collapsed: every qualifying row pairs with every matching race row.
/// Output follows qualifying order, then race order within a key.
pub fn inner_join(
    qualifying: &[QualifyingRecord],
    races: &[RaceResultRecord],
) -> Vec<MergedRecord> {
    let mut by_key: HashMap<JoinKey<'_>, Vec<&RaceResultRecord>> = HashMap::new();
    for result in races {
        by_key
            .entry((result.race.as_str(), result.driver.as_str(), result.team.as_str()))
            .or_default()
            .push(result);
    }

    let mut merged = Vec::new();
    let mut unmatched_qualifying = 0;

    for q in qualifying {
        let Some(matches) = by_key.get(&(q.race.as_str(), q.driver.as_str(), q.team.as_str()))
        else {
            unmatched_qualifying += 1;
            continue;
        };

        for r in matches {
            merged.push(MergedRecord {
                race: q.race.clone(),
                driver: q.driver.clone(),
                team: q.team.clone(),
                qualifying_position: q.qualifying_position,
                circuit: r.circuit.clone(),
                position: r.position,
                points: r.points,
            });
        }
    }

    log::debug!(
        "Joined {} rows ({} qualifying rows without a race result)",
        merged.len(),
        unmatched_qualifying
    );

    merged
}

/// Number of distinct races and drivers in a merged table
pub fn distinct_counts(records: &[MergedRecord]) -> (usize, usize) {
    let races: HashSet<&str> = records.iter().map(|r| r.race.as_str()).collect();
    let drivers: HashSet<&str> = records.iter().map(|r| r.driver.as_str()).collect();
    (races.len(), drivers.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qual(race: &str, driver: &str, pos: u32) -> QualifyingRecord {
        QualifyingRecord {
            race: race.to_string(),
            driver: driver.to_string(),
            team: format!("{} Racing", driver),
            qualifying_position: pos,
        }
    }

    fn result(race: &str, driver: &str, pos: u32) -> RaceResultRecord {
        RaceResultRecord {
            race: race.to_string(),
            circuit: format!("{} Circuit", race),
            driver: driver.to_string(),
            team: format!("{} Racing", driver),
            position: pos,
            points: if pos == 1 { 25.0 } else { 0.0 },
        }
    }

    /// A: full overlap, B: one qualifying-only entrant, C: no qualifying
    fn three_event_season() -> (Vec<QualifyingRecord>, Vec<RaceResultRecord>) {
        let qualifying = vec![
            qual("A", "Ann", 1),
            qual("A", "Bob", 2),
            qual("B", "Ann", 2),
            qual("B", "Bob", 1),
            qual("B", "Cat", 3),
        ];
        let races = vec![
            result("A", "Bob", 1),
            result("A", "Ann", 2),
            result("B", "Ann", 1),
            result("B", "Bob", 2),
            result("C", "Ann", 1),
            result("C", "Bob", 2),
        ];
        (qualifying, races)
    }

    #[test]
    fn test_three_event_scenario() {
        let (qualifying, races) = three_event_season();
        let merged = inner_join(&qualifying, &races);

        assert_eq!(merged.len(), 4);
        assert!(merged.iter().all(|m| m.race != "C"));
        assert!(merged.iter().all(|m| m.driver != "Cat"));

        // Qualifying order is preserved, race columns come from the partner row
        assert_eq!(merged[0].driver, "Ann");
        assert_eq!(merged[0].qualifying_position, 1);
        assert_eq!(merged[0].position, 2);
        assert_eq!(merged[0].circuit, "A Circuit");
    }

    #[test]
    fn test_every_row_exists_in_both_sources() {
        let (qualifying, races) = three_event_season();
        let merged = inner_join(&qualifying, &races);

        for m in &merged {
            assert!(qualifying
                .iter()
                .any(|q| q.race == m.race && q.driver == m.driver && q.team == m.team));
            assert!(races
                .iter()
                .any(|r| r.race == m.race && r.driver == m.driver && r.team == m.team));
        }

        for event in ["A", "B", "C"] {
            let q = qualifying.iter().filter(|q| q.race == event).count();
            let r = races.iter().filter(|r| r.race == event).count();
            let m = merged.iter().filter(|m| m.race == event).count();
            assert!(m <= q.min(r));
        }
    }

    #[test]
    fn test_duplicate_keys_are_not_collapsed() {
        let qualifying = vec![qual("A", "Ann", 1), qual("A", "Ann", 3)];
        let races = vec![result("A", "Ann", 1), result("A", "Ann", 4)];

        let merged = inner_join(&qualifying, &races);
        assert_eq!(merged.len(), 4);
        let pairs: Vec<_> = merged
            .iter()
            .map(|m| (m.qualifying_position, m.position))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (1, 4), (3, 1), (3, 4)]);
    }

    #[test]
    fn test_team_is_part_of_the_key() {
        let qualifying = vec![qual("A", "Ann", 1)];
        let mut r = result("A", "Ann", 1);
        r.team = "Other Team".to_string();

        assert!(inner_join(&qualifying, &[r]).is_empty());
    }

    #[test]
    fn test_distinct_counts() {
        let (qualifying, races) = three_event_season();
        let merged = inner_join(&qualifying, &races);
        assert_eq!(distinct_counts(&merged), (2, 2));
    }
}
