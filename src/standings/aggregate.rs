//! Season-long accumulation of points, wins and podiums.

use std::collections::HashMap;

use super::points::{SessionKind, PODIUM_RANKS};
use super::ranking::RankedFinisher;

/// Running totals for one driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub points: u32,
    /// Grand Prix wins
    pub wins: u32,
    pub sprint_wins: u32,
    pub podiums: u32,
}

impl Tally {
    fn record(&mut self, kind: SessionKind, rank: usize) {
        self.points += kind.points_for_rank(rank);
        if rank == 1 {
            match kind {
                SessionKind::Race => self.wins += 1,
                SessionKind::Sprint => self.sprint_wins += 1,
            }
        }
        if PODIUM_RANKS.contains(&rank) {
            self.podiums += 1;
        }
    }
}

/// Folds ranked sessions into per-driver tallies.
///
/// Remembers the order in which drivers were first credited so equal
/// points can be ordered deterministically later.
#[derive(Debug, Default)]
pub struct Aggregator {
    tallies: HashMap<u32, Tally>,
    first_seen: Vec<u32>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit every finisher of one session
    pub fn fold_session(&mut self, kind: SessionKind, finishers: &[RankedFinisher]) {
        for finisher in finishers {
            let tally = self
                .tallies
                .entry(finisher.driver_number)
                .or_insert_with(|| {
                    self.first_seen.push(finisher.driver_number);
                    Tally::default()
                });
            tally.record(kind, finisher.rank);
        }
    }

    #[cfg(test)]
    pub fn tally(&self, driver_number: u32) -> Option<Tally> {
        self.tallies.get(&driver_number).copied()
    }

    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    /// Tallies in first-seen order
    pub fn into_ordered(self) -> Vec<(u32, Tally)> {
        let Self {
            mut tallies,
            first_seen,
        } = self;
        first_seen
            .into_iter()
            .filter_map(|number| tallies.remove(&number).map(|t| (number, t)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finishers(numbers: &[u32]) -> Vec<RankedFinisher> {
        numbers
            .iter()
            .enumerate()
            .map(|(idx, &driver_number)| RankedFinisher {
                driver_number,
                rank: idx + 1,
            })
            .collect()
    }

    #[test]
    fn test_race_credit() {
        let mut agg = Aggregator::new();
        let field: Vec<u32> = (1..=12).collect();
        agg.fold_session(SessionKind::Race, &finishers(&field));

        assert_eq!(
            agg.tally(1).unwrap(),
            Tally { points: 25, wins: 1, sprint_wins: 0, podiums: 1 }
        );
        assert_eq!(
            agg.tally(3).unwrap(),
            Tally { points: 15, wins: 0, sprint_wins: 0, podiums: 1 }
        );
        assert_eq!(agg.tally(4).unwrap().podiums, 0);
        assert_eq!(agg.tally(11).unwrap(), Tally::default());
        assert_eq!(agg.len(), 12);
    }

    #[test]
    fn test_sprint_credit() {
        let mut agg = Aggregator::new();
        let field: Vec<u32> = (1..=10).collect();
        agg.fold_session(SessionKind::Sprint, &finishers(&field));

        assert_eq!(
            agg.tally(1).unwrap(),
            Tally { points: 8, wins: 0, sprint_wins: 1, podiums: 1 }
        );
        assert_eq!(agg.tally(8).unwrap().points, 1);
        assert_eq!(agg.tally(9).unwrap().points, 0);
    }

    #[test]
    fn test_session_points_bounded_by_table() {
        let field: Vec<u32> = (1..=20).collect();
        for kind in [SessionKind::Race, SessionKind::Sprint] {
            let mut agg = Aggregator::new();
            agg.fold_session(kind, &finishers(&field));
            let total: u32 = agg.into_ordered().iter().map(|(_, t)| t.points).sum();
            assert_eq!(total, kind.points_table().iter().sum::<u32>());
        }
    }

    #[test]
    fn test_counters_are_monotonic() {
        let sessions = vec![
            (SessionKind::Race, finishers(&[1, 2, 3])),
            (SessionKind::Sprint, finishers(&[2, 1, 3])),
            (SessionKind::Race, finishers(&[3, 2])),
            (SessionKind::Race, Vec::new()),
        ];

        let mut agg = Aggregator::new();
        let mut previous: HashMap<u32, Tally> = HashMap::new();
        for (kind, field) in &sessions {
            agg.fold_session(*kind, field);
            for number in 1..=3 {
                let now = agg.tally(number).unwrap_or_default();
                let before = previous.get(&number).copied().unwrap_or_default();
                assert!(now.points >= before.points);
                assert!(now.wins >= before.wins);
                assert!(now.sprint_wins >= before.sprint_wins);
                assert!(now.podiums >= before.podiums);
                previous.insert(number, now);
            }
        }

        assert_eq!(
            agg.tally(2).unwrap(),
            Tally { points: 18 + 8 + 18, wins: 0, sprint_wins: 1, podiums: 3 }
        );
    }

    #[test]
    fn test_first_seen_order() {
        let mut agg = Aggregator::new();
        agg.fold_session(SessionKind::Race, &finishers(&[44, 1]));
        agg.fold_session(SessionKind::Race, &finishers(&[16, 1, 44]));
        let order: Vec<u32> = agg.into_ordered().into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![44, 1, 16]);
    }
}
