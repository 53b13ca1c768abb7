//! Final points-ordered standings table.

use super::aggregate::Aggregator;
use super::metadata::MetadataIndex;
use super::SeasonStanding;

/// Sort tallies by points descending and assign positions 1..N.
///
/// Equal points keep first-seen order from the aggregator, which folds
/// sessions oldest-first and finishers in rank order.
pub fn rank_standings(aggregator: Aggregator, metadata: &MetadataIndex) -> Vec<SeasonStanding> {
    let mut rows = aggregator.into_ordered();
    rows.sort_by(|a, b| b.1.points.cmp(&a.1.points));

    rows.into_iter()
        .enumerate()
        .map(|(idx, (driver_number, tally))| {
            let label = metadata.label(driver_number);
            SeasonStanding {
                position: idx + 1,
                driver_number,
                driver: label.name,
                nationality: label.nationality,
                team: label.team,
                points: tally.points,
                wins: tally.wins,
                sprint_wins: tally.sprint_wins,
                podiums: tally.podiums,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::points::SessionKind;
    use crate::standings::ranking::RankedFinisher;

    fn ranked(numbers: &[u32]) -> Vec<RankedFinisher> {
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
    fn test_positions_dense_and_points_descending() {
        let mut agg = Aggregator::new();
        agg.fold_session(SessionKind::Race, &ranked(&[5, 6, 7, 8]));
        agg.fold_session(SessionKind::Sprint, &ranked(&[8, 7, 6, 5]));
        agg.fold_session(SessionKind::Race, &ranked(&[8, 5]));

        let table = rank_standings(agg, &MetadataIndex::default());
        let positions: Vec<usize> = table.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
        for pair in table.windows(2) {
            assert!(pair[0].points >= pair[1].points);
        }
        assert_eq!(table[0].driver_number, 5);
        assert_eq!(table[0].points, 25 + 5 + 18);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut agg = Aggregator::new();
        // 3 and 9 both end on 44 points; 3 was credited first
        agg.fold_session(SessionKind::Race, &ranked(&[3, 9]));
        agg.fold_session(SessionKind::Race, &ranked(&[9, 3]));
        agg.fold_session(SessionKind::Sprint, &[RankedFinisher { driver_number: 3, rank: 8 }]);
        agg.fold_session(SessionKind::Sprint, &[RankedFinisher { driver_number: 9, rank: 8 }]);

        let table = rank_standings(agg, &MetadataIndex::default());
        assert_eq!(table[0].points, table[1].points);
        assert_eq!(table[0].driver_number, 3);
        assert_eq!(table[1].driver_number, 9);
    }

    #[test]
    fn test_every_tally_yields_a_row() {
        let mut agg = Aggregator::new();
        agg.fold_session(SessionKind::Race, &ranked(&(1..=15).collect::<Vec<_>>()));
        let table = rank_standings(agg, &MetadataIndex::default());
        assert_eq!(table.len(), 15);
        assert_eq!(table[14].points, 0);
        assert_eq!(table[14].driver, "#15");
    }
}
