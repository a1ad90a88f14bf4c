use super::*;
use crate::config::CollisionConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub passes: usize,
    pub converged: bool,
    pub residual_pairs: usize,
}

fn center_distance(a: &Position, b: &Position) -> (f32, f32, f32) {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let dx = bx - ax;
    let dy = by - ay;
    (dx, dy, (dx * dx + dy * dy).sqrt())
}

fn close_pairs(positions: &PositionMap, movable: &[usize], min_distance: f32) -> usize {
    let mut count = 0;
    for (a, &i) in movable.iter().enumerate() {
        for &j in &movable[a + 1..] {
            let (_, _, distance) = center_distance(&positions[i], &positions[j]);
            if distance > 0.0 && distance < min_distance {
                count += 1;
            }
        }
    }
    count
}

/// Pairwise relaxation over non-container positions. Every pass visits each
/// pair in map order and pushes pairs closer than `min_distance` apart by half
/// the deficit each. Coincident centers have no direction and are left alone.
/// Best effort only: dense layers can still hold close pairs when the pass
/// cap is reached.
pub fn resolve_collisions(positions: &mut PositionMap, config: &CollisionConfig) -> CollisionReport {
    let movable: Vec<usize> = positions
        .values()
        .enumerate()
        .filter(|(_, pos)| !pos.is_container())
        .map(|(idx, _)| idx)
        .collect();
    let mut report = CollisionReport::default();
    if movable.len() < 2 {
        report.converged = true;
        return report;
    }

    let min_distance = config.min_distance;
    for _ in 0..config.max_iterations {
        report.passes += 1;
        let mut collisions = 0usize;
        for a in 0..movable.len() {
            for b in (a + 1)..movable.len() {
                let (i, j) = (movable[a], movable[b]);
                let (dx, dy, distance) = center_distance(&positions[i], &positions[j]);
                if distance <= 0.0 || distance >= min_distance {
                    continue;
                }
                collisions += 1;
                let push = (min_distance - distance) / 2.0;
                let (ux, uy) = (dx / distance, dy / distance);
                positions[i].translate(-ux * push, -uy * push);
                positions[j].translate(ux * push, uy * push);
            }
        }
        if collisions == 0 {
            report.converged = true;
            return report;
        }
    }

    report.residual_pairs = close_pairs(positions, &movable, min_distance);
    report.converged = report.residual_pairs == 0;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Position)]) -> PositionMap {
        entries
            .iter()
            .map(|(id, pos)| (id.to_string(), pos.clone()))
            .collect()
    }

    fn distance(positions: &PositionMap, a: &str, b: &str) -> f32 {
        center_distance(&positions[a], &positions[b]).2
    }

    #[test]
    fn separated_nodes_are_untouched() {
        let mut positions = map(&[
            ("a", Position::plain(0.0, 0.0, 70.0, 70.0)),
            ("b", Position::plain(400.0, 0.0, 70.0, 70.0)),
        ]);
        let before = positions.clone();
        let report = resolve_collisions(&mut positions, &CollisionConfig::default());
        assert_eq!(positions, before);
        assert_eq!(report.passes, 1);
        assert!(report.converged);
    }

    #[test]
    fn close_pair_is_pushed_apart_symmetrically() {
        let mut positions = map(&[
            ("a", Position::plain(100.0, 100.0, 70.0, 70.0)),
            ("b", Position::plain(160.0, 100.0, 70.0, 70.0)),
        ]);
        let report = resolve_collisions(&mut positions, &CollisionConfig::default());
        assert!(report.converged);
        assert!((positions["a"].x - 40.0).abs() < 1e-3);
        assert!((positions["b"].x - 220.0).abs() < 1e-3);
        assert_eq!(positions["a"].y, 100.0);
        assert!((distance(&positions, "a", "b") - 180.0).abs() < 1e-3);
    }

    #[test]
    fn containers_are_ignored() {
        let mut positions = map(&[
            ("box", Position::container(0.0, 0.0, 300.0, 180.0)),
            ("a", Position::plain(10.0, 10.0, 70.0, 70.0)),
        ]);
        let before = positions.clone();
        let report = resolve_collisions(&mut positions, &CollisionConfig::default());
        assert_eq!(positions, before);
        assert_eq!(report.passes, 0);
    }

    #[test]
    fn coincident_nodes_are_left_in_place() {
        let mut positions = map(&[
            ("a", Position::plain(0.0, 0.0, 70.0, 70.0)),
            ("b", Position::plain(0.0, 0.0, 70.0, 70.0)),
        ]);
        let report = resolve_collisions(&mut positions, &CollisionConfig::default());
        assert!(report.converged);
        assert_eq!(positions["a"], positions["b"]);
    }

    #[test]
    fn pass_cap_bounds_the_work() {
        let mut positions: PositionMap = (0..12)
            .map(|idx| {
                (
                    format!("n{idx}"),
                    Position::plain(idx as f32 * 3.0, (idx % 3) as f32 * 2.0, 70.0, 70.0),
                )
            })
            .collect();
        let config = CollisionConfig {
            min_distance: 180.0,
            max_iterations: 2,
        };
        let report = resolve_collisions(&mut positions, &config);
        assert!(report.passes <= 2);
        if !report.converged {
            assert_eq!(report.passes, 2);
            assert!(report.residual_pairs > 0);
        }
    }

    #[test]
    fn dense_cluster_spreads_out_given_enough_passes() {
        let mut positions: PositionMap = (0..6)
            .map(|idx| {
                (
                    format!("n{idx}"),
                    Position::plain(idx as f32 * 20.0, (idx % 2) as f32 * 15.0, 70.0, 70.0),
                )
            })
            .collect();
        let config = CollisionConfig {
            min_distance: 180.0,
            max_iterations: 500,
        };
        let report = resolve_collisions(&mut positions, &config);
        let ids: Vec<String> = positions.keys().cloned().collect();
        if report.converged {
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    assert!(distance(&positions, a, b) >= 180.0 - 1e-2);
                }
            }
        } else {
            assert_eq!(report.passes, 500);
        }
    }
}
