//! Property tests for the range query, pathfinder and evaluator.

use proptest::prelude::*;
use tactics_core::prelude::*;
use tactics_test_utils::determinism::strategies::{arb_ascii_map, arb_class, arb_health, arb_movement, arb_terrain};
use tactics_test_utils::fixtures::BattlefieldBuilder;

const SIZE: usize = 7;

/// Flatten `pos` to Plains so any class can be deployed there.
fn clear(rows: &mut [String], x: i32, y: i32) {
    let x = x as usize;
    rows[y as usize].replace_range(x..=x, ".");
}

fn arb_coord() -> impl Strategy<Value = (i32, i32)> {
    (0..SIZE as i32, 0..SIZE as i32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn found_paths_are_valid(
        mut rows in arb_ascii_map(SIZE, SIZE),
        class in arb_class(),
        (sx, sy) in arb_coord(),
        (gx, gy) in arb_coord(),
    ) {
        clear(&mut rows, sx, sy);
        let (bf, ids) = BattlefieldBuilder::ascii(&rows).unit(Side::Ai, class, sx, sy).build();
        let unit = bf.unit(ids[0]).unwrap();
        let start = TilePos::new(sx, sy);
        let goal = TilePos::new(gx, gy);

        let path = find_path(&bf, unit, goal);
        prop_assume!(!path.is_empty());

        prop_assert_eq!(path.first(), Some(&start));
        prop_assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            prop_assert!(pair[0].is_adjacent(pair[1]), "{} -> {}", pair[0], pair[1]);
            prop_assert!(bf.grid().movement_cost(pair[1], class).is_some());
        }
        prop_assert!(path_cost(bf.grid(), class, &path).is_some());
    }

    #[test]
    fn uniform_cost_paths_are_chebyshev_optimal(
        (sx, sy) in arb_coord(),
        (gx, gy) in arb_coord(),
    ) {
        let (bf, ids) = BattlefieldBuilder::plains(SIZE, SIZE)
            .unit(Side::Ai, UnitClass::Knight, sx, sy)
            .build();
        let unit = bf.unit(ids[0]).unwrap();
        let start = TilePos::new(sx, sy);
        let goal = TilePos::new(gx, gy);

        let path = find_path(&bf, unit, goal);
        prop_assert_eq!(path.len() as u32 - 1, start.chebyshev_distance(goal));
    }

    #[test]
    fn enclosed_goals_are_unreachable(
        (gx, gy) in (1..SIZE as i32 - 1, 1..SIZE as i32 - 1),
        (sx, sy) in arb_coord(),
    ) {
        let goal = TilePos::new(gx, gy);
        let start = TilePos::new(sx, sy);
        prop_assume!(start.chebyshev_distance(goal) > 1);

        // Ring of mountains around the goal; knights cannot climb.
        let mut rows = vec![".".repeat(SIZE); SIZE];
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) {
                    let x = (gx + dx) as usize;
                    rows[(gy + dy) as usize].replace_range(x..=x, "^");
                }
            }
        }

        let (bf, ids) = BattlefieldBuilder::ascii(&rows)
            .unit(Side::Ai, UnitClass::Knight, sx, sy)
            .build();
        prop_assert!(find_path(&bf, bf.unit(ids[0]).unwrap(), goal).is_empty());
    }

    #[test]
    fn movement_range_is_monotonic(
        mut rows in arb_ascii_map(SIZE, SIZE),
        class in arb_class(),
        (ox, oy) in arb_coord(),
        (bx, by) in arb_coord(),
        range in arb_movement(),
    ) {
        prop_assume!((ox, oy) != (bx, by));
        clear(&mut rows, ox, oy);
        clear(&mut rows, bx, by);
        // A bystander so occupancy skipping is exercised too.
        let (bf, _) = BattlefieldBuilder::ascii(&rows)
            .unit(Side::Ai, class, ox, oy)
            .unit(Side::Player, UnitClass::Knight, bx, by)
            .build();
        let origin = TilePos::new(ox, oy);

        let smaller = tiles_in_range(bf.grid(), class, origin, range, RangeMode::Movement);
        let larger = tiles_in_range(bf.grid(), class, origin, range + 1, RangeMode::Movement);

        for pos in &smaller {
            prop_assert!(larger.contains(pos), "{pos} lost at range {}", range + 1);
        }
        prop_assert!(!larger.contains(&origin));
        prop_assert!(!larger.contains(&TilePos::new(bx, by)));
    }

    #[test]
    fn attack_threat_dominates_position(
        (kx, ky) in arb_coord(),
        (ex, ey) in arb_coord(),
        health in arb_health(),
        movement in 2u32..=12,
    ) {
        prop_assume!((kx, ky) != (ex, ey));
        let stats = UnitStats { movement, range: 1, ..UnitStats::knight() };
        let enemy = UnitStats { health, ..UnitStats::mage() };
        let (bf, ids) = BattlefieldBuilder::plains(SIZE, SIZE)
            .unit_with_stats(Side::Ai, UnitClass::Knight, stats, kx, ky)
            .unit_with_stats(Side::Player, UnitClass::Mage, enemy, ex, ey)
            .build();
        let evaluator = MoveEvaluator::default();

        let candidates = evaluator.evaluate_all(&bf, ids[0]);
        let neighbors = |pos: TilePos| bf.grid().neighbors(pos).count();

        // On uniform terrain two destinations only differ by their
        // neighbor count and their target.
        for threat in candidates.iter().filter(|c| c.target.is_some()) {
            for quiet in candidates.iter().filter(|c| c.target.is_none()) {
                if neighbors(threat.destination) == neighbors(quiet.destination) {
                    prop_assert!(threat.score > quiet.score);
                }
            }
        }

        if candidates.iter().any(|c| c.target.is_some()) {
            let best = evaluator.find_best_move(&bf, ids[0]).unwrap();
            prop_assert_eq!(best.target, Some(TilePos::new(ex, ey)));
        }
    }

    #[test]
    fn terrain_changes_are_visible_to_queries(
        kind in arb_terrain(),
        class in arb_class(),
        (tx, ty) in arb_coord(),
    ) {
        let mut bf = BattlefieldBuilder::plains(SIZE, SIZE).build().0;
        let target = TilePos::new(tx, ty);

        bf.grid_mut().set_terrain(&[target], kind);

        let expected = bf.grid().table().movement_cost(kind, class);
        prop_assert_eq!(bf.grid().movement_cost(target, class), expected);
        prop_assert_eq!(bf.grid().tile(target).unwrap().terrain(), kind);

        let origin = if target == TilePos::new(0, 0) {
            TilePos::new(1, 0)
        } else {
            TilePos::new(0, 0)
        };
        let reachable = tiles_in_range(bf.grid(), class, origin, 100, RangeMode::Movement);
        if expected.is_none() {
            prop_assert!(!reachable.contains(&target));
        }
    }

    #[test]
    fn evaluation_is_deterministic(
        mut rows in arb_ascii_map(SIZE, SIZE),
        class in arb_class(),
        (ax, ay) in arb_coord(),
        (px, py) in arb_coord(),
    ) {
        prop_assume!((ax, ay) != (px, py));
        clear(&mut rows, ax, ay);
        clear(&mut rows, px, py);
        let build = || {
            BattlefieldBuilder::ascii(&rows)
                .unit(Side::Ai, class, ax, ay)
                .unit(Side::Player, UnitClass::Rogue, px, py)
                .build()
        };
        let (first, ids) = build();
        let (second, _) = build();
        let evaluator = MoveEvaluator::default();

        prop_assert_eq!(
            evaluator.evaluate_all(&first, ids[0]),
            evaluator.evaluate_all(&second, ids[0])
        );
        prop_assert_eq!(
            find_path(&first, first.unit(ids[0]).unwrap(), TilePos::new(px, py)),
            find_path(&second, second.unit(ids[0]).unwrap(), TilePos::new(px, py))
        );
    }
}
