//! Property-based tests for abcd_core.
//!
//! Uses proptest to check the geometry and naming rules for all inputs,
//! not just the handful of layouts used in the unit tests.

use abcd_core::{
    is_short_sequence_name, ArenaBounds, GridPosition, Heading, RewardConfiguration, Turn,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_turn() -> impl Strategy<Value = Turn> {
    prop_oneof![Just(Turn::Left), Just(Turn::Right), Just(Turn::About)]
}

fn arb_position() -> impl Strategy<Value = GridPosition> {
    (-50.0f32..50.0, -5.0f32..5.0, -50.0f32..50.0).prop_map(|(x, y, z)| GridPosition::new(x, y, z))
}

fn config_named(name: &str) -> RewardConfiguration {
    RewardConfiguration::new(name, [GridPosition::default(); 4])
}

// ============================================================================
// Naming
// ============================================================================

proptest! {
    /// Sequence length is 3 exactly when the name starts with "ABC" but not "ABCD".
    #[test]
    fn sequence_length_follows_name(suffix in "[A-Za-z0-9_]{0,8}") {
        let short = config_named(&format!("ABC_{}", suffix));
        prop_assert_eq!(short.sequence_length(), 3);

        let long = config_named(&format!("ABCD{}", suffix));
        prop_assert_eq!(long.sequence_length(), 4);
    }

    #[test]
    fn sequence_length_matches_rule(name in "[ABCDX_0-9]{0,10}") {
        let expected = if name.starts_with("ABC") && !name.starts_with("ABCD") { 3 } else { 4 };
        prop_assert_eq!(config_named(&name).sequence_length(), expected);
        prop_assert_eq!(is_short_sequence_name(&name), expected == 3);
    }
}

// ============================================================================
// Geometry
// ============================================================================

proptest! {
    /// Any chain of turns lands on an exact multiple of 90°.
    #[test]
    fn turns_stay_cardinal(turns in prop::collection::vec(arb_turn(), 0..200)) {
        let mut heading = Heading::North;
        let mut yaw = 0.0f64;
        for turn in &turns {
            heading = heading.turned(*turn);
            yaw += f64::from(turn.delta_degrees());
        }
        prop_assert_eq!(heading.degrees() % 90.0, 0.0);
        prop_assert_eq!(f64::from(heading.degrees()), yaw.rem_euclid(360.0));
    }

    /// move_towards never overshoots and never moves farther than asked.
    #[test]
    fn move_towards_never_overshoots(
        from in arb_position(),
        to in arb_position(),
        max_delta in -20.0f32..20.0,
    ) {
        let before = from.distance(&to);
        let next = from.move_towards(&to, max_delta);
        prop_assert!(from.distance(&next) <= max_delta.max(0.0) + 1e-3);
        prop_assert!(next.distance(&to) <= before + 1e-3);
    }

    /// A cell well beyond the right bound is never inside the arena.
    #[test]
    fn far_outside_is_rejected(z in 5.0f32..25.6, overshoot in 0.2f32..30.0) {
        let bounds = ArenaBounds::default();
        let outside = GridPosition::new(bounds.right + overshoot, 0.0, z);
        prop_assert!(!bounds.contains(&outside));
    }
}
