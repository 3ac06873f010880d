//! Property tests for the end-condition evaluator and health clamping.

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::domain::end_condition::{evaluate, EndDecision, EndReason, Standings};
use crate::domain::ids::WizardId;
use crate::domain::round_limit::RoundLimit;
use crate::domain::scores::{clamp_hit_points, HitPoints, Points};
use crate::domain::test_prelude;

fn arb_limit() -> impl Strategy<Value = RoundLimit> {
    prop_oneof![
        (1u32..=10).prop_map(RoundLimit::FixedRounds),
        Just(RoundLimit::ToTheDeath),
    ]
}

/// Wizard roster with per-wizard (points, hp delta) pairs.
fn arb_roster() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec((-20i32..=40, -150i32..=50), 1..=6)
}

fn build(roster: &[(i32, i32)]) -> (Vec<WizardId>, Points, HitPoints) {
    let wizards: Vec<WizardId> = (0..roster.len())
        .map(|i| WizardId::new(format!("w{i}")))
        .collect();
    let mut points = Points::starting(&wizards);
    let mut hp = HitPoints::starting(&wizards);
    for (w, (p, d)) in wizards.iter().zip(roster) {
        points.award(w, *p);
        hp.apply_delta(w, *d);
    }
    (wizards, points, hp)
}

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Property: winners and losers never overlap and never name an unknown wizard.
    #[test]
    fn prop_decision_partitions_wizards(
        roster in arb_roster(),
        limit in arb_limit(),
        round in 1u32..=12,
    ) {
        let (wizards, points, hp) = build(&roster);
        let decision = evaluate(
            Standings { wizards: &wizards, points: &points, hit_points: &hp },
            limit,
            round,
        );

        if let EndDecision::End { reason, winners, losers } = decision {
            let all: BTreeSet<_> = wizards.iter().collect();
            let won: BTreeSet<_> = winners.iter().collect();
            let lost: BTreeSet<_> = losers.iter().collect();

            prop_assert!(won.is_disjoint(&lost));
            prop_assert!(won.is_subset(&all));
            prop_assert!(lost.is_subset(&all));
            // Both end reasons classify every wizard.
            prop_assert_eq!(won.len() + lost.len(), all.len());
            if reason == EndReason::RoundLimit {
                prop_assert!(!winners.is_empty());
            }
        }
    }

    /// Property: identical inputs always yield identical decisions.
    #[test]
    fn prop_evaluation_is_deterministic(
        roster in arb_roster(),
        limit in arb_limit(),
        round in 1u32..=12,
    ) {
        let (wizards, points, hp) = build(&roster);
        let standings = Standings { wizards: &wizards, points: &points, hit_points: &hp };
        prop_assert_eq!(evaluate(standings, limit, round), evaluate(standings, limit, round));
    }

    /// Property: with two or more wizards standing and rounds left, the duel continues.
    #[test]
    fn prop_continues_while_contested(
        roster in arb_roster(),
        n in 2u32..=10,
    ) {
        let (wizards, points, hp) = build(&roster);
        let alive = wizards.iter().filter(|w| hp.is_alive(w)).count();
        let decision = evaluate(
            Standings { wizards: &wizards, points: &points, hit_points: &hp },
            RoundLimit::FixedRounds(n),
            n - 1,
        );
        prop_assert_eq!(decision.should_end(), alive <= 1);
    }

    /// Property: hit points stay within [0, 100] for any delta sequence.
    #[test]
    fn prop_hit_points_stay_clamped(deltas in prop::collection::vec(any::<i32>(), 0..20)) {
        let w = WizardId::from("w");
        let mut hp = HitPoints::starting(std::slice::from_ref(&w));
        let mut expected = 100;
        for d in deltas {
            hp.apply_delta(&w, d);
            expected = clamp_hit_points(expected, d);
            prop_assert!((0..=100).contains(&hp.get(&w)));
        }
        prop_assert_eq!(hp.get(&w), expected);
    }
}
