use crate::domain::end_condition::{evaluate, EndDecision, EndReason, Standings};
use crate::domain::ids::WizardId;
use crate::domain::round_limit::RoundLimit;
use crate::domain::scores::{HitPoints, Points};

fn wizards(ids: &[&str]) -> Vec<WizardId> {
    ids.iter().map(|id| WizardId::from(*id)).collect()
}

fn standings<'a>(
    wizards: &'a [WizardId],
    points: &'a Points,
    hit_points: &'a HitPoints,
) -> Standings<'a> {
    Standings {
        wizards,
        points,
        hit_points,
    }
}

#[test]
fn elimination_ends_before_round_limit() {
    let ws = wizards(&["a", "b"]);
    let points = Points::starting(&ws);
    let mut hp = HitPoints::starting(&ws);
    hp.apply_delta(&ws[1], -100);

    let decision = evaluate(standings(&ws, &points, &hp), RoundLimit::FixedRounds(5), 2);

    assert_eq!(
        decision,
        EndDecision::End {
            reason: EndReason::Elimination,
            winners: wizards(&["a"]),
            losers: wizards(&["b"]),
        }
    );
}

#[test]
fn round_limit_tie_on_points_and_health_makes_everyone_a_winner() {
    let ws = wizards(&["a", "b"]);
    let mut points = Points::starting(&ws);
    let mut hp = HitPoints::starting(&ws);
    for w in &ws {
        points.award(w, 10);
        hp.apply_delta(w, -20);
    }

    let decision = evaluate(standings(&ws, &points, &hp), RoundLimit::FixedRounds(3), 3);

    assert_eq!(
        decision,
        EndDecision::End {
            reason: EndReason::RoundLimit,
            winners: ws.clone(),
            losers: vec![],
        }
    );
}

#[test]
fn points_dominate_health_in_round_limit_ranking() {
    let ws = wizards(&["a", "b"]);
    let mut points = Points::starting(&ws);
    let mut hp = HitPoints::starting(&ws);
    points.award(&ws[0], 15);
    hp.apply_delta(&ws[0], -30);
    points.award(&ws[1], 10);
    hp.apply_delta(&ws[1], -10);

    let decision = evaluate(standings(&ws, &points, &hp), RoundLimit::FixedRounds(3), 3);

    assert_eq!(
        decision,
        EndDecision::End {
            reason: EndReason::RoundLimit,
            winners: wizards(&["a"]),
            losers: wizards(&["b"]),
        }
    );
}

#[test]
fn health_breaks_points_tie() {
    let ws = wizards(&["a", "b", "c"]);
    let mut points = Points::starting(&ws);
    let mut hp = HitPoints::starting(&ws);
    points.award(&ws[0], 5);
    points.award(&ws[1], 5);
    hp.apply_delta(&ws[0], -50);

    let decision = evaluate(standings(&ws, &points, &hp), RoundLimit::FixedRounds(1), 1);

    assert_eq!(
        decision,
        EndDecision::End {
            reason: EndReason::RoundLimit,
            winners: wizards(&["b"]),
            losers: wizards(&["a", "c"]),
        }
    );
}

#[test]
fn continues_before_final_round() {
    let ws = wizards(&["a", "b"]);
    let points = Points::starting(&ws);
    let hp = HitPoints::starting(&ws);

    assert_eq!(
        evaluate(standings(&ws, &points, &hp), RoundLimit::FixedRounds(3), 2),
        EndDecision::Continue
    );
}

#[test]
fn to_the_death_never_ends_by_round_count() {
    let ws = wizards(&["a", "b"]);
    let points = Points::starting(&ws);
    let hp = HitPoints::starting(&ws);

    assert_eq!(
        evaluate(standings(&ws, &points, &hp), RoundLimit::ToTheDeath, 500),
        EndDecision::Continue
    );
}

#[test]
fn mutual_knockout_has_no_winners() {
    let ws = wizards(&["a", "b"]);
    let points = Points::starting(&ws);
    let mut hp = HitPoints::starting(&ws);
    hp.apply_delta(&ws[0], -100);
    hp.apply_delta(&ws[1], -100);

    let decision = evaluate(standings(&ws, &points, &hp), RoundLimit::ToTheDeath, 4);

    assert_eq!(
        decision,
        EndDecision::End {
            reason: EndReason::Elimination,
            winners: vec![],
            losers: ws.clone(),
        }
    );
}
