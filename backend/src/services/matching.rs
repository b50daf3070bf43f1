//! Coach ranking by distance to the requester and requested-skill overlap.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::geocoding::{distance_km, parse_coordinates, Coordinates};
use crate::constants::{DISTANCE_WEIGHT, MAX_RELEVANT_DISTANCE_KM, SKILL_MATCH_SATURATION, SKILL_WEIGHT};
use crate::models::Coach;

/// How a composite score was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub distance_km: f64,
    pub closeness: f64,
    pub matched_skills: usize,
    pub skill_score: f64,
    pub total: f64,
}

/// Number of distinct requested skills the coach has. Levels are ignored.
pub fn skill_match_count(coach: &Coach, requested_skills: &[i32]) -> usize {
    let coach_skills: HashSet<i32> = coach.skills.iter().map(|skill| skill.skill_id).collect();
    requested_skills
        .iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|skill_id| coach_skills.contains(*skill_id))
        .count()
}

/// 1.0 at 0 km, falling linearly to 0.0 at the relevance ceiling.
pub fn closeness(distance_km: f64) -> f64 {
    (1.0 - distance_km / MAX_RELEVANT_DISTANCE_KM).max(0.0)
}

fn skill_score(matched: usize) -> f64 {
    (matched as f64 / SKILL_MATCH_SATURATION as f64).min(1.0)
}

/// Scores a coach against a requester position. Missing or unparsable
/// positions on either side count as the relevance ceiling distance.
pub fn score_breakdown(coach: &Coach, requested_skills: &[i32], requester: Option<Coordinates>) -> ScoreBreakdown {
    let coach_position = coach.location.as_deref().and_then(parse_coordinates);
    let distance_km = match (coach_position, requester) {
        (Some(coach_position), Some(requester)) => distance_km(requester, coach_position),
        _ => MAX_RELEVANT_DISTANCE_KM,
    };

    let closeness = closeness(distance_km);
    let matched_skills = skill_match_count(coach, requested_skills);
    let skill_score = skill_score(matched_skills);
    let total = DISTANCE_WEIGHT * closeness + SKILL_WEIGHT * skill_score;

    debug!(
        coach_id = coach.id,
        distance_km, closeness, matched_skills, skill_score, total, "Scored coach"
    );

    ScoreBreakdown {
        distance_km,
        closeness,
        matched_skills,
        skill_score,
        total,
    }
}

/// Composite compatibility in [0, 1]: 0.7 closeness + 0.3 skill overlap.
pub fn score(coach: &Coach, requested_skills: &[i32], requester_lat: f64, requester_lng: f64) -> f64 {
    let requester = Coordinates::new(requester_lat, requester_lng);
    score_breakdown(coach, requested_skills, requester).total
}

/// Coaches with their scores, best first. Equal scores keep input order.
pub fn rank_scored(coaches: Vec<Coach>, requested_skills: &[i32], requester_location: &str) -> Vec<(Coach, ScoreBreakdown)> {
    let requester = parse_coordinates(requester_location);
    if requester.is_none() {
        debug!("Requester location {:?} is unparsable, ranking on skills only", requester_location);
    }

    let mut scored: Vec<(Coach, ScoreBreakdown)> = coaches
        .into_iter()
        .map(|coach| {
            let breakdown = score_breakdown(&coach, requested_skills, requester);
            (coach, breakdown)
        })
        .collect();

    scored.sort_by(|(_, a), (_, b)| b.total.total_cmp(&a.total));
    scored
}

pub fn rank(coaches: Vec<Coach>, requested_skills: &[i32], requester_location: &str) -> Vec<Coach> {
    rank_scored(coaches, requested_skills, requester_location)
        .into_iter()
        .map(|(coach, _)| coach)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoachSkill, SkillLevel};

    fn coach(id: i32, location: Option<&str>, skills: &[i32]) -> Coach {
        Coach {
            id,
            first_name: None,
            last_name: None,
            location: location.map(str::to_string),
            skills: skills
                .iter()
                .map(|&skill_id| CoachSkill { skill_id, level: SkillLevel::Intermediate })
                .collect(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_same_spot_two_of_three_skills() {
        let coach = coach(1, Some("Latitude: 0, Longitude: 0"), &[1, 2, 9]);
        let total = score(&coach, &[1, 2, 3], 0.0, 0.0);
        assert!(approx(total, 0.82), "got {}", total);
    }

    #[test]
    fn test_no_location_no_skills_scores_zero() {
        let coach = coach(1, None, &[7]);
        let breakdown = score_breakdown(&coach, &[1, 2], Coordinates::new(44.0, -93.0));
        assert_eq!(breakdown.distance_km, MAX_RELEVANT_DISTANCE_KM);
        assert_eq!(breakdown.closeness, 0.0);
        assert_eq!(breakdown.total, 0.0);
    }

    #[test]
    fn test_unparsable_coach_location_uses_ceiling() {
        let coach = coach(1, Some("Ames, Iowa"), &[1]);
        let breakdown = score_breakdown(&coach, &[1], Coordinates::new(0.0, 0.0));
        assert_eq!(breakdown.closeness, 0.0);
        assert!(approx(breakdown.total, 0.3 * 0.2));
    }

    #[test]
    fn test_skill_term_saturates_at_five() {
        let coach = coach(1, None, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(skill_match_count(&coach, &[1, 2, 3, 4, 5, 6, 7]), 7);
        let breakdown = score_breakdown(&coach, &[1, 2, 3, 4, 5, 6, 7], None);
        assert_eq!(breakdown.skill_score, 1.0);
        assert!(approx(breakdown.total, 0.3));
    }

    #[test]
    fn test_duplicate_requested_skills_count_once() {
        let coach = coach(1, None, &[1]);
        assert_eq!(skill_match_count(&coach, &[1, 1, 1]), 1);
        assert_eq!(skill_match_count(&coach, &[]), 0);
    }

    #[test]
    fn test_closeness_is_linear_and_clamped() {
        assert_eq!(closeness(0.0), 1.0);
        assert!(approx(closeness(150.0), 0.5));
        assert_eq!(closeness(300.0), 0.0);
        assert_eq!(closeness(5000.0), 0.0);
    }

    #[test]
    fn test_score_monotonic_and_bounded() {
        let skills = [1, 2, 3, 4, 5, 6];
        let mut previous = f64::INFINITY;
        for lat in [0.0, 0.5, 1.0, 2.0, 3.0, 10.0] {
            let location = format!("{},0", lat);
            let total = score(&coach(1, Some(&location), &[1, 2]), &skills, 0.0, 0.0);
            assert!(total <= previous);
            assert!((0.0..=1.0).contains(&total));
            previous = total;
        }

        let mut previous = f64::NEG_INFINITY;
        for matched in 0..=6 {
            let owned: Vec<i32> = skills[..matched].to_vec();
            let total = score(&coach(1, Some("0,0"), &owned), &skills, 0.0, 0.0);
            assert!(total >= previous);
            assert!((0.0..=1.0).contains(&total));
            previous = total;
        }
    }

    #[test]
    fn test_rank_orders_best_first() {
        let near_no_skills = coach(1, Some("44.98,-93.27"), &[]);
        let far_all_skills = coach(2, Some("0,0"), &[1, 2, 3, 4, 5]);
        let near_some_skills = coach(3, Some("44.95,-93.09"), &[1, 2]);
        let nowhere = coach(4, None, &[]);

        let ranked = rank(
            vec![nowhere, far_all_skills, near_no_skills, near_some_skills],
            &[1, 2, 3, 4, 5],
            "Latitude: 44.98, Longitude: -93.27",
        );

        let ids: Vec<i32> = ranked.iter().map(|coach| coach.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_rank_keeps_input_order_on_ties() {
        let coaches = vec![coach(5, None, &[]), coach(2, None, &[]), coach(9, None, &[])];
        let ids: Vec<i32> = rank(coaches, &[1], "0,0").iter().map(|coach| coach.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_rank_single_and_repeatable() {
        let only = coach(1, Some("1,1"), &[1]);
        assert_eq!(rank(vec![only.clone()], &[1], "0,0"), vec![only]);

        let coaches = vec![coach(1, Some("2,2"), &[1]), coach(2, Some("1,1"), &[]), coach(3, None, &[1, 2])];
        let first = rank(coaches.clone(), &[1, 2], "0,0");
        let second = rank(coaches, &[1, 2], "0,0");
        assert_eq!(first, second);
    }

    #[test]
    fn test_rank_with_unparsable_requester_uses_skills() {
        let coaches = vec![coach(1, Some("0,0"), &[]), coach(2, Some("0,0"), &[1])];
        let ranked = rank_scored(coaches, &[1], "somewhere nice");
        assert_eq!(ranked[0].0.id, 2);
        assert_eq!(ranked[0].1.closeness, 0.0);
    }
}
