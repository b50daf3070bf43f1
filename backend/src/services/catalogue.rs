//! Skill-level filters over the coach catalogue.

use anyhow::{ensure, Result};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{Coach, SkillLevel};

/// Coaches holding `skill_id` at `min_level` or above, in catalogue order.
pub fn coaches_by_min_level(coaches: &[Coach], skill_id: i32, min_level: SkillLevel) -> Vec<Coach> {
    coaches
        .iter()
        .filter(|coach| coach.skill_level(skill_id).is_some_and(|level| level >= min_level))
        .cloned()
        .collect()
}

/// Coaches meeting every `(skill_ids[i], min_levels[i])` requirement.
///
/// The two slices pair up by position and must be the same length. No
/// requirements means no filtering.
pub fn coaches_by_min_levels(
    coaches: Vec<Coach>,
    skill_ids: &[i32],
    min_levels: &[SkillLevel],
) -> Result<Vec<Coach>> {
    ensure!(
        skill_ids.len() == min_levels.len(),
        "got {} skill ids but {} minimum levels",
        skill_ids.len(),
        min_levels.len()
    );

    let total = coaches.len();
    let qualified: Vec<Coach> = coaches
        .into_iter()
        .filter(|coach| {
            skill_ids
                .iter()
                .zip(min_levels)
                .all(|(&skill_id, &min_level)| {
                    coach.skill_level(skill_id).is_some_and(|level| level >= min_level)
                })
        })
        .collect();

    debug!("{} of {} coaches meet the skill level requirements", qualified.len(), total);
    Ok(qualified)
}

/// Coaches that teach `skill_id`, bucketed by the level they teach it at.
pub fn coaches_grouped_by_level(coaches: &[Coach], skill_id: i32) -> BTreeMap<SkillLevel, Vec<Coach>> {
    let mut grouped: BTreeMap<SkillLevel, Vec<Coach>> = BTreeMap::new();
    for coach in coaches {
        if let Some(level) = coach.skill_level(skill_id) {
            grouped.entry(level).or_default().push(coach.clone());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoachSkill;

    fn coach(id: i32, skills: &[(i32, SkillLevel)]) -> Coach {
        Coach {
            id,
            first_name: None,
            last_name: None,
            location: None,
            skills: skills
                .iter()
                .map(|&(skill_id, level)| CoachSkill { skill_id, level })
                .collect(),
        }
    }

    fn ids(coaches: &[Coach]) -> Vec<i32> {
        coaches.iter().map(|coach| coach.id).collect()
    }

    fn catalogue() -> Vec<Coach> {
        vec![
            coach(1, &[(10, SkillLevel::Beginner), (20, SkillLevel::Advanced)]),
            coach(2, &[(10, SkillLevel::Advanced)]),
            coach(3, &[(10, SkillLevel::Intermediate), (20, SkillLevel::Intermediate)]),
            coach(4, &[(20, SkillLevel::Beginner)]),
        ]
    }

    #[test]
    fn test_min_level_is_inclusive() {
        let coaches = catalogue();

        assert_eq!(ids(&coaches_by_min_level(&coaches, 10, SkillLevel::Beginner)), vec![1, 2, 3]);
        assert_eq!(ids(&coaches_by_min_level(&coaches, 10, SkillLevel::Intermediate)), vec![2, 3]);
        assert_eq!(ids(&coaches_by_min_level(&coaches, 10, SkillLevel::Advanced)), vec![2]);
        assert!(coaches_by_min_level(&coaches, 99, SkillLevel::Beginner).is_empty());
    }

    #[test]
    fn test_min_levels_intersect_requirements() {
        let qualified = coaches_by_min_levels(
            catalogue(),
            &[10, 20],
            &[SkillLevel::Intermediate, SkillLevel::Intermediate],
        )
        .unwrap();
        assert_eq!(ids(&qualified), vec![3]);

        let qualified = coaches_by_min_levels(
            catalogue(),
            &[10, 20],
            &[SkillLevel::Beginner, SkillLevel::Advanced],
        )
        .unwrap();
        assert_eq!(ids(&qualified), vec![1]);
    }

    #[test]
    fn test_min_levels_without_requirements_keeps_everyone() {
        let qualified = coaches_by_min_levels(catalogue(), &[], &[]).unwrap();
        assert_eq!(ids(&qualified), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_min_levels_rejects_mismatched_lengths() {
        let result = coaches_by_min_levels(catalogue(), &[10, 20], &[SkillLevel::Advanced]);
        assert!(result.is_err());
    }

    #[test]
    fn test_grouped_by_level() {
        let grouped = coaches_grouped_by_level(&catalogue(), 20);

        assert_eq!(grouped.len(), 3);
        assert_eq!(ids(&grouped[&SkillLevel::Beginner]), vec![4]);
        assert_eq!(ids(&grouped[&SkillLevel::Intermediate]), vec![3]);
        assert_eq!(ids(&grouped[&SkillLevel::Advanced]), vec![1]);
        assert!(coaches_grouped_by_level(&catalogue(), 99).is_empty());
    }
}
