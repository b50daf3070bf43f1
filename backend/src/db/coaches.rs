use crate::models::coaches::{CoachRow, CoachSkillRow};
use crate::models::{Coach, CoachSkill};
use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashMap;

// Coach catalogue reads used by the matching engine
pub async fn list_coaches(pool: &PgPool) -> Result<Vec<Coach>> {
    let coaches = sqlx::query_as::<_, CoachRow>(
        r#"
        SELECT id, first_name, last_name, location
        FROM coaches
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let skills = sqlx::query_as::<_, CoachSkillRow>(
        r#"
        SELECT coach_id, skill_id, level
        FROM coach_skills
        ORDER BY coach_id, skill_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(attach_skills(coaches, skills))
}

pub async fn get_coach(pool: &PgPool, coach_id: i32) -> Result<Option<Coach>> {
    let coach = sqlx::query_as::<_, CoachRow>(
        r#"
        SELECT id, first_name, last_name, location
        FROM coaches
        WHERE id = $1
        "#,
    )
    .bind(coach_id)
    .fetch_optional(pool)
    .await?;

    let Some(coach) = coach else {
        return Ok(None);
    };

    let skills = sqlx::query_as::<_, CoachSkillRow>(
        r#"
        SELECT coach_id, skill_id, level
        FROM coach_skills
        WHERE coach_id = $1
        ORDER BY skill_id
        "#,
    )
    .bind(coach_id)
    .fetch_all(pool)
    .await?;

    Ok(attach_skills(vec![coach], skills).pop())
}

/// Looks up skill ids by title, case-insensitively. Unknown titles are skipped.
pub async fn find_skill_ids(pool: &PgPool, titles: &[String]) -> Result<Vec<i32>> {
    let lowered: Vec<String> = titles.iter().map(|title| title.trim().to_lowercase()).collect();

    let ids = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM skills WHERE LOWER(title) = ANY($1) ORDER BY id",
    )
    .bind(&lowered)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

fn attach_skills(coaches: Vec<CoachRow>, skills: Vec<CoachSkillRow>) -> Vec<Coach> {
    let mut by_coach: HashMap<i32, Vec<CoachSkill>> = HashMap::new();
    for row in skills {
        by_coach.entry(row.coach_id).or_default().push(CoachSkill {
            skill_id: row.skill_id,
            level: row.level,
        });
    }

    coaches
        .into_iter()
        .map(|row| Coach {
            skills: by_coach.remove(&row.id).unwrap_or_default(),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            location: row.location,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkillLevel;

    #[test]
    fn test_attach_skills_groups_by_coach() {
        let coaches = vec![
            CoachRow { id: 1, first_name: None, last_name: None, location: None },
            CoachRow { id: 2, first_name: None, last_name: None, location: Some("0,0".to_string()) },
        ];
        let skills = vec![
            CoachSkillRow { coach_id: 2, skill_id: 10, level: SkillLevel::Advanced },
            CoachSkillRow { coach_id: 2, skill_id: 11, level: SkillLevel::Beginner },
        ];

        let coaches = attach_skills(coaches, skills);
        assert_eq!(coaches.len(), 2);
        assert!(coaches[0].skills.is_empty());
        assert_eq!(coaches[1].skills.len(), 2);
        assert!(coaches[1].has_skill(11));
        assert_eq!(coaches[1].location.as_deref(), Some("0,0"));
    }
}
