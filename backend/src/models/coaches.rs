use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Ordered from least to most experienced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "BEGINNER",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Advanced => "ADVANCED",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BEGINNER" => Ok(SkillLevel::Beginner),
            "INTERMEDIATE" => Ok(SkillLevel::Intermediate),
            "ADVANCED" => Ok(SkillLevel::Advanced),
            other => Err(format!("unknown skill level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct CoachSkill {
    pub skill_id: i32,
    pub level: SkillLevel,
}

/// A coach as the matching engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coach {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Stored coordinate string, e.g. "Latitude: 42.02, Longitude: -93.64" or "42.02,-93.64".
    pub location: Option<String>,
    pub skills: Vec<CoachSkill>,
}

impl Coach {
    pub fn has_skill(&self, skill_id: i32) -> bool {
        self.skills.iter().any(|skill| skill.skill_id == skill_id)
    }

    pub fn skill_level(&self, skill_id: i32) -> Option<SkillLevel> {
        self.skills
            .iter()
            .find(|skill| skill.skill_id == skill_id)
            .map(|skill| skill.level)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CoachRow {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CoachSkillRow {
    pub coach_id: i32,
    pub skill_id: i32,
    pub level: SkillLevel,
}

/// Coach paired with a human readable place for display.
#[derive(Debug, Clone, Serialize)]
pub struct CoachListing {
    pub coach: Coach,
    pub place: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_levels_order_by_experience() {
        assert!(SkillLevel::Beginner < SkillLevel::Intermediate);
        assert!(SkillLevel::Intermediate < SkillLevel::Advanced);
        assert_eq!(SkillLevel::Advanced.max(SkillLevel::Beginner), SkillLevel::Advanced);
    }

    #[test]
    fn test_parse_skill_level() {
        assert_eq!("advanced".parse::<SkillLevel>(), Ok(SkillLevel::Advanced));
        assert_eq!(" Beginner ".parse::<SkillLevel>(), Ok(SkillLevel::Beginner));
        assert!("expert".parse::<SkillLevel>().is_err());
        assert_eq!(SkillLevel::Intermediate.to_string(), "INTERMEDIATE");
    }
}
