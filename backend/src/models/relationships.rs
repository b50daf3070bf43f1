use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::actors::{ActorRef, ActorRole};

/// The durable member <-> coach link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromRow)]
pub struct MemberCoach {
    pub member_id: i32,
    pub coach_id: i32,
}

impl MemberCoach {
    pub fn new(member_id: i32, coach_id: i32) -> Self {
        Self { member_id, coach_id }
    }

    /// Orders an actor pair into (member, coach). Returns `None` unless
    /// exactly one side is a member and the other a coach.
    pub fn from_actors(a: ActorRef, b: ActorRef) -> Option<Self> {
        match (a.role, b.role) {
            (ActorRole::Member, ActorRole::Coach) => Some(Self::new(a.id, b.id)),
            (ActorRole::Coach, ActorRole::Member) => Some(Self::new(b.id, a.id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_actors_either_direction() {
        let link = MemberCoach::from_actors(ActorRef::member(1), ActorRef::coach(5)).unwrap();
        assert_eq!(link, MemberCoach::new(1, 5));

        let link = MemberCoach::from_actors(ActorRef::coach(5), ActorRef::member(1)).unwrap();
        assert_eq!(link, MemberCoach::new(1, 5));
    }

    #[test]
    fn test_from_actors_same_role() {
        assert!(MemberCoach::from_actors(ActorRef::member(1), ActorRef::member(2)).is_none());
        assert!(MemberCoach::from_actors(ActorRef::coach(1), ActorRef::coach(2)).is_none());
    }
}
