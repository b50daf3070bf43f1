pub mod actors;
pub mod coaches;
pub mod relationships;
pub mod requests;

pub use actors::{ActorRef, ActorRole, ProfileSnapshot};
pub use coaches::{Coach, CoachListing, CoachSkill, SkillLevel};
pub use relationships::MemberCoach;
pub use requests::{NewRequest, Party, Request, RequestKind, RequestStatus, SessionDetails};
