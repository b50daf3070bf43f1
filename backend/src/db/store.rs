use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    ActorRef, MemberCoach, NewRequest, Party, ProfileSnapshot, Request, RequestKind, RequestStatus,
};

/// A guarded status change: applies only while the request is still
/// PENDING and `acting_id` owns the given side of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub request_id: i32,
    pub party: Party,
    pub acting_id: i32,
    pub target: RequestStatus,
    /// Link to create in the same unit of work once the status write lands.
    pub link: Option<MemberCoach>,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Stores a new PENDING request. Returns `None` when storage already
    /// holds a pending connection request for the same member/coach pair.
    async fn insert_request(&self, new: NewRequest) -> Result<Option<Request>>;

    async fn get_request(&self, id: i32) -> Result<Option<Request>>;

    /// Pending connection request between `a` and `b`, sent by either side.
    async fn find_pending_connection(&self, a: ActorRef, b: ActorRef) -> Result<Option<Request>>;

    async fn list_pending_for_receiver(
        &self,
        receiver: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>>;

    async fn list_pending_sent_by(
        &self,
        sender: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>>;

    /// Compare-and-set on status. `Ok(false)` means nothing matched: the
    /// request is gone, not PENDING any more, or owned by someone else.
    async fn apply_transition(&self, transition: &Transition) -> Result<bool>;

    async fn relationship_exists(&self, link: MemberCoach) -> Result<bool>;

    async fn coaches_of_member(&self, member_id: i32) -> Result<Vec<i32>>;

    async fn members_of_coach(&self, coach_id: i32) -> Result<Vec<i32>>;
}

/// Read-only access to member and coach profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile(&self, actor: ActorRef) -> Result<Option<ProfileSnapshot>>;
}
