use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

use super::store::{ProfileDirectory, RequestStore, Transition};
use crate::models::{
    ActorRef, MemberCoach, NewRequest, Party, ProfileSnapshot, Request, RequestKind, RequestStatus,
};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i32,
    requests: Vec<Request>,
    relationships: BTreeSet<MemberCoach>,
    profiles: HashMap<ActorRef, ProfileSnapshot>,
}

impl MemoryState {
    fn pending_connection(&self, a: ActorRef, b: ActorRef) -> Option<&Request> {
        self.requests.iter().find(|request| {
            request.kind == RequestKind::Connection
                && request.status == RequestStatus::Pending
                && request.is_between(a, b)
        })
    }

    fn pending_where(
        &self,
        side: Party,
        actor: ActorRef,
        kind: Option<RequestKind>,
    ) -> Vec<Request> {
        self.requests
            .iter()
            .filter(|request| request.status == RequestStatus::Pending)
            .filter(|request| request.owner(side) == actor)
            .filter(|request| kind.is_none_or(|kind| request.kind == kind))
            .cloned()
            .collect()
    }
}

/// In-process request and profile storage.
///
/// Every check-and-write runs under a single lock, so it gives the same
/// atomicity guarantees as the Postgres store's conditional updates.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, actor: ActorRef, profile: ProfileSnapshot) -> Self {
        self.state.get_mut().profiles.insert(actor, profile);
        self
    }

    pub async fn relationships(&self) -> Vec<MemberCoach> {
        self.state.lock().await.relationships.iter().copied().collect()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(&self, new: NewRequest) -> Result<Option<Request>> {
        let mut state = self.state.lock().await;

        if new.kind == RequestKind::Connection
            && state.pending_connection(new.sender, new.receiver).is_some()
        {
            return Ok(None);
        }

        state.next_id += 1;
        let now = Utc::now();
        let request = Request {
            id: state.next_id,
            kind: new.kind,
            sender: new.sender,
            receiver: new.receiver,
            sender_profile: new.sender_profile,
            receiver_profile: new.receiver_profile,
            status: RequestStatus::Pending,
            message: new.message,
            session: new.session,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());

        Ok(Some(request))
    }

    async fn get_request(&self, id: i32) -> Result<Option<Request>> {
        let state = self.state.lock().await;
        Ok(state.requests.iter().find(|request| request.id == id).cloned())
    }

    async fn find_pending_connection(&self, a: ActorRef, b: ActorRef) -> Result<Option<Request>> {
        let state = self.state.lock().await;
        Ok(state.pending_connection(a, b).cloned())
    }

    async fn list_pending_for_receiver(
        &self,
        receiver: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>> {
        let state = self.state.lock().await;
        Ok(state.pending_where(Party::Receiver, receiver, kind))
    }

    async fn list_pending_sent_by(
        &self,
        sender: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>> {
        let state = self.state.lock().await;
        Ok(state.pending_where(Party::Sender, sender, kind))
    }

    async fn apply_transition(&self, transition: &Transition) -> Result<bool> {
        let mut state = self.state.lock().await;

        let Some(request) = state.requests.iter_mut().find(|request| {
            request.id == transition.request_id
                && request.status == RequestStatus::Pending
                && request.owner(transition.party).id == transition.acting_id
        }) else {
            return Ok(false);
        };

        request.status = transition.target;
        request.updated_at = Utc::now();

        if let Some(link) = transition.link {
            state.relationships.insert(link);
        }

        Ok(true)
    }

    async fn relationship_exists(&self, link: MemberCoach) -> Result<bool> {
        Ok(self.state.lock().await.relationships.contains(&link))
    }

    async fn coaches_of_member(&self, member_id: i32) -> Result<Vec<i32>> {
        let state = self.state.lock().await;
        Ok(state
            .relationships
            .iter()
            .filter(|link| link.member_id == member_id)
            .map(|link| link.coach_id)
            .collect())
    }

    async fn members_of_coach(&self, coach_id: i32) -> Result<Vec<i32>> {
        let state = self.state.lock().await;
        let mut members: Vec<i32> = state
            .relationships
            .iter()
            .filter(|link| link.coach_id == coach_id)
            .map(|link| link.member_id)
            .collect();
        members.sort_unstable();
        Ok(members)
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn profile(&self, actor: ActorRef) -> Result<Option<ProfileSnapshot>> {
        Ok(self.state.lock().await.profiles.get(&actor).cloned())
    }
}
