use anyhow::anyhow;
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::{MAX_MESSAGE_LENGTH, MAX_SESSION_FIELD_LENGTH};
use crate::db::{ProfileDirectory, RequestStore, Transition};
use crate::error::{RequestError, RequestResult};
use crate::models::{
    ActorRef, MemberCoach, NewRequest, Party, ProfileSnapshot, Request, RequestKind, RequestStatus,
    SessionDetails,
};

/// Creates connection/session requests and drives them through
/// PENDING -> ACCEPTED | REJECTED | CANCELLED.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn RequestStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl RequestService {
    pub fn new(store: Arc<dyn RequestStore>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self { store, profiles }
    }

    /// Uses one backend for both requests and profile lookups.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RequestStore + ProfileDirectory + 'static,
    {
        Self {
            store: store.clone(),
            profiles: store,
        }
    }

    // Creation

    pub async fn create_connection_request(
        &self,
        sender: ActorRef,
        receiver: ActorRef,
        message: Option<String>,
    ) -> RequestResult<Request> {
        let link = member_coach_pair(sender, receiver)?;
        let message = normalize_message(message)?;

        // Best-effort read check; the storage layer backs it with a unique
        // index, so a concurrent duplicate still comes back as None below.
        if let Some(existing) = self.store.find_pending_connection(sender, receiver).await? {
            return Err(RequestError::Conflict(format!(
                "connection request {} between {} and {} is already pending",
                existing.id, sender, receiver
            )));
        }

        if self.store.relationship_exists(link).await? {
            return Err(RequestError::Conflict(format!(
                "member {} and coach {} are already connected",
                link.member_id, link.coach_id
            )));
        }

        let new = NewRequest {
            kind: RequestKind::Connection,
            sender,
            receiver,
            sender_profile: self.snapshot(sender).await?,
            receiver_profile: self.snapshot(receiver).await?,
            message,
            session: None,
        };

        let Some(request) = self.store.insert_request(new).await? else {
            return Err(RequestError::Conflict(format!(
                "a connection request between {} and {} is already pending",
                sender, receiver
            )));
        };

        info!(request_id = request.id, %sender, %receiver, "Created connection request");
        Ok(request)
    }

    pub async fn create_session_request(
        &self,
        sender: ActorRef,
        receiver: ActorRef,
        message: Option<String>,
        session: SessionDetails,
    ) -> RequestResult<Request> {
        member_coach_pair(sender, receiver)?;
        let message = normalize_message(message)?;
        let session = validate_session(session)?;

        let new = NewRequest {
            kind: RequestKind::Session,
            sender,
            receiver,
            sender_profile: self.snapshot(sender).await?,
            receiver_profile: self.snapshot(receiver).await?,
            message,
            session: Some(session),
        };

        let request = self
            .store
            .insert_request(new)
            .await?
            .ok_or_else(|| anyhow!("session request between {} and {} was refused by storage", sender, receiver))?;

        info!(request_id = request.id, %sender, %receiver, "Created session request");
        Ok(request)
    }

    // Transitions

    /// Receiver accepts. Accepting a connection request also links the
    /// member and coach, in the same unit of work as the status change.
    pub async fn accept(&self, request_id: i32, acting_receiver_id: i32) -> RequestResult<bool> {
        let Some(request) = self
            .eligible(request_id, Party::Receiver, acting_receiver_id)
            .await?
        else {
            return Ok(false);
        };

        let link = match request.kind {
            RequestKind::Connection => Some(member_coach_pair(request.sender, request.receiver)?),
            RequestKind::Session => None,
        };

        self.transition(Transition {
            request_id,
            party: Party::Receiver,
            acting_id: acting_receiver_id,
            target: RequestStatus::Accepted,
            link,
        })
        .await
    }

    pub async fn decline(&self, request_id: i32, acting_receiver_id: i32) -> RequestResult<bool> {
        if self
            .eligible(request_id, Party::Receiver, acting_receiver_id)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        self.transition(Transition {
            request_id,
            party: Party::Receiver,
            acting_id: acting_receiver_id,
            target: RequestStatus::Rejected,
            link: None,
        })
        .await
    }

    pub async fn cancel(&self, request_id: i32, acting_sender_id: i32) -> RequestResult<bool> {
        if self
            .eligible(request_id, Party::Sender, acting_sender_id)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        self.transition(Transition {
            request_id,
            party: Party::Sender,
            acting_id: acting_sender_id,
            target: RequestStatus::Cancelled,
            link: None,
        })
        .await
    }

    // Queries

    pub async fn get_request(&self, request_id: i32) -> RequestResult<Request> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| RequestError::NotFound(format!("request {}", request_id)))
    }

    pub async fn list_pending_for_receiver(
        &self,
        receiver: ActorRef,
        kind: Option<RequestKind>,
    ) -> RequestResult<Vec<Request>> {
        Ok(self.store.list_pending_for_receiver(receiver, kind).await?)
    }

    pub async fn list_pending_sent_by(
        &self,
        sender: ActorRef,
        kind: Option<RequestKind>,
    ) -> RequestResult<Vec<Request>> {
        Ok(self.store.list_pending_sent_by(sender, kind).await?)
    }

    pub async fn coaches_of_member(&self, member_id: i32) -> RequestResult<Vec<i32>> {
        Ok(self.store.coaches_of_member(member_id).await?)
    }

    pub async fn members_of_coach(&self, coach_id: i32) -> RequestResult<Vec<i32>> {
        Ok(self.store.members_of_coach(coach_id).await?)
    }

    // Internals

    /// Read-side pre-check so rejections can be logged with a reason. The
    /// conditional write in `transition` remains the source of truth.
    async fn eligible(&self, request_id: i32, party: Party, acting_id: i32) -> RequestResult<Option<Request>> {
        let Some(request) = self.store.get_request(request_id).await? else {
            warn!(request_id, acting_id, "Transition on unknown request");
            return Ok(None);
        };

        if request.owner(party).id != acting_id {
            warn!(request_id, acting_id, ?party, "Transition by an actor that does not own the request");
            return Ok(None);
        }

        if request.status.is_terminal() {
            warn!(request_id, acting_id, status = %request.status, "Transition on a request that is no longer pending");
            return Ok(None);
        }

        Ok(Some(request))
    }

    async fn transition(&self, transition: Transition) -> RequestResult<bool> {
        let applied = self.store.apply_transition(&transition).await?;

        if applied {
            info!(
                request_id = transition.request_id,
                status = %transition.target,
                linked = transition.link.is_some(),
                "Request transitioned"
            );
        } else {
            warn!(
                request_id = transition.request_id,
                target = %transition.target,
                "Request changed concurrently, transition not applied"
            );
        }

        Ok(applied)
    }

    async fn snapshot(&self, actor: ActorRef) -> RequestResult<ProfileSnapshot> {
        self.profiles
            .profile(actor)
            .await?
            .ok_or_else(|| RequestError::NotFound(format!("profile {}", actor)))
    }
}

fn member_coach_pair(a: ActorRef, b: ActorRef) -> RequestResult<MemberCoach> {
    MemberCoach::from_actors(a, b).ok_or_else(|| {
        RequestError::InvalidArgument(format!(
            "requests must be between one member and one coach, got {} and {}",
            a, b
        ))
    })
}

fn normalize_message(message: Option<String>) -> RequestResult<Option<String>> {
    let message = message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    if let Some(message) = &message {
        check_length("message", message, MAX_MESSAGE_LENGTH)?;
    }

    Ok(message)
}

fn validate_session(session: SessionDetails) -> RequestResult<SessionDetails> {
    let location = session.location.trim().to_string();
    let description = session.description.trim().to_string();

    if location.is_empty() {
        return Err(RequestError::InvalidArgument("session location is required".to_string()));
    }
    if description.is_empty() {
        return Err(RequestError::InvalidArgument("session description is required".to_string()));
    }
    check_length("session location", &location, MAX_SESSION_FIELD_LENGTH)?;
    check_length("session description", &description, MAX_SESSION_FIELD_LENGTH)?;

    Ok(SessionDetails {
        location,
        description,
        ..session
    })
}

fn check_length(field: &str, value: &str, max: usize) -> RequestResult<()> {
    let length = value.chars().count();
    if length > max {
        return Err(RequestError::InvalidArgument(format!(
            "{} is {} characters, the limit is {}",
            field, length, max
        )));
    }
    Ok(())
}
