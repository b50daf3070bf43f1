use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::actors::{ActorRef, ActorRole, ProfileSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Connection,
    Session,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Connection => f.write_str("CONNECTION"),
            RequestKind::Session => f.write_str("SESSION"),
        }
    }
}

/// Which side of a request is allowed to drive a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Receiver,
}

/// Meeting proposal carried only by session requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetails {
    pub candidate_dates: [NaiveDate; 3],
    pub candidate_times: [NaiveTime; 3],
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i32,
    pub kind: RequestKind,
    pub sender: ActorRef,
    pub receiver: ActorRef,
    pub sender_profile: ProfileSnapshot,
    pub receiver_profile: ProfileSnapshot,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub session: Option<SessionDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    pub fn owner(&self, party: Party) -> ActorRef {
        match party {
            Party::Sender => self.sender,
            Party::Receiver => self.receiver,
        }
    }

    /// True when this request links the same two actors as `a` and `b`,
    /// regardless of who sent it.
    pub fn is_between(&self, a: ActorRef, b: ActorRef) -> bool {
        (self.sender == a && self.receiver == b) || (self.sender == b && self.receiver == a)
    }
}

/// A request ready to be stored; ids and timestamps are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub kind: RequestKind,
    pub sender: ActorRef,
    pub receiver: ActorRef,
    pub sender_profile: ProfileSnapshot,
    pub receiver_profile: ProfileSnapshot,
    pub message: Option<String>,
    pub session: Option<SessionDetails>,
}

/// Flat row shape of the `requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestRow {
    pub id: i32,
    pub kind: RequestKind,
    pub sender_role: ActorRole,
    pub sender_id: i32,
    pub receiver_role: ActorRole,
    pub receiver_id: i32,
    pub sender_first_name: Option<String>,
    pub sender_last_name: Option<String>,
    pub sender_profile_pic: Option<String>,
    pub receiver_first_name: Option<String>,
    pub receiver_last_name: Option<String>,
    pub receiver_profile_pic: Option<String>,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub session_date_1: Option<NaiveDate>,
    pub session_date_2: Option<NaiveDate>,
    pub session_date_3: Option<NaiveDate>,
    pub session_time_1: Option<NaiveTime>,
    pub session_time_2: Option<NaiveTime>,
    pub session_time_3: Option<NaiveTime>,
    pub session_location: Option<String>,
    pub session_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for Request {
    type Error = anyhow::Error;

    fn try_from(row: RequestRow) -> Result<Self> {
        let session = match row.kind {
            RequestKind::Connection => None,
            RequestKind::Session => {
                let missing = || anyhow!("session request {} is missing session columns", row.id);
                Some(SessionDetails {
                    candidate_dates: [
                        row.session_date_1.ok_or_else(missing)?,
                        row.session_date_2.ok_or_else(missing)?,
                        row.session_date_3.ok_or_else(missing)?,
                    ],
                    candidate_times: [
                        row.session_time_1.ok_or_else(missing)?,
                        row.session_time_2.ok_or_else(missing)?,
                        row.session_time_3.ok_or_else(missing)?,
                    ],
                    location: row.session_location.clone().ok_or_else(missing)?,
                    description: row.session_description.clone().ok_or_else(missing)?,
                })
            }
        };

        Ok(Request {
            id: row.id,
            kind: row.kind,
            sender: ActorRef { role: row.sender_role, id: row.sender_id },
            receiver: ActorRef { role: row.receiver_role, id: row.receiver_id },
            sender_profile: ProfileSnapshot {
                first_name: row.sender_first_name,
                last_name: row.sender_last_name,
                profile_pic: row.sender_profile_pic,
            },
            receiver_profile: ProfileSnapshot {
                first_name: row.receiver_first_name,
                last_name: row.receiver_last_name,
                profile_pic: row.receiver_profile_pic,
            },
            status: row.status,
            message: row.message,
            session,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
