use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{ProfileDirectory, RequestStore, Transition};
use crate::models::requests::RequestRow;
use crate::models::{
    ActorRef, ActorRole, MemberCoach, NewRequest, Party, ProfileSnapshot, Request, RequestKind,
};

const REQUEST_COLUMNS: &str = r#"
    id, kind, sender_role, sender_id, receiver_role, receiver_id,
    sender_first_name, sender_last_name, sender_profile_pic,
    receiver_first_name, receiver_last_name, receiver_profile_pic,
    status, message,
    session_date_1, session_date_2, session_date_3,
    session_time_1, session_time_2, session_time_3,
    session_location, session_description,
    created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_pending(
        &self,
        side: Party,
        actor: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>> {
        let (role_column, id_column) = match side {
            Party::Sender => ("sender_role", "sender_id"),
            Party::Receiver => ("receiver_role", "receiver_id"),
        };
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE status = 'PENDING' AND {role_column} = $1 AND {id_column} = $2
            AND ($3::request_kind IS NULL OR kind = $3)
            ORDER BY id ASC
            "#
        );

        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(actor.role)
            .bind(actor.id)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Request::try_from).collect()
    }
}

#[async_trait]
impl RequestStore for PgStore {
    async fn insert_request(&self, new: NewRequest) -> Result<Option<Request>> {
        let session = new.session.as_ref();
        let sql = format!(
            r#"
            INSERT INTO requests (
                kind, sender_role, sender_id, receiver_role, receiver_id,
                sender_first_name, sender_last_name, sender_profile_pic,
                receiver_first_name, receiver_last_name, receiver_profile_pic,
                status, message,
                session_date_1, session_date_2, session_date_3,
                session_time_1, session_time_2, session_time_3,
                session_location, session_description,
                created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                'PENDING', $12, $13, $14, $15, $16, $17, $18, $19, $20,
                NOW(), NOW()
            )
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(new.kind)
            .bind(new.sender.role)
            .bind(new.sender.id)
            .bind(new.receiver.role)
            .bind(new.receiver.id)
            .bind(&new.sender_profile.first_name)
            .bind(&new.sender_profile.last_name)
            .bind(&new.sender_profile.profile_pic)
            .bind(&new.receiver_profile.first_name)
            .bind(&new.receiver_profile.last_name)
            .bind(&new.receiver_profile.profile_pic)
            .bind(&new.message)
            .bind(session.map(|s| s.candidate_dates[0]))
            .bind(session.map(|s| s.candidate_dates[1]))
            .bind(session.map(|s| s.candidate_dates[2]))
            .bind(session.map(|s| s.candidate_times[0]))
            .bind(session.map(|s| s.candidate_times[1]))
            .bind(session.map(|s| s.candidate_times[2]))
            .bind(session.map(|s| s.location.as_str()))
            .bind(session.map(|s| s.description.as_str()))
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(row) => Ok(Some(Request::try_from(row)?)),
            // uniq_pending_connection_pair lost a race with a concurrent insert
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_request(&self, id: i32) -> Result<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Request::try_from).transpose()
    }

    async fn find_pending_connection(&self, a: ActorRef, b: ActorRef) -> Result<Option<Request>> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM requests
            WHERE kind = 'CONNECTION' AND status = 'PENDING'
            AND (
                (sender_role = $1 AND sender_id = $2 AND receiver_role = $3 AND receiver_id = $4)
                OR (sender_role = $3 AND sender_id = $4 AND receiver_role = $1 AND receiver_id = $2)
            )
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(a.role)
            .bind(a.id)
            .bind(b.role)
            .bind(b.id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Request::try_from).transpose()
    }

    async fn list_pending_for_receiver(
        &self,
        receiver: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>> {
        self.list_pending(Party::Receiver, receiver, kind).await
    }

    async fn list_pending_sent_by(
        &self,
        sender: ActorRef,
        kind: Option<RequestKind>,
    ) -> Result<Vec<Request>> {
        self.list_pending(Party::Sender, sender, kind).await
    }

    async fn apply_transition(&self, transition: &Transition) -> Result<bool> {
        let sql = match transition.party {
            Party::Sender => {
                r#"
                UPDATE requests SET status = $1, updated_at = NOW()
                WHERE id = $2 AND sender_id = $3 AND status = 'PENDING'
                "#
            }
            Party::Receiver => {
                r#"
                UPDATE requests SET status = $1, updated_at = NOW()
                WHERE id = $2 AND receiver_id = $3 AND status = 'PENDING'
                "#
            }
        };

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(sql)
            .bind(transition.target)
            .bind(transition.request_id)
            .bind(transition.acting_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(link) = transition.link {
            sqlx::query(
                r#"
                INSERT INTO member_coach (member_id, coach_id)
                VALUES ($1, $2)
                ON CONFLICT (member_id, coach_id) DO NOTHING
                "#,
            )
            .bind(link.member_id)
            .bind(link.coach_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn relationship_exists(&self, link: MemberCoach) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM member_coach WHERE member_id = $1 AND coach_id = $2)",
        )
        .bind(link.member_id)
        .bind(link.coach_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn coaches_of_member(&self, member_id: i32) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT coach_id FROM member_coach WHERE member_id = $1 ORDER BY coach_id",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn members_of_coach(&self, coach_id: i32) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT member_id FROM member_coach WHERE coach_id = $1 ORDER BY member_id",
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

#[async_trait]
impl ProfileDirectory for PgStore {
    async fn profile(&self, actor: ActorRef) -> Result<Option<ProfileSnapshot>> {
        let sql = match actor.role {
            ActorRole::Member => "SELECT first_name, last_name, profile_pic FROM members WHERE id = $1",
            ActorRole::Coach => "SELECT first_name, last_name, profile_pic FROM coaches WHERE id = $1",
        };

        let row = sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(sql)
            .bind(actor.id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(first_name, last_name, profile_pic)| ProfileSnapshot {
            first_name,
            last_name,
            profile_pic,
        }))
    }
}
