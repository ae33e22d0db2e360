use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateRow, NewCandidate};

/// Persistence boundary for candidates.
///
/// Implementations enforce the column constraints: both foreign keys must be
/// present and point at existing rows, `bio` holds at most 500 characters,
/// and `post` and `image_url` at most 255. Violations surface as
/// [`Error::Constraint`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Candidate>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Candidate>>;

    async fn list_by_election(&self, election_id: i64) -> Result<Vec<Candidate>>;

    async fn add(&self, candidate: NewCandidate) -> Result<Candidate>;

    /// Replaces every mutable column. Fails with [`Error::NotFound`] when the
    /// id does not exist.
    async fn update(&self, id: i64, details: NewCandidate) -> Result<Candidate>;

    /// Fails with [`Error::NotFound`] when the id does not exist.
    async fn delete(&self, id: i64) -> Result<()>;
}

pub(crate) fn candidate_not_found(id: i64) -> Error {
    Error::NotFound(format!("Candidate with candidate_id {} not found", id))
}

const SELECT_CANDIDATE: &str = r#"
    SELECT
        c.candidate_id, c.post, c.bio, c.approved, c.date_registered, c.image_url,
        v.id AS voter_id,
        v.first_name AS voter_first_name,
        v.last_name AS voter_last_name,
        v.email AS voter_email,
        v.password_hash AS voter_password_hash,
        v.approved AS voter_approved,
        e.id AS election_id,
        e.name AS election_name,
        e.description AS election_description,
        e.start_time AS election_start_time,
        e.end_time AS election_end_time,
        e.status AS election_status
    FROM candidates c
    JOIN voters v ON v.id = c.voter_id
    JOIN elections e ON e.id = c.election_id
"#;

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_joined(&self, id: i64) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(&format!(
            "{} WHERE c.candidate_id = $1",
            SELECT_CANDIDATE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Candidate::from))
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "{} ORDER BY c.candidate_id",
            SELECT_CANDIDATE
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Candidate::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Candidate>> {
        self.fetch_one_joined(id).await
    }

    async fn list_by_election(&self, election_id: i64) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            "{} WHERE c.election_id = $1 ORDER BY c.candidate_id",
            SELECT_CANDIDATE
        ))
        .bind(election_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Candidate::from).collect())
    }

    async fn add(&self, candidate: NewCandidate) -> Result<Candidate> {
        let date_registered = candidate
            .date_registered
            .unwrap_or_else(|| Utc::now().naive_utc());

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO candidates (voter_id, election_id, post, bio, approved, date_registered, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING candidate_id
            "#,
        )
        .bind(candidate.voter_id)
        .bind(candidate.election_id)
        .bind(candidate.post)
        .bind(candidate.bio)
        .bind(candidate.approved)
        .bind(date_registered)
        .bind(candidate.image_url)
        .fetch_one(&self.pool)
        .await?;

        self.fetch_one_joined(id)
            .await?
            .ok_or_else(|| candidate_not_found(id))
    }

    async fn update(&self, id: i64, details: NewCandidate) -> Result<Candidate> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE candidates
            SET
                voter_id = $2,
                election_id = $3,
                post = $4,
                bio = $5,
                approved = $6,
                date_registered = COALESCE($7, date_registered),
                image_url = $8
            WHERE candidate_id = $1
            RETURNING candidate_id
            "#,
        )
        .bind(id)
        .bind(details.voter_id)
        .bind(details.election_id)
        .bind(details.post)
        .bind(details.bio)
        .bind(details.approved)
        .bind(details.date_registered)
        .bind(details.image_url)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self
                .fetch_one_joined(id)
                .await?
                .ok_or_else(|| candidate_not_found(id)),
            None => Err(candidate_not_found(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM candidates WHERE candidate_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(candidate_not_found(id));
        }
        Ok(())
    }
}
