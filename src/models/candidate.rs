use chrono::NaiveDateTime;
use sqlx::FromRow;
use validator::Validate;

use super::{election::Election, voter::Voter};

/// A persisted candidacy with its voter and election loaded eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub candidate_id: i64,
    pub voter: Voter,
    pub election: Election,
    pub post: Option<String>,
    pub bio: Option<String>,
    pub approved: Option<bool>,
    pub date_registered: NaiveDateTime,
    pub image_url: Option<String>,
}

/// Column values written on insert and on full replace.
///
/// Foreign keys stay optional here: a missing reference is rejected by the
/// store, the same way the `NOT NULL` columns reject it in Postgres.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct NewCandidate {
    pub voter_id: Option<i64>,
    pub election_id: Option<i64>,
    #[validate(length(max = 255))]
    pub post: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub approved: Option<bool>,
    pub date_registered: Option<NaiveDateTime>,
    #[validate(length(max = 255))]
    pub image_url: Option<String>,
}

/// Flat row produced by joining `candidates` with `voters` and `elections`.
#[derive(Debug, FromRow)]
pub struct CandidateRow {
    pub candidate_id: i64,
    pub post: Option<String>,
    pub bio: Option<String>,
    pub approved: Option<bool>,
    pub date_registered: NaiveDateTime,
    pub image_url: Option<String>,
    pub voter_id: i64,
    pub voter_first_name: String,
    pub voter_last_name: String,
    pub voter_email: String,
    pub voter_password_hash: String,
    pub voter_approved: Option<bool>,
    pub election_id: i64,
    pub election_name: String,
    pub election_description: Option<String>,
    pub election_start_time: Option<NaiveDateTime>,
    pub election_end_time: Option<NaiveDateTime>,
    pub election_status: Option<String>,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            candidate_id: row.candidate_id,
            voter: Voter {
                id: row.voter_id,
                first_name: row.voter_first_name,
                last_name: row.voter_last_name,
                email: row.voter_email,
                password_hash: row.voter_password_hash,
                approved: row.voter_approved,
            },
            election: Election {
                id: row.election_id,
                name: row.election_name,
                description: row.election_description,
                start_time: row.election_start_time,
                end_time: row.election_end_time,
                status: row.election_status,
            },
            post: row.post,
            bio: row.bio,
            approved: row.approved,
            date_registered: row.date_registered,
            image_url: row.image_url,
        }
    }
}
