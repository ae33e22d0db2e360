use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{
    candidate::{Candidate, NewCandidate},
    election::Election,
    voter::Voter,
};

/// `{"id": ...}` reference to a row owned elsewhere. Extra keys are ignored,
/// so a client may echo back a full embedded voter or election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: i64,
}

/// Request body for create and full-replace update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    pub voter: Option<EntityRef>,
    #[serde(alias = "elections")]
    pub election: Option<EntityRef>,
    pub post: Option<String>,
    pub bio: Option<String>,
    pub approved: Option<bool>,
    pub date_registered: Option<NaiveDateTime>,
    pub image_url: Option<String>,
}

impl From<CandidatePayload> for NewCandidate {
    fn from(payload: CandidatePayload) -> Self {
        Self {
            voter_id: payload.voter.map(|v| v.id),
            election_id: payload.election.map(|e| e.id),
            post: payload.post,
            bio: payload.bio,
            approved: payload.approved,
            date_registered: payload.date_registered,
            image_url: payload.image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<Voter> for VoterSummary {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            first_name: voter.first_name,
            last_name: voter.last_name,
            email: voter.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: i64,
    pub name: String,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            name: election.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResponse {
    pub candidate_id: i64,
    pub voter: VoterSummary,
    pub election: ElectionSummary,
    pub post: Option<String>,
    pub bio: Option<String>,
    pub approved: Option<bool>,
    pub date_registered: NaiveDateTime,
    pub image_url: Option<String>,
}

impl From<Candidate> for CandidateResponse {
    fn from(candidate: Candidate) -> Self {
        Self {
            candidate_id: candidate.candidate_id,
            voter: candidate.voter.into(),
            election: candidate.election.into(),
            post: candidate.post,
            bio: candidate.bio,
            approved: candidate.approved,
            date_registered: candidate.date_registered,
            image_url: candidate.image_url,
        }
    }
}

/// What happened to the optional `image` part of a multipart create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ImageOutcome {
    NotProvided,
    Stored { url: String },
    Failed { reason: String },
}

/// Multipart create response: the candidate plus the image outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCreatedResponse {
    #[serde(flatten)]
    pub candidate: CandidateResponse,
    pub image_upload: ImageOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCandidateResponse {
    pub message: String,
}

impl DeleteCandidateResponse {
    pub fn for_id(id: i64) -> Self {
        Self {
            message: format!("Candidate with candidate_id {} deleted successfully!", id),
        }
    }
}
