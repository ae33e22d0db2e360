use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use validator::Validate;

use super::candidate_service::{candidate_not_found, CandidateStore};
use crate::error::{Error, Result};
use crate::models::{
    candidate::{Candidate, NewCandidate},
    election::Election,
    voter::Voter,
};

#[derive(Debug, Clone)]
struct StoredCandidate {
    voter_id: i64,
    election_id: i64,
    post: Option<String>,
    bio: Option<String>,
    approved: Option<bool>,
    date_registered: NaiveDateTime,
    image_url: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    voters: HashMap<i64, Voter>,
    elections: HashMap<i64, Election>,
    candidates: BTreeMap<i64, StoredCandidate>,
    last_id: i64,
}

impl Tables {
    /// Applies the same checks the Postgres schema does.
    fn check(&self, new: &NewCandidate) -> Result<(i64, i64)> {
        new.validate()
            .map_err(|e| Error::Constraint(format!("value too long for candidates: {}", e)))?;

        let voter_id = new
            .voter_id
            .ok_or_else(|| Error::Constraint("candidates.voter_id must not be null".into()))?;
        let election_id = new
            .election_id
            .ok_or_else(|| Error::Constraint("candidates.election_id must not be null".into()))?;

        if !self.voters.contains_key(&voter_id) {
            return Err(Error::Constraint(format!("voter {} does not exist", voter_id)));
        }
        if !self.elections.contains_key(&election_id) {
            return Err(Error::Constraint(format!(
                "election {} does not exist",
                election_id
            )));
        }
        Ok((voter_id, election_id))
    }

    fn load(&self, id: i64) -> Option<Candidate> {
        let stored = self.candidates.get(&id)?;
        Some(Candidate {
            candidate_id: id,
            voter: self.voters.get(&stored.voter_id)?.clone(),
            election: self.elections.get(&stored.election_id)?.clone(),
            post: stored.post.clone(),
            bio: stored.bio.clone(),
            approved: stored.approved,
            date_registered: stored.date_registered,
            image_url: stored.image_url.clone(),
        })
    }
}

/// In-process [`CandidateStore`] that enforces the column limits and foreign
/// keys of the `candidates` table. Voters and elections are seeded by the
/// caller.
#[derive(Clone, Default)]
pub struct MemoryCandidateStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_voter(&self, voter: Voter) {
        self.tables.write().await.voters.insert(voter.id, voter);
    }

    pub async fn insert_election(&self, election: Election) {
        self.tables
            .write()
            .await
            .elections
            .insert(election.id, election);
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn list(&self) -> Result<Vec<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .candidates
            .keys()
            .filter_map(|id| tables.load(*id))
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Candidate>> {
        Ok(self.tables.read().await.load(id))
    }

    async fn list_by_election(&self, election_id: i64) -> Result<Vec<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables
            .candidates
            .iter()
            .filter(|(_, stored)| stored.election_id == election_id)
            .filter_map(|(id, _)| tables.load(*id))
            .collect())
    }

    async fn add(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        let (voter_id, election_id) = tables.check(&candidate)?;

        tables.last_id += 1;
        let id = tables.last_id;
        tables.candidates.insert(
            id,
            StoredCandidate {
                voter_id,
                election_id,
                post: candidate.post,
                bio: candidate.bio,
                approved: candidate.approved,
                date_registered: candidate
                    .date_registered
                    .unwrap_or_else(|| Utc::now().naive_utc()),
                image_url: candidate.image_url,
            },
        );
        tables.load(id).ok_or_else(|| candidate_not_found(id))
    }

    async fn update(&self, id: i64, details: NewCandidate) -> Result<Candidate> {
        let mut tables = self.tables.write().await;
        if !tables.candidates.contains_key(&id) {
            return Err(candidate_not_found(id));
        }
        let (voter_id, election_id) = tables.check(&details)?;

        if let Some(stored) = tables.candidates.get_mut(&id) {
            stored.voter_id = voter_id;
            stored.election_id = election_id;
            stored.post = details.post;
            stored.bio = details.bio;
            stored.approved = details.approved;
            if let Some(at) = details.date_registered {
                stored.date_registered = at;
            }
            stored.image_url = details.image_url;
        }
        tables.load(id).ok_or_else(|| candidate_not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.tables
            .write()
            .await
            .candidates
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| candidate_not_found(id))
    }
}
