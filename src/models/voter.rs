/// Voter account as stored by the accounts side of the system.
///
/// Holds credential material and is not `Serialize`; responses embed
/// [`crate::dto::candidate_dto::VoterSummary`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub approved: Option<bool>,
}
