//! Election payloads.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Ballot type of an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionVersion {
    OpenBallot,
    SecretBallot,
}

/// One question of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionQuestion {
    pub id: String,
    pub question: String,
    pub voting_method: String,
    pub ballot_options: Vec<String>,
    #[serde(default)]
    pub write_in: bool,
}

/// `election/setup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSetup {
    pub id: String,
    pub lao: String,
    pub name: String,
    pub version: ElectionVersion,
    pub created_at: Timestamp,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub questions: Vec<ElectionQuestion>,
}

/// `election/open`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenElection {
    pub lao: String,
    pub election: String,
    pub opened_at: Timestamp,
}

/// A ballot choice: an option index for open ballots, a ciphertext otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoteChoice {
    Index(u32),
    Encrypted(String),
}

/// One answer inside a cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub question: String,
    pub vote: VoteChoice,
}

/// `election/cast_vote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub lao: String,
    pub election: String,
    pub created_at: Timestamp,
    pub votes: Vec<Vote>,
}

/// `election/end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionEnd {
    pub lao: String,
    pub election: String,
    pub created_at: Timestamp,
    pub registered_votes: String,
}

/// Tally of one ballot option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionResult {
    pub ballot_option: String,
    pub count: u64,
}

/// Results of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResultQuestion {
    pub id: String,
    pub result: Vec<QuestionResult>,
}

/// `election/result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResult {
    pub questions: Vec<ElectionResultQuestion>,
}

/// `election/key`: public key voters encrypt secret ballots with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionKey {
    pub election: String,
    pub election_key: String,
}
