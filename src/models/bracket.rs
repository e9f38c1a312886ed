//! Bracket (the full match tree of one category) and BracketError.

use crate::models::game::{Match, MatchId, MatchStatus, TournamentId};
use crate::models::registration::{Category, ParticipantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or progressing a bracket.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BracketError {
    /// Fewer than two confirmed participants.
    #[error("Not enough participants to generate a bracket (min 2, found {found})")]
    InsufficientParticipants { found: usize },
    /// A bracket already exists for this tournament and category.
    #[error("A bracket already exists for {category} in tournament {tournament_id}")]
    BracketAlreadyExists {
        tournament_id: TournamentId,
        category: Category,
    },
    /// Category is empty or not configured.
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    /// More confirmed participants than the category allows.
    #[error("Category {category} allows {limit} participants, found {found}")]
    ParticipantLimitExceeded {
        category: Category,
        limit: usize,
        found: usize,
    },
    #[error("No bracket for {category} in tournament {tournament_id}")]
    BracketNotFound {
        tournament_id: TournamentId,
        category: Category,
    },
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    /// The match is not in a status that allows this action.
    #[error("Cannot {action} a match that is {status}")]
    InvalidTransition {
        status: MatchStatus,
        action: &'static str,
    },
    /// One or both slots are still waiting for an earlier match.
    #[error("Match {0} does not have both participants yet")]
    MatchNotReady(MatchId),
    /// Explicit winner is empty, contradicts the scores, or the match is already decided.
    #[error("Invalid winner: {0}")]
    InvalidWinner(String),
    /// Broken tree invariant (double slot write, missing link, round mismatch).
    #[error("Bracket corruption: {0}")]
    BracketCorruption(String),
}

impl BracketError {
    /// Invariant violations that must alert rather than be shown as user errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BracketError::BracketCorruption(_))
    }
}

/// Identity of a bracket: one per (tournament, category).
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BracketKey {
    pub tournament_id: TournamentId,
    pub category: Category,
}

impl BracketKey {
    pub fn new(tournament_id: TournamentId, category: Category) -> Self {
        Self {
            tournament_id,
            category,
        }
    }
}

/// Smallest power of two that fits `participants` (byes fill the rest).
pub fn bracket_size(participants: usize) -> usize {
    participants.max(1).next_power_of_two()
}

/// log2 of the bracket size.
pub fn total_rounds(participants: usize) -> u32 {
    bracket_size(participants).trailing_zeros()
}

/// Display name of a round, counted back from the final.
pub fn round_label(round: u32, total_rounds: u32) -> String {
    match total_rounds.checked_sub(round) {
        Some(0) => "Final".to_string(),
        Some(1) => "Semifinals".to_string(),
        Some(2) => "Quarterfinals".to_string(),
        _ => format!("Round {round}"),
    }
}

/// All matches of one bracket, ordered by round then position.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub key: BracketKey,
    pub total_rounds: u32,
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Wrap stored matches, sorting them and deriving the round count.
    pub fn from_matches(key: BracketKey, mut matches: Vec<Match>) -> Self {
        matches.sort_by_key(|m| (m.round, m.position));
        let total_rounds = matches.iter().map(|m| m.round).max().unwrap_or(0);
        Self {
            key,
            total_rounds,
            matches,
        }
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// The single match of the last round.
    pub fn final_match(&self) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.round == self.total_rounds && m.next.is_none())
    }

    /// Winner of the final. Derived, never stored separately.
    pub fn champion(&self) -> Option<ParticipantId> {
        self.final_match()
            .filter(|m| m.status == MatchStatus::Completed)
            .and_then(Match::winner)
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }
}
