//! Match (1v1 battle), its participant slots, result and forward link.

use crate::models::registration::{Category, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Unique identifier for a tournament (battle event).
pub type TournamentId = Uuid;

/// One of the two participant slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "slot_a")]
    A,
    #[serde(rename = "slot_b")]
    B,
}

impl Slot {
    /// Slot of the next-round match fed by the match at `position` in its round.
    pub fn for_position(position: u32) -> Self {
        if position % 2 == 0 {
            Slot::A
        } else {
            Slot::B
        }
    }
}

/// Lifecycle of a match. Transitions only move forward.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Forward link: the match in the next round this one feeds its winner into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NextMatch {
    pub match_id: MatchId,
    pub slot: Slot,
}

/// The workout contested in a match. A time cap means "for time" (lower wins),
/// no cap means "max reps" (higher wins).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Wod {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_cap_secs: Option<u32>,
}

impl Wod {
    pub fn has_time_cap(&self) -> bool {
        self.time_cap_secs.is_some()
    }
}

/// One participant's performance. Missing values never produce an automatic winner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub time_secs: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
}

impl Score {
    pub fn time(time_secs: u32) -> Self {
        Self {
            time_secs: Some(time_secs),
            reps: None,
        }
    }

    pub fn reps(reps: u32) -> Self {
        Self {
            time_secs: None,
            reps: Some(reps),
        }
    }
}

/// Recorded outcome of a completed match. `winner` is None when undecided.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: Option<ParticipantId>,
    pub score_a: Score,
    pub score_b: Score,
    pub notes: String,
}

/// A single contest node of a bracket tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub category: Category,
    /// 1 is the first round played; the final has the highest number.
    pub round: u32,
    pub round_label: String,
    /// Index of this match inside its round (0-based, top to bottom).
    pub position: u32,
    /// None while unassigned, or permanently for a bye.
    pub slot_a: Option<ParticipantId>,
    pub slot_b: Option<ParticipantId>,
    pub wod: Option<Wod>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub result: Option<MatchResult>,
    pub status: MatchStatus,
    pub completed_at: Option<DateTime<Utc>>,
    /// None only for the final.
    pub next: Option<NextMatch>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        category: Category,
        round: u32,
        round_label: String,
        position: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category,
            round,
            round_label,
            position,
            slot_a: None,
            slot_b: None,
            wod: None,
            scheduled_at: None,
            result: None,
            status: MatchStatus::Pending,
            completed_at: None,
            next: None,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::A => self.slot_a,
            Slot::B => self.slot_b,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<ParticipantId> {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    /// Both slots are occupied, so the match can be played.
    pub fn is_ready(&self) -> bool {
        self.slot_a.is_some() && self.slot_b.is_some()
    }

    /// Exactly one slot is occupied.
    pub fn is_bye(&self) -> bool {
        self.slot_a.is_some() != self.slot_b.is_some()
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.result.as_ref().and_then(|r| r.winner)
    }

    pub fn has_participant(&self, participant: ParticipantId) -> bool {
        self.slot_a == Some(participant) || self.slot_b == Some(participant)
    }
}
