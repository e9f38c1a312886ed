//! Data structures for the battle bracket: matches, registrations, brackets.

mod bracket;
mod game;
mod registration;

pub use bracket::{bracket_size, round_label, total_rounds, Bracket, BracketError, BracketKey};
pub use game::{Match, MatchId, MatchResult, MatchStatus, NextMatch, Score, Slot, TournamentId, Wod};
pub use registration::{Category, ParticipantId, Registration, RegistrationStatus};
