//! WOD battle bracket engine: library with models, storage seams and bracket logic.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use config::{AppConfig, CategoryLimits};
pub use logic::{
    assign_wod, build_bracket, champion, declare_winner, decide_winner, find_match_view,
    generate_bracket, get_bracket, matches_for_participant, matches_in_round, record_match_result,
    schedule_match, start_match, InputOrder, MatchView, RandomShuffle, ResultInput, Shuffle,
};
pub use models::{
    bracket_size, round_label, total_rounds, Bracket, BracketError, BracketKey, Category, Match,
    MatchId, MatchResult, MatchStatus, NextMatch, ParticipantId, Registration, RegistrationStatus,
    Score, Slot, TournamentId, Wod,
};
pub use store::{InMemoryMatchStore, MatchRepository, RegistrationBook, RegistrationSource};
