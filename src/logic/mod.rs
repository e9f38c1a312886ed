//! Bracket business logic: construction, match progression, read views.

mod builder;
mod progression;
mod seeding;
mod views;

pub use builder::{build_bracket, generate_bracket};
pub use progression::{
    assign_wod, champion, declare_winner, decide_winner, record_match_result, schedule_match,
    start_match, ResultInput,
};
pub use seeding::{InputOrder, RandomShuffle, Shuffle};
pub use views::{find_match_view, get_bracket, matches_for_participant, matches_in_round, MatchView};

use crate::models::BracketError;

/// Log invariant violations loudly before handing them back.
pub(crate) fn alert(err: BracketError) -> BracketError {
    if err.is_fatal() {
        log::error!("{}", err);
    }
    err
}
