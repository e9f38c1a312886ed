//! Read side: matches with participant display names filled in.

use crate::models::{BracketError, BracketKey, Category, Match, MatchId, ParticipantId, TournamentId};
use crate::store::{MatchRepository, RegistrationSource};
use serde::Serialize;

/// A match as rendered by clients.
#[derive(Clone, Debug, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub game: Match,
    pub slot_a_name: Option<String>,
    pub slot_b_name: Option<String>,
    pub winner_name: Option<String>,
}

impl MatchView {
    pub fn new<R: RegistrationSource + ?Sized>(game: Match, registrations: &R) -> Self {
        let name = |p: Option<ParticipantId>| p.and_then(|id| registrations.display_name(id));
        Self {
            slot_a_name: name(game.slot_a),
            slot_b_name: name(game.slot_b),
            winner_name: name(game.winner()),
            game,
        }
    }
}

/// Whole bracket of a category, ordered by round then position.
pub fn get_bracket<S, R>(
    store: &S,
    registrations: &R,
    tournament_id: TournamentId,
    category: &Category,
) -> Result<Vec<MatchView>, BracketError>
where
    S: MatchRepository + ?Sized,
    R: RegistrationSource + ?Sized,
{
    let key = BracketKey::new(tournament_id, category.clone());
    let bracket = store
        .find_bracket(&key)
        .ok_or_else(|| BracketError::BracketNotFound {
            tournament_id,
            category: category.clone(),
        })?;
    Ok(bracket
        .matches
        .into_iter()
        .map(|m| MatchView::new(m, registrations))
        .collect())
}

/// Matches of one round of a category.
pub fn matches_in_round<S, R>(
    store: &S,
    registrations: &R,
    tournament_id: TournamentId,
    category: &Category,
    round: u32,
) -> Result<Vec<MatchView>, BracketError>
where
    S: MatchRepository + ?Sized,
    R: RegistrationSource + ?Sized,
{
    let mut views = get_bracket(store, registrations, tournament_id, category)?;
    views.retain(|v| v.game.round == round);
    Ok(views)
}

/// Every match a participant has been placed in, across tournaments.
pub fn matches_for_participant<S, R>(
    store: &S,
    registrations: &R,
    participant: ParticipantId,
) -> Vec<MatchView>
where
    S: MatchRepository + ?Sized,
    R: RegistrationSource + ?Sized,
{
    store
        .matches_for_participant(participant)
        .into_iter()
        .map(|m| MatchView::new(m, registrations))
        .collect()
}

pub fn find_match_view<S, R>(store: &S, registrations: &R, id: MatchId) -> Result<MatchView, BracketError>
where
    S: MatchRepository + ?Sized,
    R: RegistrationSource + ?Sized,
{
    store
        .find_match(id)
        .map(|m| MatchView::new(m, registrations))
        .ok_or(BracketError::MatchNotFound(id))
}
