//! Persistence seams: where matches live and where confirmed entrants come from.

mod matches;
mod registrations;

pub use matches::InMemoryMatchStore;
pub use registrations::RegistrationBook;

use crate::models::{
    Bracket, BracketError, BracketKey, Category, Match, MatchId, MatchStatus, ParticipantId,
    Registration, Slot, TournamentId,
};

/// Storage for bracket matches.
///
/// Slots are written only by [`MatchRepository::commit_bracket`] and
/// [`MatchRepository::fill_slot`]; every other update goes through
/// [`MatchRepository::replace_match`], which keeps the stored slots.
pub trait MatchRepository {
    /// Insert a whole tree at once. Either every match is stored or none is.
    /// Fails with `BracketAlreadyExists` if the key already has a tree.
    fn commit_bracket(&self, bracket: &Bracket) -> Result<(), BracketError>;

    fn find_match(&self, id: MatchId) -> Option<Match>;

    fn find_bracket(&self, key: &BracketKey) -> Option<Bracket>;

    /// Every match in which the participant occupies a slot, across brackets.
    fn matches_for_participant(&self, participant: ParticipantId) -> Vec<Match>;

    /// Overwrite the non-slot fields of a match, provided its stored status is
    /// still `expected`.
    fn replace_match(&self, updated: Match, expected: MatchStatus) -> Result<(), BracketError>;

    /// Write a participant into one empty slot. An occupied slot is corruption.
    fn fill_slot(
        &self,
        id: MatchId,
        slot: Slot,
        participant: ParticipantId,
    ) -> Result<(), BracketError>;
}

/// Source of entrants for bracket generation and of display names for rendering.
pub trait RegistrationSource {
    /// Confirmed participants of one category, in storage order.
    fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Vec<ParticipantId>;

    fn display_name(&self, participant: ParticipantId) -> Option<String>;
}

impl RegistrationSource for [Registration] {
    fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Vec<ParticipantId> {
        self.iter()
            .filter(|r| r.tournament_id == tournament_id && &r.category == category)
            .filter(|r| r.is_confirmed())
            .map(|r| r.participant_id)
            .collect()
    }

    fn display_name(&self, participant: ParticipantId) -> Option<String> {
        self.iter()
            .find(|r| r.participant_id == participant)
            .map(Registration::full_name)
    }
}

impl RegistrationSource for Vec<Registration> {
    fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Vec<ParticipantId> {
        self.as_slice().confirmed_participants(tournament_id, category)
    }

    fn display_name(&self, participant: ParticipantId) -> Option<String> {
        self.as_slice().display_name(participant)
    }
}
