//! In-memory match storage behind a single RwLock.

use super::MatchRepository;
use crate::models::{
    Bracket, BracketError, BracketKey, Match, MatchId, MatchStatus, ParticipantId, Slot,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    matches: HashMap<MatchId, Match>,
    /// Bracket key -> ids of its matches. Doubles as the uniqueness constraint.
    brackets: HashMap<BracketKey, Vec<MatchId>>,
}

/// Process-local [`MatchRepository`]. Every operation holds the lock for its
/// whole read-modify-write, so each one is atomic.
#[derive(Debug, Default)]
pub struct InMemoryMatchStore {
    tables: RwLock<Tables>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches across all brackets.
    pub fn len(&self) -> usize {
        self.read().matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MatchRepository for InMemoryMatchStore {
    fn commit_bracket(&self, bracket: &Bracket) -> Result<(), BracketError> {
        let mut tables = self.write();
        if tables.brackets.contains_key(&bracket.key) {
            return Err(BracketError::BracketAlreadyExists {
                tournament_id: bracket.key.tournament_id,
                category: bracket.key.category.clone(),
            });
        }
        if let Some(dup) = bracket
            .matches
            .iter()
            .find(|m| tables.matches.contains_key(&m.id))
        {
            return Err(BracketError::BracketCorruption(format!(
                "match id {} already stored",
                dup.id
            )));
        }
        let ids = bracket.matches.iter().map(|m| m.id).collect();
        for m in &bracket.matches {
            tables.matches.insert(m.id, m.clone());
        }
        tables.brackets.insert(bracket.key.clone(), ids);
        Ok(())
    }

    fn find_match(&self, id: MatchId) -> Option<Match> {
        self.read().matches.get(&id).cloned()
    }

    fn find_bracket(&self, key: &BracketKey) -> Option<Bracket> {
        let tables = self.read();
        let ids = tables.brackets.get(key)?;
        let matches = ids
            .iter()
            .filter_map(|id| tables.matches.get(id).cloned())
            .collect();
        Some(Bracket::from_matches(key.clone(), matches))
    }

    fn matches_for_participant(&self, participant: ParticipantId) -> Vec<Match> {
        let mut found: Vec<Match> = self
            .read()
            .matches
            .values()
            .filter(|m| m.has_participant(participant))
            .cloned()
            .collect();
        found.sort_by(|x, y| {
            (x.tournament_id, &x.category, x.round, x.position)
                .cmp(&(y.tournament_id, &y.category, y.round, y.position))
        });
        found
    }

    fn replace_match(&self, mut updated: Match, expected: MatchStatus) -> Result<(), BracketError> {
        let mut tables = self.write();
        let stored = tables
            .matches
            .get_mut(&updated.id)
            .ok_or(BracketError::MatchNotFound(updated.id))?;
        if stored.status != expected {
            return Err(BracketError::InvalidTransition {
                status: stored.status,
                action: "update",
            });
        }
        updated.slot_a = stored.slot_a;
        updated.slot_b = stored.slot_b;
        *stored = updated;
        Ok(())
    }

    fn fill_slot(
        &self,
        id: MatchId,
        slot: Slot,
        participant: ParticipantId,
    ) -> Result<(), BracketError> {
        let mut tables = self.write();
        let m = tables.matches.get_mut(&id).ok_or_else(|| {
            BracketError::BracketCorruption(format!("forward link points to missing match {id}"))
        })?;
        if m.status != MatchStatus::Pending {
            return Err(BracketError::BracketCorruption(format!(
                "match {id} is {} but still receiving participants",
                m.status
            )));
        }
        let target = m.slot_mut(slot);
        if let Some(existing) = *target {
            return Err(BracketError::BracketCorruption(format!(
                "slot {slot:?} of match {id} already holds {existing}, refusing to write {participant}"
            )));
        }
        *target = Some(participant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BracketKey, Category, Match};
    use uuid::Uuid;

    fn single_match_bracket() -> Bracket {
        let key = BracketKey::new(Uuid::new_v4(), Category::parse("scaled-male"));
        let m = Match::new(key.tournament_id, key.category.clone(), 1, "Final".into(), 0);
        Bracket::from_matches(key, vec![m])
    }

    #[test]
    fn second_commit_for_same_key_is_rejected() {
        let store = InMemoryMatchStore::new();
        let bracket = single_match_bracket();
        store.commit_bracket(&bracket).unwrap();

        let mut again = single_match_bracket();
        again.key = bracket.key.clone();
        again.matches[0].id = Uuid::new_v4();
        assert!(matches!(
            store.commit_bracket(&again),
            Err(BracketError::BracketAlreadyExists { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fill_slot_refuses_to_overwrite() {
        let store = InMemoryMatchStore::new();
        let bracket = single_match_bracket();
        store.commit_bracket(&bracket).unwrap();
        let id = bracket.matches[0].id;

        store.fill_slot(id, Slot::B, Uuid::new_v4()).unwrap();
        let err = store.fill_slot(id, Slot::B, Uuid::new_v4()).unwrap_err();
        assert!(err.is_fatal());
        store.fill_slot(id, Slot::A, Uuid::new_v4()).unwrap();
        assert!(store.find_match(id).unwrap().is_ready());
    }

    #[test]
    fn replace_keeps_slots_and_checks_status() {
        let store = InMemoryMatchStore::new();
        let bracket = single_match_bracket();
        store.commit_bracket(&bracket).unwrap();
        let mut stale = bracket.matches[0].clone();

        let p = Uuid::new_v4();
        store.fill_slot(stale.id, Slot::A, p).unwrap();

        stale.round_label = "Grand Final".into();
        store.replace_match(stale.clone(), MatchStatus::Pending).unwrap();
        let stored = store.find_match(stale.id).unwrap();
        assert_eq!(stored.slot_a, Some(p));
        assert_eq!(stored.round_label, "Grand Final");

        assert!(matches!(
            store.replace_match(stale, MatchStatus::InProgress),
            Err(BracketError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn participant_matches_are_grouped_by_category() {
        let store = InMemoryMatchStore::new();
        let t = Uuid::new_v4();
        let p = Uuid::new_v4();
        for slug in ["scaled-male", "intermedio-male"] {
            let key = BracketKey::new(t, Category::parse(slug));
            let matches = (1..=2)
                .map(|round| {
                    let mut m = Match::new(t, key.category.clone(), round, format!("Round {round}"), 0);
                    m.slot_a = Some(p);
                    m
                })
                .collect();
            store.commit_bracket(&Bracket::from_matches(key, matches)).unwrap();
        }

        let order: Vec<_> = store
            .matches_for_participant(p)
            .iter()
            .map(|m| (m.category.to_string(), m.round))
            .collect();
        let expected = [("intermedio-male", 1), ("intermedio-male", 2), ("scaled-male", 1), ("scaled-male", 2)]
            .map(|(c, r)| (c.to_string(), r));
        assert_eq!(order, expected);
    }
}
