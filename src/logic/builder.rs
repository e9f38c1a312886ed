//! Bracket construction: one single-elimination tree per (tournament, category).

use crate::config::CategoryLimits;
use crate::logic::alert;
use crate::logic::seeding::Shuffle;
use crate::models::{
    bracket_size, round_label, total_rounds, Bracket, BracketError, BracketKey, Category, Match,
    MatchResult, MatchStatus, NextMatch, ParticipantId, Slot, TournamentId,
};
use crate::store::{MatchRepository, RegistrationSource};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Build a complete bracket in memory. Nothing is persisted.
///
/// 1. Deduplicate and shuffle the entrants.
/// 2. Round 1 has `size / 2` matches: the first `n - size / 2` get two entrants,
///    the rest get one (a bye), so no first-round match is empty.
/// 3. Each later round is created before the previous round is linked to it.
/// 4. Byes are settled immediately: the sole entrant wins and is written into
///    the next match.
pub fn build_bracket(
    tournament_id: TournamentId,
    category: Category,
    participants: Vec<ParticipantId>,
    shuffle: &mut dyn Shuffle,
    now: DateTime<Utc>,
) -> Result<Bracket, BracketError> {
    if category.is_empty() {
        return Err(BracketError::UnknownCategory(category.to_string()));
    }
    let mut seen = HashSet::new();
    let mut entrants: Vec<ParticipantId> =
        participants.into_iter().filter(|p| seen.insert(*p)).collect();
    let n = entrants.len();
    if n < 2 {
        return Err(BracketError::InsufficientParticipants { found: n });
    }

    let size = bracket_size(n);
    let rounds = total_rounds(n);
    shuffle.arrange(&mut entrants);

    let first_round = size / 2;
    let full_matches = n - first_round;
    let mut entrants = entrants.into_iter();
    let mut previous: Vec<Match> = (0..first_round)
        .map(|pos| {
            let mut m = Match::new(
                tournament_id,
                category.clone(),
                1,
                round_label(1, rounds),
                pos as u32,
            );
            m.slot_a = entrants.next();
            if pos < full_matches {
                m.slot_b = entrants.next();
            }
            m
        })
        .collect();

    let mut matches = Vec::with_capacity(size - 1);
    for round in 2..=rounds {
        let current: Vec<Match> = (0..previous.len() / 2)
            .map(|pos| {
                Match::new(
                    tournament_id,
                    category.clone(),
                    round,
                    round_label(round, rounds),
                    pos as u32,
                )
            })
            .collect();
        for m in &mut previous {
            let parent = &current[(m.position / 2) as usize];
            m.next = Some(NextMatch {
                match_id: parent.id,
                slot: Slot::for_position(m.position),
            });
        }
        matches.append(&mut previous);
        previous = current;
    }
    matches.append(&mut previous);

    resolve_byes(&mut matches, now)?;

    Ok(Bracket {
        key: BracketKey::new(tournament_id, category),
        total_rounds: rounds,
        matches,
    })
}

/// Complete every first-round bye and forward its entrant.
fn resolve_byes(matches: &mut [Match], now: DateTime<Utc>) -> Result<(), BracketError> {
    let index: HashMap<_, _> = matches.iter().enumerate().map(|(i, m)| (m.id, i)).collect();
    let byes: Vec<usize> = matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.round == 1 && m.is_bye())
        .map(|(i, _)| i)
        .collect();

    for i in byes {
        let m = &mut matches[i];
        let Some(winner) = m.slot_a.or(m.slot_b) else {
            continue;
        };
        m.status = MatchStatus::Completed;
        m.completed_at = Some(now);
        m.result = Some(MatchResult {
            winner: Some(winner),
            notes: "bye".to_string(),
            ..MatchResult::default()
        });
        let Some(next) = m.next else {
            return Err(BracketError::BracketCorruption(format!(
                "bye match {} has no next match",
                m.id
            )));
        };
        let Some(&j) = index.get(&next.match_id) else {
            return Err(BracketError::BracketCorruption(format!(
                "missing next match {}",
                next.match_id
            )));
        };
        let slot = matches[j].slot_mut(next.slot);
        if slot.is_some() {
            return Err(BracketError::BracketCorruption(format!(
                "slot {:?} of match {} filled twice",
                next.slot, next.match_id
            )));
        }
        *slot = Some(winner);
        log::debug!("Bye: {} advances to match {}", winner, next.match_id);
    }
    Ok(())
}

/// Generate and persist the bracket of one category from its confirmed registrations.
///
/// A category that already has a bracket is rejected with `BracketAlreadyExists`;
/// the store's commit enforces the same rule, so two racing calls cannot both win.
pub fn generate_bracket<S, R>(
    store: &S,
    registrations: &R,
    limits: &CategoryLimits,
    tournament_id: TournamentId,
    category: &Category,
    shuffle: &mut dyn Shuffle,
) -> Result<Bracket, BracketError>
where
    S: MatchRepository + ?Sized,
    R: RegistrationSource + ?Sized,
{
    let limit = limits
        .limit_for(category)
        .ok_or_else(|| BracketError::UnknownCategory(category.to_string()))?;

    let key = BracketKey::new(tournament_id, category.clone());
    if store.find_bracket(&key).is_some() {
        return Err(BracketError::BracketAlreadyExists {
            tournament_id,
            category: category.clone(),
        });
    }

    let mut seen = HashSet::new();
    let participants: Vec<ParticipantId> = registrations
        .confirmed_participants(tournament_id, category)
        .into_iter()
        .filter(|p| seen.insert(*p))
        .collect();
    if participants.len() > limit {
        return Err(BracketError::ParticipantLimitExceeded {
            category: category.clone(),
            limit,
            found: participants.len(),
        });
    }

    let bracket = build_bracket(tournament_id, category.clone(), participants, shuffle, Utc::now())
        .map_err(alert)?;
    store.commit_bracket(&bracket).map_err(alert)?;
    log::info!(
        "Bracket generated for {} in tournament {}: {} matches, {} rounds",
        category,
        tournament_id,
        bracket.matches.len(),
        bracket.total_rounds
    );
    Ok(bracket)
}
