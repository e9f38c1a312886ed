//! Match state machine (pending -> in_progress -> completed) and winner propagation.

use crate::logic::alert;
use crate::models::{
    BracketError, BracketKey, Match, MatchId, MatchResult, MatchStatus, ParticipantId, Score, Slot,
    Wod,
};
use crate::store::MatchRepository;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;

/// Scores reported by the organizer for one match.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResultInput {
    #[serde(default)]
    pub score_a: Score,
    #[serde(default)]
    pub score_b: Score,
    /// Needed when the scores do not decide the match (tie or missing value).
    #[serde(default)]
    pub winner_slot: Option<Slot>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Winner from the scores alone.
///
/// With a time cap the lower time wins, otherwise the higher reps. A missing
/// value on either side or an exact tie decides nothing.
pub fn decide_winner(wod: Option<&Wod>, a: &Score, b: &Score) -> Option<Slot> {
    let ordering = if wod.is_some_and(Wod::has_time_cap) {
        match (a.time_secs, b.time_secs) {
            (Some(ta), Some(tb)) => tb.cmp(&ta),
            _ => return None,
        }
    } else {
        match (a.reps, b.reps) {
            (Some(ra), Some(rb)) => ra.cmp(&rb),
            _ => return None,
        }
    };
    match ordering {
        Ordering::Greater => Some(Slot::A),
        Ordering::Less => Some(Slot::B),
        Ordering::Equal => None,
    }
}

fn load<S: MatchRepository + ?Sized>(store: &S, id: MatchId) -> Result<Match, BracketError> {
    store.find_match(id).ok_or(BracketError::MatchNotFound(id))
}

fn require_status(m: &Match, status: MatchStatus, action: &'static str) -> Result<(), BracketError> {
    if m.status != status {
        return Err(BracketError::InvalidTransition {
            status: m.status,
            action,
        });
    }
    Ok(())
}

/// Move a pending match with both participants to in_progress.
pub fn start_match<S: MatchRepository + ?Sized>(store: &S, id: MatchId) -> Result<Match, BracketError> {
    let mut m = load(store, id)?;
    require_status(&m, MatchStatus::Pending, "start")?;
    if !m.is_ready() {
        return Err(BracketError::MatchNotReady(id));
    }
    m.status = MatchStatus::InProgress;
    store.replace_match(m.clone(), MatchStatus::Pending)?;
    log::info!("Match {} ({}) started", m.id, m.round_label);
    Ok(m)
}

/// Complete an in-progress match and forward its winner, if one is determined.
///
/// An explicit `winner_slot` only settles matches the scores leave undecided;
/// one that contradicts the scores is rejected. Without any winner the match
/// is still completed and can be settled later with [`declare_winner`].
pub fn record_match_result<S: MatchRepository + ?Sized>(
    store: &S,
    id: MatchId,
    input: ResultInput,
) -> Result<Match, BracketError> {
    let mut m = load(store, id)?;
    require_status(&m, MatchStatus::InProgress, "record a result for")?;

    let automatic = decide_winner(m.wod.as_ref(), &input.score_a, &input.score_b);
    let winner_slot = match (automatic, input.winner_slot) {
        (Some(auto), Some(explicit)) if auto != explicit => {
            return Err(BracketError::InvalidWinner(format!(
                "scores decide {:?}, not {:?}",
                auto, explicit
            )));
        }
        (Some(auto), _) => Some(auto),
        (None, explicit) => explicit,
    };
    let winner = winner_slot.map(|slot| occupant(&m, slot)).transpose()?;
    if winner.is_some() {
        check_next_slot_free(store, &m).map_err(alert)?;
    }

    let before = m.clone();
    m.status = MatchStatus::Completed;
    m.completed_at = Some(Utc::now());
    m.result = Some(MatchResult {
        winner,
        score_a: input.score_a,
        score_b: input.score_b,
        notes: input.notes.unwrap_or_default(),
    });
    store.replace_match(m.clone(), MatchStatus::InProgress)?;

    match winner {
        Some(w) => {
            log::info!("Match {} ({}) completed, winner {}", m.id, m.round_label, w);
            advance_or_restore(store, before, &m, w)?;
        }
        None => log::info!("Match {} ({}) completed without a winner", m.id, m.round_label),
    }
    Ok(m)
}

/// Settle a completed match that the scores left undecided, then forward the winner.
pub fn declare_winner<S: MatchRepository + ?Sized>(
    store: &S,
    id: MatchId,
    slot: Slot,
) -> Result<Match, BracketError> {
    let mut m = load(store, id)?;
    require_status(&m, MatchStatus::Completed, "declare a winner for")?;
    if let Some(existing) = m.winner() {
        return Err(BracketError::InvalidWinner(format!(
            "match {} already won by {}",
            id, existing
        )));
    }
    let winner = occupant(&m, slot)?;
    check_next_slot_free(store, &m).map_err(alert)?;

    let before = m.clone();
    m.result.get_or_insert_with(MatchResult::default).winner = Some(winner);
    store.replace_match(m.clone(), MatchStatus::Completed)?;
    log::info!("Match {} ({}) settled, winner {}", m.id, m.round_label, winner);
    advance_or_restore(store, before, &m, winner)?;
    Ok(m)
}

/// Attach the workout of a match that has not started yet.
pub fn assign_wod<S: MatchRepository + ?Sized>(
    store: &S,
    id: MatchId,
    wod: Wod,
) -> Result<Match, BracketError> {
    let mut m = load(store, id)?;
    require_status(&m, MatchStatus::Pending, "assign a WOD to")?;
    m.wod = Some(wod);
    store.replace_match(m.clone(), MatchStatus::Pending)?;
    Ok(m)
}

/// Set the planned start time of a match that has not started yet.
pub fn schedule_match<S: MatchRepository + ?Sized>(
    store: &S,
    id: MatchId,
    at: DateTime<Utc>,
) -> Result<Match, BracketError> {
    let mut m = load(store, id)?;
    require_status(&m, MatchStatus::Pending, "schedule")?;
    m.scheduled_at = Some(at);
    store.replace_match(m.clone(), MatchStatus::Pending)?;
    Ok(m)
}

/// Winner of the final, if it has been played and decided.
pub fn champion<S: MatchRepository + ?Sized>(
    store: &S,
    key: &BracketKey,
) -> Result<Option<ParticipantId>, BracketError> {
    let bracket = store
        .find_bracket(key)
        .ok_or_else(|| BracketError::BracketNotFound {
            tournament_id: key.tournament_id,
            category: key.category.clone(),
        })?;
    Ok(bracket.champion())
}

fn occupant(m: &Match, slot: Slot) -> Result<ParticipantId, BracketError> {
    m.slot(slot).ok_or_else(|| {
        BracketError::InvalidWinner(format!("slot {:?} of match {} is empty", slot, m.id))
    })
}

/// The slot this match feeds must still be empty, and one round further on.
fn check_next_slot_free<S: MatchRepository + ?Sized>(store: &S, m: &Match) -> Result<(), BracketError> {
    let Some(next) = m.next else {
        return check_is_final(store, m);
    };
    let target = store.find_match(next.match_id).ok_or_else(|| {
        BracketError::BracketCorruption(format!(
            "match {} links to missing match {}",
            m.id, next.match_id
        ))
    })?;
    if target.round != m.round + 1 {
        return Err(BracketError::BracketCorruption(format!(
            "match {} in round {} links to round {}",
            m.id, m.round, target.round
        )));
    }
    if let Some(existing) = target.slot(next.slot) {
        return Err(BracketError::BracketCorruption(format!(
            "slot {:?} of match {} already holds {}",
            next.slot, target.id, existing
        )));
    }
    Ok(())
}

/// A match without a forward link must be the last round of its bracket.
fn check_is_final<S: MatchRepository + ?Sized>(store: &S, m: &Match) -> Result<(), BracketError> {
    let key = BracketKey::new(m.tournament_id, m.category.clone());
    let total = store.find_bracket(&key).map(|b| b.total_rounds).unwrap_or(0);
    if m.round != total {
        return Err(BracketError::BracketCorruption(format!(
            "match {} in round {} of {} has no next match",
            m.id, m.round, total
        )));
    }
    Ok(())
}

/// Forward the winner of a just-committed match. If the slot write fails the
/// match is put back to `before`, so its result can be entered again.
fn advance_or_restore<S: MatchRepository + ?Sized>(
    store: &S,
    before: Match,
    after: &Match,
    winner: ParticipantId,
) -> Result<(), BracketError> {
    let Err(e) = propagate(store, after, winner) else {
        return Ok(());
    };
    let id = before.id;
    if let Err(undo) = store.replace_match(before, MatchStatus::Completed) {
        log::error!("Could not restore match {} after failed propagation: {}", id, undo);
    }
    Err(alert(e))
}

fn propagate<S: MatchRepository + ?Sized>(
    store: &S,
    m: &Match,
    winner: ParticipantId,
) -> Result<(), BracketError> {
    match m.next {
        Some(next) => {
            store.fill_slot(next.match_id, next.slot, winner)?;
            log::debug!("{} advances to match {} {:?}", winner, next.match_id, next.slot);
        }
        None => log::info!(
            "{} wins {} in tournament {}",
            winner,
            m.category,
            m.tournament_id
        ),
    }
    Ok(())
}
