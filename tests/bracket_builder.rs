//! Integration tests for bracket generation: sizes, byes, links and idempotency.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use uuid::Uuid;
use wod_battle_bracket::{
    build_bracket, generate_bracket, get_bracket, Bracket, BracketError, Category, CategoryLimits,
    InMemoryMatchStore, InputOrder, MatchRepository, MatchStatus, ParticipantId, RandomShuffle,
    Registration, RegistrationStatus, TournamentId,
};

fn category() -> Category {
    Category::parse("scaled-male")
}

fn registrations(tournament_id: TournamentId, n: usize) -> Vec<Registration> {
    (0..n)
        .map(|i| Registration::confirmed(tournament_id, category(), format!("Athlete{i}"), "Test"))
        .collect()
}

fn build(n: usize) -> (Vec<ParticipantId>, Bracket) {
    let entrants: Vec<ParticipantId> = (0..n).map(|_| Uuid::new_v4()).collect();
    let bracket = build_bracket(Uuid::new_v4(), category(), entrants.clone(), &mut InputOrder, Utc::now())
        .unwrap();
    (entrants, bracket)
}

#[test]
fn match_count_is_size_minus_one_with_single_final() {
    for n in 2..=33 {
        let (_, bracket) = build(n);
        let size = n.next_power_of_two();
        assert_eq!(bracket.matches.len(), size - 1, "n = {n}");
        assert_eq!(bracket.round(bracket.total_rounds).count(), 1, "n = {n}");
        assert_eq!(2usize.pow(bracket.total_rounds), size, "n = {n}");
    }
}

#[test]
fn power_of_two_has_no_byes() {
    for n in [2, 4, 8, 16, 32] {
        let (_, bracket) = build(n);
        assert!(bracket.round(1).all(|m| m.is_ready()), "n = {n}");
        assert!(bracket.round(1).all(|m| m.status == MatchStatus::Pending));
    }
}

#[test]
fn non_power_of_two_byes_auto_advance() {
    for n in [3, 5, 6, 7, 9, 12, 17] {
        let (entrants, bracket) = build(n);
        let size = n.next_power_of_two();
        let empty_slots = bracket
            .round(1)
            .map(|m| usize::from(m.slot_a.is_none()) + usize::from(m.slot_b.is_none()))
            .sum::<usize>();
        assert_eq!(empty_slots, size - n, "n = {n}");

        for bye in bracket.round(1).filter(|m| m.is_bye()) {
            let sole = bye.slot_a.or(bye.slot_b).unwrap();
            assert_eq!(bye.status, MatchStatus::Completed);
            assert_eq!(bye.winner(), Some(sole));
            let next = bye.next.unwrap();
            assert_eq!(bracket.get(next.match_id).unwrap().slot(next.slot), Some(sole));
        }

        let placed: HashSet<_> = bracket
            .round(1)
            .flat_map(|m| [m.slot_a, m.slot_b])
            .flatten()
            .collect();
        assert_eq!(placed, entrants.iter().copied().collect::<HashSet<_>>(), "n = {n}");
    }
}

#[test]
fn every_non_final_match_links_forward() {
    let (_, bracket) = build(13);
    for m in &bracket.matches {
        if m.round == bracket.total_rounds {
            assert!(m.next.is_none());
            assert_eq!(m.round_label, "Final");
        } else {
            let next = m.next.expect("non-final match without forward link");
            assert_eq!(bracket.get(next.match_id).unwrap().round, m.round + 1);
        }
    }
    let linked_slots: HashSet<_> = bracket
        .matches
        .iter()
        .filter_map(|m| m.next)
        .map(|n| (n.match_id, n.slot))
        .collect();
    assert_eq!(linked_slots.len(), bracket.matches.len() - 1);
}

#[test]
fn five_participants_layout() {
    let (p, bracket) = build(5);
    assert_eq!(bracket.total_rounds, 3);
    assert_eq!(bracket.round(1).count(), 4);
    assert_eq!(bracket.round(2).count(), 2);
    assert_eq!(bracket.round(3).count(), 1);

    let first: Vec<_> = bracket.round(1).collect();
    assert_eq!((first[0].slot_a, first[0].slot_b), (Some(p[0]), Some(p[1])));
    assert_eq!(first.iter().filter(|m| m.is_bye()).count(), 3);

    let labels: Vec<_> = bracket.matches.iter().map(|m| m.round_label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "Quarterfinals",
            "Quarterfinals",
            "Quarterfinals",
            "Quarterfinals",
            "Semifinals",
            "Semifinals",
            "Final"
        ]
    );

    // Byes of p[3] and p[4] meet in the second semifinal straight away.
    let semis: Vec<_> = bracket.round(2).collect();
    assert_eq!((semis[0].slot_a, semis[0].slot_b), (None, Some(p[2])));
    assert_eq!((semis[1].slot_a, semis[1].slot_b), (Some(p[3]), Some(p[4])));
}

#[test]
fn seeded_shuffle_is_reproducible() {
    let entrants: Vec<ParticipantId> = (0..11).map(|_| Uuid::new_v4()).collect();
    let t = Uuid::new_v4();
    let layout = |seed| {
        let mut shuffle = RandomShuffle::new(StdRng::seed_from_u64(seed));
        let b = build_bracket(t, category(), entrants.clone(), &mut shuffle, Utc::now()).unwrap();
        b.round(1).map(|m| (m.slot_a, m.slot_b)).collect::<Vec<_>>()
    };
    assert_eq!(layout(42), layout(42));
}

#[test]
fn generate_rejects_fewer_than_two_confirmed() {
    let t = Uuid::new_v4();
    let mut regs = registrations(t, 3);
    regs[1].status = RegistrationStatus::PendingPayment;
    regs[2].status = RegistrationStatus::Cancelled;
    let store = InMemoryMatchStore::new();

    let err = generate_bracket(&store, &regs, &CategoryLimits::default(), t, &category(), &mut InputOrder)
        .unwrap_err();
    assert_eq!(err, BracketError::InsufficientParticipants { found: 1 });
    assert!(!err.is_fatal());
    assert!(store.is_empty());
}

#[test]
fn generate_twice_is_rejected_and_keeps_one_tree() {
    let t = Uuid::new_v4();
    let regs = registrations(t, 6);
    let store = InMemoryMatchStore::new();
    let limits = CategoryLimits::default();

    let first = generate_bracket(&store, &regs, &limits, t, &category(), &mut InputOrder).unwrap();
    assert_eq!(first.total_rounds, 3);

    let err = generate_bracket(&store, &regs, &limits, t, &category(), &mut InputOrder).unwrap_err();
    assert!(matches!(err, BracketError::BracketAlreadyExists { .. }));
    assert_eq!(store.len(), 7);

    let stored = get_bracket(&store, &regs, t, &category()).unwrap();
    let ids: Vec<_> = stored.iter().map(|v| v.game.id).collect();
    let expected: Vec<_> = first.matches.iter().map(|m| m.id).collect();
    assert_eq!(ids, expected);
}

#[test]
fn racing_generations_leave_a_single_tree() {
    let t = Uuid::new_v4();
    let regs = registrations(t, 9);
    let store = InMemoryMatchStore::new();
    let limits = CategoryLimits::default();

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| generate_bracket(&store, &regs, &limits, t, &category(), &mut InputOrder)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, BracketError::BracketAlreadyExists { .. })));
    assert_eq!(store.len(), 15);
}

#[test]
fn generate_checks_category_and_limit() {
    let t = Uuid::new_v4();
    let regs = registrations(t, 5);
    let store = InMemoryMatchStore::new();

    let unknown = generate_bracket(
        &store,
        &regs,
        &CategoryLimits::default(),
        t,
        &Category::parse("rx-open"),
        &mut InputOrder,
    )
    .unwrap_err();
    assert!(matches!(unknown, BracketError::UnknownCategory(_)));

    let tight = CategoryLimits::new([(category(), 4)]);
    let err = generate_bracket(&store, &regs, &tight, t, &category(), &mut InputOrder).unwrap_err();
    assert!(matches!(
        err,
        BracketError::ParticipantLimitExceeded { limit: 4, found: 5, .. }
    ));
    assert!(store.is_empty());
}

#[test]
fn display_labels_resolve_to_the_same_bracket() {
    let t = Uuid::new_v4();
    let regs = registrations(t, 4);
    let store = InMemoryMatchStore::new();
    generate_bracket(
        &store,
        &regs,
        &CategoryLimits::default(),
        t,
        &Category::parse("Scaled Masculino"),
        &mut InputOrder,
    )
    .unwrap();

    let views = get_bracket(&store, &regs, t, &category()).unwrap();
    assert_eq!(views.len(), 3);
    assert_eq!(views[0].slot_a_name.as_deref(), Some("Athlete0 Test"));
    assert!(store
        .find_bracket(&wod_battle_bracket::BracketKey::new(t, category()))
        .is_some());
}

#[test]
fn repeated_registration_counts_once_against_the_limit() {
    let t = Uuid::new_v4();
    let mut regs = registrations(t, 2);
    regs.push(regs[0].clone());
    let store = InMemoryMatchStore::new();
    let limits = CategoryLimits::new([(category(), 2)]);

    let bracket = generate_bracket(&store, &regs, &limits, t, &category(), &mut InputOrder).unwrap();
    assert_eq!(bracket.total_rounds, 1);
    let only = &bracket.matches[0];
    assert_eq!(
        (only.slot_a, only.slot_b),
        (Some(regs[0].participant_id), Some(regs[1].participant_id))
    );
}
