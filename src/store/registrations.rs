//! In-memory registration book, optionally seeded from a CSV export.

use super::RegistrationSource;
use crate::models::{Category, ParticipantId, Registration, TournamentId};
use std::io::Read;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Registrations kept in memory.
///
/// CSV columns: `participant_id,tournament_id,category,first_name,last_name,status`.
/// `category` accepts slugs or display labels; `status` is one of
/// `pending_payment`, `confirmed`, `cancelled`, `refunded`.
#[derive(Debug, Default)]
pub struct RegistrationBook {
    entries: RwLock<Vec<Registration>>,
}

impl RegistrationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registrations(entries: Vec<Registration>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let entries = rdr
            .deserialize::<Registration>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_registrations(entries))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Add a registration, replacing an earlier one of the same participant
    /// in the same tournament and category.
    pub fn add(&self, registration: Registration) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|r| {
            !(r.participant_id == registration.participant_id
                && r.tournament_id == registration.tournament_id
                && r.category == registration.category)
        });
        entries.push(registration);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistrationSource for RegistrationBook {
    fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
        category: &Category,
    ) -> Vec<ParticipantId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .confirmed_participants(tournament_id, category)
    }

    fn display_name(&self, participant: ParticipantId) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .display_name(participant)
    }
}
