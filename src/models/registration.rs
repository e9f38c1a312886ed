//! Registration records and categories consumed by the bracket builder.

use crate::models::game::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (athlete).
pub type ParticipantId = Uuid;

/// Display labels used by the registration form, mapped to stored slugs.
const CATEGORY_LABELS: [(&str, &str); 4] = [
    ("intermedio masculino", "intermedio-male"),
    ("intermedio femenino", "intermedio-female"),
    ("scaled masculino", "scaled-male"),
    ("scaled femenino", "scaled-female"),
];

/// Competition category, stored as a normalized slug (e.g. `scaled-female`).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Category(String);

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse(&raw)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl Category {
    /// Normalize a slug or a display label ("Scaled Femenino") into a category.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
        let slug = CATEGORY_LABELS
            .iter()
            .find(|(label, _)| *label == collapsed)
            .map(|(_, slug)| slug.to_string())
            .unwrap_or_else(|| collapsed.replace(' ', "-"));
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The four categories of the battle format.
    pub fn defaults() -> Vec<Category> {
        CATEGORY_LABELS
            .iter()
            .map(|(_, slug)| Category(slug.to_string()))
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment/registration state. Only `Confirmed` entrants are seeded into a bracket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    PendingPayment,
    Confirmed,
    Cancelled,
    Refunded,
}

/// An athlete's registration to one category of a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub participant_id: ParticipantId,
    pub tournament_id: TournamentId,
    pub category: Category,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub status: RegistrationStatus,
}

impl Registration {
    /// New confirmed registration with a fresh participant id.
    pub fn confirmed(
        tournament_id: TournamentId,
        category: Category,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: Uuid::new_v4(),
            tournament_id,
            category,
            first_name: first_name.into(),
            last_name: last_name.into(),
            status: RegistrationStatus::Confirmed,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_maps_display_labels_to_slugs() {
        assert_eq!(Category::parse("Intermedio Masculino").as_str(), "intermedio-male");
        assert_eq!(Category::parse("  scaled   FEMENINO ").as_str(), "scaled-female");
    }

    #[test]
    fn parse_keeps_slugs() {
        assert_eq!(Category::parse("scaled-male").as_str(), "scaled-male");
        assert_eq!(Category::parse("RX Open").as_str(), "rx-open");
    }

    #[test]
    fn full_name_trims_parts() {
        let r = Registration::confirmed(Uuid::new_v4(), Category::parse("scaled-male"), " Ana", "Gil ");
        assert_eq!(r.full_name(), "Ana Gil");
        assert!(r.is_confirmed());
    }
}
