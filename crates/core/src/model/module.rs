use serde::{Deserialize, Serialize};

use crate::model::card::LearningCard;
use crate::model::ids::ModuleId;

/// An ordered collection of cards studied as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    pub id: ModuleId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub cards: Vec<LearningCard>,
}

impl LearningModule {
    /// Number of cards, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_cards(&self) -> u32 {
        u32::try_from(self.cards.len()).unwrap_or(u32::MAX)
    }
}
