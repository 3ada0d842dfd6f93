use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{EssayId, OwnerId};

/// Prompts offered when the writer asks for a random theme.
pub const ESSAY_THEMES: &[&str] = &[
    "Desafios da educação no Brasil",
    "Fake news e democracia",
    "Saúde mental dos jovens",
    "Violência nas escolas",
    "Impacto das redes sociais",
    "Desigualdade social",
    "Sustentabilidade ambiental",
    "Inclusão digital",
    "Cultura do cancelamento",
    "Inteligência artificial",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EssayError {
    #[error("essay theme cannot be empty")]
    EmptyTheme,

    #[error("essay text cannot be empty")]
    EmptyText,
}

/// A written essay practice. Essays are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: EssayId,
    pub owner_id: OwnerId,
    pub theme: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Creation request for an essay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEssay {
    owner_id: OwnerId,
    theme: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl NewEssay {
    /// Build a creation request. The theme is trimmed; the text keeps its
    /// layout and only has surrounding blank lines removed.
    ///
    /// # Errors
    ///
    /// Returns `EssayError::EmptyTheme` or `EssayError::EmptyText` for blank
    /// input.
    pub fn new(
        owner_id: OwnerId,
        theme: impl AsRef<str>,
        text: impl AsRef<str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EssayError> {
        let theme = theme.as_ref().trim();
        if theme.is_empty() {
            return Err(EssayError::EmptyTheme);
        }
        let text = text.as_ref().trim_matches(|c: char| c == '\n' || c == '\r');
        if text.trim().is_empty() {
            return Err(EssayError::EmptyText);
        }
        Ok(Self {
            owner_id,
            theme: theme.to_owned(),
            text: text.to_owned(),
            created_at,
        })
    }

    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn into_essay(self, id: EssayId) -> Essay {
        Essay {
            id,
            owner_id: self.owner_id,
            theme: self.theme,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

impl Essay {
    /// Number of whitespace-separated words in the text.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
