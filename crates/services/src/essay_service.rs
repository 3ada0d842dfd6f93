use std::sync::Arc;

use rand::Rng;
use rand::rng;
use rand::seq::IndexedRandom;
use storage::repository::EssayRepository;
use study_core::model::{ESSAY_THEMES, Essay, EssayId, NewEssay, OwnerId};
use tracing::info;

use crate::Clock;
use crate::error::EssayServiceError;

/// Essay practice: write against a theme, read back past essays.
#[derive(Clone)]
pub struct EssayService {
    clock: Clock,
    essays: Arc<dyn EssayRepository>,
}

impl EssayService {
    #[must_use]
    pub fn new(clock: Clock, essays: Arc<dyn EssayRepository>) -> Self {
        Self { clock, essays }
    }

    /// Store an essay stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `EssayServiceError::Essay` if theme or text is blank.
    /// Returns `EssayServiceError::Storage` if persistence fails.
    pub async fn write(
        &self,
        owner: OwnerId,
        theme: &str,
        text: &str,
    ) -> Result<EssayId, EssayServiceError> {
        let essay = NewEssay::new(owner, theme, text, self.clock.now())?;
        let id = self.essays.create_essay(&essay).await?;
        info!(essay_id = %id, theme = essay.theme(), "essay saved");
        Ok(id)
    }

    /// The owner's essays, newest first.
    ///
    /// # Errors
    ///
    /// Returns `EssayServiceError::Storage` if repository access fails.
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<Essay>, EssayServiceError> {
        Ok(self.essays.list_essays(owner).await?)
    }

    #[must_use]
    pub fn random_theme(&self) -> &'static str {
        random_theme_with(&mut rng())
    }
}

/// Pick one of the built-in themes.
pub fn random_theme_with<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ESSAY_THEMES.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::InMemoryRepository;
    use study_core::model::EssayError;
    use study_core::time::fixed_now;

    #[tokio::test]
    async fn write_then_list_newest_first() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut clock = Clock::fixed(fixed_now());
        let owner = OwnerId::new("u1");

        EssayService::new(clock, repo.clone())
            .write(owner.clone(), "Inclusão digital", "Primeiro texto.")
            .await
            .unwrap();
        clock.advance(Duration::days(1));
        let svc = EssayService::new(clock, repo);
        let id = svc
            .write(owner.clone(), "Desigualdade social", "Segundo texto.")
            .await
            .unwrap();

        let essays = svc.list(&owner).await.unwrap();
        assert_eq!(essays.len(), 2);
        assert_eq!(essays[0].id, id);
        assert_eq!(essays[0].created_at, fixed_now() + Duration::days(1));
        assert_eq!(essays[1].theme, "Inclusão digital");
        assert!(svc.list(&OwnerId::new("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_rejects_blank_fields() {
        let svc = EssayService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()));
        let owner = OwnerId::new("u1");

        assert!(matches!(
            svc.write(owner.clone(), "", "Texto").await,
            Err(EssayServiceError::Essay(EssayError::EmptyTheme))
        ));
        assert!(matches!(
            svc.write(owner.clone(), "Inclusão digital", "   ").await,
            Err(EssayServiceError::Essay(EssayError::EmptyText))
        ));
        assert!(svc.list(&owner).await.unwrap().is_empty());
    }

    #[test]
    fn random_theme_comes_from_the_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(ESSAY_THEMES.contains(&random_theme_with(&mut rng)));
        }

        let svc = EssayService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()));
        assert!(ESSAY_THEMES.contains(&svc.random_theme()));
    }
}
