use std::sync::Arc;

use spark_core::model::{LearningCard, LearningModule, ModuleId};
use spark_core::{CardStack, StackTransition, SwipeOutcome};

use crate::progress_store::ProgressStore;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One viewing session over a module's cards. Lives in memory only; its
/// position reaches storage through `StudyService`.
#[derive(Debug, Clone)]
pub struct StudySession {
    module_id: ModuleId,
    title: String,
    stack: CardStack<LearningCard>,
}

impl StudySession {
    fn new(module: LearningModule, start_index: usize) -> Self {
        Self {
            module_id: module.id,
            title: module.title,
            stack: CardStack::new(module.cards, start_index),
        }
    }

    #[must_use]
    pub fn module_id(&self) -> &ModuleId {
        &self.module_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn stack(&self) -> &CardStack<LearningCard> {
        &self.stack
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&LearningCard> {
        self.stack.current_card()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.stack.current_index()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stack.is_finished()
    }

    /// Card count as stored in progress records.
    #[must_use]
    pub fn total_cards(&self) -> u32 {
        u32::try_from(self.stack.len()).unwrap_or(u32::MAX)
    }
}

/// Result of one navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyStep {
    pub transition: StackTransition,
    /// `None` when nothing needed saving, otherwise whether the save succeeded.
    pub persisted: Option<bool>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives study sessions and records every position change in `ProgressStore`.
#[derive(Clone)]
pub struct StudyService {
    progress: Arc<ProgressStore>,
}

impl StudyService {
    #[must_use]
    pub fn new(progress: Arc<ProgressStore>) -> Self {
        Self { progress }
    }

    /// Open a module where the learner left off.
    ///
    /// Completed modules and modules without saved progress start at the
    /// first card.
    pub async fn start(&self, module: LearningModule) -> StudySession {
        let start_index = self
            .progress
            .get_module_progress(&module.id)
            .await
            .map_or(0, |record| record.resume_index(module.cards.len()));
        log::debug!("starting {} at card {start_index}", module.id);
        StudySession::new(module, start_index)
    }

    /// Open a module at an explicit card, ignoring saved progress.
    #[must_use]
    pub fn start_at(&self, module: LearningModule, start_index: usize) -> StudySession {
        StudySession::new(module, start_index)
    }

    pub async fn advance(&self, session: &mut StudySession) -> StudyStep {
        let transition = session.stack.advance();
        self.record(session, transition).await
    }

    pub async fn retreat(&self, session: &mut StudySession) -> StudyStep {
        let transition = session.stack.retreat();
        self.record(session, transition).await
    }

    pub async fn swipe(&self, session: &mut StudySession, outcome: SwipeOutcome) -> StudyStep {
        let transition = session.stack.apply_swipe(outcome);
        self.record(session, transition).await
    }

    async fn record(&self, session: &StudySession, transition: StackTransition) -> StudyStep {
        let total = session.total_cards();
        let persisted = match transition {
            StackTransition::Moved { index } => {
                let index = u32::try_from(index).unwrap_or(total);
                Some(
                    self.progress
                        .save_module_progress(&session.module_id, index, total, false)
                        .await,
                )
            }
            StackTransition::Completed => {
                log::info!("completed module {}", session.module_id);
                Some(
                    self.progress
                        .complete_module(&session.module_id, total)
                        .await,
                )
            }
            StackTransition::Ignored => None,
        };
        StudyStep { transition, persisted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_core::model::CardKind;
    use spark_core::time::fixed_clock;
    use storage::InMemoryKeyValueStore;

    fn module(n: usize) -> LearningModule {
        LearningModule {
            id: ModuleId::try_new("m1").unwrap(),
            title: "Module".into(),
            subtitle: None,
            icon: None,
            difficulty: None,
            estimated_time: None,
            cards: (0..n)
                .map(|i| LearningCard::new(CardKind::TextFocused, format!("Card {i}")))
                .collect(),
        }
    }

    fn service() -> (StudyService, Arc<ProgressStore>) {
        let progress = Arc::new(ProgressStore::new(
            fixed_clock(),
            Arc::new(InMemoryKeyValueStore::new()),
        ));
        (StudyService::new(Arc::clone(&progress)), progress)
    }

    #[tokio::test]
    async fn each_move_is_saved() {
        let (service, progress) = service();
        let mut session = service.start(module(4)).await;
        assert_eq!(session.current_index(), 0);

        let step = service.advance(&mut session).await;
        assert_eq!(step.transition, StackTransition::Moved { index: 1 });
        assert_eq!(step.persisted, Some(true));

        let record = progress
            .get_module_progress(session.module_id())
            .await
            .unwrap();
        assert_eq!(record.current_card_index(), 1);
        assert_eq!(record.total_cards(), 4);
        assert_eq!(record.progress_percentage(), 25);
    }

    #[tokio::test]
    async fn resumes_from_saved_index() {
        let (service, progress) = service();
        let id = ModuleId::try_new("m1").unwrap();
        progress.save_module_progress(&id, 2, 4, false).await;

        let session = service.start(module(4)).await;
        assert_eq!(session.current_index(), 2);
    }

    #[tokio::test]
    async fn completion_marks_module_complete() {
        let (service, progress) = service();
        let mut session = service.start(module(2)).await;
        service.advance(&mut session).await;

        let step = service.advance(&mut session).await;
        assert_eq!(step.transition, StackTransition::Completed);
        assert_eq!(step.persisted, Some(true));
        assert!(session.is_finished());

        let record = progress
            .get_module_progress(session.module_id())
            .await
            .unwrap();
        assert!(record.completed());
        assert_eq!(record.progress_percentage(), 100);

        let again = service.start(module(2)).await;
        assert_eq!(again.current_index(), 0);
    }

    #[tokio::test]
    async fn ignored_transitions_save_nothing() {
        let (service, progress) = service();
        let mut session = service.start(module(3)).await;

        let step = service.retreat(&mut session).await;
        assert_eq!(step, StudyStep { transition: StackTransition::Ignored, persisted: None });

        let step = service.swipe(&mut session, SwipeOutcome::SnapBack).await;
        assert_eq!(step.persisted, None);
        assert!(progress.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn empty_module_has_no_transitions() {
        let (service, _) = service();
        let mut session = service.start(module(0)).await;
        assert_eq!(session.total_cards(), 0);
        assert!(session.current_card().is_none());
        assert_eq!(service.advance(&mut session).await.transition, StackTransition::Ignored);
    }

    #[test]
    fn start_at_clamps_out_of_range_index() {
        let (service, _) = service();
        let session = service.start_at(module(3), 9);
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.title(), "Module");
    }
}
