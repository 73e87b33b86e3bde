use spark_core::model::{CardKind, LearningCard, LearningModule, ModuleId};
use spark_core::time::fixed_now;
use spark_core::{StackTransition, SwipeOutcome, SwipeTracker};
use services::{AppServices, Clock};

fn module(cards: usize) -> LearningModule {
    LearningModule {
        id: ModuleId::try_new("focus-basics").unwrap(),
        title: "Focus Basics".into(),
        subtitle: Some("Five minutes a day".into()),
        icon: None,
        difficulty: Some("beginner".into()),
        estimated_time: Some("5 min".into()),
        cards: (0..cards)
            .map(|i| LearningCard::new(CardKind::KeyInsight, format!("Card {i}")))
            .collect(),
    }
}

#[tokio::test]
async fn study_session_survives_restart_and_completes() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let study = services.study();
    let progress = services.progress();

    let mut session = study.start(module(5)).await;
    study.advance(&mut session).await;
    study.advance(&mut session).await;
    study.retreat(&mut session).await;
    drop(session);

    let in_progress = progress.get_in_progress_modules().await;
    assert_eq!(in_progress, vec![ModuleId::try_new("focus-basics").unwrap()]);

    let mut session = study.start(module(5)).await;
    assert_eq!(session.current_index(), 1);

    let mut tracker = SwipeTracker::default();
    let mut completed = 0;
    for _ in 0..10 {
        tracker.begin();
        tracker.update(tracker.threshold() + 1.0);
        let step = study.swipe(&mut session, tracker.release()).await;
        if step.transition == StackTransition::Completed {
            completed += 1;
        }
    }
    assert_eq!(completed, 1);

    let completed_ids = progress.get_completed_modules().await;
    assert_eq!(completed_ids.len(), 1);
    assert!(progress.get_in_progress_modules().await.is_empty());

    let record = progress
        .get_module_progress(&ModuleId::try_new("focus-basics").unwrap())
        .await
        .unwrap();
    assert_eq!(record.current_card_index(), 5);
    assert_eq!(record.progress_percentage(), 100);
}

#[tokio::test]
async fn short_drag_changes_nothing() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let study = services.study();
    let mut session = study.start(module(3)).await;

    let step = study.swipe(&mut session, SwipeOutcome::SnapBack).await;
    assert_eq!(step.transition, StackTransition::Ignored);
    assert!(services.progress().get_all().await.is_empty());
}
