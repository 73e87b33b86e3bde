//! Sequential progression through a module's cards.
//!
//! The stack only navigates. Persisting the position is left to whoever
//! drives it, either by inspecting each returned [`StackTransition`] or by
//! passing a [`StackObserver`].

/// Horizontal drag distance (logical px) that commits a swipe.
pub const SWIPE_THRESHOLD: f32 = 120.0;

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// What a navigation request did to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackTransition {
    /// The current index changed to `index`.
    Moved { index: usize },
    /// Advanced past the last card. Returned once per stack.
    Completed,
    /// Nothing changed (first card, empty stack, or already completed).
    Ignored,
}

/// Receives transitions synchronously as they happen.
pub trait StackObserver {
    fn on_progress_update(&mut self, index: usize);
    fn on_complete(&mut self);
}

//
// ─── STACK ─────────────────────────────────────────────────────────────────────
//

/// A fixed card sequence with a cursor.
#[derive(Debug, Clone)]
pub struct CardStack<C> {
    cards: Vec<C>,
    current: usize,
    finished: bool,
}

impl<C> CardStack<C> {
    /// Opens the stack at `start_index`, clamped to the last card.
    #[must_use]
    pub fn new(cards: Vec<C>, start_index: usize) -> Self {
        let current = start_index.min(cards.len().saturating_sub(1));
        Self {
            cards,
            current,
            finished: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn cards(&self) -> &[C] {
        &self.cards
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&C> {
        self.cards.get(self.current)
    }

    /// True once advancing past the last card has been reported.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        !self.finished && self.current > 0
    }

    /// The next advance will complete the stack rather than move.
    #[must_use]
    pub fn on_last_card(&self) -> bool {
        !self.cards.is_empty() && self.current + 1 == self.cards.len()
    }

    pub fn advance(&mut self) -> StackTransition {
        if self.cards.is_empty() || self.finished {
            return StackTransition::Ignored;
        }
        let next = self.current + 1;
        if next < self.cards.len() {
            self.current = next;
            StackTransition::Moved { index: next }
        } else {
            self.finished = true;
            StackTransition::Completed
        }
    }

    pub fn retreat(&mut self) -> StackTransition {
        if !self.can_retreat() {
            return StackTransition::Ignored;
        }
        self.current -= 1;
        StackTransition::Moved {
            index: self.current,
        }
    }

    /// Applies a released swipe. Retreating from the first card snaps back.
    pub fn apply_swipe(&mut self, outcome: SwipeOutcome) -> StackTransition {
        match outcome {
            SwipeOutcome::Advance => self.advance(),
            SwipeOutcome::Retreat => self.retreat(),
            SwipeOutcome::SnapBack => StackTransition::Ignored,
        }
    }

    pub fn advance_notify(&mut self, observer: &mut impl StackObserver) -> StackTransition {
        let transition = self.advance();
        dispatch(transition, observer);
        transition
    }

    pub fn retreat_notify(&mut self, observer: &mut impl StackObserver) -> StackTransition {
        let transition = self.retreat();
        dispatch(transition, observer);
        transition
    }

    /// 1-based position for display, 0 for an empty stack.
    #[must_use]
    pub fn position(&self) -> usize {
        if self.cards.is_empty() {
            0
        } else {
            self.current + 1
        }
    }

    /// Share of the stack seen so far, counting the current card.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f32 {
        if self.cards.is_empty() {
            return 0.0;
        }
        self.position() as f32 / self.cards.len() as f32
    }

    /// `"3 / 10"` style counter.
    #[must_use]
    pub fn position_label(&self) -> String {
        format!("{} / {}", self.position(), self.cards.len())
    }
}

fn dispatch(transition: StackTransition, observer: &mut impl StackObserver) {
    match transition {
        StackTransition::Moved { index } => observer.on_progress_update(index),
        StackTransition::Completed => observer.on_complete(),
        StackTransition::Ignored => {}
    }
}

//
// ─── GESTURES ──────────────────────────────────────────────────────────────────
//

/// Where a released drag leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Advance,
    Retreat,
    SnapBack,
}

/// Samples horizontal drag displacement between touch-down and release.
///
/// Positive displacement past the threshold advances, negative past the
/// negated threshold retreats, anything shorter snaps back.
#[derive(Debug, Clone, Copy)]
pub struct SwipeTracker {
    threshold: f32,
    dx: f32,
    active: bool,
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD)
    }
}

impl SwipeTracker {
    /// A tracker committing at `threshold`; non-positive values fall back to
    /// [`SWIPE_THRESHOLD`].
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold > 0.0 {
            threshold
        } else {
            SWIPE_THRESHOLD
        };
        Self {
            threshold,
            dx: 0.0,
            active: false,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn begin(&mut self) {
        self.dx = 0.0;
        self.active = true;
    }

    /// Records the latest total displacement since `begin`.
    pub fn update(&mut self, dx: f32) {
        if self.active && dx.is_finite() {
            self.dx = dx;
        }
    }

    #[must_use]
    pub fn displacement(&self) -> f32 {
        self.dx
    }

    /// Ends the drag and classifies it.
    pub fn release(&mut self) -> SwipeOutcome {
        if !self.active {
            return SwipeOutcome::SnapBack;
        }
        self.active = false;
        let dx = std::mem::take(&mut self.dx);
        self.classify(dx)
    }

    #[must_use]
    pub fn classify(&self, dx: f32) -> SwipeOutcome {
        if dx >= self.threshold {
            SwipeOutcome::Advance
        } else if dx <= -self.threshold {
            SwipeOutcome::Retreat
        } else {
            SwipeOutcome::SnapBack
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        updates: Vec<usize>,
        completions: usize,
    }

    impl StackObserver for Recorder {
        fn on_progress_update(&mut self, index: usize) {
            self.updates.push(index);
        }

        fn on_complete(&mut self) {
            self.completions += 1;
        }
    }

    fn stack(n: usize) -> CardStack<u32> {
        CardStack::new((0..n as u32).collect(), 0)
    }

    #[test]
    fn advancing_through_all_cards_completes_once() {
        let mut stack = stack(4);
        let mut recorder = Recorder::default();

        for _ in 0..3 {
            stack.advance_notify(&mut recorder);
        }
        assert_eq!(stack.current_index(), 3);
        assert_eq!(recorder.completions, 0);
        assert_eq!(recorder.updates, vec![1, 2, 3]);

        assert_eq!(stack.advance_notify(&mut recorder), StackTransition::Completed);
        assert_eq!(stack.advance_notify(&mut recorder), StackTransition::Ignored);
        assert_eq!(recorder.completions, 1);
        assert!(stack.is_finished());
    }

    #[test]
    fn retreat_at_first_card_is_noop() {
        let mut stack = stack(3);
        let mut recorder = Recorder::default();
        assert_eq!(stack.retreat_notify(&mut recorder), StackTransition::Ignored);
        assert_eq!(stack.current_index(), 0);
        assert!(recorder.updates.is_empty());
    }

    #[test]
    fn retreat_moves_back_one() {
        let mut stack = CardStack::new(vec!['a', 'b', 'c'], 2);
        assert_eq!(stack.retreat(), StackTransition::Moved { index: 1 });
        assert_eq!(stack.current_card(), Some(&'b'));
    }

    #[test]
    fn empty_stack_accepts_no_transitions() {
        let mut stack: CardStack<u32> = CardStack::new(Vec::new(), 3);
        assert_eq!(stack.len(), 0);
        assert!(stack.current_card().is_none());
        assert_eq!(stack.advance(), StackTransition::Ignored);
        assert_eq!(stack.retreat(), StackTransition::Ignored);
        assert!(!stack.is_finished());
        assert_eq!(stack.position_label(), "0 / 0");
    }

    #[test]
    fn start_index_is_clamped() {
        let stack = CardStack::new(vec![1, 2, 3], 10);
        assert_eq!(stack.current_index(), 2);
        assert!(stack.on_last_card());
    }

    #[test]
    fn single_card_completes_on_first_advance() {
        let mut stack = stack(1);
        assert_eq!(stack.advance(), StackTransition::Completed);
    }

    #[test]
    fn position_helpers() {
        let mut stack = stack(4);
        stack.advance();
        assert_eq!(stack.position(), 2);
        assert_eq!(stack.position_label(), "2 / 4");
        assert!((stack.progress_fraction() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn swipe_classification() {
        let mut tracker = SwipeTracker::default();
        tracker.begin();
        tracker.update(40.0);
        tracker.update(130.0);
        assert_eq!(tracker.release(), SwipeOutcome::Advance);

        tracker.begin();
        tracker.update(-119.0);
        assert_eq!(tracker.release(), SwipeOutcome::SnapBack);

        tracker.begin();
        tracker.update(-200.0);
        assert_eq!(tracker.release(), SwipeOutcome::Retreat);

        assert_eq!(tracker.release(), SwipeOutcome::SnapBack);
        assert!((SwipeTracker::new(-5.0).threshold() - SWIPE_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn retreat_swipe_on_first_card_snaps_back() {
        let mut stack = stack(3);
        assert_eq!(stack.apply_swipe(SwipeOutcome::Retreat), StackTransition::Ignored);
        assert_eq!(
            stack.apply_swipe(SwipeOutcome::Advance),
            StackTransition::Moved { index: 1 }
        );
        assert_eq!(stack.apply_swipe(SwipeOutcome::SnapBack), StackTransition::Ignored);
        assert_eq!(stack.current_index(), 1);
    }
}
