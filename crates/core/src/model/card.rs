use serde::{Deserialize, Serialize};

//
// ─── CARD KINDS ────────────────────────────────────────────────────────────────
//

/// Layout variant of a learning card, as named by the `type` field in content JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardKind {
    Hero,
    TextFocused,
    Comparison,
    StatHighlight,
    Quote,
    Timeline,
    InteractiveQuiz,
    Completion,
    CodeSnippet,
    ActionSteps,
    Visual,
    KeyInsight,
    #[serde(other)]
    Unknown,
}

/// Renderer a card is drawn with. Several kinds share the text-focused layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRenderer {
    Hero,
    TextFocused,
    Comparison,
    StatHighlight,
    Quote,
    Timeline,
    Quiz,
    Completion,
}

impl CardKind {
    #[must_use]
    pub fn renderer(self) -> CardRenderer {
        match self {
            CardKind::Hero => CardRenderer::Hero,
            CardKind::Comparison => CardRenderer::Comparison,
            CardKind::StatHighlight => CardRenderer::StatHighlight,
            CardKind::Quote => CardRenderer::Quote,
            CardKind::Timeline => CardRenderer::Timeline,
            CardKind::InteractiveQuiz => CardRenderer::Quiz,
            CardKind::Completion => CardRenderer::Completion,
            CardKind::TextFocused
            | CardKind::CodeSnippet
            | CardKind::ActionSteps
            | CardKind::Visual
            | CardKind::KeyInsight
            | CardKind::Unknown => CardRenderer::TextFocused,
        }
    }
}

//
// ─── PAYLOAD PIECES ────────────────────────────────────────────────────────────
//

/// One column of a comparison card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSide {
    pub title: String,
    #[serde(default)]
    pub points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub year: String,
    pub event: String,
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// One unit of learning content.
///
/// Content files mix fields from every layout on a single flat object, so
/// everything beyond `type` and `title` is optional here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<usize>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub left_side: Option<ComparisonSide>,
    #[serde(default)]
    pub right_side: Option<ComparisonSide>,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub achievement: Option<String>,
    #[serde(default)]
    pub next_module: Option<String>,
}

/// Result of picking an option on a quiz card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
}

impl LearningCard {
    /// A bare card of the given kind, mostly useful for tests and fixtures.
    #[must_use]
    pub fn new(kind: CardKind, title: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            title: title.into(),
            subtitle: None,
            content: None,
            color: None,
            icon: None,
            category: None,
            difficulty: None,
            read_time: None,
            key_points: Vec::new(),
            question: None,
            options: Vec::new(),
            correct_answer: None,
            explanation: None,
            left_side: None,
            right_side: None,
            stats: Vec::new(),
            events: Vec::new(),
            quote: None,
            author: None,
            achievement: None,
            next_module: None,
        }
    }

    #[must_use]
    pub fn is_quiz(&self) -> bool {
        self.kind == CardKind::InteractiveQuiz
    }

    /// Grades a quiz choice.
    ///
    /// Returns `None` for non-quiz cards, quizzes without a correct answer,
    /// and choices outside the option list.
    #[must_use]
    pub fn check_answer(&self, choice: usize) -> Option<QuizOutcome> {
        if !self.is_quiz() || choice >= self.options.len() {
            return None;
        }
        let correct_index = self.correct_answer?;
        Some(QuizOutcome {
            selected: choice,
            correct_index,
            is_correct: choice == correct_index,
        })
    }

    /// Option label as shown next to each choice (A, B, C, ...).
    #[must_use]
    pub fn option_letter(index: usize) -> char {
        u8::try_from(index)
            .ok()
            .filter(|i| *i < 26)
            .map_or('?', |i| char::from(b'A' + i))
    }
}
