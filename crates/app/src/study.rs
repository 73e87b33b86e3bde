use std::io::Write;
use std::path::Path;

use services::{AppServices, StudySession, StudyStep};
use spark_core::model::{CardRenderer, LearningCard, LearningModule};
use spark_core::{StackTransition, SwipeTracker};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

type StudyResult<T> = Result<T, Box<dyn std::error::Error>>;

/// One line of learner input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StudyInput {
    Advance,
    Retreat,
    Swipe(f32),
    Answer(usize),
    Quit,
}

impl StudyInput {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(Self::Advance);
        };
        let input = match word {
            "n" | "next" => Self::Advance,
            "p" | "prev" => Self::Retreat,
            "q" | "quit" => Self::Quit,
            "s" | "swipe" => {
                let raw = parts.next().ok_or("swipe needs a displacement")?;
                let dx: f32 = raw
                    .parse()
                    .map_err(|_| format!("invalid displacement: {raw}"))?;
                Self::Swipe(dx)
            }
            "a" | "answer" => {
                let raw = parts.next().ok_or("answer needs a choice")?;
                Self::Answer(parse_choice(raw).ok_or_else(|| format!("invalid choice: {raw}"))?)
            }
            other => return Err(format!("unknown command: {other}")),
        };
        match parts.next() {
            Some(extra) => Err(format!("unexpected argument: {extra}")),
            None => Ok(input),
        }
    }
}

/// `B`/`b` or `2` both select the second option.
fn parse_choice(raw: &str) -> Option<usize> {
    if let Ok(number) = raw.parse::<usize>() {
        return number.checked_sub(1);
    }
    let mut chars = raw.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !letter.is_ascii_uppercase() {
        return None;
    }
    Some(usize::from(u8::try_from(letter).ok()? - b'A'))
}

pub fn load_module(path: &Path) -> StudyResult<LearningModule> {
    let raw = std::fs::read_to_string(path)?;
    let module: LearningModule = serde_json::from_str(&raw)?;
    log::debug!(
        "loaded module {} with {} cards from {}",
        module.id,
        module.cards.len(),
        path.display()
    );
    Ok(module)
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn render_card(session: &StudySession, out: &mut impl Write) -> std::io::Result<()> {
    let Some(card) = session.current_card() else {
        return writeln!(out, "{} has no cards.", session.title());
    };
    writeln!(out)?;
    writeln!(out, "[{}] {}", session.stack().position_label(), card.title)?;
    if let Some(subtitle) = &card.subtitle {
        writeln!(out, "  {subtitle}")?;
    }

    match card.kind.renderer() {
        CardRenderer::Hero | CardRenderer::TextFocused => {
            if let Some(content) = &card.content {
                writeln!(out, "  {content}")?;
            }
            for point in &card.key_points {
                writeln!(out, "  * {point}")?;
            }
        }
        CardRenderer::Comparison => {
            for side in [&card.left_side, &card.right_side].into_iter().flatten() {
                writeln!(out, "  {}", side.title)?;
                for point in &side.points {
                    writeln!(out, "    - {point}")?;
                }
            }
        }
        CardRenderer::StatHighlight => {
            for stat in &card.stats {
                writeln!(out, "  {}  {}", stat.value, stat.label)?;
            }
        }
        CardRenderer::Quote => {
            if let Some(quote) = &card.quote {
                writeln!(out, "  \"{quote}\"")?;
            }
            if let Some(author) = &card.author {
                writeln!(out, "    - {author}")?;
            }
        }
        CardRenderer::Timeline => {
            for event in &card.events {
                writeln!(out, "  {}: {}", event.year, event.event)?;
            }
        }
        CardRenderer::Quiz => {
            if let Some(question) = &card.question {
                writeln!(out, "  {question}")?;
            }
            for (index, option) in card.options.iter().enumerate() {
                writeln!(out, "    {}) {option}", LearningCard::option_letter(index))?;
            }
        }
        CardRenderer::Completion => {
            if let Some(achievement) = &card.achievement {
                writeln!(out, "  Achievement: {achievement}")?;
            }
            if let Some(next) = &card.next_module {
                writeln!(out, "  Up next: {next}")?;
            }
        }
    }
    Ok(())
}

fn render_answer(card: &LearningCard, choice: usize, out: &mut impl Write) -> std::io::Result<()> {
    if !card.is_quiz() {
        return writeln!(out, "This card has no quiz.");
    }
    let Some(outcome) = card.check_answer(choice) else {
        return writeln!(out, "No option {}.", LearningCard::option_letter(choice));
    };
    if outcome.is_correct {
        writeln!(out, "Correct!")?;
    } else {
        writeln!(
            out,
            "Not quite, the answer is {}.",
            LearningCard::option_letter(outcome.correct_index)
        )?;
    }
    if let Some(explanation) = &card.explanation {
        writeln!(out, "  {explanation}")?;
    }
    Ok(())
}

fn report_step(step: StudyStep, out: &mut impl Write) -> std::io::Result<()> {
    if step.persisted == Some(false) {
        writeln!(out, "(progress could not be saved)")?;
    }
    Ok(())
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

/// Run an interactive session until the learner quits, input ends, or the
/// module is completed. Returns whether the module was completed.
pub async fn run_study<R>(
    services: &AppServices,
    module: LearningModule,
    input: R,
    out: &mut impl Write,
) -> StudyResult<bool>
where
    R: AsyncBufRead + Unpin,
{
    let study = services.study();
    let mut session = study.start(module).await;
    let mut tracker = SwipeTracker::default();

    render_card(&session, out)?;
    if session.stack().is_empty() {
        return Ok(false);
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match StudyInput::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        let step = match command {
            StudyInput::Quit => break,
            StudyInput::Answer(choice) => {
                if let Some(card) = session.current_card() {
                    render_answer(card, choice, out)?;
                }
                continue;
            }
            StudyInput::Advance => study.advance(&mut session).await,
            StudyInput::Retreat => study.retreat(&mut session).await,
            StudyInput::Swipe(dx) => {
                tracker.begin();
                tracker.update(dx);
                study.swipe(&mut session, tracker.release()).await
            }
        };
        report_step(step, out)?;

        match step.transition {
            StackTransition::Moved { .. } => render_card(&session, out)?,
            StackTransition::Completed => {
                writeln!(out)?;
                writeln!(out, "Module complete: {}", session.title())?;
                return Ok(true);
            }
            StackTransition::Ignored => writeln!(out, "(no change)")?,
        }
    }

    writeln!(
        out,
        "Stopped at card {}; progress saved.",
        session.stack().position_label()
    )?;
    Ok(false)
}
