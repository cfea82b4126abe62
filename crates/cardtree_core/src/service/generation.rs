//! Text-generation collaborator contract.
//!
//! # Responsibility
//! - Describe what a generation request carries (card, ancestry, prompts).
//! - Apply streamed fragments to the target card as plain content updates.
//! - Expose the busy flag callers use to hold off structural edits.
//!
//! # Invariants
//! - A failed generation leaves the card content as it was before the request.
//! - Provider wire formats never reach this module; only text does.

use crate::model::card::CardId;
use crate::service::forest_store::ForestStore;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What the generator should do with the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationMode {
    /// Keep writing after the existing content.
    Continue,
    Summarize,
    /// Split the content into smaller points.
    Breakdown,
    Expand,
    /// Free-form instruction from the user.
    Custom(String),
}

impl GenerationMode {
    /// Whether produced text is appended to the current content instead of
    /// replacing it.
    pub fn appends(&self) -> bool {
        matches!(self, Self::Continue)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Summarize => "summarize",
            Self::Breakdown => "breakdown",
            Self::Expand => "expand",
            Self::Custom(_) => "custom",
        }
    }
}

/// Everything a generator needs to know about one card.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub card_id: CardId,
    pub mode: GenerationMode,
    pub content: String,
    /// Contents of the card's ancestors, root first.
    pub ancestor_contents: Vec<String>,
    pub column_prompt: String,
    pub global_prompt: String,
}

impl GenerationRequest {
    /// Builds a request for `card_id`, or `None` for unknown cards.
    pub fn build(store: &ForestStore, card_id: &str, mode: GenerationMode) -> Option<Self> {
        let card = store.get_card(card_id)?;
        let ancestor_contents = store
            .get_ancestor_ids(card_id)
            .iter()
            .filter_map(|id| store.get_card(id))
            .map(|ancestor| ancestor.content.clone())
            .collect();
        Some(Self {
            card_id: card.id.clone(),
            mode,
            content: card.content.clone(),
            ancestor_contents,
            column_prompt: store
                .get_column(card.column_index)
                .map(|column| column.prompt.clone())
                .unwrap_or_default(),
            global_prompt: store.global_prompt().to_string(),
        })
    }
}

/// Errors surfaced by a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Target card does not exist.
    CardNotFound(CardId),
    /// The text producer reported a failure.
    Provider(String),
    /// Generator returned without calling `on_done` or `on_error`.
    Incomplete,
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::Provider(message) => write!(f, "generation failed: {message}"),
            Self::Incomplete => write!(f, "generation ended without a result"),
        }
    }
}

impl Error for GenerationError {}

/// Callbacks a text producer drives.
pub trait GenerationSink {
    /// One streamed fragment.
    fn on_chunk(&mut self, delta: &str);
    /// Terminal failure.
    fn on_error(&mut self, err: GenerationError);
    /// Terminal success with the assembled text.
    fn on_done(&mut self, final_text: String);
}

/// Opaque text producer.
pub trait TextGenerator {
    fn generate(&mut self, request: &GenerationRequest, sink: &mut dyn GenerationSink);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Pending,
    Done,
    Failed(GenerationError),
}

/// Applies one generation's output to its card.
pub struct GenerationSession<'a> {
    store: &'a mut ForestStore,
    card_id: CardId,
    appends: bool,
    original: String,
    streamed: String,
    state: SessionState,
}

impl<'a> GenerationSession<'a> {
    /// Starts a session for `card_id`.
    pub fn start(
        store: &'a mut ForestStore,
        card_id: &str,
        mode: &GenerationMode,
    ) -> Result<Self, GenerationError> {
        let original = store
            .get_card(card_id)
            .map(|card| card.content.clone())
            .ok_or_else(|| GenerationError::CardNotFound(card_id.to_string()))?;
        Ok(Self {
            store,
            card_id: card_id.to_string(),
            appends: mode.appends(),
            original,
            streamed: String::new(),
            state: SessionState::Pending,
        })
    }

    /// True until a terminal callback arrives.
    pub fn is_busy(&self) -> bool {
        self.state == SessionState::Pending
    }

    /// Outcome once finished; `None` while still pending.
    pub fn outcome(&self) -> Option<Result<String, GenerationError>> {
        match &self.state {
            SessionState::Pending => None,
            SessionState::Done => Some(Ok(self.current_text())),
            SessionState::Failed(err) => Some(Err(err.clone())),
        }
    }

    fn current_text(&self) -> String {
        if self.appends && !self.original.is_empty() {
            format!("{}{}", self.original, self.streamed)
        } else {
            self.streamed.clone()
        }
    }

    fn write_through(&mut self) {
        let text = self.current_text();
        self.store.update_content(&self.card_id, text);
    }
}

impl GenerationSink for GenerationSession<'_> {
    fn on_chunk(&mut self, delta: &str) {
        if !self.is_busy() {
            return;
        }
        self.streamed.push_str(delta);
        self.write_through();
    }

    fn on_error(&mut self, err: GenerationError) {
        if !self.is_busy() {
            return;
        }
        error!(
            "event=generation module=generation status=error card_id={} error={}",
            self.card_id, err
        );
        let original = self.original.clone();
        self.store.update_content(&self.card_id, original);
        self.state = SessionState::Failed(err);
    }

    fn on_done(&mut self, final_text: String) {
        if !self.is_busy() {
            return;
        }
        self.streamed = final_text;
        self.write_through();
        self.state = SessionState::Done;
        info!(
            "event=generation module=generation status=ok card_id={} chars={}",
            self.card_id,
            self.streamed.chars().count()
        );
    }
}

/// Runs `generator` against `card_id` and returns the resulting card text.
pub fn run_generation(
    store: &mut ForestStore,
    generator: &mut dyn TextGenerator,
    card_id: &str,
    mode: GenerationMode,
) -> Result<String, GenerationError> {
    let request = GenerationRequest::build(store, card_id, mode.clone())
        .ok_or_else(|| GenerationError::CardNotFound(card_id.to_string()))?;
    info!(
        "event=generation module=generation status=start card_id={} mode={}",
        card_id,
        mode.label()
    );
    let mut session = GenerationSession::start(store, card_id, &mode)?;
    generator.generate(&request, &mut session);
    match session.outcome() {
        Some(outcome) => outcome,
        None => {
            session.on_error(GenerationError::Incomplete);
            Err(GenerationError::Incomplete)
        }
    }
}
