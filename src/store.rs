// src/store.rs
use crate::errors::GenerationError;
use crate::models::{GeneratedImage, StylePreset};
use crate::services::ImageGenerator;
use log::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Generating,
}

/// Proof that a generation was started. Only one exists while the store is
/// in `Generating`, and it must be handed back to `complete_generation`.
#[derive(Debug)]
pub struct PendingGeneration {
    pub prompt: String,
    pub style: &'static StylePreset,
}

pub struct SessionStore {
    prompt_text: String,
    selected_style: &'static StylePreset,
    phase: GenerationPhase,
    last_error: Option<String>,
    current_image: Option<GeneratedImage>,
    history: Vec<GeneratedImage>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            prompt_text: String::new(),
            selected_style: StylePreset::default_preset(),
            phase: GenerationPhase::Idle,
            last_error: None,
            current_image: None,
            history: Vec::new(),
        }
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn selected_style(&self) -> &'static StylePreset {
        self.selected_style
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase == GenerationPhase::Generating
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.current_image.as_ref()
    }

    /// Newest first.
    pub fn history(&self) -> &[GeneratedImage] {
        &self.history
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt_text = text.into();
    }

    pub fn select_style(&mut self, preset: &'static StylePreset) {
        self.selected_style = preset;
    }

    /// Moves to `Generating` unless a request is already in flight or the
    /// prompt is blank.
    pub fn begin_generation(&mut self) -> Option<PendingGeneration> {
        if self.is_generating() {
            debug!("Generation already in flight, ignoring request");
            return None;
        }

        let prompt = self.prompt_text.trim();
        if prompt.is_empty() {
            debug!("Blank prompt, ignoring request");
            return None;
        }

        let pending = PendingGeneration {
            prompt: prompt.to_string(),
            style: self.selected_style,
        };

        self.phase = GenerationPhase::Generating;
        self.last_error = None;
        debug!("Idle -> Generating ({})", pending.style.id);

        Some(pending)
    }

    pub fn complete_generation(
        &mut self,
        pending: PendingGeneration,
        outcome: Result<GeneratedImage, GenerationError>,
    ) -> Result<Uuid, GenerationError> {
        self.phase = GenerationPhase::Idle;

        match outcome {
            Ok(image) => {
                debug!("Generating -> Idle with image {} for '{}'", image.id, pending.prompt);
                let id = image.id;
                self.history.insert(0, image.clone());
                self.current_image = Some(image);
                Ok(id)
            }
            Err(e) => {
                warn!("Generation for '{}' failed: {}", pending.prompt, e);
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Runs one full generation cycle in place. Returns `None` when the
    /// request was ignored by the guard.
    pub async fn request_generation(
        &mut self,
        generator: &dyn ImageGenerator,
    ) -> Option<Result<Uuid, GenerationError>> {
        let pending = self.begin_generation()?;
        let outcome = generator.generate(&pending.prompt, pending.style).await;
        Some(self.complete_generation(pending, outcome))
    }

    pub fn select_history_item(&mut self, id: Uuid) -> bool {
        match self.history.iter().find(|image| image.id == id) {
            Some(image) => {
                self.current_image = Some(image.clone());
                true
            }
            None => false,
        }
    }

    pub fn clear_history(&mut self, confirmed: bool) {
        if !confirmed {
            return;
        }
        debug!("Clearing {} history entries", self.history.len());
        self.history.clear();
        self.current_image = None;
    }
}
