// src/handlers.rs
use crate::errors::GenerationError;
use crate::models::{GeneratedImage, STYLE_PRESETS, StylePreset};
use crate::services::ImageGenerator;
use crate::store::{GenerationPhase, PendingGeneration, SessionStore};
use crate::AppState;
use log::{debug, error};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

pub type Completion = (PendingGeneration, Result<GeneratedImage, GenerationError>);

pub const HELP: &str = "\
Commands:
  prompt <text>   set the icon description
  style <id>      pick a style preset (see `styles`)
  styles          list style presets
  generate        generate an icon from the current prompt and style
  history         list icons generated this session
  show <n>        display history entry n
  download        save the displayed icon as PNG
  clear           clear history (asks for confirmation)
  status          show the current session state
  help            show this message
  quit            exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    Style(String),
    Styles,
    Generate,
    History,
    Show(usize),
    Download,
    Clear,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "prompt" => Ok(Command::Prompt(rest.to_string())),
            "style" if !rest.is_empty() => Ok(Command::Style(rest.to_string())),
            "style" => Err("Usage: style <id>".to_string()),
            "styles" => Ok(Command::Styles),
            "generate" | "gen" => Ok(Command::Generate),
            "history" => Ok(Command::History),
            "show" => rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Command::Show)
                .ok_or_else(|| "Usage: show <n> (1 is the newest icon)".to_string()),
            "download" => Ok(Command::Download),
            "clear" => Ok(Command::Clear),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("Unknown command '{}'. Type `help` for a list.", other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub struct Session {
    pub store: SessionStore,
    awaiting_confirmation: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            store: SessionStore::new(),
            awaiting_confirmation: false,
        }
    }
}

pub async fn handle_line(
    app: &AppState,
    session: &mut Session,
    line: &str,
    completions: &UnboundedSender<Completion>,
) -> Reply {
    if session.awaiting_confirmation {
        session.awaiting_confirmation = false;
        let confirmed = matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes");
        session.store.clear_history(confirmed);
        return Reply::Text(if confirmed {
            "History cleared.".to_string()
        } else {
            "History kept.".to_string()
        });
    }

    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(message) => return Reply::Text(message),
    };

    let store = &mut session.store;
    let text = match command {
        Command::Prompt(text) => {
            store.set_prompt(text);
            format!("Prompt: {}", store.prompt_text())
        }
        Command::Style(id) => match StylePreset::find(&id) {
            Some(preset) => {
                store.select_style(preset);
                format!("Style: {}", preset.display_name)
            }
            None => format!("Unknown style '{}'. Type `styles` for a list.", id),
        },
        Command::Styles => render_styles(store),
        Command::Generate => start_generation(app, store, completions),
        Command::History => render_history(store),
        Command::Show(position) => match store.history().get(position - 1).map(|image| image.id) {
            Some(id) => {
                store.select_history_item(id);
                render_current(app, store)
            }
            None => format!("No history entry {}.", position),
        },
        Command::Download => match app.exporter.save(store.current_image()).await {
            Ok(Some(path)) => format!("Saved {}", path.display()),
            Ok(None) => "No icon to download.".to_string(),
            Err(e) => {
                error!("{}", e);
                format!("Download failed: {}", e)
            }
        },
        Command::Clear => {
            if store.history().is_empty() {
                "History is already empty.".to_string()
            } else {
                session.awaiting_confirmation = true;
                format!("Clear all {} icons? [y/N]", store.history().len())
            }
        }
        Command::Status => render_status(app, store),
        Command::Help => HELP.to_string(),
        Command::Quit => return Reply::Quit,
    };

    Reply::Text(text)
}

fn start_generation(
    app: &AppState,
    store: &mut SessionStore,
    completions: &UnboundedSender<Completion>,
) -> String {
    if store.is_generating() {
        return "Still generating, please wait.".to_string();
    }

    let Some(pending) = store.begin_generation() else {
        return "Enter a prompt first (`prompt <text>`).".to_string();
    };

    let message = format!(
        "Generating \"{}\" in {} style...",
        pending.prompt, pending.style.display_name
    );

    let generator = Arc::clone(&app.generator);
    let completions = completions.clone();
    tokio::spawn(async move {
        let outcome = generator.generate(&pending.prompt, pending.style).await;
        if completions.send((pending, outcome)).is_err() {
            debug!("Session ended before generation finished");
        }
    });

    message
}

pub fn handle_completion(app: &AppState, session: &mut Session, completion: Completion) -> String {
    let (pending, outcome) = completion;
    match session.store.complete_generation(pending, outcome) {
        Ok(_) => render_current(app, &session.store),
        Err(_) => format!(
            "Error: {}",
            session.store.last_error().unwrap_or("generation failed")
        ),
    }
}

fn render_styles(store: &SessionStore) -> String {
    let mut out = String::new();
    for preset in STYLE_PRESETS {
        let marker = if preset == store.selected_style() { "*" } else { " " };
        let _ = writeln!(out, "{} {:<7} {}", marker, preset.id, preset.display_name);
    }
    out.trim_end().to_string()
}

fn render_history(store: &SessionStore) -> String {
    if store.history().is_empty() {
        return "No icons generated yet.".to_string();
    }

    let current = store.current_image().map(|image| image.id);
    let mut out = String::new();
    for (index, image) in store.history().iter().enumerate() {
        let marker = if Some(image.id) == current { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {:>2}. {} [{}] {}",
            marker,
            index + 1,
            image.source_prompt,
            image.style_name,
            image.created_at.format("%H:%M:%S")
        );
    }
    out.trim_end().to_string()
}

fn render_current(app: &AppState, store: &SessionStore) -> String {
    let Some(image) = store.current_image() else {
        return "No icon displayed.".to_string();
    };

    let details = match app.processor.inspect(&image.image_data) {
        Ok(summary) => format!("{}x{} {}", summary.width, summary.height, summary.format),
        Err(_) => format!("{} bytes", image.image_data.len()),
    };

    format!(
        "Icon: \"{}\" [{}] {}",
        image.source_prompt, image.style_name, details
    )
}

pub fn render_status(app: &AppState, store: &SessionStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prompt: {}", store.prompt_text());
    let _ = writeln!(out, "Style: {}", store.selected_style().display_name);
    let _ = writeln!(
        out,
        "State: {}",
        match store.phase() {
            GenerationPhase::Idle => "idle",
            GenerationPhase::Generating => "generating",
        }
    );
    if let Some(message) = store.last_error() {
        let _ = writeln!(out, "Error: {}", message);
    }
    let _ = writeln!(out, "History: {} icons", store.history().len());
    out.push_str(&render_current(app, store));
    out
}
