// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub display_name: &'static str,
    pub prompt_suffix: &'static str,
}

/// Fixed preset set. The first entry is the default selection.
pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: "flat",
        display_name: "Flat Design",
        prompt_suffix: "flat design, vector style, minimal, clean shapes, solid colors",
    },
    StylePreset {
        id: "3d",
        display_name: "3D Render",
        prompt_suffix: "3D render, soft lighting, glossy materials, isometric view",
    },
    StylePreset {
        id: "pixel",
        display_name: "Pixel Art",
        prompt_suffix: "pixel art, 16-bit, retro game style, crisp pixels",
    },
    StylePreset {
        id: "line",
        display_name: "Line Art",
        prompt_suffix: "line art, monoline strokes, outline icon, white background",
    },
    StylePreset {
        id: "glass",
        display_name: "Glassmorphism",
        prompt_suffix: "glassmorphism, frosted glass, translucent layers, vibrant gradient",
    },
    StylePreset {
        id: "sketch",
        display_name: "Hand Drawn",
        prompt_suffix: "hand drawn sketch, pencil texture, doodle style",
    },
];

impl StylePreset {
    pub fn default_preset() -> &'static StylePreset {
        &STYLE_PRESETS[0]
    }

    pub fn find(id: &str) -> Option<&'static StylePreset> {
        STYLE_PRESETS
            .iter()
            .find(|preset| preset.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Builds the text sent to the image endpoint for `prompt`.
    pub fn compose_prompt(&self, prompt: &str) -> String {
        format!(
            "Icon of {}, {}, high quality, no text, no watermark",
            prompt, self.prompt_suffix
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub image_data: Bytes,
    pub source_prompt: String,
    pub style_name: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(image_data: Bytes, source_prompt: &str, style: &StylePreset) -> Self {
        Self {
            id: Uuid::now_v7(),
            image_data,
            source_prompt: source_prompt.to_string(),
            style_name: style.display_name.to_string(),
            created_at: Utc::now(),
        }
    }
}
