// src/services/mod.rs
pub mod export_service;
pub mod image_processor;
pub mod imagen_service;

pub use export_service::ExportService;
pub use image_processor::ImageProcessor;
pub use imagen_service::{ImageGenerator, ImagenService};
