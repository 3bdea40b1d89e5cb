// src/services/mod.rs
pub mod gemini_service;
pub mod image_processor;
pub mod restyler;
pub mod session_store;

pub use gemini_service::GeminiRestyler;
pub use image_processor::ImageProcessor;
pub use restyler::Restyler;
pub use session_store::SessionStore;
