//! Frameless side-panel chat window for a local Ollama server.
//!
//! Window chrome (`geometry`, `chrome`) and conversation logic
//! (`conversation`, `ollama`, `render`, `bubbles`) are independent; only
//! `app` wires them into an iced application.

pub mod app;
pub mod bubbles;
pub mod chrome;
pub mod config;
pub mod conversation;
pub mod geometry;
pub mod logging;
pub mod message;
pub mod ollama;
pub mod render;
