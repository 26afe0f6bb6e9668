//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep outer surfaces decoupled from storage details.

pub mod bookmark_service;
pub mod organizer_service;
