//! Sweep orchestration services.
//!
//! # Responsibility
//! - Drive the scan → extract → categorize → persist → rewrite pipeline
//!   over collaborator contracts.
//! - Keep CLI wiring decoupled from pipeline details.

pub mod sweep_service;
