//! litrev Core - Core library for the literature review relay
//!
//! This crate turns a research query into a literature review by running an
//! external generator process and relaying the JSON it prints. It also holds
//! the client side: persisted settings and an HTTP client for the relay's
//! endpoint.

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod review;
pub mod secrets;
pub mod settings;

pub use client::{ReviewClient, REVIEW_PATH};
pub use config::Config;
pub use error::{Error, Result};
pub use relay::{Generator, OutputContract, ReviewRelay, ScriptGenerator};
pub use review::{Article, Confidence, ReviewRequest, ReviewResponse, Synthesis};
pub use secrets::Secrets;
pub use settings::{ClientSettings, FileSettingsStore, MemorySettingsStore, SettingsStore};
