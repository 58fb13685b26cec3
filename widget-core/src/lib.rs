//! Core library for the weather widget.
//!
//! This crate defines:
//! - Forecast providers behind the [`Forecaster`] trait
//! - The named template registry and its render helpers
//! - Shared domain models and configuration
//!
//! It is used by `widget-server`, but the renderer and forecasters do not
//! depend on any HTTP server.

pub mod config;
pub mod error;
pub mod helpers;
pub mod model;
pub mod provider;
pub mod render;

pub use config::Config;
pub use error::{Error, ProviderError, Result};
pub use helpers::{Helpers, clothe};
pub use model::{Conditions, ViewData};
pub use provider::{Forecaster, ProviderId, forecaster_from_config};
pub use render::{Renderer, Template};
