pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::app::{build_orchestrator, SpaceOrchestrator};
pub use crate::config::{CliArgs, Settings};
pub use crate::core::{orchestrator::Orchestrator, queue::AdmissionQueue};
pub use crate::domain::model::{ImageRef, ProcessingOptions, RequestId};
pub use crate::utils::error::{AppError, Result};
