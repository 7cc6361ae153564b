use crate::core::ProgressReporter;
use crate::utils::error::AppError;
use std::sync::Mutex;

/// Collects progress messages so the HTTP response can show them.
#[derive(Debug, Default)]
pub struct RequestReporter {
    messages: Mutex<Vec<String>>,
}

impl RequestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RequestReporter {
    fn notify_progress(&self, message: &str) {
        tracing::info!("ℹ️ {}", message);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }

    fn fail_request(&self, message: String) -> AppError {
        tracing::info!("🛑 Request failed: {}", message);
        AppError::UserFacing { message }
    }
}

/// Writes progress to stderr for the one-shot binary.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn notify_progress(&self, message: &str) {
        eprintln!("⏳ {}", message);
    }
}
