use std::path::{Path, PathBuf};
use std::sync::Arc;

use mashup_core::{Config, MashupRunner, SanitizedConfig};

use crate::mailer::Mailer;

/// Shared application state
pub struct AppState {
    config: Config,
    runner: Arc<dyn MashupRunner>,
    mailer: Arc<dyn Mailer>,
    scratch_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn MashupRunner>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            scratch_root: config.workspace.root.clone(),
            config,
            runner,
            mailer,
        }
    }

    /// Overrides where per-request output directories are created.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn runner(&self) -> &dyn MashupRunner {
        self.runner.as_ref()
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn scratch_root(&self) -> Option<&Path> {
        self.scratch_root.as_deref()
    }

    /// Name of the emailed archive.
    pub fn archive_name(&self) -> String {
        format!("{}_mashup.zip", self.config.server.archive_prefix)
    }
}
