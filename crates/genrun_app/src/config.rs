use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use genrun_engine::{MatchSettings, RunSettings};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Timing overrides in milliseconds. Absent fields keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub generation_timeout_ms: Option<u64>,
    pub field_settle_ms: Option<u64>,
    pub focus_settle_ms: Option<u64>,
    pub paste_cooldown_ms: Option<u64>,
    pub inter_paste_delay_ms: Option<u64>,
    pub submit_settle_ms: Option<u64>,
    pub multi_attachment_settle_ms: Option<u64>,
    pub submit_wait_budget_ms: Option<u64>,
    pub submit_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    pub prompt_field_selectors: Option<Vec<String>>,
    pub submit_primary: Option<String>,
    pub submit_fallbacks: Option<Vec<String>>,
    pub submit_keywords: Option<Vec<String>>,
    pub progress_class_fragments: Option<Vec<String>>,
    pub tile_class_fragments: Option<Vec<String>>,
    pub task_href_fragment: Option<String>,
}

/// Contents of a `genrun.ron` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub timing: TimingConfig,
    pub selectors: SelectorConfig,
    pub persist_attachments: bool,
    pub simulated_latency_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn run_settings(&self) -> RunSettings {
        let mut settings = RunSettings::default();
        let t = &self.timing;
        override_ms(&mut settings.generation_timeout, t.generation_timeout_ms);
        override_ms(&mut settings.field_settle, t.field_settle_ms);
        override_ms(&mut settings.focus_settle, t.focus_settle_ms);
        override_ms(&mut settings.paste_cooldown, t.paste_cooldown_ms);
        override_ms(&mut settings.inter_paste_delay, t.inter_paste_delay_ms);
        override_ms(&mut settings.submit_settle, t.submit_settle_ms);
        override_ms(&mut settings.multi_attachment_settle, t.multi_attachment_settle_ms);
        override_ms(&mut settings.submit_wait_budget, t.submit_wait_budget_ms);
        override_ms(&mut settings.submit_poll_interval, t.submit_poll_interval_ms);
        settings
    }

    pub fn match_settings(&self) -> MatchSettings {
        let mut settings = MatchSettings::default();
        let s = self.selectors.clone();
        if let Some(value) = s.prompt_field_selectors {
            settings.prompt_field_selectors = value;
        }
        if let Some(value) = s.submit_primary {
            settings.submit_primary = value;
        }
        if let Some(value) = s.submit_fallbacks {
            settings.submit_fallbacks = value;
        }
        if let Some(value) = s.submit_keywords {
            settings.submit_keywords = value;
        }
        if let Some(value) = s.progress_class_fragments {
            settings.progress_class_fragments = value;
        }
        if let Some(value) = s.tile_class_fragments {
            settings.tile_class_fragments = value;
        }
        if let Some(value) = s.task_href_fragment {
            settings.task_href_fragment = value;
        }
        settings
    }
}

fn override_ms(target: &mut Duration, millis: Option<u64>) {
    if let Some(millis) = millis {
        *target = Duration::from_millis(millis);
    }
}
