//! Agent rule documents used verbatim inside system prompts.
//!
//! Rules are editable markdown files. The cache re-stats them at most once
//! per poll interval and swaps in a fresh bundle when either file changed;
//! requests hold an `Arc` snapshot so a reload never touches rules in use.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;
use tracing::{debug, info, warn};

pub const ORCHESTRATOR_FILE: &str = "orchestrator-agent.md";
pub const COPYWRITER_FILE: &str = "copywriter-agent.md";

const DEFAULT_ORCHESTRATOR_RULES: &str = "# Orchestrator Agent\n\n\
You assemble portfolio pages for Charles Pfaff from registered UI components. \
Place each piece of supplied copy into the component that fits it best, keep \
pages between one and twelve components, and never invent facts that are not \
in the copy payload. If the request is unrelated to Charles Pfaff or his work, \
return {\"error\": \"OUT_OF_SCOPE\", \"message\": \"...\"}.";

const DEFAULT_COPYWRITER_RULES: &str = "# Copywriter Agent\n\n\
You write concise, warm, human-centered copy about Charles Pfaff, a creative \
technologist and front-end engineer. Ground every claim in the static data. \
Organize the copy as {\"meta\": {...}, \"sections\": {...}} keyed by section \
name. If the brief is unrelated to Charles Pfaff or his work, return \
{\"error\": \"OUT_OF_SCOPE\", \"message\": \"...\"}.";

#[derive(Debug, Error)]
#[error("failed to read rules file {path}: {source}")]
pub struct RulesError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesBundle {
    pub orchestrator: String,
    pub copywriter: String,
}

impl RulesBundle {
    pub fn builtin() -> Self {
        Self {
            orchestrator: DEFAULT_ORCHESTRATOR_RULES.to_string(),
            copywriter: DEFAULT_COPYWRITER_RULES.to_string(),
        }
    }
}

struct Cached {
    bundle: Arc<RulesBundle>,
    loaded_at: SystemTime,
    checked_at: Instant,
}

pub struct RulesCache {
    dir: PathBuf,
    poll_interval: Option<Duration>,
    state: Mutex<Option<Cached>>,
}

impl RulesCache {
    /// `poll_interval` of `None` loads the rules once and never re-checks.
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            poll_interval,
            state: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Result<Arc<RulesBundle>, RulesError> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(cached) = state.as_mut() {
            if !self.should_reload(cached) {
                return Ok(Arc::clone(&cached.bundle));
            }
            info!(dir = %self.dir.display(), "rules changed on disk; reloading");
        }

        let loaded_at = SystemTime::now();
        let bundle = Arc::new(self.read_bundle()?);
        *state = Some(Cached {
            bundle: Arc::clone(&bundle),
            loaded_at,
            checked_at: Instant::now(),
        });
        Ok(bundle)
    }

    fn should_reload(&self, cached: &mut Cached) -> bool {
        let Some(interval) = self.poll_interval else {
            return false;
        };
        if cached.checked_at.elapsed() < interval {
            return false;
        }
        cached.checked_at = Instant::now();

        [ORCHESTRATOR_FILE, COPYWRITER_FILE].iter().any(|name| {
            std::fs::metadata(self.dir.join(name))
                .and_then(|meta| meta.modified())
                .map(|modified| modified > cached.loaded_at)
                .unwrap_or(false)
        })
    }

    fn read_bundle(&self) -> Result<RulesBundle, RulesError> {
        let defaults = RulesBundle::builtin();
        let orchestrator = read_rules_file(&self.dir.join(ORCHESTRATOR_FILE), defaults.orchestrator)?;
        let copywriter = read_rules_file(&self.dir.join(COPYWRITER_FILE), defaults.copywriter)?;
        debug!(
            orchestrator_bytes = orchestrator.len(),
            copywriter_bytes = copywriter.len(),
            "loaded agent rules"
        );
        Ok(RulesBundle {
            orchestrator,
            copywriter,
        })
    }
}

fn read_rules_file(path: &Path, fallback: String) -> Result<String, RulesError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "rules file missing; using built-in rules");
            Ok(fallback)
        }
        Err(source) => Err(RulesError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
