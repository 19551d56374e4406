//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use campbot_domain::CharacterState;

/// Default game server root.
pub const DEFAULT_BASE_URL: &str = "https://www.kingdomofloathing.com";

/// Prefix for free-form properties read by [`AppConfig::property`].
const PROPERTY_PREFIX: &str = "CAMPBOT_PROP_";

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Game server root; endpoints are joined onto it
    pub base_url: String,
    /// Per-request transport timeout
    pub request_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Directory that relative script and macro paths resolve against
    pub scripts_dir: PathBuf,
    /// Character values used at login
    pub login: LoginConfig,
}

/// Initial character values for a new session.
///
/// Unset counters stay unknown until the first status page reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    pub character_name: String,
    pub hp: Option<u32>,
    pub max_hp: Option<u32>,
    pub mp: Option<u32>,
    pub max_mp: Option<u32>,
    pub adventures: Option<u32>,
    pub meat: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            character_name: "player".to_string(),
            hp: None,
            max_hp: None,
            mp: None,
            max_mp: None,
            adventures: None,
            meat: 0,
        }
    }
}

/// A gauge is known once its maximum is; a missing current value means full.
fn known_gauge(current: Option<u32>, maximum: Option<u32>) -> Option<(u32, u32)> {
    maximum.map(|max| (current.unwrap_or(max), max))
}

impl LoginConfig {
    pub fn initial_state(&self) -> CharacterState {
        let mut state = CharacterState::new(self.character_name.clone()).with_meat(self.meat);
        if let Some((current, max)) = known_gauge(self.hp, self.max_hp) {
            state = state.with_hp(current, max);
        }
        if let Some((current, max)) = known_gauge(self.mp, self.max_mp) {
            state = state.with_mp(current, max);
        }
        if let Some(adventures) = self.adventures {
            state = state.with_adventures(adventures);
        }
        state
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    parse_opt_var(name).unwrap_or(default)
}

fn parse_opt_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            user_agent: format!("campbot/{}", env!("CARGO_PKG_VERSION")),
            scripts_dir: PathBuf::from("scripts"),
            login: LoginConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = LoginConfig::default();

        Ok(Self {
            base_url: env::var("CAMPBOT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),

            request_timeout_secs: env::var("CAMPBOT_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("CAMPBOT_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,

            user_agent: env::var("CAMPBOT_USER_AGENT")
                .unwrap_or_else(|_| format!("campbot/{}", env!("CARGO_PKG_VERSION"))),

            scripts_dir: env::var("CAMPBOT_SCRIPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("scripts")),

            login: LoginConfig {
                character_name: env::var("CAMPBOT_CHARACTER")
                    .unwrap_or(defaults.character_name),
                hp: parse_opt_var("CAMPBOT_START_HP"),
                max_hp: parse_opt_var("CAMPBOT_START_MAX_HP"),
                mp: parse_opt_var("CAMPBOT_START_MP"),
                max_mp: parse_opt_var("CAMPBOT_START_MAX_MP"),
                adventures: parse_opt_var("CAMPBOT_START_ADVENTURES"),
                meat: parse_var("CAMPBOT_START_MEAT", defaults.meat),
            },
        })
    }

    /// Look up a free-form property (`CAMPBOT_PROP_<KEY>`).
    ///
    /// Keys are case-insensitive and `-`/`.` map to `_`.
    pub fn property(&self, key: &str) -> Option<String> {
        let normalized: String = key
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        env::var(format!("{PROPERTY_PREFIX}{normalized}")).ok()
    }

    /// Resolve a script or macro path against `scripts_dir` when relative.
    pub fn resolve_script_path(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_absolute() || path.exists() {
            path
        } else {
            self.scripts_dir.join(path)
        }
    }
}
