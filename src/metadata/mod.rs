// src/metadata/mod.rs
//! Environment metadata extraction
//!
//! Classifies the host environment (browser family/version, device class,
//! OS, screen resolution) from injected signals. `environment_info` is a
//! pure, total function: absent or unparseable signals produce empty-string
//! fields, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Browser family priority list: leftmost match in the user agent wins.
static BROWSER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(chrome|firefox|safari|edge|opera)/?\s*(\d+)")
        .expect("browser pattern is valid")
});

/// OS family plus version token, separators underscore or dot.
static OS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(windows nt|mac os x|android|ios) ([\d._]+)")
        .expect("os pattern is valid")
});

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mobi").expect("mobile pattern is valid"));
static TABLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)tablet").expect("tablet pattern is valid"));

/// Classified environment snapshot embedded in every batch envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserMetaInfo {
    /// Browser family, lowercased ("chrome", "firefox", ...)
    pub browser_type: String,

    /// Major version digits
    pub browser_version: String,

    /// OS family with separators normalized to spaces
    pub device_os: String,

    /// "Mobile", "Tablet" or "Desktop"
    pub device_type: String,

    /// "{width}x{height}", empty when the screen signal is absent
    pub screen_resolution: String,
}

/// Host environment signals consumed by [`environment_info`].
///
/// Injected so the core stays testable outside a real browser host; a fake
/// probe with canned values is all a test needs.
pub trait EnvironmentProbe: Send + Sync {
    /// User agent string, if the host exposes one
    fn user_agent(&self) -> Option<String>;

    /// Screen dimensions in pixels (width, height)
    fn screen(&self) -> Option<(u32, u32)>;

    /// Page origin embedded in batch envelopes
    fn origin(&self) -> Option<String>;
}

/// Fixed-value probe for embedders with static signals and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub user_agent: Option<String>,
    pub screen: Option<(u32, u32)>,
    pub origin: Option<String>,
}

impl EnvironmentProbe for StaticEnvironment {
    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn screen(&self) -> Option<(u32, u32)> {
        self.screen
    }

    fn origin(&self) -> Option<String> {
        self.origin.clone()
    }
}

/// Snapshot the environment attributes at call time.
///
/// Total: every missing or unrecognized signal degrades to an empty field.
pub fn environment_info(probe: &dyn EnvironmentProbe) -> BrowserMetaInfo {
    let user_agent = probe.user_agent().unwrap_or_default();

    let mut browser_type = String::new();
    let mut browser_version = String::new();
    if let Some(caps) = BROWSER_RE.captures(&user_agent) {
        browser_type = caps[1].to_lowercase();
        browser_version = caps[2].to_string();
    }

    let device_type = if MOBILE_RE.is_match(&user_agent) {
        "Mobile"
    } else if TABLET_RE.is_match(&user_agent) {
        "Tablet"
    } else {
        "Desktop"
    }
    .to_string();

    let device_os = OS_RE
        .captures(&user_agent)
        .map(|caps| caps[1].replace('_', " "))
        .unwrap_or_default();

    let screen_resolution = probe
        .screen()
        .map(|(w, h)| format!("{}x{}", w, h))
        .unwrap_or_default();

    BrowserMetaInfo {
        browser_type,
        browser_version,
        device_os,
        device_type,
        screen_resolution,
    }
}
