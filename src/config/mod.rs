//! Configuration for the clipwatch engine.
//!
//! [`Configuration`] is a plain value object: the engine reads a single
//! current snapshot and replaces it wholesale on reload, never mutating it
//! partially mid-tick. Persistence goes through the [`ConfigStore`]
//! collaborator, which substitutes defaults on absence or corruption and
//! treats saves as best-effort.

mod store;

use std::{collections::BTreeSet, time::Duration};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub use store::{ConfigStore, JsonConfigStore};
#[cfg(test)]
pub use store::MockConfigStore;

/// Default tick cadence for the poll loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// User-tunable parameters for the monitoring engine.
///
/// Field declaration order matters: serialized keys come out in this order,
/// and the persisted file is specified as sorted-key JSON, so fields are
/// declared in the alphabetical order of their camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    /// Length of the sliding window used by the per-source rate limiter.
    #[serde(
        deserialize_with = "deserialize_duration_from_secs_f64",
        serialize_with = "serialize_duration_to_secs_f64"
    )]
    pub alert_cooldown: Duration,

    /// Source identifiers exempt from alerting. Matching is exact-string,
    /// never prefix or wildcard; insertion of duplicates is a no-op.
    pub allowlist: BTreeSet<String>,

    /// Whether monitoring should auto-start when the engine comes up.
    pub enabled: bool,

    /// Sliding-window alert cap per source. Zero denies all alerts.
    pub max_alerts_per_source: u32,

    /// Tick cadence of the change-detection poll loop. Must be positive;
    /// the store sanitizes a zero value back to the default on load.
    #[serde(
        deserialize_with = "deserialize_duration_from_secs_f64",
        serialize_with = "serialize_duration_to_secs_f64"
    )]
    pub poll_interval: Duration,

    /// How long a displayed alert remains visible before auto-dismissal.
    #[serde(
        deserialize_with = "deserialize_duration_from_secs_f64",
        serialize_with = "serialize_duration_to_secs_f64"
    )]
    pub popup_duration: Duration,

    /// Whether to invoke the alert-display collaborator at all. Events are
    /// recorded into history regardless of this flag.
    pub show_popup: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            alert_cooldown: Duration::from_secs(10),
            allowlist: default_allowlist(),
            enabled: true,
            max_alerts_per_source: 3,
            poll_interval: DEFAULT_POLL_INTERVAL,
            popup_duration: Duration::from_secs(3),
            show_popup: true,
        }
    }
}

/// The out-of-the-box allowlist: common editors, terminals, browsers and
/// launchers whose clipboard writes users overwhelmingly intend.
fn default_allowlist() -> BTreeSet<String> {
    [
        "com.apple.Terminal",
        "com.googlecode.iterm2",
        "com.microsoft.VSCode",
        "com.apple.Safari",
        "com.google.Chrome",
        "org.mozilla.firefox",
        "com.apple.finder",
        "com.apple.dt.Xcode",
        "com.jetbrains.intellij",
        "com.sublimetext.4",
        "com.hegenberg.BetterTouchTool",
        "com.raycast.macos",
        "com.alfredapp.Alfred",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Custom deserializer for a `Duration` expressed as fractional seconds.
fn deserialize_duration_from_secs_f64<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(de::Error::custom(format!("invalid duration in seconds: {secs}")));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Custom serializer for a `Duration` to fractional seconds.
fn serialize_duration_to_secs_f64<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}
