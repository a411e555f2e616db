//! Retry policy: defaults, partial overrides, and configuration loading.
//!
//! A [`RetryPolicy`] is the fully-resolved, read-only configuration used for
//! one execution. Callers usually supply a [`RetryOverrides`] instead; it is
//! merged onto the defaults once, when the call starts.

use crate::classify::{Classification, RetryableError, classify};
use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(300);
/// Default ceiling for any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(5000);
/// Default per-retry delay multiplier.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
/// Status codes treated as transient by default.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];
/// Error kinds treated as transient by default.
pub const DEFAULT_RETRYABLE_ERROR_KINDS: [&str; 2] = ["NetworkError", "TimeoutError"];

/// Observer invoked before each retry with the last error and the index of
/// the attempt about to start.
pub type OnRetry = Arc<dyn Fn(&dyn RetryableError, u32) + Send + Sync>;

/// Fully-resolved retry configuration.
///
/// # Examples
///
/// ```rust
/// use retrykit::policy::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(2)
///     .initial_delay(Duration::from_millis(100))
///     .retryable_status_codes([503])
///     .build();
///
/// assert_eq!(policy.max_retries(), 2);
/// assert!(policy.retryable_status_codes().contains(&503));
/// assert!(!policy.retryable_status_codes().contains(&500));
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) initial_delay: Duration,
    pub(crate) max_delay: Duration,
    pub(crate) backoff_factor: f64,
    pub(crate) jitter: f64,
    pub(crate) retryable_status_codes: BTreeSet<u16>,
    pub(crate) retryable_error_kinds: BTreeSet<String>,
    pub(crate) on_retry: Option<OnRetry>,
}

impl Default for RetryPolicy {
    /// Defaults:
    /// - `max_retries`: 3 (4 attempts total)
    /// - `initial_delay`: 300ms
    /// - `max_delay`: 5s
    /// - `backoff_factor`: 2.0
    /// - `jitter`: 0.0
    /// - `retryable_status_codes`: 408, 429, 500, 502, 503, 504
    /// - `retryable_error_kinds`: `NetworkError`, `TimeoutError`
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            jitter: 0.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
            retryable_error_kinds: DEFAULT_RETRYABLE_ERROR_KINDS
                .into_iter()
                .map(String::from)
                .collect(),
            on_retry: None,
        }
    }
}

impl RetryPolicy {
    /// Create a builder starting from the defaults.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Resolve overrides against the defaults.
    pub fn from_overrides(overrides: &RetryOverrides) -> Self {
        Self::default().merge(overrides)
    }

    /// Produce a new policy with every field set in `overrides` replaced.
    ///
    /// A backoff factor below 1.0 (or not finite) becomes 1.0 and jitter is
    /// clamped to `[0.0, 1.0]`. Use [`RetryOverrides::validate`] to reject
    /// such values instead.
    pub fn merge(&self, overrides: &RetryOverrides) -> Self {
        let mut policy = self.clone();
        if let Some(max_retries) = overrides.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(delay) = overrides.initial_delay {
            policy.initial_delay = delay;
        }
        if let Some(delay) = overrides.max_delay {
            policy.max_delay = delay;
        }
        if let Some(factor) = overrides.backoff_factor {
            policy.backoff_factor = if factor.is_finite() && factor >= 1.0 {
                factor
            } else {
                1.0
            };
        }
        if let Some(jitter) = overrides.jitter {
            policy.jitter = if jitter.is_nan() {
                0.0
            } else {
                jitter.clamp(0.0, 1.0)
            };
        }
        if let Some(codes) = &overrides.retryable_status_codes {
            policy.retryable_status_codes = codes.clone();
        }
        if let Some(kinds) = &overrides.retryable_error_kinds {
            policy.retryable_error_kinds = kinds.clone();
        }
        if let Some(on_retry) = &overrides.on_retry {
            policy.on_retry = Some(Arc::clone(on_retry));
        }
        policy
    }

    /// Classify an error under this policy.
    pub fn classify(&self, error: &dyn RetryableError) -> Classification {
        classify(
            error,
            &self.retryable_error_kinds,
            &self.retryable_status_codes,
        )
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Ceiling for any single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Per-retry delay multiplier.
    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Randomization fraction applied to each delay.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Status codes treated as transient.
    pub fn retryable_status_codes(&self) -> &BTreeSet<u16> {
        &self.retryable_status_codes
    }

    /// Error kinds treated as transient.
    pub fn retryable_error_kinds(&self) -> &BTreeSet<String> {
        &self.retryable_error_kinds
    }

    /// Whether an observer is installed.
    pub fn has_observer(&self) -> bool {
        self.on_retry.is_some()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("jitter", &self.jitter)
            .field("retryable_status_codes", &self.retryable_status_codes)
            .field("retryable_error_kinds", &self.retryable_error_kinds)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Partial retry configuration; unset fields keep their defaults.
///
/// Deserializes from TOML or JSON with delays given in milliseconds:
///
/// ```rust
/// use retrykit::policy::RetryOverrides;
/// use std::time::Duration;
///
/// let overrides: RetryOverrides = serde_json::from_str(
///     r#"{ "max_retries": 2, "initial_delay_ms": 100, "retryable_status_codes": [503] }"#,
/// ).unwrap();
///
/// assert_eq!(overrides.max_retries, Some(2));
/// assert_eq!(overrides.initial_delay, Some(Duration::from_millis(100)));
/// assert!(overrides.max_delay.is_none());
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryOverrides {
    /// Maximum number of retries after the initial attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Delay before the first retry.
    #[serde(
        rename = "initial_delay_ms",
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_delay: Option<Duration>,

    /// Ceiling for any single delay.
    #[serde(
        rename = "max_delay_ms",
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_delay: Option<Duration>,

    /// Per-retry delay multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_factor: Option<f64>,

    /// Randomization fraction applied to each delay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,

    /// Status codes treated as transient. Replaces the default set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable_status_codes: Option<BTreeSet<u16>>,

    /// Error kinds treated as transient. Replaces the default set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable_error_kinds: Option<BTreeSet<String>>,

    /// Observer called before each retry.
    #[serde(skip)]
    pub on_retry: Option<OnRetry>,
}

impl RetryOverrides {
    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the delay ceiling.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    /// Set the jitter fraction.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Replace the retryable status codes.
    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = Some(codes.into_iter().collect());
        self
    }

    /// Replace the retryable error kinds.
    pub fn with_retryable_error_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_error_kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    /// Install an observer called after each backoff sleep, right before
    /// the next attempt starts.
    pub fn with_on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(&dyn RetryableError, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(on_retry));
        self
    }

    /// Reject a backoff factor below 1.0 and jitter outside `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<()> {
        if let Some(factor) = self.backoff_factor
            && !(factor.is_finite() && factor >= 1.0)
        {
            return Err(PolicyError::InvalidBackoffFactor(factor));
        }
        if let Some(jitter) = self.jitter
            && !(0.0..=1.0).contains(&jitter)
        {
            return Err(PolicyError::InvalidJitter(jitter));
        }
        Ok(())
    }

    /// Load overrides from environment variables.
    ///
    /// This will look for:
    /// - `RETRYKIT_MAX_RETRIES` (u32)
    /// - `RETRYKIT_INITIAL_DELAY_MS` (u64 milliseconds)
    /// - `RETRYKIT_MAX_DELAY_MS` (u64 milliseconds)
    /// - `RETRYKIT_BACKOFF_FACTOR` (f64, >= 1.0)
    /// - `RETRYKIT_JITTER` (f64, within 0.0..=1.0)
    /// - `RETRYKIT_RETRYABLE_STATUS_CODES` (comma-separated u16 list)
    /// - `RETRYKIT_RETRYABLE_ERROR_KINDS` (comma-separated names)
    ///
    /// Unset variables are left as `None`.
    pub fn from_env() -> Result<Self> {
        let overrides = Self {
            max_retries: env_parse("RETRYKIT_MAX_RETRIES")?,
            initial_delay: env_parse("RETRYKIT_INITIAL_DELAY_MS")?.map(Duration::from_millis),
            max_delay: env_parse("RETRYKIT_MAX_DELAY_MS")?.map(Duration::from_millis),
            backoff_factor: env_parse("RETRYKIT_BACKOFF_FACTOR")?,
            jitter: env_parse("RETRYKIT_JITTER")?,
            retryable_status_codes: env_list::<u16, _>("RETRYKIT_RETRYABLE_STATUS_CODES")?,
            retryable_error_kinds: env_list::<String, _>("RETRYKIT_RETRYABLE_ERROR_KINDS")?,
            on_retry: None,
        };
        overrides.validate()?;
        Ok(overrides)
    }
}

impl fmt::Debug for RetryOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOverrides")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("jitter", &self.jitter)
            .field("retryable_status_codes", &self.retryable_status_codes)
            .field("retryable_error_kinds", &self.retryable_error_kinds)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

fn env_parse<T>(var: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PolicyError::env(var, &raw, e)),
        Err(_) => Ok(None),
    }
}

fn env_list<T, C>(var: &'static str) -> Result<Option<C>>
where
    T: FromStr,
    T::Err: fmt::Display,
    C: FromIterator<T>,
{
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().map_err(|e| PolicyError::env(var, &raw, e)))
        .collect::<Result<C>>()
        .map(Some)
}

/// Builder for [`RetryPolicy`], starting from the defaults.
///
/// ```rust
/// use retrykit::policy::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(2))
///     .backoff_factor(1.5)
///     .build();
///
/// assert_eq!(policy.backoff_factor(), 1.5);
/// ```
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    overrides: RetryOverrides,
}

impl RetryPolicyBuilder {
    /// Set the maximum number of retries.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.overrides.max_retries = Some(max_retries);
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 300ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.overrides.initial_delay = Some(delay);
        self
    }

    /// Set the maximum delay between retries.
    ///
    /// Default: 5s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.overrides.max_delay = Some(delay);
        self
    }

    /// Set the backoff multiplier. Values below 1.0 are raised to 1.0.
    ///
    /// Default: 2.0
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.overrides.backoff_factor = Some(factor);
        self
    }

    /// Set the jitter factor (0.0 to 1.0). A jitter of 0.1 means each delay
    /// can vary by ±10% before the `max_delay` cap is applied.
    ///
    /// Default: 0.0
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.overrides.jitter = Some(jitter);
        self
    }

    /// Replace the retryable status codes.
    pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.overrides = self.overrides.with_retryable_status_codes(codes);
        self
    }

    /// Replace the retryable error kinds.
    pub fn retryable_error_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides = self.overrides.with_retryable_error_kinds(kinds);
        self
    }

    /// Install a retry observer.
    pub fn on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(&dyn RetryableError, u32) + Send + Sync + 'static,
    {
        self.overrides = self.overrides.with_on_retry(on_retry);
        self
    }

    /// Build the policy, using defaults for any unset parameters.
    pub fn build(self) -> RetryPolicy {
        RetryPolicy::from_overrides(&self.overrides)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
