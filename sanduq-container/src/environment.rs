//! Deployment environment and configuration values.
//!
//! An [`Environment`] names the deployment (production, development, ...)
//! and carries string-typed options that constructors read while building
//! services. [`Process`] gives the same get/set surface over the process
//! environment variables.
//!
//! Values are stored as strings; typed access goes through [`FromStr`] and
//! [`Display`], so any type that round-trips through its string form works.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ffi::OsString;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where the application runs, plus its configuration options.
///
/// Can be deserialized from configuration files:
///
/// ```
/// use sanduq_container::environment::Environment;
///
/// let env: Environment = serde_json::from_str(
///     r#"{ "name": "staging", "options": { "DB_NAME": "sqlite" } }"#,
/// ).unwrap();
///
/// assert_eq!(env.name(), "staging");
/// assert_eq!(env.string_option("DB_NAME").as_deref(), Some("sqlite"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    name: String,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    options: BTreeMap<String, String>,
}

impl Environment {
    pub const PRODUCTION: &'static str = "production";
    pub const DEVELOPMENT: &'static str = "development";
    pub const TESTING: &'static str = "testing";

    /// Creates an environment named `name` whose arguments are the process
    /// command line. Arguments that are not valid unicode are converted
    /// lossily.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: lossy_arguments(std::env::args_os()),
            options: BTreeMap::new(),
        }
    }

    /// Environment for serving real users.
    pub fn production() -> Self {
        Self::new(Self::PRODUCTION)
    }

    /// Environment for local development.
    pub fn development() -> Self {
        Self::new(Self::DEVELOPMENT)
    }

    /// Environment for test runs.
    pub fn testing() -> Self {
        Self::new(Self::TESTING)
    }

    /// Environment with a custom name.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    /// Replaces the command-line arguments.
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// `true` when the binary was built without debug assertions.
    ///
    /// This is a property of the build, not of the environment name.
    pub fn is_release(&self) -> bool {
        !cfg!(debug_assertions)
    }

    // ── Options ──

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn string_option(&self, key: &str) -> Option<String> {
        self.options.get(key).cloned()
    }

    /// Sets `key` to `value`, or removes it when `value` is `None`.
    pub fn set_string_option(&mut self, key: impl Into<String>, value: Option<&str>) {
        let key = key.into();
        match value {
            Some(value) => {
                self.options.insert(key, value.to_string());
            }
            None => {
                self.options.remove(&key);
            }
        }
    }

    /// Parses the option stored under `key`.
    ///
    /// Returns `None` if the key is missing or the value does not parse.
    pub fn option<T: FromStr>(&self, key: &str) -> Option<T> {
        self.options.get(key)?.parse().ok()
    }

    /// Stores `value` in its string form, or removes `key` when `None`.
    pub fn set_option<T: Display>(&mut self, key: impl Into<String>, value: Option<T>) {
        let value = value.map(|v| v.to_string());
        self.set_string_option(key, value.as_deref());
    }

    // ── Process ──

    /// Reads a process environment variable.
    pub fn get(key: &str) -> Option<String> {
        Process.get(key)
    }

    /// Accessor for process environment variables.
    pub fn process() -> Process {
        Process
    }
}

fn lossy_arguments(arguments: impl IntoIterator<Item = OsString>) -> Vec<String> {
    arguments
        .into_iter()
        .map(|argument| argument.to_string_lossy().into_owned())
        .collect()
}

/// Equality looks at the name and build mode only; arguments and options
/// are ignored.
impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.is_release() == other.is_release()
    }
}

impl Eq for Environment {}

impl From<&str> for Environment {
    fn from(name: &str) -> Self {
        match name {
            Self::PRODUCTION => Self::production(),
            Self::DEVELOPMENT => Self::development(),
            Self::TESTING => Self::testing(),
            other => Self::custom(other),
        }
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(name))
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Get/set access to the process environment variables.
///
/// ```
/// use sanduq_container::environment::Environment;
///
/// let home = Environment::process().get("HOME");
/// let port: Option<u16> = Environment::process().get_as("DATABASE_PORT");
/// # let _ = (home, port);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Process;

impl Process {
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    /// Parses the variable `key`; `None` if unset, not unicode, or
    /// unparsable.
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.parse().ok()
    }

    /// Sets `key`, or unsets it when `value` is `None`.
    ///
    /// # Safety
    /// Same contract as [`std::env::set_var`]: no other thread may read or
    /// write the process environment concurrently.
    pub unsafe fn set(&self, key: &str, value: Option<&str>) {
        // SAFETY: forwarded to the caller.
        unsafe {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }

    /// Typed form of [`Process::set`].
    ///
    /// # Safety
    /// See [`Process::set`].
    pub unsafe fn set_as<T: Display>(&self, key: &str, value: Option<T>) {
        let value = value.map(|v| v.to_string());
        // SAFETY: forwarded to the caller.
        unsafe { self.set(key, value.as_deref()) }
    }
}
