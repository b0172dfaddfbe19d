//! Service lifetimes.
//!
//! A lifetime says how often a registration's value is produced:
//! - [`Lifetime::Instance`]: a value supplied up front, cloned on every resolve
//! - [`Lifetime::Transient`]: constructor runs on every resolve
//! - [`Lifetime::Singleton`]: constructor runs once per container lifetime

use std::fmt;

/// How a registration produces its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A fixed value registered with `Services::instance`.
    ///
    /// Never stored in the singleton cache, yet every resolve sees an equal
    /// value, so it behaves like a singleton that survives `shutdown`.
    Instance,

    /// Constructed fresh for every `make`.
    Transient,

    /// Constructed on first `make` and cached until `shutdown`.
    ///
    /// # When to use
    /// - Connection pools
    /// - Clients holding sockets or file handles
    Singleton,
}

impl Lifetime {
    /// Returns `true` if resolved values go into the singleton cache.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Instance => write!(f, "Instance"),
            Lifetime::Transient => write!(f, "Transient"),
            Lifetime::Singleton => write!(f, "Singleton"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_singletons_are_cached() {
        assert!(Lifetime::Singleton.is_cached());
        assert!(!Lifetime::Transient.is_cached());
        assert!(!Lifetime::Instance.is_cached());
    }

    #[test]
    fn display() {
        assert_eq!(Lifetime::Instance.to_string(), "Instance");
        assert_eq!(Lifetime::Transient.to_string(), "Transient");
        assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
    }
}
