//! Error types for container operations.
//!
//! Misusing the container's lifecycle (resolving after `shutdown`, dropping
//! an active container) is a programming error and panics instead of
//! producing one of these values.

use std::fmt;

use sanduq_support::rendering::render_chain;

use crate::key::ServiceId;

/// Failure type returned by user constructors, hooks and providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Sanduq operations.
#[derive(Debug, thiserror::Error)]
pub enum SanduqError {
    /// No construction record exists for the resolved service.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// A constructor called back into a service already being built.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A constructor returned an error.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: ServiceId,
        #[source]
        source: BoxError,
    },

    /// An extension hook returned an error.
    #[error("Extension for {key} failed: {source}")]
    ExtensionFailed {
        key: ServiceId,
        #[source]
        source: BoxError,
    },

    /// A stored value could not be downcast to the requested type.
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch {
        key: ServiceId,
        expected: &'static str,
    },

    /// A provider failed while registering its services.
    #[error("Provider {provider} failed to register: {source}")]
    ProviderFailed {
        provider: String,
        #[source]
        source: BoxError,
    },
}

impl SanduqError {
    /// Wraps a constructor failure for `key`.
    ///
    /// Container errors raised inside the constructor (for example a nested
    /// `make` that found nothing registered) pass through unchanged.
    pub(crate) fn construction(key: ServiceId, source: BoxError) -> Self {
        match source.downcast::<SanduqError>() {
            Ok(inner) => *inner,
            Err(source) => SanduqError::ConstructionFailed { key, source },
        }
    }

    /// Wraps an extension hook failure for `key`, with the same pass-through
    /// rule as [`SanduqError::construction`].
    pub(crate) fn extension(key: ServiceId, source: BoxError) -> Self {
        match source.downcast::<SanduqError>() {
            Ok(inner) => *inner,
            Err(source) => SanduqError::ExtensionFailed { key, source },
        }
    }

    pub(crate) fn type_mismatch<T: ?Sized + 'static>(key: ServiceId) -> Self {
        SanduqError::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        }
    }
}

/// A requested service has no construction record.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The type passed to `make`.
    pub requested: ServiceId,
    /// The id looked up after applying requirements and preferences.
    pub resolved: ServiceId,
    /// Registered types with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not registered: {}", self.requested)?;

        if self.resolved != self.requested {
            write!(f, "\n  Resolved through overrides to: {}", self.resolved)?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register {} with .instance(), .transient() or .singleton()",
            self.resolved.short_name()
        )
    }
}

/// A resolution chain that revisits one of its own services.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Requested types from the outermost `make` to the repeated one.
    pub chain: Vec<ServiceId>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(ServiceId::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: resolve one side lazily or restructure the constructors"
        )
    }
}

/// Convenient Result type for Sanduq operations.
pub type Result<T> = std::result::Result<T, SanduqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectionRefused;

    #[test]
    fn not_registered_display() {
        let err = SanduqError::NotRegistered(NotRegisteredError {
            requested: ServiceId::of::<String>(),
            resolved: ServiceId::of::<u8>(),
            suggestions: vec!["alloc::string::Strung".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("not registered"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Resolved through overrides to: u8"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn circular_display() {
        let err = SanduqError::CircularDependency(CircularDependencyError {
            chain: vec![
                ServiceId::of::<String>(),
                ServiceId::of::<u32>(),
                ServiceId::of::<String>(),
            ],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular"));
        assert!(msg.contains("String → u32 → String"));
    }

    #[test]
    fn user_errors_are_wrapped() {
        let err = SanduqError::construction(ServiceId::of::<u32>(), Box::new(ConnectionRefused));
        match err {
            SanduqError::ConstructionFailed { key, source } => {
                assert_eq!(key, ServiceId::of::<u32>());
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("expected ConstructionFailed, got {other:?}"),
        }

        let err = SanduqError::extension(ServiceId::of::<u32>(), Box::new(ConnectionRefused));
        assert!(matches!(err, SanduqError::ExtensionFailed { .. }));
    }

    #[test]
    fn container_errors_pass_through() {
        let nested = SanduqError::type_mismatch::<u64>(ServiceId::of::<u8>());
        let err = SanduqError::construction(ServiceId::of::<u32>(), Box::new(nested));
        match err {
            SanduqError::TypeMismatch { key, expected } => {
                assert_eq!(key, ServiceId::of::<u8>());
                assert_eq!(expected, "u64");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }
}
