//! Provider trait: a bootstrap participant.
//!
//! A provider groups the registrations of one part of an application and
//! gets told when the container boots and shuts down.
//!
//! # Examples
//! ```rust,ignore
//! struct DatabaseProvider;
//!
//! impl Provider for DatabaseProvider {
//!     fn register(&self, services: &mut Services) -> Result<(), BoxError> {
//!         services.singleton::<Arc<Pool>>(|r| {
//!             let url = r.environment().string_option("DATABASE_URL").ok_or("DATABASE_URL unset")?;
//!             Ok(Arc::new(Pool::connect(&url)?))
//!         });
//!         Ok(())
//!     }
//!
//!     fn will_shutdown(&self, container: &Container) {
//!         if let Ok(pool) = container.make::<Arc<Pool>>() {
//!             pool.close();
//!         }
//!     }
//! }
//! ```

use crate::container::Container;
use crate::error::BoxError;
use crate::registry::Services;

/// A module that registers services and follows the container lifecycle.
///
/// Providers are kept in registration order; every callback walks them in
/// that order. Only [`register`](Provider::register) is required.
///
/// | Callback        | When                                                 |
/// |-----------------|------------------------------------------------------|
/// | `register`      | once, while the registry is assembled                |
/// | `will_boot`     | on `switch_environment`, before any `did_boot`       |
/// | `did_boot`      | on `switch_environment`, after every `will_boot`     |
/// | `will_shutdown` | when an active container shuts down, cache still set |
pub trait Provider: Send + Sync {
    /// Registers this provider's services.
    ///
    /// Called before any container exists.
    fn register(&self, services: &mut Services) -> Result<(), BoxError>;

    fn will_boot(&self, _container: &Container) {}

    fn did_boot(&self, _container: &Container) {}

    fn will_shutdown(&self, _container: &Container) {}

    /// Human-readable name for logs and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
