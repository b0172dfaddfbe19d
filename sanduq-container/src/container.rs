//! # The Container
//!
//! Resolves services and runs the provider lifecycle.
//!
//! # Architecture
//! ```text
//! Services + Overrides ──▶ ContainerBuilder ──build()──▶ Container
//!                                                           │
//!   make::<S>()  ──▶ singleton cache ──hit──────────────────┤
//!                        │ miss                             │
//!                        ▼                                  │
//!                  overrides.resolve(S) ──▶ registration    │
//!                        ▼                                  │
//!                  construct ─▶ extensions ─▶ cast to S ────┴──▶ caller
//! ```
//!
//! # Examples
//! ```rust
//! use sanduq_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait DatabaseProtocol: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//!
//! struct MockDatabase {
//!     name: String,
//! }
//!
//! impl DatabaseProtocol for MockDatabase {
//!     fn name(&self) -> &str { &self.name }
//! }
//!
//! let mut services = Services::new();
//! services.transient::<Arc<dyn DatabaseProtocol>>(|_| {
//!     Ok(Arc::new(MockDatabase { name: "postgres".into() }))
//! });
//!
//! let container = Container::new(Environment::testing(), Overrides::new(), services);
//! let db: Arc<dyn DatabaseProtocol> = container.make().expect("registered");
//! assert_eq!(db.name(), "postgres");
//!
//! container.shutdown();
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};

use crate::cache::SingletonCache;
use crate::environment::Environment;
use crate::error::{CircularDependencyError, NotRegisteredError, Result, SanduqError};
use crate::key::ServiceId;
use crate::overrides::Overrides;
use crate::provider::Provider;
use crate::registry::{Service, Services};
use crate::resolver::Resolver;

const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Assembles a [`Container`] from an environment, overrides and services.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .environment(Environment::production())
///     .require::<Arc<PostgresDatabase>, Arc<dyn DatabaseProtocol>>()
///     .provider(DatabaseProvider)
///     .configure(|services| {
///         services.instance(Config::load());
///     })
///     .build()?;
/// ```
pub struct ContainerBuilder {
    environment: Environment,
    overrides: Overrides,
    services: Services,
    deferred: Option<SanduqError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            environment: Environment::development(),
            overrides: Overrides::new(),
            services: Services::new(),
            deferred: None,
        }
    }

    /// Sets the environment. Defaults to [`Environment::development`].
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Replaces the override tables.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the registry, including its providers.
    pub fn services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    // ── Overrides ──

    pub fn prefer<C: ?Sized + 'static, I: ?Sized + 'static>(mut self) -> Self {
        self.overrides.prefer::<C, I>();
        self
    }

    pub fn require<C: ?Sized + 'static, I: ?Sized + 'static>(mut self) -> Self {
        self.overrides.require::<C, I>();
        self
    }

    // ── Registrations ──

    /// Registers services directly on the underlying [`Services`].
    pub fn configure(mut self, configure: impl FnOnce(&mut Services)) -> Self {
        configure(&mut self.services);
        self
    }

    /// Adds a [`Provider`].
    ///
    /// A failing provider does not stop the chain; the first failure is
    /// returned from [`build`](ContainerBuilder::build).
    pub fn provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        if self.deferred.is_none() {
            if let Err(err) = self.services.register_provider(provider) {
                warn!(error = %err, "Provider registration failed");
                self.deferred = Some(err);
            }
        }
        self
    }

    // ── Build ──

    /// Builds the container.
    ///
    /// # Errors
    /// [`SanduqError::ProviderFailed`] if any provider failed to register.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        info!(
            registered = self.services.len(),
            providers = self.services.providers().len(),
            environment = %self.environment,
            "Building container"
        );
        Ok(Container::new(self.environment, self.overrides, self.services))
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Lifecycle state of a [`Container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Resolving is allowed.
    Active,
    /// `shutdown` was called; resolving panics until the environment is
    /// switched.
    ShutDown,
}

/// Resolves services and owns the singleton cache and provider lifecycle.
///
/// A container must be [`shutdown`](Container::shutdown) before it is
/// dropped; debug builds assert this.
///
/// The container is `Send + Sync`: the cache, the lifecycle flag and the
/// environment each sit behind a lock, and no lock is held while user code
/// (constructors, hooks, provider callbacks) runs. Two threads racing on an
/// uncached singleton may both construct it; the last one stays cached.
pub struct Container {
    environment: RwLock<Arc<Environment>>,
    overrides: Overrides,
    services: Services,
    cache: Mutex<SingletonCache>,
    lifecycle: RwLock<Lifecycle>,
    shutting_down: AtomicBool,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Creates an active container with an empty singleton cache.
    pub fn new(environment: Environment, overrides: Overrides, services: Services) -> Self {
        Self {
            environment: RwLock::new(Arc::new(environment)),
            overrides,
            services,
            cache: Mutex::new(SingletonCache::new()),
            lifecycle: RwLock::new(Lifecycle::Active),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Resolves a service by type.
    ///
    /// ```rust,ignore
    /// let db: Arc<dyn DatabaseProtocol> = container.make()?;
    /// ```
    ///
    /// # Errors
    /// - [`SanduqError::NotRegistered`]: nothing registered for `S` after
    ///   applying overrides
    /// - [`SanduqError::ConstructionFailed`] / [`SanduqError::ExtensionFailed`]
    /// - [`SanduqError::TypeMismatch`]: an override points at a registration
    ///   that does not declare `supports::<S>()`
    /// - [`SanduqError::CircularDependency`]
    ///
    /// # Panics
    /// If the container has been shut down.
    pub fn make<S: Service>(&self) -> Result<S> {
        self.make_in_chain::<S>(&[])
    }

    pub(crate) fn make_in_chain<S: Service>(&self, chain: &[ServiceId]) -> Result<S> {
        assert!(
            self.is_active(),
            "Container::shutdown() has been called, this container can no longer resolve services"
        );

        let requested = ServiceId::of::<S>();
        trace!(key = %requested, depth = chain.len(), "Resolving");

        if let Some(cached) = self.cached::<S>(requested)? {
            trace!(key = %requested, "Singleton cache hit");
            return Ok(cached);
        }

        if let Some(start) = chain.iter().position(|id| *id == requested) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(requested);
            warn!(cycle = ?cycle, "Circular dependency detected!");
            return Err(SanduqError::CircularDependency(CircularDependencyError {
                chain: cycle,
            }));
        }

        let target = self.overrides.resolve(requested);
        if target != requested {
            trace!(from = %requested, to = %target, "Following override");
        }

        let registration = self.services.registration(target).ok_or_else(|| {
            SanduqError::NotRegistered(NotRegisteredError {
                requested,
                resolved: target,
                suggestions: self.suggestions(target),
            })
        })?;

        if !registration.satisfies(requested) {
            return Err(SanduqError::TypeMismatch {
                key: registration.id(),
                expected: requested.type_name(),
            });
        }

        let mut nested = chain.to_vec();
        nested.push(requested);
        let resolver = Resolver::new(self, nested);

        let mut instance = registration.construct(&resolver)?;
        for hook in self.services.extensions(target) {
            instance = hook(instance, &resolver)?;
        }

        let instance = registration.convert(instance, requested)?;
        let service = instance
            .downcast::<S>()
            .map(|boxed| *boxed)
            .map_err(|_| SanduqError::type_mismatch::<S>(requested))?;

        if registration.lifetime().is_cached() {
            self.cache.lock().insert(requested, Box::new(service.clone()));
        }

        Ok(service)
    }

    fn cached<S: Service>(&self, id: ServiceId) -> Result<Option<S>> {
        let cache = self.cache.lock();
        match cache.get(&id) {
            Some(value) => value
                .downcast_ref::<S>()
                .cloned()
                .map(Some)
                .ok_or_else(|| SanduqError::type_mismatch::<S>(id)),
            None => Ok(None),
        }
    }

    fn suggestions(&self, id: ServiceId) -> Vec<String> {
        let mut ranked: Vec<(u8, ServiceId)> = self
            .services
            .registered_ids()
            .into_iter()
            .filter_map(|registered| Some((id.resemblance(&registered)?, registered)))
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.type_name().cmp(b.1.type_name())));
        ranked
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, registered)| registered.type_name().to_string())
            .collect()
    }

    // ── Lifecycle ──

    /// Shuts the container down.
    ///
    /// If the container was active, every provider's
    /// [`will_shutdown`](Provider::will_shutdown) runs first, in registration
    /// order, while services can still be resolved. Then the singleton
    /// cache is cleared. Calling this again is harmless, including from
    /// inside a `will_shutdown` callback, where it returns immediately.
    #[instrument(skip(self), name = "container_shutdown")]
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            debug!("Shutdown already in progress");
            return;
        }

        if self.is_active() {
            for provider in self.providers() {
                debug!(provider = provider.name(), "will_shutdown");
                provider.will_shutdown(self);
            }
        }

        let dropped = {
            let mut cache = self.cache.lock();
            let dropped = cache.len();
            cache.clear();
            dropped
        };
        *self.lifecycle.write() = Lifecycle::ShutDown;
        self.shutting_down.store(false, Ordering::Release);

        info!(dropped, "Container shut down");
    }

    /// Shuts down, swaps in `environment`, reactivates, then boots every
    /// provider: all `will_boot` calls first, then all `did_boot` calls,
    /// each pass in registration order.
    ///
    /// Singletons are rebuilt on their next `make`.
    #[instrument(skip(self, environment), fields(environment = %environment))]
    pub fn switch_environment(&self, environment: Environment) -> &Self {
        self.shutdown();
        *self.environment.write() = Arc::new(environment);
        *self.lifecycle.write() = Lifecycle::Active;

        for provider in self.providers() {
            debug!(provider = provider.name(), "will_boot");
            provider.will_boot(self);
        }
        for provider in self.providers() {
            debug!(provider = provider.name(), "did_boot");
            provider.did_boot(self);
        }

        info!("Container booted");
        self
    }

    // ── Accessors ──

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }

    /// The current environment.
    pub fn environment(&self) -> Arc<Environment> {
        Arc::clone(&self.environment.read())
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn providers(&self) -> &[Box<dyn Provider>] {
        self.services.providers()
    }

    /// Number of singletons currently cached.
    pub fn cached_services(&self) -> usize {
        self.cache.lock().len()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        debug_assert!(
            *self.lifecycle.get_mut() == Lifecycle::ShutDown,
            "Container::shutdown() was not called before the container was dropped"
        );
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("environment", &self.environment.read().name())
            .field("lifecycle", &self.lifecycle())
            .field("registered", &self.services.len())
            .field("cached", &self.cached_services())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, Lifecycle};
    pub use crate::environment::Environment;
    pub use crate::error::{BoxError, Result, SanduqError};
    pub use crate::key::ServiceId;
    pub use crate::lifetime::Lifetime;
    pub use crate::overrides::Overrides;
    pub use crate::provider::Provider;
    pub use crate::registry::{Service, ServiceType, Services, Supports};
    pub use crate::resolver::Resolver;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
