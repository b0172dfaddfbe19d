//! Service registry: construction records, extension hooks and providers.
//!
//! [`Services`] is filled during bootstrap and handed to the
//! [`Container`](crate::container::Container), which treats it as read-only
//! from then on.
//!
//! Values of any type live side by side in one map, so everything stored
//! here is type-erased to [`BoxedService`]. Every way back to a concrete
//! type is a checked downcast that reports
//! [`SanduqError::TypeMismatch`] instead of guessing.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sanduq_support::rendering::render_section;
use tracing::{debug, trace};

use crate::error::{BoxError, Result, SanduqError};
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::resolver::Resolver;

/// Anything the container can hand out.
///
/// Resolved values are returned by value, so services are cloned out of the
/// cache. Wrap heavy services in `Arc<T>` (or `Arc<dyn Trait>`) to make that
/// clone a reference-count bump.
pub trait Service: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Service for T {}

/// A service that knows how to build itself, so it can be registered by
/// type alone.
///
/// ```rust,ignore
/// impl ServiceType for Arc<RedisCache> {
///     fn make_service(resolver: &Resolver<'_>) -> Result<Self, BoxError> {
///         let url = resolver.environment().string_option("REDIS_URL").ok_or("REDIS_URL unset")?;
///         Ok(Arc::new(RedisCache::connect(&url)?))
///     }
///
///     fn service_supports(registration: Supports<'_, Self>) -> Supports<'_, Self> {
///         registration.supports::<Arc<dyn Cache>>(|cache| cache)
///     }
/// }
///
/// services.singleton_type::<Arc<RedisCache>>();
/// ```
pub trait ServiceType: Service {
    /// Builds a new value, resolving dependencies through `resolver`.
    fn make_service(resolver: &Resolver<'_>) -> std::result::Result<Self, BoxError>;

    /// Declares the interfaces this service can be handed out as. None by
    /// default.
    fn service_supports(registration: Supports<'_, Self>) -> Supports<'_, Self> {
        registration
    }
}

/// A type-erased service value.
pub type BoxedService = Box<dyn Any + Send + Sync>;

/// A type-erased constructor.
///
/// Receives the [`Resolver`] so it can `make` its own dependencies.
pub type FactoryFn = Arc<dyn Fn(&Resolver<'_>) -> Result<BoxedService> + Send + Sync>;

/// A type-erased extension hook: takes the freshly built value and returns
/// the (possibly replaced) value.
pub type ExtensionFn = Arc<dyn Fn(BoxedService, &Resolver<'_>) -> Result<BoxedService> + Send + Sync>;

type CloneFn = fn(&(dyn Any + Send + Sync)) -> Option<BoxedService>;

type CastFn = Arc<dyn Fn(BoxedService) -> Result<BoxedService> + Send + Sync>;

fn clone_boxed<S: Service>(value: &(dyn Any + Send + Sync)) -> Option<BoxedService> {
    value
        .downcast_ref::<S>()
        .map(|v| Box::new(v.clone()) as BoxedService)
}

fn factory<F>(f: F) -> FactoryFn
where
    F: Fn(&Resolver<'_>) -> Result<BoxedService> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn extension<F>(f: F) -> ExtensionFn
where
    F: Fn(BoxedService, &Resolver<'_>) -> Result<BoxedService> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn erase_constructor<S, F>(constructor: F) -> FactoryFn
where
    S: Service,
    F: Fn(&Resolver<'_>) -> std::result::Result<S, BoxError> + Send + Sync + 'static,
{
    let id = ServiceId::of::<S>();
    factory(move |resolver| {
        let value = constructor(resolver).map_err(|e| SanduqError::construction(id, e))?;
        Ok(Box::new(value) as BoxedService)
    })
}

/// The recipe stored for one service.
pub(crate) enum Construction {
    /// A value cloned out on every resolve.
    Instance { value: BoxedService, clone: CloneFn },
    Transient(FactoryFn),
    Singleton(FactoryFn),
}

/// Construction record for one service id.
pub struct Registration {
    id: ServiceId,
    construction: Construction,
    /// Interfaces (other than `id` itself) this record can be converted to,
    /// in declaration order.
    supports: Vec<(ServiceId, CastFn)>,
}

impl Registration {
    fn new(id: ServiceId, construction: Construction) -> Self {
        Self {
            id,
            construction,
            supports: Vec::new(),
        }
    }

    /// The id this record is registered under.
    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn lifetime(&self) -> Lifetime {
        match self.construction {
            Construction::Instance { .. } => Lifetime::Instance,
            Construction::Transient(_) => Lifetime::Transient,
            Construction::Singleton(_) => Lifetime::Singleton,
        }
    }

    /// Every capability this record satisfies, its own id first.
    pub fn supports(&self) -> Vec<ServiceId> {
        std::iter::once(self.id)
            .chain(self.supports.iter().map(|(id, _)| *id))
            .collect()
    }

    /// Returns `true` if a value built from this record can be handed out
    /// as `id`.
    pub fn satisfies(&self, id: ServiceId) -> bool {
        id == self.id || self.supports.iter().any(|(supported, _)| *supported == id)
    }

    /// Produces a value of the registered type.
    pub(crate) fn construct(&self, resolver: &Resolver<'_>) -> Result<BoxedService> {
        match &self.construction {
            Construction::Instance { value, clone } => clone(value.as_ref()).ok_or(
                SanduqError::TypeMismatch {
                    key: self.id,
                    expected: self.id.type_name(),
                },
            ),
            Construction::Transient(constructor) | Construction::Singleton(constructor) => {
                constructor(resolver)
            }
        }
    }

    /// Converts a value built by this record into the `target` capability.
    pub(crate) fn convert(&self, value: BoxedService, target: ServiceId) -> Result<BoxedService> {
        if target == self.id {
            return Ok(value);
        }

        let (_, cast) = self
            .supports
            .iter()
            .find(|(supported, _)| *supported == target)
            .ok_or(SanduqError::TypeMismatch {
                key: self.id,
                expected: target.type_name(),
            })?;

        trace!(from = %self.id, to = %target, "Casting to supported interface");
        cast(value)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("lifetime", &self.lifetime())
            .field("supports", &self.supports())
            .finish()
    }
}

/// Handle returned by registrations to declare extra capabilities.
///
/// ```rust,ignore
/// services
///     .transient::<Arc<LocalDatabase>>(|_| Ok(Arc::new(LocalDatabase::open())))
///     .supports::<Arc<dyn DatabaseProtocol>>(|db| db);
/// ```
pub struct Supports<'a, C> {
    registration: &'a mut Registration,
    _concrete: PhantomData<fn() -> C>,
}

impl<C: Service> Supports<'_, C> {
    /// Declares that this registration can serve requests for `I`, using
    /// `upcast` to turn the concrete value into one.
    ///
    /// Needed when an override points an interface at this registration:
    /// the container builds a `C` and hands out `upcast(c)`.
    pub fn supports<I: Service>(self, upcast: impl Fn(C) -> I + Send + Sync + 'static) -> Self {
        let from = ServiceId::of::<C>();
        let to = ServiceId::of::<I>();

        let cast: CastFn = Arc::new(move |value: BoxedService| {
            let concrete = value
                .downcast::<C>()
                .map_err(|_| SanduqError::type_mismatch::<C>(from))?;
            Ok(Box::new(upcast(*concrete)) as BoxedService)
        });

        debug!(concrete = %from, interface = %to, "Registered supported interface");
        self.registration.supports.retain(|(id, _)| *id != to);
        self.registration.supports.push((to, cast));
        self
    }
}

/// Every registration available to a container.
///
/// # Examples
/// ```
/// use sanduq_container::registry::Services;
/// use sanduq_container::lifetime::Lifetime;
/// use sanduq_container::key::ServiceId;
///
/// let mut services = Services::new();
/// services.instance(String::from("postgres://localhost"));
/// services.singleton::<u16>(|_| Ok(5432));
///
/// let record = services.registration(ServiceId::of::<u16>()).unwrap();
/// assert_eq!(record.lifetime(), Lifetime::Singleton);
/// ```
#[derive(Default)]
pub struct Services {
    registrations: HashMap<ServiceId, Registration>,
    extensions: HashMap<ServiceId, Vec<ExtensionFn>>,
    providers: Vec<Box<dyn Provider>>,
}

impl Services {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──

    /// Registers a fixed value. Every resolve returns a clone of it.
    pub fn instance<S: Service>(&mut self, value: S) -> Supports<'_, S> {
        self.insert(Registration::new(
            ServiceId::of::<S>(),
            Construction::Instance {
                value: Box::new(value),
                clone: clone_boxed::<S>,
            },
        ))
    }

    /// Registers a constructor that runs on every resolve.
    pub fn transient<S: Service>(
        &mut self,
        constructor: impl Fn(&Resolver<'_>) -> std::result::Result<S, BoxError> + Send + Sync + 'static,
    ) -> Supports<'_, S> {
        self.insert(Registration::new(
            ServiceId::of::<S>(),
            Construction::Transient(erase_constructor(constructor)),
        ))
    }

    /// Registers a constructor whose result is cached until the container
    /// shuts down.
    pub fn singleton<S: Service>(
        &mut self,
        constructor: impl Fn(&Resolver<'_>) -> std::result::Result<S, BoxError> + Send + Sync + 'static,
    ) -> Supports<'_, S> {
        self.insert(Registration::new(
            ServiceId::of::<S>(),
            Construction::Singleton(erase_constructor(constructor)),
        ))
    }

    /// Registers `S` as a transient built by [`ServiceType::make_service`].
    pub fn transient_type<S: ServiceType>(&mut self) -> Supports<'_, S> {
        let registration = self.insert(Registration::new(
            ServiceId::of::<S>(),
            Construction::Transient(erase_constructor(S::make_service)),
        ));
        S::service_supports(registration)
    }

    /// Registers `S` as a singleton built by [`ServiceType::make_service`].
    pub fn singleton_type<S: ServiceType>(&mut self) -> Supports<'_, S> {
        let registration = self.insert(Registration::new(
            ServiceId::of::<S>(),
            Construction::Singleton(erase_constructor(S::make_service)),
        ));
        S::service_supports(registration)
    }

    /// Appends a hook that runs on every freshly built `S`.
    ///
    /// Hooks run in the order they were added. Each receives the value the
    /// previous one returned; the first error aborts the resolve.
    pub fn extend<S: Service>(
        &mut self,
        hook: impl Fn(S, &Resolver<'_>) -> std::result::Result<S, BoxError> + Send + Sync + 'static,
    ) -> &mut Self {
        let id = ServiceId::of::<S>();
        let hook = extension(move |value, resolver| {
            let typed = value
                .downcast::<S>()
                .map_err(|_| SanduqError::type_mismatch::<S>(id))?;
            let extended = hook(*typed, resolver).map_err(|e| SanduqError::extension(id, e))?;
            Ok(Box::new(extended) as BoxedService)
        });

        let hooks = self.extensions.entry(id).or_default();
        hooks.push(hook);
        debug!(key = %id, hooks = hooks.len(), "Registered extension");
        self
    }

    /// Lets `provider` register its services, then keeps it for lifecycle
    /// callbacks.
    ///
    /// # Errors
    /// Returns [`SanduqError::ProviderFailed`] if
    /// [`Provider::register`] fails; the provider is not kept.
    pub fn register_provider<P: Provider + 'static>(&mut self, provider: P) -> Result<&mut Self> {
        let name = provider.name().to_string();

        provider
            .register(self)
            .map_err(|source| SanduqError::ProviderFailed {
                provider: name.clone(),
                source,
            })?;

        debug!(provider = %name, position = self.providers.len(), "Registered provider");
        self.providers.push(Box::new(provider));
        Ok(self)
    }

    fn insert<S>(&mut self, registration: Registration) -> Supports<'_, S> {
        let id = registration.id;
        debug!(key = %id, lifetime = %registration.lifetime(), "Registered service");

        let registration = self.registrations.entry(id).insert_entry(registration).into_mut();
        Supports {
            registration,
            _concrete: PhantomData,
        }
    }

    // ── Queries ──

    /// Looks up the construction record registered under `id`.
    pub fn registration(&self, id: ServiceId) -> Option<&Registration> {
        self.registrations.get(&id)
    }

    /// Hooks registered for `id`, in registration order.
    pub fn extensions(&self, id: ServiceId) -> &[ExtensionFn] {
        self.extensions.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Providers in registration order.
    pub fn providers(&self) -> &[Box<dyn Provider>] {
        &self.providers
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn registered_ids(&self) -> Vec<ServiceId> {
        self.registrations.keys().copied().collect()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("registered", &self.registrations.len())
            .field("extended", &self.extensions.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}

impl fmt::Display for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services: Vec<String> = self
            .registrations
            .values()
            .map(|r| format!("{} ({})", r.id.short_name(), r.lifetime()))
            .collect();
        services.sort();

        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .map(|(id, hooks)| format!("{} ({} hooks)", id.short_name(), hooks.len()))
            .collect();
        extensions.sort();

        let providers: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();

        writeln!(f, "{}", render_section("Services", &services))?;
        writeln!(f, "{}", render_section("Extensions", &extensions))?;
        write!(f, "{}", render_section("Providers", &providers))
    }
}
