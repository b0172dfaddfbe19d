//! Resolution context for constructors and extension hooks.

use std::fmt;
use std::sync::Arc;

use crate::container::Container;
use crate::environment::Environment;
use crate::error::Result;
use crate::key::ServiceId;
use crate::registry::Service;

/// What a constructor or an extension hook receives.
///
/// Resolving through the `Resolver` instead of the container directly keeps
/// track of which services are currently being built, so a constructor that
/// (indirectly) asks for itself gets
/// [`SanduqError::CircularDependency`](crate::error::SanduqError::CircularDependency)
/// instead of recursing until the stack runs out.
///
/// ```rust,ignore
/// services.transient::<UserService>(|r| {
///     let db: Arc<dyn DatabaseProtocol> = r.make()?;
///     Ok(UserService { db })
/// });
/// ```
pub struct Resolver<'a> {
    container: &'a Container,
    chain: Vec<ServiceId>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(container: &'a Container, chain: Vec<ServiceId>) -> Self {
        Self { container, chain }
    }

    /// Resolves a dependency of the service being built.
    pub fn make<S: Service>(&self) -> Result<S> {
        self.container.make_in_chain::<S>(&self.chain)
    }

    /// The container's current environment.
    pub fn environment(&self) -> Arc<Environment> {
        self.container.environment()
    }

    /// Services being built right now, outermost first. The last entry is
    /// the one this resolver was created for.
    pub fn chain(&self) -> &[ServiceId] {
        &self.chain
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("chain", &self.chain).finish()
    }
}
