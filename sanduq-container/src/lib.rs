//! Core container implementation for Sanduq.

mod cache;

pub mod container;
pub mod environment;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod overrides;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use container::{Container, ContainerBuilder, Lifecycle, prelude};
pub use environment::{Environment, Process};
pub use error::{BoxError, Result, SanduqError};
pub use key::ServiceId;
pub use lifetime::Lifetime;
pub use overrides::Overrides;
pub use provider::Provider;
pub use registry::{Registration, Service, ServiceType, Services, Supports};
pub use resolver::Resolver;
