//! # Sanduq: a service container for Rust
//!
//! Register how to build each service once, then ask the [`Container`] for
//! it by type:
//!
//! - **instances**: a fixed value cloned out on every resolve
//! - **transients**: a constructor that runs on every resolve
//! - **singletons**: a constructor whose result is cached until shutdown
//!
//! Requirements and preferences ([`Overrides`]) redirect a request for an
//! interface to a concrete registration, extensions post-process freshly
//! built services, and [`Provider`]s group registrations and follow the
//! container lifecycle.
//!
//! ```rust
//! use sanduq::prelude::*;
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String { "hello".into() }
//! }
//!
//! let container = Container::builder()
//!     .environment(Environment::testing())
//!     .configure(|services| {
//!         services.singleton::<Arc<dyn Greeter>>(|_| Ok(Arc::new(English)));
//!     })
//!     .build()?;
//!
//! let greeter: Arc<dyn Greeter> = container.make()?;
//! assert_eq!(greeter.greet(), "hello");
//!
//! container.shutdown();
//! # Ok::<(), SanduqError>(())
//! ```

pub use sanduq_container::*;
pub use sanduq_support::*;
