//! Preference and requirement tables.
//!
//! When several concrete services can satisfy one interface, the overrides
//! decide which registration `make` uses:
//!
//! ```text
//! requirement_for(I)  ──▶  preference_for(I)  ──▶  I itself
//!   (hard override)         (soft default)         (fallback)
//! ```
//!
//! Nothing here checks that the concrete type actually implements the
//! interface; the registration's `supports` cast does that at compile time.

use std::collections::HashMap;
use std::fmt;

use sanduq_support::rendering::render_section;
use tracing::debug;

use crate::key::ServiceId;

/// Override tables consulted by the container before looking up a
/// registration.
///
/// # Examples
/// ```
/// use sanduq_container::overrides::Overrides;
/// use sanduq_container::key::ServiceId;
///
/// struct RedisCache;
/// struct MemoryCache;
/// trait Cache {}
///
/// let mut overrides = Overrides::new();
/// overrides.prefer::<MemoryCache, dyn Cache>();
/// overrides.require::<RedisCache, dyn Cache>();
///
/// assert_eq!(overrides.resolve(ServiceId::of::<dyn Cache>()), ServiceId::of::<RedisCache>());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    preferences: HashMap<ServiceId, ServiceId>,
    requirements: HashMap<ServiceId, ServiceId>,
}

impl Overrides {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefers `C` whenever `I` is requested and no requirement exists.
    pub fn prefer<C: ?Sized + 'static, I: ?Sized + 'static>(&mut self) -> &mut Self {
        self.prefer_id(ServiceId::of::<C>(), ServiceId::of::<I>())
    }

    /// Requires `C` whenever `I` is requested.
    pub fn require<C: ?Sized + 'static, I: ?Sized + 'static>(&mut self) -> &mut Self {
        self.require_id(ServiceId::of::<C>(), ServiceId::of::<I>())
    }

    /// Id-based form of [`Overrides::prefer`]. Replaces any earlier preference
    /// for `interface`.
    pub fn prefer_id(&mut self, concrete: ServiceId, interface: ServiceId) -> &mut Self {
        debug!(interface = %interface, concrete = %concrete, "Registered preference");
        self.preferences.insert(interface, concrete);
        self
    }

    /// Id-based form of [`Overrides::require`]. Replaces any earlier
    /// requirement for `interface`.
    pub fn require_id(&mut self, concrete: ServiceId, interface: ServiceId) -> &mut Self {
        debug!(interface = %interface, concrete = %concrete, "Registered requirement");
        self.requirements.insert(interface, concrete);
        self
    }

    pub fn preference_for(&self, interface: ServiceId) -> Option<ServiceId> {
        self.preferences.get(&interface).copied()
    }

    pub fn requirement_for(&self, interface: ServiceId) -> Option<ServiceId> {
        self.requirements.get(&interface).copied()
    }

    /// Returns the id whose registration serves a request for `requested`.
    pub fn resolve(&self, requested: ServiceId) -> ServiceId {
        self.requirement_for(requested)
            .or_else(|| self.preference_for(requested))
            .unwrap_or(requested)
    }

    /// Returns `true` if neither table has entries.
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.requirements.is_empty()
    }
}

fn entries(table: &HashMap<ServiceId, ServiceId>) -> Vec<String> {
    let mut lines: Vec<String> = table
        .iter()
        .map(|(interface, concrete)| format!("{}: {}", interface.short_name(), concrete.short_name()))
        .collect();
    lines.sort();
    lines
}

impl fmt::Display for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", render_section("Preferences", &entries(&self.preferences)))?;
        write!(f, "{}", render_section("Requirements", &entries(&self.requirements)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Logger {}
    struct ConsoleLogger;
    struct FileLogger;
    struct SyslogLogger;

    #[test]
    fn falls_back_to_requested_id() {
        let overrides = Overrides::new();
        let id = ServiceId::of::<dyn Logger>();
        assert_eq!(overrides.resolve(id), id);
        assert!(overrides.is_empty());
    }

    #[test]
    fn preference_applies_without_requirement() {
        let mut overrides = Overrides::new();
        overrides.prefer::<ConsoleLogger, dyn Logger>();

        let id = ServiceId::of::<dyn Logger>();
        assert_eq!(overrides.preference_for(id), Some(ServiceId::of::<ConsoleLogger>()));
        assert_eq!(overrides.requirement_for(id), None);
        assert_eq!(overrides.resolve(id), ServiceId::of::<ConsoleLogger>());
    }

    #[test]
    fn requirement_beats_preference() {
        let mut overrides = Overrides::new();
        overrides
            .require::<FileLogger, dyn Logger>()
            .prefer::<ConsoleLogger, dyn Logger>();

        assert_eq!(
            overrides.resolve(ServiceId::of::<dyn Logger>()),
            ServiceId::of::<FileLogger>()
        );
    }

    #[test]
    fn last_write_wins() {
        let mut overrides = Overrides::new();
        overrides.prefer::<ConsoleLogger, dyn Logger>();
        overrides.prefer::<SyslogLogger, dyn Logger>();
        overrides.require::<ConsoleLogger, dyn Logger>();
        overrides.require::<FileLogger, dyn Logger>();

        let id = ServiceId::of::<dyn Logger>();
        assert_eq!(overrides.preference_for(id), Some(ServiceId::of::<SyslogLogger>()));
        assert_eq!(overrides.requirement_for(id), Some(ServiceId::of::<FileLogger>()));
    }

    #[test]
    fn overrides_do_not_leak_to_other_interfaces() {
        let mut overrides = Overrides::new();
        overrides.require::<FileLogger, dyn Logger>();

        let other = ServiceId::of::<ConsoleLogger>();
        assert_eq!(overrides.resolve(other), other);
    }

    #[test]
    fn display_lists_both_tables() {
        let mut overrides = Overrides::new();
        assert_eq!(
            overrides.to_string(),
            "Preferences:\n- none\nRequirements:\n- none"
        );

        overrides.prefer::<ConsoleLogger, dyn Logger>();
        let rendered = overrides.to_string();
        assert!(rendered.contains("- dyn Logger: ConsoleLogger"));
        assert!(rendered.ends_with("Requirements:\n- none"));
    }
}
