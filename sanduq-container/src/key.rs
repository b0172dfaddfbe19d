//! Service identification.
//!
//! [`ServiceId`] is the only key the registry, the override tables and the
//! singleton cache are indexed by. It wraps a [`TypeId`], so two ids are
//! equal exactly when they were taken from the same type.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use sanduq_support::rendering::short_type_name;

/// Identity of a capability or a concrete service type.
///
/// # Examples
/// ```
/// use sanduq_container::key::ServiceId;
/// use std::sync::Arc;
///
/// trait Cache: Send + Sync {}
///
/// let id = ServiceId::of::<Arc<dyn Cache>>();
/// assert_eq!(id, ServiceId::of::<Arc<dyn Cache>>());
/// assert_ne!(id, ServiceId::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceId {
    /// Returns the id of type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    ///
    /// Only used for messages; it takes no part in equality.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        short_type_name(self.type_name)
    }

    /// How closely `other` looks like this id, for "did you mean" hints.
    ///
    /// Higher is closer. `None` for the id itself and for names with nothing
    /// in common.
    pub fn resemblance(&self, other: &ServiceId) -> Option<u8> {
        if self == other {
            return None;
        }

        let ours = self.short_name().to_lowercase();
        let theirs = other.short_name().to_lowercase();
        if ours == theirs {
            // same type name from another module
            return Some(3);
        }
        if ours.contains(&theirs) || theirs.contains(&ours) {
            return Some(2);
        }

        let shared = innermost(&ours)
            .chars()
            .zip(innermost(&theirs).chars())
            .take_while(|(a, b)| a == b)
            .count();
        (shared >= MIN_SHARED_PREFIX).then_some(1)
    }
}

const MIN_SHARED_PREFIX: usize = 4;

/// `arc<dyn databaseprotocol>` → `databaseprotocol`
fn innermost(name: &str) -> &str {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    name.trim_end_matches(|c: char| !is_ident(c))
        .rsplit(|c: char| !is_ident(c))
        .next()
        .unwrap_or(name)
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceId {}

impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.type_name)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait DatabaseProtocol {}
    struct LocalDatabase;

    #[test]
    fn same_type_same_id() {
        assert_eq!(ServiceId::of::<LocalDatabase>(), ServiceId::of::<LocalDatabase>());
    }

    #[test]
    fn different_types_differ() {
        assert_ne!(ServiceId::of::<LocalDatabase>(), ServiceId::of::<String>());
    }

    #[test]
    fn wrappers_are_distinct_identities() {
        assert_ne!(
            ServiceId::of::<Arc<LocalDatabase>>(),
            ServiceId::of::<LocalDatabase>()
        );
        assert_ne!(
            ServiceId::of::<Arc<dyn DatabaseProtocol>>(),
            ServiceId::of::<dyn DatabaseProtocol>()
        );
    }

    #[test]
    fn usable_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ServiceId::of::<String>(), "string");
        map.insert(ServiceId::of::<u16>(), "u16");
        assert_eq!(map.get(&ServiceId::of::<String>()), Some(&"string"));
        assert_eq!(map.get(&ServiceId::of::<bool>()), None);
    }

    #[test]
    fn resemblance_ranks_names() {
        mod other {
            pub struct LocalDatabase;
        }
        struct LocalDatabaseConfig;
        struct DatabasePool;
        struct Mailer;

        let wanted = ServiceId::of::<LocalDatabase>();
        assert_eq!(wanted.resemblance(&wanted), None);
        assert_eq!(wanted.resemblance(&ServiceId::of::<other::LocalDatabase>()), Some(3));
        assert_eq!(wanted.resemblance(&ServiceId::of::<LocalDatabaseConfig>()), Some(2));
        assert_eq!(wanted.resemblance(&ServiceId::of::<Arc<LocalDatabase>>()), Some(2));
        assert_eq!(wanted.resemblance(&ServiceId::of::<Mailer>()), None);

        let interface = ServiceId::of::<Arc<dyn DatabaseProtocol>>();
        assert_eq!(interface.resemblance(&ServiceId::of::<DatabasePool>()), Some(1));
    }

    #[test]
    fn names_for_messages() {
        let id = ServiceId::of::<Arc<dyn DatabaseProtocol>>();
        assert!(id.type_name().contains("DatabaseProtocol"));
        assert_eq!(id.short_name(), "Arc<dyn DatabaseProtocol>");
        assert_eq!(format!("{id}"), id.type_name());
    }
}
