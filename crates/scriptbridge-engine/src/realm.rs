//! Realm registry
//!
//! A realm is a separate global environment. Every heap cell remembers the
//! realm that was current when it was allocated.

use scriptbridge_sdk::RealmId;

/// Registered realms, indexed by id
pub struct RealmRegistry {
    names: Vec<String>,
}

impl RealmRegistry {
    /// Create a registry holding the initial realm
    pub fn new(initial: &str) -> Self {
        Self {
            names: vec![initial.to_string()],
        }
    }

    /// The realm created with the registry
    pub fn initial(&self) -> RealmId {
        RealmId(0)
    }

    /// Register a new realm
    pub fn create(&mut self, name: &str) -> RealmId {
        self.names.push(name.to_string());
        RealmId(self.names.len() as u32 - 1)
    }

    /// Name of a realm
    pub fn name(&self, realm: RealmId) -> Option<&str> {
        self.names.get(realm.0 as usize).map(String::as_str)
    }

    /// Whether the realm is registered
    pub fn contains(&self, realm: RealmId) -> bool {
        (realm.0 as usize) < self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_realms() {
        let mut realms = RealmRegistry::new("main");
        assert_eq!(realms.name(realms.initial()), Some("main"));
        let iframe = realms.create("iframe");
        assert_eq!(iframe, RealmId(1));
        assert!(realms.contains(iframe));
        assert!(!realms.contains(RealmId(2)));
    }
}
