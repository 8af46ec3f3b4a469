use std::collections::HashMap;
use std::fmt::Debug;

use coap_lite::ContentFormat;

use crate::app::{ConfigError, Resource};

/// Owns every resource the server exposes and maps request paths onto them.  Matching is exact:
/// a request for `LEDs` or `LE` never reaches `LED`.
///
/// Resources are kept in registration order so that discovery listings are stable.
#[derive(Debug)]
pub struct EndpointRegistry<Endpoint> {
    resources: Vec<Resource<Endpoint>>,
    index_by_name: HashMap<String, usize>,
}

impl<Endpoint> Default for EndpointRegistry<Endpoint> {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            index_by_name: HashMap::new(),
        }
    }
}

impl<Endpoint: Debug + Clone + PartialEq> EndpointRegistry<Endpoint> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a new resource and hand back a mutable reference for attaching handlers.  Fails
    /// without touching the existing entry if `name` is taken.
    pub fn create(
        &mut self,
        name: &str,
        content_format: ContentFormat,
        observable: bool,
    ) -> Result<&mut Resource<Endpoint>, ConfigError> {
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        if self.index_by_name.contains_key(name) {
            return Err(ConfigError::DuplicateEndpoint(name.to_string()));
        }
        let index = self.resources.len();
        self.resources
            .push(Resource::new(name, content_format, observable));
        self.index_by_name.insert(name.to_string(), index);
        Ok(&mut self.resources[index])
    }

    pub fn find(&self, path: &str) -> Option<&Resource<Endpoint>> {
        self.index_by_name.get(path).map(|&i| &self.resources[i])
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Resource<Endpoint>> {
        match self.index_by_name.get(path) {
            Some(&i) => Some(&mut self.resources[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource<Endpoint>> {
        self.resources.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource<Endpoint>> {
        self.resources.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::app::Status;

    use super::*;

    fn new_registry<const N: usize>(names: [&str; N]) -> EndpointRegistry<u8> {
        let mut registry = EndpointRegistry::new();
        for name in names {
            registry
                .create(name, ContentFormat::TextPlain, false)
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_exact_match() {
        let registry = new_registry(["LED", "temp", "tempVar"]);
        for name in ["LED", "temp", "tempVar"] {
            assert_eq!(registry.find(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_prefixes_and_suffixes_do_not_match() {
        let registry = new_registry(["LED", "temp"]);
        for path in ["", "L", "LE", "LEDs", "xLED", "led", "tem", "temp/", "LED/on"] {
            assert!(registry.find(path).is_none(), "{path:?} should not match");
        }
    }

    #[test]
    fn test_duplicate_keeps_first_registration() {
        let mut registry = EndpointRegistry::<u8>::new();
        registry
            .create("LED", ContentFormat::TextPlain, true)
            .unwrap()
            .on_get(|_| Status::ok("first"));

        let err = registry
            .create("LED", ContentFormat::ApplicationJSON, false)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateEndpoint("LED".to_string()));

        assert_eq!(registry.len(), 1);
        let kept = registry.find("LED").unwrap();
        assert!(kept.is_observable());
        assert!(kept.handles(crate::app::Method::Get));
    }

    #[test]
    fn test_invalid_names() {
        let mut registry = EndpointRegistry::<u8>::new();
        assert!(matches!(
            registry.create("", ContentFormat::TextPlain, false),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(matches!(
            registry.create("a/b", ContentFormat::TextPlain, false),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let registry = new_registry(["b", "a", "c"]);
        let names: Vec<_> = registry.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
