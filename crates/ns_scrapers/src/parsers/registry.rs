use std::collections::BTreeMap;
use ns_core::{Error, Result};
use tracing::debug;
use super::SiteParser;

pub type ParserFactory = fn() -> Box<dyn SiteParser>;

/// Maps source names to parser constructors. Names are matched
/// case-insensitively and a fresh parser is built for every lookup.
#[derive(Default, Clone)]
pub struct ParserRegistry {
    factories: BTreeMap<String, ParserFactory>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every parser shipped with the crate.
    pub fn with_default_parsers() -> Result<Self> {
        let mut registry = Self::new();
        super::argentina::register_parsers(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, factory: ParserFactory) -> Result<()> {
        let key = name.to_lowercase();
        if self.factories.contains_key(&key) {
            return Err(Error::DuplicateParser(key));
        }
        debug!(parser = %key, "Registered parser");
        self.factories.insert(key, factory);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Box<dyn SiteParser>> {
        self.factories
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| Error::ParserNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::argentina::LaNacionParser;

    fn lanacion() -> Box<dyn SiteParser> {
        Box::new(LaNacionParser::new())
    }

    #[test]
    fn test_register_and_get_case_insensitive() {
        let mut registry = ParserRegistry::new();
        registry.register("LaNacion", lanacion).unwrap();

        assert!(registry.contains("lanacion"));
        assert_eq!(registry.get("LANACION").unwrap().source(), "lanacion");
        assert_eq!(registry.names(), vec!["lanacion"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ParserRegistry::new();
        registry.register("lanacion", lanacion).unwrap();
        let err = registry.register("LANACION", lanacion).unwrap_err();
        assert!(matches!(err, Error::DuplicateParser(name) if name == "lanacion"));
    }

    #[test]
    fn test_missing_parser() {
        let registry = ParserRegistry::new();
        let err = registry.get("clarin").err().unwrap();
        assert!(matches!(err, Error::ParserNotFound(ref name) if name == "clarin"));
        assert_eq!(err.to_string(), "No parser registered for source: clarin");
    }

    #[test]
    fn test_default_parsers() {
        let registry = ParserRegistry::with_default_parsers().unwrap();
        assert_eq!(registry.names(), vec!["infobae", "lanacion", "lapoliticaonline"]);
    }
}
