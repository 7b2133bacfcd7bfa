//! Plugins shipped with sawmon
//!
//! `core` is always loaded; the others are catalog packages installed on
//! request with `sawmon plugins add <name>`.

pub mod builtin;
pub mod http;
pub mod ip;

use crate::infrastructure::plugins::Catalog;

pub use builtin::module as core_module;

/// Packages installable without a local plugin directory
pub fn catalog() -> Catalog {
    Catalog::new()
        .with_package(ip::manifest(), ip::module)
        .with_package(http::manifest(), http::module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_bundled_packages() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(ip::NAME).is_some());
        assert!(catalog.get(http::NAME).is_some());
        assert!(catalog.get("core").is_none());

        let names: Vec<&str> = catalog.manifests().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, [http::NAME, ip::NAME]);
    }
}
