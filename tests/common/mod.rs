//! Shared helpers for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

use brrtconneg::constraint::HeaderMatchConstraint;
use brrtconneg::manifest::load_registry;
use brrtconneg::registry::CandidateRegistry;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;

pub const BOOK_ROUTE: &str = "/api/v1/authors/{authorId}/books/{bookId}";
pub const BOOKS_ROUTE: &str = "/api/v1/authors/{authorId}/books";

/// Path of the bundled library manifest
pub fn library_manifest_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("library.yaml")
}

pub fn library_registry() -> CandidateRegistry {
    load_registry(library_manifest_path()).expect("demos/library.yaml must compile")
}

/// Build a header map; repeated names append
pub fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

pub fn accept(types: &[&str]) -> HeaderMatchConstraint {
    HeaderMatchConstraint::new("Accept", types).unwrap()
}

pub fn content_type(types: &[&str]) -> HeaderMatchConstraint {
    HeaderMatchConstraint::new("Content-Type", types).unwrap()
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Temporary manifest with the given extension; removed when dropped
    pub fn create_temp_manifest(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("conneg_manifest_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_manifest(content, "json")
    }
}
