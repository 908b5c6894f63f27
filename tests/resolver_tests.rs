//! Tests for dispatch resolution
//!
//! # Test Coverage
//!
//! - Constrained vs. unconstrained candidates on one route
//! - Disjoint constraints with no fallback
//! - Specificity tie-break and registration-order tie-break
//! - Multiple constraints per candidate (all must hold, ranked most specific first)
//! - Unknown route / method not allowed
//! - Malformed and refused (`q=0`) request entries
//! - Concurrent resolution over a shared registry

use brrtconneg::dispatcher::{resolve, NoMatch, Resolution, SelectionKind};
use brrtconneg::registry::{Candidate, CandidateRegistry};
use brrtconneg::Specificity;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::Method;
use std::sync::Arc;

mod common;
use common::{accept, content_type, headers};

const ROUTE: &str = "/things/{id}";

fn handler_of(resolution: &Resolution) -> Option<&str> {
    resolution.handler().map(|h| h.as_str())
}

fn vendor_with_fallback() -> CandidateRegistry {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("vendor").with_constraint(accept(&["application/vnd.x+json"])),
        )
        .unwrap();
    registry
        .register(ROUTE, Method::GET, Candidate::new("default"))
        .unwrap();
    registry
}

#[test]
fn test_constrained_candidate_wins_when_satisfied() {
    let registry = vendor_with_fallback();
    let resolution = resolve(
        &registry,
        ROUTE,
        &Method::GET,
        &headers(&[("Accept", "application/vnd.x+json")]),
    );
    match resolution {
        Resolution::Selected(selection) => {
            assert_eq!(selection.handler.as_str(), "vendor");
            assert_eq!(selection.kind, SelectionKind::Constrained);
            assert_eq!(selection.contenders, 1);
            assert!(!selection.was_tie_broken());
        }
        other => panic!("expected selection, got {other:?}"),
    }
}

#[test]
fn test_fallback_when_constraint_unsatisfied() {
    let registry = vendor_with_fallback();
    let resolution = resolve(
        &registry,
        ROUTE,
        &Method::GET,
        &headers(&[("Accept", "text/plain")]),
    );
    match resolution {
        Resolution::Selected(selection) => {
            assert_eq!(selection.handler.as_str(), "default");
            assert_eq!(selection.kind, SelectionKind::Fallback);
            assert_eq!(selection.specificity, Specificity::default());
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[test]
fn test_fallback_when_header_absent() {
    let registry = vendor_with_fallback();
    let resolution = resolve(&registry, ROUTE, &Method::GET, &headers(&[]));
    assert_eq!(handler_of(&resolution), Some("default"));
}

#[test]
fn test_fallback_registered_first_still_loses_to_constrained() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(ROUTE, Method::GET, Candidate::new("default"))
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("vendor").with_constraint(accept(&["application/vnd.x+json"])),
        )
        .unwrap();
    let resolution = registry.resolve(
        ROUTE,
        &Method::GET,
        &headers(&[("Accept", "application/vnd.x+json")]),
    );
    assert_eq!(handler_of(&resolution), Some("vendor"));
}

#[test]
fn test_disjoint_constraints_no_match() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("a").with_constraint(accept(&["application/vnd.a+json"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("b").with_constraint(accept(&["application/vnd.b+json"])),
        )
        .unwrap();

    let resolution = resolve(
        &registry,
        ROUTE,
        &Method::GET,
        &headers(&[("Accept", "application/vnd.c+json")]),
    );
    assert_eq!(
        resolution,
        Resolution::NoMatch(NoMatch::Unsatisfied {
            headers: vec![ACCEPT]
        })
    );
    assert!(resolution.is_no_match());
}

#[test]
fn test_exact_subtype_beats_wildcard_in_either_order() {
    for wildcard_first in [true, false] {
        let mut registry = CandidateRegistry::new();
        let wildcard = Candidate::new("wildcard").with_constraint(accept(&["application/*"]));
        let exact = Candidate::new("exact").with_constraint(accept(&["application/json"]));
        let ordered = if wildcard_first {
            [wildcard, exact]
        } else {
            [exact, wildcard]
        };
        for candidate in ordered {
            registry.register(ROUTE, Method::GET, candidate).unwrap();
        }

        let resolution = resolve(
            &registry,
            ROUTE,
            &Method::GET,
            &headers(&[("Accept", "application/json")]),
        );
        match resolution {
            Resolution::Selected(selection) => {
                assert_eq!(selection.handler.as_str(), "exact");
                assert_eq!(selection.contenders, 2);
                assert!(selection.was_tie_broken());
            }
            other => panic!("expected exact, got {other:?}"),
        }
    }
}

#[test]
fn test_suffix_wildcard_ranks_between_wildcard_and_exact() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("any").with_constraint(accept(&["*/*"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("any_json").with_constraint(accept(&["application/*+json"])),
        )
        .unwrap();

    let request = headers(&[("Accept", "application/vnd.marvin.book+json")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("any_json")
    );

    let request = headers(&[("Accept", "text/csv")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("any")
    );
}

#[test]
fn test_parameters_break_ties_between_equally_concrete_types() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("plain").with_constraint(accept(&["text/html"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("level1").with_constraint(accept(&["text/html;level=1"])),
        )
        .unwrap();

    let request = headers(&[("Accept", "text/html;level=1")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("level1")
    );
    // Without the parameter only the plain declaration matches
    let request = headers(&[("Accept", "text/html")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("plain")
    );
}

#[test]
fn test_equal_specificity_earliest_registration_wins() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("first").with_constraint(accept(&["application/json"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("second").with_constraint(accept(&["application/json"])),
        )
        .unwrap();

    let request = headers(&[("Accept", "application/json")]);
    for _ in 0..10 {
        assert_eq!(
            handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
            Some("first")
        );
    }
}

#[test]
fn test_all_constraints_must_hold() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::POST,
            Candidate::new("json_in_json_out")
                .with_constraint(content_type(&["application/json"]))
                .with_constraint(accept(&["application/json"])),
        )
        .unwrap();

    let both = headers(&[
        ("Content-Type", "application/json"),
        ("Accept", "application/json"),
    ]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::POST, &both)),
        Some("json_in_json_out")
    );

    let wrong_accept = headers(&[
        ("Content-Type", "application/json"),
        ("Accept", "text/html"),
    ]);
    assert_eq!(
        resolve(&registry, ROUTE, &Method::POST, &wrong_accept),
        Resolution::NoMatch(NoMatch::Unsatisfied {
            headers: vec![ACCEPT]
        })
    );

    let no_content_type = headers(&[("Accept", "application/json")]);
    assert_eq!(
        resolve(&registry, ROUTE, &Method::POST, &no_content_type),
        Resolution::NoMatch(NoMatch::Unsatisfied {
            headers: vec![CONTENT_TYPE]
        })
    );
}

#[test]
fn test_more_constraints_win_on_equal_specificity() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::POST,
            Candidate::new("accept_only").with_constraint(accept(&["application/json"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::POST,
            Candidate::new("both")
                .with_constraint(content_type(&["application/json"]))
                .with_constraint(accept(&["application/json"])),
        )
        .unwrap();

    let request = headers(&[
        ("Content-Type", "application/json"),
        ("Accept", "application/json"),
    ]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::POST, &request)),
        Some("both")
    );
}

#[test]
fn test_exact_constraint_beats_several_wildcard_constraints() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::POST,
            Candidate::new("exact").with_constraint(accept(&["application/vnd.x+json;v=1"])),
        )
        .unwrap();
    registry
        .register(
            ROUTE,
            Method::POST,
            Candidate::new("wild")
                .with_constraint(accept(&["application/*+json"]))
                .with_constraint(content_type(&["application/*+json"])),
        )
        .unwrap();

    let request = headers(&[
        ("Accept", "application/vnd.x+json;v=1"),
        ("Content-Type", "application/vnd.x+json"),
    ]);
    match resolve(&registry, ROUTE, &Method::POST, &request) {
        Resolution::Selected(selection) => {
            assert_eq!(selection.handler.as_str(), "exact");
            assert_eq!(selection.contenders, 2);
            assert_eq!(
                selection.specificity,
                Specificity {
                    concreteness: 3,
                    parameters: 1
                }
            );
        }
        other => panic!("expected selection, got {other:?}"),
    }
}

#[test]
fn test_unknown_route_and_method_not_allowed() {
    let registry = vendor_with_fallback();
    assert_eq!(
        resolve(&registry, "/missing", &Method::GET, &headers(&[])),
        Resolution::NoMatch(NoMatch::UnknownRoute)
    );
    assert_eq!(
        resolve(&registry, ROUTE, &Method::DELETE, &headers(&[])),
        Resolution::NoMatch(NoMatch::MethodNotAllowed {
            allowed: vec![Method::GET]
        })
    );
}

#[test]
fn test_refused_entry_never_matches() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("json").with_constraint(accept(&["application/json"])),
        )
        .unwrap();

    let refused = headers(&[("Accept", "application/json;q=0")]);
    assert!(resolve(&registry, ROUTE, &Method::GET, &refused).is_no_match());

    let refused_with_other = headers(&[("Accept", "text/html, application/json;q=0.0")]);
    assert!(resolve(&registry, ROUTE, &Method::GET, &refused_with_other).is_no_match());

    let low_but_acceptable = headers(&[("Accept", "application/json;q=0.1")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &low_but_acceptable)),
        Some("json")
    );
}

#[test]
fn test_malformed_request_entries_are_ignored() {
    let registry = vendor_with_fallback();

    // Only the malformed entry: constraint fails quietly, fallback runs
    let malformed = headers(&[("Accept", "application/")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &malformed)),
        Some("default")
    );

    // A malformed entry next to a valid one does not poison the header
    let mixed = headers(&[("Accept", "garbage, application/vnd.x+json")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &mixed)),
        Some("vendor")
    );
}

#[test]
fn test_stray_quote_keeps_earlier_valid_entry() {
    let mut registry = CandidateRegistry::new();
    registry
        .register(
            ROUTE,
            Method::GET,
            Candidate::new("json").with_constraint(accept(&["application/json"])),
        )
        .unwrap();

    let request = headers(&[("Accept", r#"application/json, text/"html"#)]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("json")
    );
}

#[test]
fn test_request_wildcard_does_not_satisfy_concrete_declaration() {
    let registry = vendor_with_fallback();
    let request = headers(&[("Accept", "*/*")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("default")
    );
}

#[test]
fn test_repeated_header_lines_are_combined() {
    let registry = vendor_with_fallback();
    let request = headers(&[("Accept", "text/plain"), ("Accept", "application/vnd.x+json")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("vendor")
    );
}

#[test]
fn test_case_insensitive_matching() {
    let registry = vendor_with_fallback();
    let request = headers(&[("accept", "Application/VND.X+JSON")]);
    assert_eq!(
        handler_of(&resolve(&registry, ROUTE, &Method::GET, &request)),
        Some("vendor")
    );
}

#[test]
fn test_concurrent_resolution_is_consistent() {
    let registry = Arc::new(vendor_with_fallback());
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let (accept_value, expected) = if i % 2 == 0 {
                    ("application/vnd.x+json", "vendor")
                } else {
                    ("text/plain", "default")
                };
                let request = headers(&[("Accept", accept_value)]);
                for _ in 0..500 {
                    let resolution = registry.resolve(ROUTE, &Method::GET, &request);
                    assert_eq!(resolution.handler().map(|h| h.as_str()), Some(expected));
                }
            })
        })
        .collect();
    for handle in threads {
        handle.join().unwrap();
    }
}
