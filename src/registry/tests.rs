use super::*;
use crate::constraint::HeaderMatchConstraint;
use crate::error::ConnegError;
use http::Method;

fn accept(types: &[&str]) -> HeaderMatchConstraint {
    HeaderMatchConstraint::new("Accept", types).unwrap()
}

#[test]
fn test_lookup_preserves_registration_order() {
    let mut registry = CandidateRegistry::new();
    registry
        .register("/books", Method::GET, Candidate::new("a").with_constraint(accept(&["text/csv"])))
        .unwrap();
    registry.register("/books", Method::GET, Candidate::new("b")).unwrap();
    registry
        .register("/books", Method::GET, Candidate::new("c").with_constraint(accept(&["text/xml"])))
        .unwrap();

    let names: Vec<&str> = registry
        .lookup("/books", &Method::GET)
        .iter()
        .map(|c| c.handler().as_str())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.route_count(), 1);
}

#[test]
fn test_lookup_unknown_is_empty() {
    let mut registry = CandidateRegistry::new();
    registry.register("/books", Method::GET, Candidate::new("list")).unwrap();
    assert!(registry.lookup("/authors", &Method::GET).is_empty());
    assert!(registry.lookup("/books", &Method::DELETE).is_empty());
    assert!(registry.contains_route("/books"));
    assert!(!registry.contains_route("/authors"));
}

#[test]
fn test_allowed_methods() {
    let mut registry = CandidateRegistry::new();
    registry.register("/books", Method::GET, Candidate::new("list")).unwrap();
    registry.register("/books", Method::POST, Candidate::new("create")).unwrap();
    registry.register("/books", Method::GET, Candidate::new("list_csv").with_constraint(accept(&["text/csv"]))).unwrap();
    assert_eq!(registry.allowed_methods("/books"), vec![Method::GET, Method::POST]);
    assert!(registry.allowed_methods("/nope").is_empty());
}

#[test]
fn test_duplicate_candidate_rejected() {
    let mut registry = CandidateRegistry::new();
    registry.register("/books", Method::GET, Candidate::new("list")).unwrap();
    let err = registry
        .register("/books", Method::GET, Candidate::new("list"))
        .unwrap_err();
    assert!(matches!(err, ConnegError::DuplicateCandidate { .. }));
    assert_eq!(registry.len(), 1);
    // Same handler on another method is fine
    registry.register("/books", Method::HEAD, Candidate::new("list")).unwrap();
}

#[test]
fn test_invalid_route_and_handler_rejected() {
    let mut registry = CandidateRegistry::new();
    assert!(matches!(
        registry.register("books", Method::GET, Candidate::new("list")),
        Err(ConnegError::InvalidRoute(_))
    ));
    assert!(matches!(
        registry.register("/books", Method::GET, Candidate::new("  ")),
        Err(ConnegError::EmptyHandler)
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_entries_in_registration_order() {
    let mut registry = CandidateRegistry::new();
    registry.register("/b", Method::GET, Candidate::new("b_get")).unwrap();
    registry.register("/a", Method::GET, Candidate::new("a_get")).unwrap();
    registry.register("/b", Method::POST, Candidate::new("b_post")).unwrap();

    let entries: Vec<(String, Method)> = registry
        .entries()
        .map(|(route, method, _)| (route.to_string(), method.clone()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("/b".to_string(), Method::GET),
            ("/b".to_string(), Method::POST),
            ("/a".to_string(), Method::GET),
        ]
    );
    let handlers: Vec<&str> = registry.handler_ids().map(HandlerId::as_str).collect();
    assert_eq!(handlers, vec!["b_get", "b_post", "a_get"]);
}

#[test]
fn test_parse_method() {
    assert_eq!(parse_method("get").unwrap(), Method::GET);
    assert_eq!(parse_method(" Patch ").unwrap(), Method::PATCH);
    assert!(matches!(parse_method("FETCH"), Err(ConnegError::InvalidMethod(_))));
    assert!(parse_method("").is_err());
}

#[test]
fn test_candidate_fallback_flag() {
    assert!(Candidate::new("x").is_fallback());
    assert!(!Candidate::new("x").with_constraint(accept(&["*/*"])).is_fallback());
}
