//! Resolver - picks exactly one candidate per request.
//!
//! # Algorithm
//!
//! 1. No candidates for route + method → [`NoMatch`].
//! 2. Constrained candidates are eligible iff **all** their constraints accept.
//! 3. One eligible → selected. Several → candidates are ranked by the [`Specificity`]
//!    of their matching declared types, most specific constraint first and compared
//!    lexicographically; remaining ties go to the earliest registered.
//! 4. None eligible → first unconstrained candidate, if any.
//! 5. Otherwise [`NoMatch::Unsatisfied`] naming the headers that failed.
//!
//! Stateless: everything besides the immutable registry lives on the stack of one call.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::header::{HeaderMap, HeaderName};
use http::Method;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::constraint::request_media_types;
use crate::media_type::{MediaType, RequestMediaTypes, Specificity};
use crate::registry::{Candidate, CandidateRegistry, HandlerId};

/// How the winning candidate was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    /// All constraints of the candidate held
    Constrained,
    /// No constrained candidate was eligible; the route's unconstrained default ran
    Fallback,
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub handler: HandlerId,
    pub kind: SelectionKind,
    /// Eligible constrained candidates; above 1 means the specificity tie-break decided
    pub contenders: usize,
    /// Specificity of the winner's most specific matching declared type (zero for fallbacks)
    pub specificity: Specificity,
}

impl Selection {
    #[must_use]
    pub fn was_tie_broken(&self) -> bool {
        self.contenders > 1
    }
}

/// Why no candidate qualified. Mapping to an HTTP status is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoMatch {
    /// Nothing registered for this route template
    UnknownRoute,
    /// The route exists, but not for this method
    MethodNotAllowed { allowed: Vec<Method> },
    /// Candidates exist, but none was eligible and no fallback is registered
    Unsatisfied { headers: Vec<HeaderName> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(Selection),
    NoMatch(NoMatch),
}

impl Resolution {
    /// The selected handler, if any
    #[must_use]
    pub fn handler(&self) -> Option<&HandlerId> {
        match self {
            Resolution::Selected(selection) => Some(&selection.handler),
            Resolution::NoMatch(_) => None,
        }
    }

    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Resolution::NoMatch(_))
    }
}

/// Per-call cache so a header shared by several constraints is parsed only once.
struct HeaderCache<'h> {
    headers: &'h HeaderMap,
    entries: SmallVec<[(HeaderName, Option<RequestMediaTypes>); 2]>,
}

impl<'h> HeaderCache<'h> {
    fn new(headers: &'h HeaderMap) -> Self {
        Self {
            headers,
            entries: SmallVec::new(),
        }
    }

    fn get(&mut self, name: &HeaderName) -> Option<&[MediaType]> {
        let idx = match self.entries.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                let parsed = request_media_types(self.headers, name);
                self.entries.push((name.clone(), parsed));
                self.entries.len() - 1
            }
        };
        self.entries[idx].1.as_deref()
    }
}

/// Per-constraint specificities of one candidate, sorted most specific first.
///
/// Compared lexicographically, so one exact declared type beats any number of
/// wildcards; on an equal prefix the candidate with more constraints wins.
type CandidateScore = SmallVec<[Specificity; 2]>;

/// Score a constrained candidate; `None` as soon as one constraint fails.
fn evaluate_candidate(
    candidate: &Candidate,
    cache: &mut HeaderCache<'_>,
    unsatisfied: &mut SmallVec<[HeaderName; 2]>,
) -> Option<CandidateScore> {
    let mut scores = CandidateScore::new();
    for constraint in candidate.constraints() {
        let score = cache
            .get(constraint.header())
            .and_then(|requested| constraint.best_match(requested));
        match score {
            Some(score) => scores.push(score),
            None => {
                if !unsatisfied.contains(constraint.header()) {
                    unsatisfied.push(constraint.header().clone());
                }
                return None;
            }
        }
    }
    scores.sort_unstable_by(|a, b| b.cmp(a));
    Some(scores)
}

/// Resolve `route` + `method` against the request headers.
///
/// Never fails: malformed request headers only make constraints non-matching.
#[must_use]
pub fn resolve(
    registry: &CandidateRegistry,
    route: &str,
    method: &Method,
    headers: &HeaderMap,
) -> Resolution {
    let candidates = registry.lookup(route, method);
    if candidates.is_empty() {
        let reason = if registry.contains_route(route) {
            NoMatch::MethodNotAllowed {
                allowed: registry.allowed_methods(route),
            }
        } else {
            NoMatch::UnknownRoute
        };
        debug!(route = %route, method = %method, reason = ?reason, "No candidates registered");
        return Resolution::NoMatch(reason);
    }

    let mut cache = HeaderCache::new(headers);
    let mut unsatisfied: SmallVec<[HeaderName; 2]> = SmallVec::new();
    let mut best: Option<(&Candidate, CandidateScore)> = None;
    let mut fallback: Option<&Candidate> = None;
    let mut contenders = 0usize;

    for candidate in candidates {
        if candidate.is_fallback() {
            fallback = fallback.or(Some(candidate));
            continue;
        }
        let Some(score) = evaluate_candidate(candidate, &mut cache, &mut unsatisfied) else {
            continue;
        };
        contenders += 1;
        // Strictly greater: on equal scores the earlier registration keeps the lead
        if best.as_ref().map_or(true, |(_, leader)| score > *leader) {
            best = Some((candidate, score));
        }
    }

    if let Some((winner, score)) = best {
        debug!(
            route = %route,
            method = %method,
            handler_name = %winner.handler(),
            contenders = contenders,
            tie_break = contenders > 1,
            "Constrained candidate selected"
        );
        return Resolution::Selected(Selection {
            handler: winner.handler().clone(),
            kind: SelectionKind::Constrained,
            contenders,
            specificity: score.first().copied().unwrap_or_default(),
        });
    }

    if let Some(fallback) = fallback {
        debug!(
            route = %route,
            method = %method,
            handler_name = %fallback.handler(),
            "Fallback candidate selected"
        );
        return Resolution::Selected(Selection {
            handler: fallback.handler().clone(),
            kind: SelectionKind::Fallback,
            contenders: 0,
            specificity: Specificity::default(),
        });
    }

    debug!(
        route = %route,
        method = %method,
        unsatisfied = ?unsatisfied,
        "No candidate satisfied the request headers"
    );
    Resolution::NoMatch(NoMatch::Unsatisfied {
        headers: unsatisfied.into_vec(),
    })
}

impl CandidateRegistry {
    /// Shorthand for [`resolve`]`(self, route, method, headers)`.
    #[must_use]
    pub fn resolve(&self, route: &str, method: &Method, headers: &HeaderMap) -> Resolution {
        resolve(self, route, method, headers)
    }
}
