use brrtconneg::manifest::{parse_manifest_str, ManifestFormat};
use brrtconneg::media_type::parse_media_types;
use brrtconneg::registry::CandidateRegistry;
use criterion::{criterion_group, criterion_main, Criterion};
use http::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::Method;
use std::hint::black_box;

const BOOK: &str = "/api/v1/authors/{authorId}/books/{bookId}";
const BOOKS: &str = "/api/v1/authors/{authorId}/books";

fn library() -> CandidateRegistry {
    let yaml = include_str!("../demos/library.yaml");
    parse_manifest_str(yaml, ManifestFormat::Yaml)
        .and_then(|manifest| manifest.build_registry())
        .expect("bundled manifest compiles")
}

fn header_map(name: http::header::HeaderName, value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_static(value));
    headers
}

fn bench_resolve(c: &mut Criterion) {
    let registry = library();
    let requests = [
        (
            Method::GET,
            BOOK,
            header_map(ACCEPT, "application/json"),
        ),
        (
            Method::GET,
            BOOK,
            header_map(
                ACCEPT,
                "text/html, application/xhtml+xml;q=0.9, application/vnd.marvin.bookwithconcatenatedauthorname+json",
            ),
        ),
        (
            Method::POST,
            BOOKS,
            header_map(
                CONTENT_TYPE,
                "application/vnd.marvin.bookforcreationwithamountofpages+json; charset=utf-8",
            ),
        ),
        (Method::GET, BOOK, header_map(ACCEPT, "image/png")),
        (Method::DELETE, BOOKS, HeaderMap::new()),
    ];

    c.bench_function("resolve_library", |b| {
        b.iter(|| {
            for (method, route, headers) in requests.iter() {
                let res = registry.resolve(route, method, headers);
                black_box(&res);
            }
        })
    });
}

fn bench_parse_accept(c: &mut Criterion) {
    let raw = "text/html, application/xhtml+xml, application/xml;q=0.9, image/webp, */*;q=0.8";
    c.bench_function("parse_accept_header", |b| {
        b.iter(|| black_box(parse_media_types(black_box(raw))))
    });
}

criterion_group!(benches, bench_resolve, bench_parse_accept);
criterion_main!(benches);
