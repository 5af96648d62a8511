extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use domscope_lib::inspect::rules::RuleMatcher;
use domscope_lib::parser::dom_indices::DomIndices;
use domscope_lib::parser::html::parse_document;
use domscope_lib::style::css_matcher::{compute_document_styles, query_selector};
use domscope_lib::style::owned_css::SheetRegistry;
use domscope_lib::style::sheet::collect_document_sheets;

fn build_page(rows: usize) -> String {
    let mut html = String::with_capacity(rows * 64 + 512);
    html.push_str(
        "<head><style>\
         .row { margin-top: 4px; margin-right: 8px; margin-bottom: 4px; margin-left: 8px; }\
         .row.odd { color: maroon; }\
         #target { font-size: 18px; }\
         div > p { line-height: 1.4; }\
         </style></head><body><div class=\"table\">",
    );
    for i in 0..rows {
        let odd = if i % 2 == 1 { " odd" } else { "" };
        html.push_str(&format!("<p class=\"row{}\">row {}</p>", odd, i));
    }
    html.push_str("<p id=\"target\" class=\"row\">last</p></div></body>");
    html
}

fn bench_document_load(c: &mut Criterion) {
    let html = build_page(2_000);
    c.bench_function("load_and_cascade", |b| {
        b.iter(|| {
            let document = parse_document(&html);
            let mut registry = SheetRegistry::new();
            collect_document_sheets(&document, &mut registry);
            compute_document_styles(&document, &registry)
        })
    });
}

fn bench_match_rules(c: &mut Criterion) {
    let html = build_page(2_000);
    let document = parse_document(&html);
    let mut registry = SheetRegistry::new();
    collect_document_sheets(&document, &mut registry);
    let computed = compute_document_styles(&document, &registry);
    let indices = DomIndices::build(&document);
    let target = query_selector(&indices, "#target").unwrap();

    c.bench_function("match_rules", |b| {
        let matcher = RuleMatcher::new(&registry, &computed);
        b.iter(|| matcher.match_rules(&target))
    });
}

criterion_group!(benches, bench_document_load, bench_match_rules);
criterion_main!(benches);
