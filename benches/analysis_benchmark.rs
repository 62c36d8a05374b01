use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;
use tailwind_analyzer::{parse, Analyzer, AnalyzerConfig, Searcher, StaticDesignSystem, SuggestKind};

fn design_system() -> StaticDesignSystem {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/design_system.json");
    StaticDesignSystem::from_file(&path).unwrap()
}

/// Build a source file with `components` twin components
fn source_text(components: usize) -> String {
    let classes = [
        "flex", "block", "p-4", "px-4", "md:(text-sm font-bold)", "hover:underline",
        "text-red-500", "bg-red-500/50", "lg:hidden", "[color:red]", "bg-[#123456]",
    ];
    let mut content = String::from("import tw from 'twin.macro'\n\n");
    for i in 0..components {
        let class_list = classes
            .iter()
            .cycle()
            .skip(i % classes.len())
            .take(6)
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        content.push_str(&format!("export const Component{} = tw.div`{}`\n", i, class_list));
        content.push_str(&format!("const Label{} = () => <span tw=\"{}\" />\n", i, class_list));
    }
    content
}

fn benchmark_parse(c: &mut Criterion) {
    let input = "lg:hover:(flex !p-4) [mask-type:luminance] bg-red-500/[.25] md:(text-sm (font-bold underline))";
    c.bench_function("parse_expression", |b| b.iter(|| parse(black_box(input), ":")));
}

fn benchmark_validate_source(c: &mut Criterion) {
    let design = design_system();
    let config = AnalyzerConfig::default();
    let mut group = c.benchmark_group("validate_source");

    for components in [10, 100, 500] {
        let text = source_text(components);
        group.bench_with_input(BenchmarkId::from_parameter(components), &text, |b, text| {
            let mut analyzer = Analyzer::new(&design, &config);
            b.iter(|| analyzer.validate_source(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_suggest(c: &mut Criterion) {
    let design = design_system();
    let searcher = Searcher::build(&design, 0.6);

    c.bench_function("suggest_classname", |b| {
        b.iter(|| searcher.suggest(SuggestKind::Classname, &[], black_box("text-red-50")))
    });
    c.bench_function("suggest_variant", |b| {
        b.iter(|| searcher.suggest(SuggestKind::Variant, &["md"], black_box("hoverr")))
    });
}

criterion_group!(benches, benchmark_parse, benchmark_validate_source, benchmark_suggest);
criterion_main!(benches);
