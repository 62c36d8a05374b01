use std::path::PathBuf;

use tailwind_analyzer::resolver::default_exemptions;
use tailwind_analyzer::{
    extract_colors, find_conflicts, parse, Analyzer, AnalyzerConfig, ColorDescriptor, ConflictPolicy, DesignSystem,
    DiagnosticKind, ExpressionKind, Resolver, Searcher, Severity, StaticDesignSystem, SuggestKind,
};

fn fixture() -> StaticDesignSystem {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/design_system.json");
    StaticDesignSystem::from_file(&path).unwrap()
}

fn conflict_groups(design: &StaticDesignSystem, input: &str, policy: ConflictPolicy) -> Vec<Vec<String>> {
    let mut resolver = Resolver::new(design, default_exemptions(), 128);
    let result = parse(input, ":");
    find_conflicts(&result.class_list, policy, ExpressionKind::Twin, &mut resolver)
        .into_iter()
        .map(|c| c.tokens.texts().into_iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_strict_and_none_policies() {
    let ds = fixture();
    assert_eq!(
        conflict_groups(&ds, "text-red-500 text-blue-500", ConflictPolicy::Strict),
        vec![vec!["text-red-500".to_string(), "text-blue-500".to_string()]]
    );
    assert!(conflict_groups(&ds, "text-red-500 text-blue-500", ConflictPolicy::None).is_empty());
}

#[test]
fn test_group_children_conflict_with_siblings() {
    let ds = fixture();
    let groups = conflict_groups(&ds, "md:(flex p-4) md:hidden", ConflictPolicy::Strict);
    assert_eq!(groups, vec![vec!["flex".to_string(), "hidden".to_string()]]);
    assert!(conflict_groups(&ds, "md:flex lg:hidden", ConflictPolicy::Strict).is_empty());
}

#[test]
fn test_loose_policy_needs_identical_property_sets() {
    let ds = fixture();
    assert!(conflict_groups(&ds, "p-4 px-4", ConflictPolicy::Loose).is_empty());
    assert!(conflict_groups(&ds, "p-4 px-4", ConflictPolicy::Strict).is_empty());
    assert_eq!(conflict_groups(&ds, "block hidden", ConflictPolicy::Loose).len(), 1);
}

#[test]
fn test_opacity_suffix_conflicts_like_its_base_class() {
    let ds = fixture();
    for policy in [ConflictPolicy::Strict, ConflictPolicy::Loose] {
        assert_eq!(
            conflict_groups(&ds, "text-red-500/[.5] text-blue-500", policy),
            vec![vec!["text-red-500/[.5]".to_string(), "text-blue-500".to_string()]],
            "{policy:?}"
        );
        assert_eq!(
            conflict_groups(&ds, "md:text-blue-500/[.25] md:text-red-500/50", policy),
            vec![vec!["text-blue-500/[.25]".to_string(), "text-red-500/50".to_string()]],
            "{policy:?}"
        );
        assert!(conflict_groups(&ds, "text-red-500/[.5] md:text-blue-500", policy).is_empty());
    }
}

#[test]
fn test_adding_a_class_grows_the_group_by_one() {
    let ds = fixture();
    let before = conflict_groups(&ds, "flex block", ConflictPolicy::Strict);
    let after = conflict_groups(&ds, "flex block hidden", ConflictPolicy::Strict);
    assert_eq!(before[0].len() + 1, after[0].len());
    assert_eq!(&after[0][..2], &before[0][..]);
}

#[test]
fn test_suggestions() {
    let ds = fixture();
    let searcher = Searcher::build(&ds, 0.6);
    assert_eq!(searcher.suggest(SuggestKind::Variant, &[], "hoverr").as_deref(), Some("hover"));
    assert_eq!(
        searcher.suggest(SuggestKind::Classname, &[], "text-red-50").as_deref(),
        Some("text-red-500")
    );
    assert_eq!(searcher.suggest(SuggestKind::Classname, &[], "qqqqqqqq"), None);

    let first = searcher.suggest(SuggestKind::Classname, &["md"], "undrline");
    for _ in 0..5 {
        assert_eq!(searcher.suggest(SuggestKind::Classname, &["md"], "undrline"), first);
    }
}

#[test]
fn test_screen_suggestions_exclude_used_screens() {
    let ds = fixture();
    let searcher = Searcher::build(&ds, 0.3);
    let candidates = searcher.search(SuggestKind::Variant, &["md"], "mdd");
    assert!(candidates.iter().all(|c| c.text != "md" && c.text != "sm" && c.text != "lg"));
}

#[test]
fn test_extract_colors_hex_span() {
    let value = "background-color: #ff0000";
    let colors = extract_colors(value);
    assert_eq!(colors.len(), 1);
    assert_eq!(&value[colors[0].range.clone()], "#ff0000");
    assert_eq!(
        colors[0].descriptor,
        ColorDescriptor::Hex {
            hex: "#ff0000".to_string()
        }
    );
}

#[test]
fn test_class_color_from_variable_alpha() {
    let ds = fixture();
    let mut resolver = Resolver::new(&ds, Vec::new(), 16);
    let desc = resolver.color_desc("bg-red-500").unwrap();
    assert_eq!(desc.background_color.as_deref(), Some("#ef4444"));
    assert!(desc.can_render);
}

#[test]
fn test_design_system_post_processing() {
    let ds = fixture();
    assert!(!ds.is_known_class_name("dark"));
    assert!(!ds.is_known_class_name("group"));
    assert!(ds.is_known_variant("dark", false));
    assert!(ds.is_known_class_name("text-red-500/50"));
    assert!(ds.is_known_class_name("bg-[#123456]"));
    let screens: Vec<_> = ds.screens().map(|(name, _)| name).collect();
    assert_eq!(screens, vec!["sm", "md", "lg"]);
}

#[test]
fn test_source_diagnostics() {
    let ds = fixture();
    let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
    let text = r#"
const Button = tw.button`flex blok hover:p-4`
const Title = () => <h1 tw="text-red-500 text-blue-500" css={cs`[color:red] flex`} />
const spacing = theme`spacing.44`
"#;
    let found = analyzer.validate_source(text);
    let summary: Vec<_> = found
        .iter()
        .map(|d| (d.kind, &text[d.range.clone()]))
        .collect();
    assert_eq!(
        summary,
        vec![
            (DiagnosticKind::UnknownClassName, "blok"),
            (DiagnosticKind::Conflict, "text-red-500"),
            (DiagnosticKind::Conflict, "text-blue-500"),
            (DiagnosticKind::InvalidToken, "flex"),
            (DiagnosticKind::UndefinedTheme, "spacing.44"),
        ]
    );
    assert_eq!(found[0].message, "Can't find 'blok', did you mean 'block'?");
    assert_eq!(found[1].severity, Severity::Warning);
}

#[test]
fn test_analyzers_share_one_searcher() {
    let ds = fixture();
    let config = AnalyzerConfig::default();
    let first = Analyzer::new(&ds, &config);
    let second = Analyzer::with_searcher(&ds, first.searcher().clone(), &config);
    assert!(std::sync::Arc::ptr_eq(first.searcher(), second.searcher()));
}
