use tailwind_analyzer::{parse, EmptyKind, Node};

#[test]
fn test_variant_and_class_name() {
    let result = parse("hover:text-red-500", ":");
    assert_eq!(result.class_list.len(), 1);
    match &result.class_list[0] {
        Node::ClassName { variants, token, important, .. } => {
            assert_eq!(variants.texts(), vec!["hover"]);
            assert_eq!(token.text, "text-red-500");
            assert!(!important);
        }
        other => panic!("expected class name, got {:?}", other),
    }
}

#[test]
fn test_group_with_variant() {
    let result = parse("sm:(text-sm font-bold)", ":");
    assert_eq!(result.class_list.len(), 1);
    match &result.class_list[0] {
        Node::Group { variants, children, .. } => {
            assert_eq!(variants.texts(), vec!["sm"]);
            let names: Vec<_> = children
                .iter()
                .map(|c| match c {
                    Node::ClassName { token, .. } => token.text.as_str(),
                    other => panic!("expected class name, got {:?}", other),
                })
                .collect();
            assert_eq!(names, vec!["text-sm", "font-bold"]);
        }
        other => panic!("expected group, got {:?}", other),
    }
}

#[test]
fn test_css_declaration() {
    let result = parse("[color:red]", ":");
    assert_eq!(result.class_list.len(), 1);
    match &result.class_list[0] {
        Node::CssDeclaration { key, value, .. } => {
            assert_eq!(key.text, "color");
            assert_eq!(value.text, "red");
        }
        other => panic!("expected css declaration, got {:?}", other),
    }
}

#[test]
fn test_single_class_name_round_trip() {
    for input in ["flex", "  underline  ", "text-red-500/50", "-mt-2"] {
        let result = parse(input, ":");
        assert_eq!(result.class_list.len(), 1, "{input}");
        match &result.class_list[0] {
            Node::ClassName { variants, token, .. } => {
                assert!(variants.is_empty());
                assert_eq!(token.text, input.trim());
            }
            other => panic!("expected class name, got {:?}", other),
        }
    }
}

#[test]
fn test_unbalanced_brackets_report_one_error() {
    for input in ["flex bg-[red", "p-4 w-[calc(100%-2px]", "block [color:rgb(0,0,0]"] {
        let result = parse(input, ":");
        let error = result.error.expect("syntax error");
        assert_eq!(error.message, "missing closing bracket", "{input}");
        assert_eq!(result.class_list.len(), 1, "{input}");
    }
}

#[test]
fn test_stray_closing_bracket() {
    let result = parse("flex ] block", ":");
    let error = result.error.expect("syntax error");
    assert_eq!(error.message, "unexpected closing bracket");
    assert_eq!((error.start, error.end), (5, 6));
}

#[test]
fn test_empty_group_inside_variant_group() {
    let result = parse("md:(hover: flex)", ":");
    assert_eq!(result.leaves().len(), 1);
    assert_eq!(result.empty_list.len(), 1);
    assert_eq!(result.empty_list[0].kind, EmptyKind::Group);
    assert_eq!(result.empty_list[0].variants.texts(), vec!["md", "hover"]);
}

#[test]
fn test_parse_is_idempotent() {
    let input = "lg:hover:(flex !p-4) [mask-type:luminance] bg-red-500/[.25] :";
    assert_eq!(parse(input, ":"), parse(input, ":"));
}
