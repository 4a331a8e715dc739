use diagnostics::{DiagnosticSet, ParseResult};
use hir::{AstNode, ContainerArena, ContainerType, InternalNodeKind};
use lowering::{traverse, Context, TraverseConfig};
use parser::{parse, ParserOptions};

fn lower(text: &str) -> ParseResult<(Vec<AstNode>, ContainerArena)> {
    let mut messages = DiagnosticSet::new();
    let mut containers = ContainerArena::new();
    let markup = parse(text, "Controls/a.wml", &ParserOptions::default(), &mut messages)?;
    let config = TraverseConfig {
        file_name: "Controls/a.wml".to_string(),
    };
    let nodes = traverse(
        &markup,
        &config,
        &mut Context {
            containers: &mut containers,
            handler: &mut messages,
        },
    )?;
    Ok((nodes, containers))
}

#[test]
fn unresolvable_tests_demote_their_branch() {
    let (_, containers) = lower(concat!(
        r#"<ws:if data="{{ a }}"><div class="{{ b }}"/></ws:if>"#,
        r#"<ws:else data="{{ check(c) }}"><div class="{{ d }}"/></ws:else>"#,
        r#"<ws:else><div class="{{ e }}"/></ws:else>"#,
    ))
    .unwrap();
    let tree = containers.internal_structure(containers.global());
    assert_eq!(
        tree.to_string(),
        "BLOCK #0 []\n  IF #1 (a) [b]\n  BLOCK #2 [d]\n  ELSE #3 [e]\n"
    );
    let kinds: Vec<InternalNodeKind> = tree.children.iter().map(|node| node.kind).collect();
    assert_eq!(kinds, vec![InternalNodeKind::If, InternalNodeKind::Block, InternalNodeKind::Else]);
    assert!(tree.children[1].test.is_none());
}

#[test]
fn resolvable_chains_survive() {
    let (_, containers) = lower(concat!(
        r#"<ws:if data="{{ a }}">{{ b }}</ws:if>"#,
        r#"<ws:else data="{{ c > 1 }}">{{ d }}</ws:else>"#,
        r#"<ws:else>{{ e }}</ws:else>"#,
    ))
    .unwrap();
    let tree = containers.internal_structure(containers.global());
    assert_eq!(
        tree.to_string(),
        "BLOCK #0 []\n  IF #1 (a) [b]\n  ELSE_IF #2 (c > 1) [d]\n  ELSE #3 [e]\n"
    );
}

#[test]
fn content_options_stay_out_of_their_component() {
    let (nodes, containers) =
        lower(r#"<Controls.Button caption="{{ title }}"><div class="{{ inner }}">{{ text }}</div></Controls.Button>"#)
            .unwrap();
    let component = match &nodes[0] {
        AstNode::Component(component) => component,
        other => panic!("expected a component, got {:?}", other),
    };
    assert_eq!(containers.get(component.container).container_type, ContainerType::Component);
    let tree = containers.internal_structure(component.container);
    assert_eq!(tree.to_string(), "BLOCK #1 [title]\n");
}

#[test]
fn names_from_outside_the_component_are_not_stored() {
    let (nodes, containers) = lower(
        r#"<ws:for data="item in items"><Controls.Button caption="{{ item.title }}" size="{{ size }}"/></ws:for>"#,
    )
    .unwrap();
    let component = match &nodes[0] {
        AstNode::Foreach(foreach) => match &foreach.children[0] {
            AstNode::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        },
        other => panic!("expected a loop, got {:?}", other),
    };
    let tree = containers.internal_structure(component.container);
    assert_eq!(tree.to_string(), "BLOCK #2 [size]\n");
}

#[quickcheck]
fn container_indices_increase(parents: Vec<u8>) -> bool {
    let mut arena = ContainerArena::new();
    let mut created = vec![arena.global()];
    for parent in parents {
        let parent = created[usize::from(parent) % created.len()];
        created.push(arena.create_container(parent, ContainerType::Conditional));
    }
    let indices: Vec<usize> = created.iter().map(|&id| arena.get(id).index).collect();
    indices.windows(2).all(|pair| pair[0] < pair[1])
}
