use compiler::{compile, compile_batch, CompileOptions, Dialect};
use insta::assert_snapshot;

fn options(file_name: &str) -> CompileOptions {
    CompileOptions::default().for_file(file_name)
}

fn text(source: &str, file_name: &str) -> String {
    match compile(source, &options(file_name)) {
        Ok(result) => result.text,
        Err(err) => panic!("{}", err),
    }
}

#[test]
fn loops_at_different_positions_get_different_names() {
    let code = text(
        concat!(
            r#"<div><ws:for data="i = 0; i < 3; i++">{{ i }}</ws:for></div>"#,
            r#"<ws:for data="j = 0; j < 2; j++"><b>{{ j }}</b></ws:for>"#,
        ),
        "Controls/loops.wml",
    );
    assert_eq!(code.matches("(function forTemplate_1(data, key) {").count(), 1);
    assert_eq!(code.matches("(function forTemplate_2(data, key) {").count(), 1);
    assert!(code.contains("var out_1 = [];"));
    assert!(code.contains("var out_2 = [];"));
}

#[test]
fn dialects_clean_whitespace_differently() {
    let source = "<p>\n  x </p>";
    assert!(text(source, "Controls/a.wml").contains(r#"markupGenerator.createText("x ", key + "0_0_")"#));
    assert!(text(source, "Controls/a.tmpl").contains(r#"markupGenerator.createText(" x ", key + "0_0_")"#));

    let mut forced = options("Controls/a.wml");
    forced.dialect = Some(Dialect::Tmpl);
    let result = compile(source, &forced).unwrap();
    assert_eq!(result.module_name, "tmpl!Controls/a");
}

#[test]
fn umd_modules_resolve_their_dependencies() {
    let mut options = options("Controls/list.wml");
    options.module_type = String::from("umd");
    let result = compile(
        r#"<Controls.Button caption="{[ Save ]}"/><ws:partial template="wml!Controls/row"/>"#,
        &options,
    )
    .unwrap();
    assert_eq!(
        result.dependencies,
        vec![
            "i18n!Controls".to_string(),
            "Controls/Button".to_string(),
            "wml!Controls/row".to_string()
        ]
    );
    assert!(result.text.starts_with("(function(factory) {if (typeof define === \"function\" && define.amd) {"));
    assert!(result.text.contains(r#"define('wml!Controls/list', ["i18n!Controls", "Controls/Button", "wml!Controls/row"], factory);"#));
    assert!(result.text.contains("var dep_0 = function(key) { return key; };"));
    assert!(result.text.contains(r#"var dep_1 = global.requirejs("Controls/Button");"#));
    assert!(result.text.contains(r#"var dep_2 = global.requirejs("wml!Controls/row");"#));
    assert!(result.text.contains("var result = factory(dep_0, dep_1, dep_2);"));
    assert!(result.text.ends_with("return wml_Controls_list;});"));
}

#[test]
fn anomalies_are_collected_and_compilation_goes_on() {
    let result = compile(
        r#"<ws:if data="{{ a }}" class="x"><Controls.Input bind:value="a + b"/></ws:if>"#,
        &options("Controls/a.wml"),
    )
    .unwrap();
    let warnings: Vec<String> = result.diagnostics.warnings().map(|message| message.text.clone()).collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("\"class\""));
    assert!(result.diagnostics.to_json().unwrap().contains("\"level\":\"warn\""));
    assert!(result.text.contains("createControlNew"));
}

#[test]
fn fatal_errors_carry_their_position() {
    let error = compile("<div>\n  <span></div>", &options("Controls/a.wml")).unwrap_err();
    assert_eq!(error.file_name.as_deref(), Some("Controls/a.wml"));
    assert_eq!(error.position.map(|position| position.line), Some(2));

    let error = compile("<div></div>", &options("Controls/a.html")).unwrap_err();
    assert_snapshot!(error.message, @"Cannot tell the template dialect of 'Controls/a.html': expected a .wml or .tmpl file");
}

#[test]
fn batch_output_equals_sequential_output() {
    let sources = [
        r#"<div class="{{ cls }}">{{ title }}</div>"#,
        r#"<ws:template name="row"><li>{{ item }}</li></ws:template><ul><ws:for data="item in items"><ws:partial template="row" item="{{ item }}"/></ws:for></ul>"#,
        r#"<Controls.Button caption="{[ Save ]}" on:click="save()"/>"#,
        r#"<ws:if data="{{ a }}">x</ws:if><ws:else>y</ws:else>"#,
        "<div>",
        r#"<Controls.List><ws:itemTemplate><span>{{ itemTemplate.item.title }}</span></ws:itemTemplate></Controls.List>"#,
    ];
    let units: Vec<(String, String)> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| (format!("Controls/unit{}.wml", index), source.to_string()))
        .collect();
    let mut options = CompileOptions::default();
    options.pretty = true;
    let batch = compile_batch(&units, &options);
    assert_eq!(batch.len(), units.len());
    for ((file_name, source), result) in units.iter().zip(&batch) {
        let sequential = compile(source, &options.for_file(file_name));
        match (result, sequential) {
            (Ok(batch), Ok(sequential)) => {
                assert_eq!(batch.text, sequential.text);
                assert_eq!(batch.dependencies, sequential.dependencies);
            }
            (Err(batch), Err(sequential)) => assert_eq!(batch.message, sequential.message),
            (batch, sequential) => panic!("{} differs: {:?} vs {:?}", file_name, batch.is_ok(), sequential.is_ok()),
        }
    }
    assert!(batch[4].is_err());
}
