use codegen::{create_module_processor, DebugFormatter, ModuleGenerator, ReleaseFormatter};
use insta::assert_snapshot;

fn module(module_type: &str, strict: bool) -> Box<dyn ModuleGenerator> {
    let mut module = create_module_processor(module_type).unwrap();
    module.set_module_name("My/Module");
    module.set_strict_mode(strict);
    module.add_dependency("Dep/X", None).unwrap();
    module.add_code_block("var x = 1;");
    module.set_returnable_export("x").unwrap();
    module
}

#[test]
fn amd_module_in_both_modes() {
    let strict = module("amd", true);
    assert_snapshot!(
        strict.compile(&mut ReleaseFormatter),
        @r###"define('My/Module', ["Dep/X"], function() {"use strict";var x = 1;return x;});"###
    );
    assert_eq!(
        strict.compile(&mut DebugFormatter::default()),
        "define('My/Module', [\"Dep/X\"], function() {\n  \"use strict\";\n  var x = 1;\n  return x;\n});\n"
    );
    let sloppy = module("amd", false);
    assert_snapshot!(
        sloppy.compile(&mut ReleaseFormatter),
        @r###"define('My/Module', ["Dep/X"], function() {var x = 1;return x;});"###
    );
}

#[test]
fn ambiguous_dependency_names() {
    let mut module = create_module_processor("umd").unwrap();
    module.add_dependency("Lib/A", Some("A")).unwrap();
    module.add_dependency("Lib/A", Some("A")).unwrap();
    let error = module.add_dependency("Lib/B", Some("A")).unwrap_err();
    assert!(error.message.contains("Ambiguous dependencies"));
    assert!(error.message.contains("'A'"));
    assert!(error.message.contains("Lib/A"));
    assert!(error.message.contains("Lib/B"));
    assert_eq!(module.descriptor().dependencies.paths(), vec!["Lib/A".to_string()]);
}

#[test]
fn nameless_dependencies_collapse() {
    let mut module = create_module_processor("amd").unwrap();
    module.add_dependency("Dep/X", None).unwrap();
    module.add_dependency("Dep/Y", None).unwrap();
    module.add_dependency("Dep/X", None).unwrap();
    module.add_dependency("i18n!Dep", Some("rk")).unwrap();
    assert_eq!(
        module.descriptor().dependencies.paths(),
        vec!["i18n!Dep".to_string(), "Dep/X".to_string(), "Dep/Y".to_string()]
    );
    assert_snapshot!(
        module.compile(&mut ReleaseFormatter),
        @r###"define(["i18n!Dep", "Dep/X", "Dep/Y"], function(rk) {});"###
    );
}

#[test]
fn export_is_set_once() {
    let mut module = module("umd", true);
    let error = module.set_returnable_export("y").unwrap_err();
    assert!(error.message.contains("already set"));
    let text = module.compile(&mut ReleaseFormatter);
    assert!(text.contains("return x;"));
    assert!(!text.contains("return y;"));
}

#[test]
fn no_export_no_return() {
    let mut module = create_module_processor("amd").unwrap();
    module.add_code_block("var x = 1;");
    let text = module.compile(&mut ReleaseFormatter);
    assert!(!text.contains("return"));
}

#[test]
fn unknown_module_types() {
    assert!(create_module_processor("amd").is_ok());
    assert!(create_module_processor("umd").is_ok());
    let error = create_module_processor("esm").err().unwrap();
    assert!(error.message.contains("esm"));
}
