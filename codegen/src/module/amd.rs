use super::{ModuleDescriptor, ModuleGenerator};
use crate::formatter::Formatter;

/// `define('Name', ["deps"], function(params) { ... });`
#[derive(Debug, Default)]
pub struct AmdModule {
    descriptor: ModuleDescriptor,
}

impl ModuleGenerator for AmdModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn descriptor_mut(&mut self) -> &mut ModuleDescriptor {
        &mut self.descriptor
    }

    fn compile(&self, formatter: &mut dyn Formatter) -> String {
        let descriptor = &self.descriptor;
        let mut out = formatter.format_line(&format!(
            "define({}function({}) {{",
            descriptor.define_arguments(),
            descriptor.parameters()
        ));
        descriptor.write_body(&mut out, formatter);
        out.push_str(&formatter.format_line("});"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DebugFormatter, ReleaseFormatter};
    use insta::assert_snapshot;

    fn module(strict: bool) -> AmdModule {
        let mut module = AmdModule::default();
        module.set_module_name("My/Module");
        module.set_strict_mode(strict);
        module.add_dependency("Dep/X", None).unwrap();
        module.add_code_block("var x = 1;");
        module.set_returnable_export("x").unwrap();
        module
    }

    #[test]
    fn strict_module() {
        assert_snapshot!(module(true).compile(&mut ReleaseFormatter), @r###"define('My/Module', ["Dep/X"], function() {"use strict";var x = 1;return x;});"###);
        assert_eq!(
            module(true).compile(&mut DebugFormatter::default()),
            "define('My/Module', [\"Dep/X\"], function() {\n  \"use strict\";\n  var x = 1;\n  return x;\n});\n"
        );
    }

    #[test]
    fn sloppy_module() {
        assert_snapshot!(module(false).compile(&mut ReleaseFormatter), @r###"define('My/Module', ["Dep/X"], function() {var x = 1;return x;});"###);
    }

    #[test]
    fn named_dependencies_become_parameters() {
        let mut module = AmdModule::default();
        module.add_dependency("Dep/X", None).unwrap();
        module.add_dependency("i18n!Controls", Some("rk")).unwrap();
        module.add_code_block("var y = rk(\"Save\");");
        assert_snapshot!(module.compile(&mut ReleaseFormatter), @r###"define(["i18n!Controls", "Dep/X"], function(rk) {var y = rk("Save");});"###);
    }

    #[test]
    fn no_export_no_return() {
        let mut module = AmdModule::default();
        module.add_code_block("var x = 1;");
        assert!(!module.compile(&mut ReleaseFormatter).contains("return"));
    }
}
