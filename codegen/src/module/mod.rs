//! Packaging of generated code into loadable modules.

pub mod amd;
pub mod dependencies;
pub mod umd;

pub use amd::AmdModule;
pub use dependencies::Dependencies;
pub use umd::UmdModule;

use crate::formatter::Formatter;

use diagnostics::{Diagnostic, ParseResult as Result};
use syntax::ast::quote_string;

/// Everything a module is made of, whatever the format.
#[derive(Debug, Default, Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub strict_mode: bool,
    pub dependencies: Dependencies,
    pub code_blocks: Vec<String>,
    pub export: Option<String>,
}

impl ModuleDescriptor {
    /// The head of the `define` call: name and dependency list, each
    /// followed by a comma, or nothing when absent.
    fn define_arguments(&self) -> String {
        let mut arguments = String::new();
        if !self.name.is_empty() {
            arguments.push_str(&format!("'{}', ", self.name.replace('\\', "\\\\").replace('\'', "\\'")));
        }
        let paths = self.dependencies.paths();
        if !paths.is_empty() {
            let quoted: Vec<String> = paths.iter().map(|path| quote_string(path)).collect();
            arguments.push_str(&format!("[{}], ", quoted.join(", ")));
        }
        arguments
    }

    fn parameters(&self) -> String {
        self.dependencies.names().join(", ")
    }

    /// The body of the module function, one level deeper than the caller.
    fn write_body(&self, out: &mut String, formatter: &mut dyn Formatter) {
        formatter.enter();
        if self.strict_mode {
            out.push_str(&formatter.format_line("\"use strict\";"));
        }
        for block in &self.code_blocks {
            out.push_str(&formatter.format_block(block));
        }
        if let Some(export) = &self.export {
            out.push_str(&formatter.format_line(&format!("return {};", export)));
        }
        formatter.leave();
    }
}

pub trait ModuleGenerator {
    fn descriptor(&self) -> &ModuleDescriptor;
    fn descriptor_mut(&mut self) -> &mut ModuleDescriptor;
    fn compile(&self, formatter: &mut dyn Formatter) -> String;

    fn set_module_name(&mut self, name: &str) {
        self.descriptor_mut().name = name.to_string();
    }

    fn set_strict_mode(&mut self, strict: bool) {
        self.descriptor_mut().strict_mode = strict;
    }

    fn add_dependency(&mut self, path: &str, name: Option<&str>) -> Result<()> {
        self.descriptor_mut().dependencies.add(path, name)
    }

    fn add_code_block(&mut self, block: &str) {
        self.descriptor_mut().code_blocks.push(block.to_string());
    }

    fn set_returnable_export(&mut self, block: &str) -> Result<()> {
        let descriptor = self.descriptor_mut();
        if let Some(existing) = &descriptor.export {
            return Err(Diagnostic::error().with_message(format!(
                "Returnable export of module '{}' is already set to '{}'",
                descriptor.name, existing
            )));
        }
        descriptor.export = Some(block.to_string());
        Ok(())
    }
}

pub fn create_module_processor(module_type: &str) -> Result<Box<dyn ModuleGenerator>> {
    match module_type {
        "amd" => Ok(Box::new(AmdModule::default())),
        "umd" => Ok(Box::new(UmdModule::default())),
        other => Err(Diagnostic::error().with_message(format!(
            "Unknown module type \"{}\": expected \"amd\" or \"umd\"",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DebugFormatter, ReleaseFormatter};

    #[test]
    fn unknown_types_are_rejected() {
        assert!(create_module_processor("amd").is_ok());
        assert!(create_module_processor("umd").is_ok());
        let error = create_module_processor("cjs").err().unwrap();
        assert_eq!(error.message, "Unknown module type \"cjs\": expected \"amd\" or \"umd\"");
    }

    #[test]
    fn export_is_set_once() {
        let mut module = create_module_processor("amd").unwrap();
        module.set_module_name("My/Module");
        module.set_returnable_export("x").unwrap();
        let error = module.set_returnable_export("y").unwrap_err();
        assert_eq!(error.message, "Returnable export of module 'My/Module' is already set to 'x'");
        assert!(module.compile(&mut ReleaseFormatter).contains("return x;"));
    }

    #[test]
    fn multi_line_blocks_are_indented() {
        let mut module = create_module_processor("amd").unwrap();
        module.add_code_block("function f() {\n  return 1;\n}");
        assert_eq!(
            module.compile(&mut DebugFormatter::default()),
            "define(function() {\n  function f() {\n    return 1;\n  }\n});\n"
        );
    }

    #[test]
    fn release_keeps_statement_ends_of_blocks() {
        let mut module = create_module_processor("amd").unwrap();
        module.add_code_block("var a = 1\n// note\nvar b = 2");
        module.set_returnable_export("b").unwrap();
        assert_eq!(
            module.compile(&mut ReleaseFormatter),
            "define(function() {var a = 1\n// note\nvar b = 2\nreturn b;});"
        );
    }
}
