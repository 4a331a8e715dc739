use super::{ModuleDescriptor, ModuleGenerator};
use crate::formatter::Formatter;

use syntax::ast::quote_string;

/// An AMD module that also loads under CommonJS, resolving its
/// dependencies through the global loader.
#[derive(Debug, Default)]
pub struct UmdModule {
    descriptor: ModuleDescriptor,
}

/// How a dependency is obtained outside of an AMD loader, decided by the
/// outermost plugin of its path.
fn resolve_dependency(path: &str) -> String {
    let plugin = match path.split_once('!') {
        Some((plugin, _)) => plugin,
        None => "",
    };
    match plugin {
        "" | "js" | "wml" | "tmpl" => format!("global.requirejs({})", quote_string(path)),
        "i18n" => "function(key) { return key; }".to_string(),
        "css" => "\"\"".to_string(),
        _ => "undefined".to_string(),
    }
}

impl ModuleGenerator for UmdModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn descriptor_mut(&mut self) -> &mut ModuleDescriptor {
        &mut self.descriptor
    }

    fn compile(&self, formatter: &mut dyn Formatter) -> String {
        let descriptor = &self.descriptor;
        let paths = descriptor.dependencies.paths();
        let locals: Vec<String> = (0..paths.len()).map(|index| format!("dep_{}", index)).collect();

        let mut out = formatter.format_line("(function(factory) {");
        formatter.enter();
        out.push_str(&formatter.format_line("if (typeof define === \"function\" && define.amd) {"));
        formatter.enter();
        out.push_str(&formatter.format_line(&format!("define({}factory);", descriptor.define_arguments())));
        formatter.leave();
        out.push_str(&formatter.format_line(
            "} else if (typeof module === \"object\" && typeof module.exports === \"object\") {",
        ));
        formatter.enter();
        if !paths.is_empty() {
            out.push_str(&formatter.format_line("try {"));
            formatter.enter();
            for (local, path) in locals.iter().zip(&paths) {
                out.push_str(&formatter.format_line(&format!("var {} = {};", local, resolve_dependency(path))));
            }
            formatter.leave();
            out.push_str(&formatter.format_line("} catch (error) {"));
            formatter.enter();
            let prefix = quote_string(&format!("Could not load dependencies of module '{}': ", descriptor.name));
            out.push_str(&formatter.format_line(&format!("throw new Error({} + error.message);", prefix)));
            formatter.leave();
            out.push_str(&formatter.format_line("}"));
        }
        out.push_str(&formatter.format_line(&format!("var result = factory({});", locals.join(", "))));
        out.push_str(&formatter.format_line("if (result !== undefined) {"));
        formatter.enter();
        out.push_str(&formatter.format_line("module.exports = result;"));
        formatter.leave();
        out.push_str(&formatter.format_line("}"));
        formatter.leave();
        out.push_str(&formatter.format_line("}"));
        formatter.leave();
        out.push_str(&formatter.format_line(&format!("}})(function({}) {{", descriptor.parameters())));
        descriptor.write_body(&mut out, formatter);
        out.push_str(&formatter.format_line("});"));
        out
    }
}
