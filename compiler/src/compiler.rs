#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

//! One template file in, one JavaScript module out.
//!
//! Every compilation owns its container arena, function names, dependency
//! list and formatter, so units share nothing and a batch can run them on
//! any number of threads.

use codegen::{create_module_processor, generate, DebugFormatter, Formatter, GeneratorConfig, ReleaseFormatter};
use common::FunctionNames;
use diagnostics::ParseResult as Result;
use diagnostics::{DiagnosticSet, ErrorHandler, Level};
use hir::ContainerArena;
use log::debug;
use lowering::{traverse, Context, TraverseConfig};
use parser::ParserOptions;
use rayon::prelude::*;
use serde::Deserialize;
use source::diagnostics::Diagnostic;

/// The two template languages. They share a grammar and differ in how
/// whitespace is cleaned and in the loader plugin of the module.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Wml,
    Tmpl,
}

impl Dialect {
    pub fn from_file_name(file_name: &str) -> Option<Dialect> {
        match file_name.rsplit_once('.').map(|(_, extension)| extension) {
            Some("wml") => Some(Dialect::Wml),
            Some("tmpl") => Some(Dialect::Tmpl),
            _ => None,
        }
    }

    pub fn plugin(self) -> &'static str {
        match self {
            Dialect::Wml => "wml",
            Dialect::Tmpl => "tmpl",
        }
    }

    pub fn parser_options(self) -> ParserOptions {
        ParserOptions {
            rude_white_space_cleaning: self == Dialect::Wml,
            ..ParserOptions::default()
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CompileOptions {
    pub file_name: String,
    /// `amd` or `umd`.
    pub module_type: String,
    /// Indented output instead of one line per module.
    pub pretty: bool,
    pub indent_width: usize,
    pub indent_char: char,
    pub strict_mode: bool,
    /// Overrides the dialect implied by the file extension.
    pub dialect: Option<Dialect>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            file_name: String::from("template.wml"),
            module_type: String::from("amd"),
            pretty: false,
            indent_width: 2,
            indent_char: ' ',
            strict_mode: true,
            dialect: None,
        }
    }
}

impl CompileOptions {
    pub fn from_json(text: &str) -> Result<CompileOptions> {
        serde_json::from_str(text)
            .map_err(|error| Diagnostic::error().with_message(format!("Invalid compiler options: {}", error)))
    }

    pub fn for_file(&self, file_name: &str) -> CompileOptions {
        CompileOptions {
            file_name: file_name.to_string(),
            ..self.clone()
        }
    }

    pub fn dialect(&self) -> Result<Dialect> {
        self.dialect
            .or_else(|| Dialect::from_file_name(&self.file_name))
            .ok_or_else(|| {
                Diagnostic::error()
                    .with_message(format!(
                        "Cannot tell the template dialect of '{}': expected a .wml or .tmpl file",
                        self.file_name
                    ))
                    .in_file(self.file_name.as_str())
            })
    }

    fn formatter(&self) -> Box<dyn Formatter> {
        if self.pretty {
            Box::new(DebugFormatter::new(self.indent_width, self.indent_char))
        } else {
            Box::new(ReleaseFormatter)
        }
    }
}

/// `wml!Controls/list` for `Controls/list.wml`.
pub fn module_name(file_name: &str, dialect: Dialect) -> String {
    let path = file_name.replace('\\', "/");
    let path = path.trim_start_matches("./");
    let stem = match path.rsplit_once('.') {
        Some((stem, extension)) if !extension.contains('/') => stem,
        _ => path,
    };
    format!("{}!{}", dialect.plugin(), stem)
}

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub text: String,
    pub module_name: String,
    /// Paths the module loads, named ones first.
    pub dependencies: Vec<String>,
    /// Recoverable anomalies reported on the way.
    pub diagnostics: DiagnosticSet,
}

pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileResult> {
    let dialect = options.dialect()?;
    let module_name = module_name(&options.file_name, dialect);
    debug!("compile {} as {}", options.file_name, module_name);

    let mut diagnostics = DiagnosticSet::new();
    let nodes = parser::parse(source, &options.file_name, &dialect.parser_options(), &mut diagnostics)?;

    let mut containers = ContainerArena::new();
    let config = TraverseConfig {
        file_name: options.file_name.clone(),
    };
    let ast = traverse(
        &nodes,
        &config,
        &mut Context {
            containers: &mut containers,
            handler: &mut diagnostics,
        },
    )?;
    if diagnostics.has_errors() {
        return Err(first_error(&diagnostics));
    }

    let mut names = FunctionNames::new();
    let mut formatter = options.formatter();
    let code = generate(
        &ast,
        &containers,
        &mut names,
        formatter.as_mut(),
        &GeneratorConfig {
            file_name: options.file_name.clone(),
            module_name: module_name.clone(),
        },
    )?;

    let mut module = create_module_processor(&options.module_type)?;
    module.set_module_name(&module_name);
    module.set_strict_mode(options.strict_mode);
    for (path, name) in &code.dependencies {
        module.add_dependency(path, name.as_deref())?;
    }
    for function in &code.functions {
        module.add_code_block(function);
    }
    module.set_returnable_export(&code.main)?;
    let text = module.compile(formatter.as_mut());

    Ok(CompileResult {
        text,
        module_name,
        dependencies: module.descriptor().dependencies.paths(),
        diagnostics,
    })
}

fn first_error(diagnostics: &DiagnosticSet) -> Diagnostic {
    diagnostics
        .messages
        .iter()
        .position(|message| message.level >= Level::Error)
        .and_then(|index| diagnostics.to_diagnostics().into_iter().nth(index))
        .unwrap_or_else(|| Diagnostic::error().with_message("Compilation failed"))
}

/// Compiles `(file name, source)` pairs in parallel. Results come back in
/// the order of the input.
pub fn compile_batch(units: &[(String, String)], options: &CompileOptions) -> Vec<Result<CompileResult>> {
    debug!("compile batch of {}", units.len());
    units
        .par_iter()
        .map(|(file_name, source)| compile(source, &options.for_file(file_name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn options(file_name: &str) -> CompileOptions {
        CompileOptions::default().for_file(file_name)
    }

    #[test]
    fn module_names() {
        assert_eq!(module_name("Controls/list.wml", Dialect::Wml), "wml!Controls/list");
        assert_eq!(module_name("./Controls\\old.tmpl", Dialect::Tmpl), "tmpl!Controls/old");
        assert_eq!(module_name("v1.2/list", Dialect::Wml), "wml!v1.2/list");
    }

    #[test]
    fn dialect_from_extension_or_override() {
        assert_eq!(options("a.wml").dialect().unwrap(), Dialect::Wml);
        assert_eq!(options("a.tmpl").dialect().unwrap(), Dialect::Tmpl);
        assert!(options("a.html").dialect().is_err());
        let mut forced = options("a.html");
        forced.dialect = Some(Dialect::Tmpl);
        assert_eq!(forced.dialect().unwrap(), Dialect::Tmpl);
    }

    #[test]
    fn options_from_json() {
        let options = CompileOptions::from_json(
            r#"{"file_name": "Controls/a.tmpl", "module_type": "umd", "pretty": true, "indent_char": "\t"}"#,
        )
        .unwrap();
        assert_eq!(options.module_type, "umd");
        assert!(options.pretty);
        assert_eq!(options.indent_char, '\t');
        assert_eq!(options.indent_width, 2);
        assert!(options.strict_mode);

        let error = CompileOptions::from_json(r#"{"pretty": "yes"}"#).unwrap_err();
        assert!(error.message.starts_with("Invalid compiler options"));
    }

    #[test]
    fn amd_module() {
        let result = compile("<div>{{ title }}</div>", &options("Controls/a.wml")).unwrap();
        assert_eq!(result.module_name, "wml!Controls/a");
        assert!(result.dependencies.is_empty());
        assert!(result.diagnostics.is_empty());
        assert!(result
            .text
            .starts_with("define('wml!Controls/a', function() {\"use strict\";function wml_Controls_a(data, attr, context, isVdom, sets) {"));
        assert!(result.text.contains("thelpers.wrapUndef(thelpers.getter(data, [\"title\"]))"));
        assert!(result.text.ends_with("return wml_Controls_a;});"));
        assert!(!result.text.contains('\n'));
    }

    #[test]
    fn translations_become_dependencies() {
        let mut options = options("Controls/a.wml");
        options.module_type = String::from("umd");
        let result = compile("<span>{[ Save ]}</span>", &options).unwrap();
        assert_eq!(result.dependencies, vec!["i18n!Controls".to_string()]);
        assert!(result.text.contains("var dep_0 = function(key) { return key; };"));
        assert!(result.text.contains("})(function(rk) {"));
    }

    #[test]
    fn pretty_output_flattens_to_release() {
        let source = "<ul><ws:for data=\"item in items\"><li class=\"{{ item.cls }}\">{{ item.name }}</li></ws:for></ul>";
        let release = compile(source, &options("Controls/a.wml")).unwrap().text;
        let mut pretty = options("Controls/a.wml");
        pretty.pretty = true;
        let debug = compile(source, &pretty).unwrap().text;
        assert!(debug.lines().count() > 10);
        let flattened: String = debug.lines().map(str::trim_start).collect();
        assert_eq!(flattened, release);
    }

    #[test]
    fn fatal_errors_stop_compilation() {
        let error = compile("<div>", &options("Controls/a.wml")).unwrap_err();
        assert_eq!(error.file_name.as_deref(), Some("Controls/a.wml"));

        let mut unknown = options("Controls/a.wml");
        unknown.module_type = String::from("cjs");
        let error = compile("<div></div>", &unknown).unwrap_err();
        assert_snapshot!(error.message, @r###"Unknown module type "cjs": expected "amd" or "umd""###);
    }

    #[test]
    fn batch_matches_sequential() {
        let units: Vec<(String, String)> = (0..8)
            .map(|index| {
                (
                    format!("Controls/unit{}.wml", index),
                    format!("<div class=\"c{}\"><Controls.Button caption=\"{{{{ v{} }}}}\"/></div>", index, index),
                )
            })
            .collect();
        let options = CompileOptions::default();
        let batch = compile_batch(&units, &options);
        for ((file_name, source), result) in units.iter().zip(batch) {
            let sequential = compile(source, &options.for_file(file_name)).unwrap();
            assert_eq!(result.unwrap().text, sequential.text);
        }
    }
}
