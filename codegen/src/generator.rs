//! Annotated tree to JavaScript.
//!
//! Every node becomes one expression for the runtime markup generator.
//! Inline templates and dirty-checking functions are hoisted into
//! function declarations of the module; everything else is nested where
//! it stands. Layout goes through the formatter: before generating the
//! items of a block the generator enters one level, so nested blocks come
//! out indented in debug mode and flat in release mode.

use crate::expr::{translation, ExpressionGenerator, HELPERS};
use crate::formatter::Formatter;
use crate::internal::InternalFunction;
use crate::template::Template as CodeTemplate;

use common::FunctionNames;
use data_structures::{HashMap, OrderedMap};
use diagnostics::ParseResult as Result;
use hir::visit::{walk_nodes, Visitor};
use hir::*;
use lazy_static::lazy_static;
use log::debug;
use source::diagnostics::Diagnostic;
use syntax::ast::{quote_string, Expr, ExprKind};

/// The variable holding template data in every generated function.
const SCOPE: &str = "data";
const PARAMETERS: &str = "data, attr, context, isVdom, sets";
const PROLOGUE: &[&str] = &[
    "var key = thelpers.validateNodeKey(attr && attr.key);",
    "var defCollection = {\"id\": [], \"def\": undefined};",
    "var viewController = thelpers.calcParent(this, undefined, data);",
    "var markupGenerator = thelpers.createGenerator(isVdom);",
];
/// Names bound by the module itself: dependency parameters, function
/// parameters and the locals of the prologue and loops.
const MODULE_BINDINGS: &[&str] = &[
    "rk",
    HELPERS,
    "data",
    "key",
    "attr",
    "context",
    "isVdom",
    "sets",
    "markupGenerator",
    "defCollection",
    "viewController",
    "scope",
    "out",
    "collection",
    "factory",
    "module",
    "define",
    "global",
    "require",
];

lazy_static! {
    static ref CREATE_TAG: CodeTemplate = CodeTemplate::parse(
        "markupGenerator.createTag(/*#NAME#*/, /*#CONFIG#*/, /*#CHILDREN#*/, attr, defCollection, viewController)"
    );
    static ref CREATE_TEXT: CodeTemplate = CodeTemplate::parse("markupGenerator.createText(/*#TEXT#*/, /*#KEY#*/)");
    static ref CREATE_CONTROL: CodeTemplate = CodeTemplate::parse("markupGenerator.createControlNew(/*#ARGUMENTS#*/)");
    static ref JOIN_ELEMENTS: CodeTemplate =
        CodeTemplate::parse("var out = markupGenerator.joinElements(/*#CHILDREN#*/, key, defCollection);");
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    pub file_name: String,
    /// `wml!Controls/list`; names the main function and the translation
    /// dependency.
    pub module_name: String,
}

impl GeneratorConfig {
    /// `i18n!Controls` for `wml!Controls/list`.
    pub fn translation_module(&self) -> String {
        let path = match self.module_name.rsplit_once('!') {
            Some((_, path)) => path,
            None => self.module_name.as_str(),
        };
        let root = path.split('/').next().unwrap_or(path);
        format!("i18n!{}", root)
    }
}

/// The code of one compilation, ready to be packaged.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    /// Name of the function rendering the whole file.
    pub main: String,
    /// Function declarations, the main function last.
    pub functions: Vec<String>,
    pub dependencies: Vec<(String, Option<String>)>,
}

pub fn generate(
    nodes: &[AstNode],
    containers: &ContainerArena,
    names: &mut FunctionNames,
    formatter: &mut dyn Formatter,
    config: &GeneratorConfig,
) -> Result<GeneratedCode> {
    debug!("generate {}", config.file_name);
    for binding in MODULE_BINDINGS {
        names.reserve(binding);
    }
    let main = names.register(&config.module_name);
    let mut generator = Generator {
        containers,
        names,
        formatter,
        config,
        templates: HashMap::default(),
        functions: vec![],
        internals: vec![],
        dependencies: vec![],
        translations: false,
        at_root: true,
    };
    let mut collector = TemplateCollector::default();
    walk_nodes(&mut collector, nodes)?;
    // The first definition of a name wins, like the first attribute does.
    let mut hoisted = vec![];
    for template in &collector.templates {
        if !generator.templates.contains_key(&template.name) {
            let function = generator.names.register(&template.name);
            generator.templates.insert(template.name.clone(), function.clone());
            hoisted.push((function, template));
        }
    }
    for (function, template) in hoisted {
        let declaration = generator.function_declaration(&function, &template.children)?;
        generator.functions.push(declaration);
    }
    let declaration = generator.function_declaration(&main, nodes)?;
    for (name, tree) in std::mem::take(&mut generator.internals) {
        let function = InternalFunction::new(&name, &tree).generate(&mut *generator.formatter);
        generator.functions.push(function);
    }
    generator.functions.push(declaration);
    if generator.translations {
        let module = config.translation_module();
        generator.dependencies.push((module, Some("rk".to_string())));
    }
    Ok(GeneratedCode {
        main,
        functions: generator.functions,
        dependencies: generator.dependencies,
    })
}

/// Inline templates in document order, wherever they are nested.
#[derive(Default)]
struct TemplateCollector {
    templates: Vec<Template>,
}

impl Visitor for TemplateCollector {
    fn visit_template(&mut self, template: &Template) -> Result<()> {
        self.templates.push(template.clone());
        walk_nodes(self, &template.children)
    }
}

/// Nodes that render nothing between the branches of a conditional.
fn is_blank(node: &AstNode) -> bool {
    match node {
        AstNode::Text(text) => text.parts.iter().all(|part| matches!(part, TextPart::Text(text) if text.trim().is_empty())),
        AstNode::Comment(_) => true,
        _ => false,
    }
}

fn key_code(key: &str) -> String {
    format!("key + {}", quote_string(key))
}

struct Generator<'a> {
    containers: &'a ContainerArena,
    names: &'a mut FunctionNames,
    formatter: &'a mut dyn Formatter,
    config: &'a GeneratorConfig,
    /// Inline template name to its hoisted function.
    templates: HashMap<String, String>,
    functions: Vec<String>,
    /// Dirty-checking functions, generated once the rest is done.
    internals: Vec<(String, InternalNode)>,
    dependencies: Vec<(String, Option<String>)>,
    translations: bool,
    /// Whether the nodes being generated are the top level of a function.
    at_root: bool,
}

impl Generator<'_> {
    fn expr(&self, expr: &Expr) -> String {
        ExpressionGenerator::new(SCOPE).generate(expr)
    }

    fn depend(&mut self, path: &str) {
        self.dependencies.push((path.to_string(), None));
    }

    /// Runs `build` one level deeper.
    fn nested<T>(&mut self, build: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.formatter.enter();
        let result = build(self);
        self.formatter.leave();
        result
    }

    fn object(&mut self, build: impl FnOnce(&mut Self) -> Result<Vec<(String, String)>>) -> Result<String> {
        let entries = self.nested(build)?;
        Ok(self.formatter.format_object(&entries))
    }

    fn array(&mut self, build: impl FnOnce(&mut Self) -> Result<Vec<String>>) -> Result<String> {
        let items = self.nested(build)?;
        Ok(self.formatter.format_array(&items))
    }

    fn line(&self, line: &str) -> String {
        self.formatter.format_line(line)
    }

    /// A function used as a value: the header stays on the line of its
    /// caller, the body goes one level deeper.
    fn function_expression(
        &mut self,
        header: &str,
        body: impl FnOnce(&mut Self) -> Result<String>,
        footer: &str,
    ) -> Result<String> {
        let mut out = self.line(header).trim_start().to_string();
        out.push_str(&self.nested(body)?);
        let footer = self.line(footer);
        out.push_str(footer.strip_suffix('\n').unwrap_or(&footer));
        Ok(out)
    }

    fn function_declaration(&mut self, name: &str, nodes: &[AstNode]) -> Result<String> {
        let mut out = self.line(&format!("function {}({}) {{", name, PARAMETERS));
        out.push_str(&self.nested(|generator| generator.body(nodes))?);
        out.push_str(&self.line("}"));
        Ok(out)
    }

    /// The statements of a rendering function at the current level.
    fn body(&mut self, nodes: &[AstNode]) -> Result<String> {
        let was_root = std::mem::replace(&mut self.at_root, true);
        let children = self.children(nodes);
        self.at_root = was_root;
        let children = children?;
        let mut out = String::new();
        for statement in PROLOGUE {
            out.push_str(&self.line(statement));
        }
        out.push_str(&self.line(&JOIN_ELEMENTS.fill(&[("CHILDREN", children.as_str())])));
        out.push_str(&self.line("return out;"));
        Ok(out)
    }

    fn children(&mut self, nodes: &[AstNode]) -> Result<String> {
        self.array(|generator| generator.items(nodes))
    }

    fn items(&mut self, nodes: &[AstNode]) -> Result<Vec<String>> {
        let mut items = vec![];
        let mut index = 0;
        while index < nodes.len() {
            let node = &nodes[index];
            index += 1;
            match node {
                AstNode::Template(_) => {}
                AstNode::If(branch) => {
                    let mut branches = vec![];
                    while let Some(next) = nodes[index..].iter().position(|node| !is_blank(node)) {
                        match &nodes[index + next] {
                            AstNode::Else(otherwise) => {
                                branches.push(otherwise);
                                index += next + 1;
                                if otherwise.test.is_none() {
                                    break;
                                }
                            }
                            _ => break,
                        }
                    }
                    items.push(self.conditional(branch, &branches)?);
                }
                AstNode::Else(otherwise) => {
                    // Chains are checked while traversing; a stray branch
                    // renders like a chain of its own.
                    items.push(self.branches(otherwise.test.as_ref(), &otherwise.children, &[])?);
                }
                _ => items.push(self.node(node)?),
            }
        }
        Ok(items)
    }

    fn node(&mut self, node: &AstNode) -> Result<String> {
        match node {
            AstNode::Element(element) => self.element(element),
            AstNode::Text(text) => {
                let value = self.text(&text.parts);
                Ok(CREATE_TEXT.fill(&[("TEXT", value.as_str()), ("KEY", key_code(&text.key).as_str())]))
            }
            AstNode::Comment(comment) => Ok(format!(
                "markupGenerator.createComment({}, key)",
                quote_string(&comment.data)
            )),
            AstNode::CData(cdata) => Ok(format!("markupGenerator.createText({}, key)", quote_string(&cdata.data))),
            AstNode::Doctype(doctype) => Ok(format!(
                "markupGenerator.createDirective({})",
                quote_string(&format!("<{}>", doctype.data))
            )),
            AstNode::Instruction(instruction) => Ok(format!(
                "markupGenerator.createDirective({})",
                quote_string(&format!("<?{}?>", instruction.data))
            )),
            AstNode::Component(component) => self.component(component),
            AstNode::Partial(partial) => self.partial(partial),
            AstNode::For(cycle) => self.for_loop(cycle),
            AstNode::Foreach(cycle) => self.foreach(cycle),
            AstNode::If(branch) => self.conditional(branch, &[]),
            AstNode::Else(otherwise) => self.branches(otherwise.test.as_ref(), &otherwise.children, &[]),
            AstNode::Template(_) => Ok("[]".to_string()),
        }
    }

    /// `(test ? [...] : (test ? [...] : [...]))`
    fn conditional(&mut self, branch: &If, rest: &[&Else]) -> Result<String> {
        self.branches(Some(&branch.test), &branch.children, rest)
    }

    fn branches(&mut self, test: Option<&Program>, children: &[AstNode], rest: &[&Else]) -> Result<String> {
        let consequent = self.children(children)?;
        let test = match test {
            Some(test) => self.expr(&test.expr),
            None => return Ok(consequent),
        };
        let alternate = match rest.split_first() {
            Some((next, rest)) => self.branches(next.test.as_ref(), &next.children, rest)?,
            None => "[]".to_string(),
        };
        Ok(format!("({} ? {} : {})", test, consequent, alternate))
    }

    fn text(&mut self, parts: &[TextPart]) -> String {
        if parts.is_empty() {
            return "\"\"".to_string();
        }
        let pieces: Vec<String> = parts
            .iter()
            .map(|part| match part {
                TextPart::Text(text) => quote_string(text),
                TextPart::Expression(program) => format!("{}.wrapUndef({})", HELPERS, self.expr(&program.expr)),
                TextPart::Translation { text, context } => {
                    self.translations = true;
                    translation(text, context.as_deref())
                }
            })
            .collect();
        pieces.join(" + ")
    }

    /// An expression value keeps its type, text values are strings.
    fn value(&mut self, value: &Value, empty: &str) -> String {
        match value {
            Value::Empty => empty.to_string(),
            Value::Text(parts) => self.text(parts),
            Value::Expression(program) => self.expr(&program.expr),
        }
    }

    fn attributes(&mut self, attributes: &OrderedMap<Value>) -> Result<String> {
        self.object(|generator| {
            Ok(attributes
                .iter()
                .map(|(name, value)| (name.to_string(), generator.value(value, "\"\"")))
                .collect())
        })
    }

    fn events(&mut self, events: &OrderedMap<Event>) -> Result<String> {
        self.object(|generator| {
            let mut entries = vec![];
            for (name, event) in events.iter() {
                let handler = generator.event(event)?;
                entries.push((name.to_string(), handler));
            }
            Ok(entries)
        })
    }

    fn event(&mut self, event: &Event) -> Result<String> {
        let expr = &event.program.expr;
        self.object(|generator| {
            let entries = match event.kind {
                EventKind::Handler => {
                    let (function, arguments, name) = match &expr.kind {
                        ExprKind::Call(callee, arguments) => (
                            generator.expr(callee),
                            arguments.iter().map(|argument| generator.expr(argument)).collect::<Vec<_>>(),
                            callee.to_source(),
                        ),
                        _ => (generator.expr(expr), vec![], expr.to_source()),
                    };
                    vec![
                        ("fn".to_string(), function),
                        ("args".to_string(), format!("[{}]", arguments.join(", "))),
                        ("value".to_string(), quote_string(&name)),
                    ]
                }
                EventKind::Bind => {
                    let setter = ExpressionGenerator::new(SCOPE).setter(expr, "value");
                    vec![
                        ("fn".to_string(), format!("function(value) {{ {}; }}", setter)),
                        ("bind".to_string(), quote_string(&event.name)),
                        ("value".to_string(), quote_string(&expr.to_source())),
                    ]
                }
            };
            Ok(entries)
        })
    }

    fn element(&mut self, element: &Element) -> Result<String> {
        let config = self.object(|generator| {
            let attributes = generator.attributes(&element.attributes)?;
            let events = generator.events(&element.events)?;
            Ok(vec![
                ("attributes".to_string(), attributes),
                ("events".to_string(), events),
                ("key".to_string(), key_code(&element.key)),
            ])
        })?;
        let was_root = std::mem::replace(&mut self.at_root, false);
        let children = self.children(&element.children);
        self.at_root = was_root;
        let children = children?;
        Ok(CREATE_TAG.fill(&[
            ("NAME", quote_string(&element.name).as_str()),
            ("CONFIG", config.as_str()),
            ("CHILDREN", children.as_str()),
        ]))
    }

    fn options(&mut self, options: &OrderedMap<OptionValue>) -> Result<String> {
        self.object(|generator| {
            let mut entries = vec![];
            for (name, option) in options.iter() {
                let code = match option {
                    OptionValue::Value(value) => generator.value(value, "true"),
                    OptionValue::Bind(program) => generator.expr(&program.expr),
                    OptionValue::Content(content) => generator.content_option(content)?,
                    OptionValue::Data(data) => generator.data(data)?,
                };
                entries.push((name.to_string(), code));
            }
            Ok(entries)
        })
    }

    fn data(&mut self, data: &DataValue) -> Result<String> {
        let code = match data {
            DataValue::Array(items) => self.array(|generator| items.iter().map(|item| generator.data(item)).collect())?,
            DataValue::Object(fields) => self.object(|generator| {
                let mut entries = vec![];
                for (name, field) in fields.iter() {
                    entries.push((name.to_string(), generator.data(field)?));
                }
                Ok(entries)
            })?,
            DataValue::String(value) => match value.as_static() {
                Some(text) => quote_string(&text),
                None => format!("String({})", self.value(value, "\"\"")),
            },
            DataValue::Number(value) => match value.as_static() {
                Some(text) if text.trim().parse::<f64>().is_ok() => text.trim().to_string(),
                _ => format!("Number({})", self.value(value, "\"\"")),
            },
            DataValue::Boolean(value) => match value {
                Value::Expression(program) => format!("Boolean({})", self.expr(&program.expr)),
                _ => match value.as_static() {
                    Some(text) => (text.trim() == "true").to_string(),
                    None => format!("({} === \"true\")", self.value(value, "\"\"")),
                },
            },
            DataValue::Value(value) => self.value(value, "\"\""),
            DataValue::Function { path, arguments } => {
                let module = path.split_once(':').map_or(path.as_str(), |(module, _)| module);
                self.depend(module);
                let arguments = self.attributes(arguments)?;
                format!("{}.getFunction({}, {})", HELPERS, quote_string(path), arguments)
            }
            DataValue::Markup(content) => self.content_option(content)?,
        };
        Ok(code)
    }

    /// Each call of the content function renders with its own scope object
    /// inheriting from the one captured here.
    fn content_option(&mut self, content: &ContentOption) -> Result<String> {
        let name = self.names.register(&content.name);
        debug!("content option {} as {}", content.name, name);
        self.function_expression(
            "(function(scope) {",
            |generator| {
                let mut out = generator.line(&format!("return function {}({}) {{", name, PARAMETERS));
                out.push_str(&generator.nested(|generator| {
                    let mut out = generator.line("data = thelpers.plainMerge(Object.create(scope), data);");
                    out.push_str(&generator.body(&content.children)?);
                    Ok(out)
                })?);
                out.push_str(&generator.line("};"));
                Ok(out)
            },
            "})(data)",
        )
    }

    fn merge_type(&self, template: Option<&TemplateRef>) -> &'static str {
        match template {
            Some(TemplateRef::Dynamic(program)) if matches!(program.expr.kind, ExprKind::Decorated(..)) => "none",
            _ if self.at_root => "attribute",
            _ => "context",
        }
    }

    fn internal(&mut self, container: ContainerId) -> String {
        let tree = self.containers.internal_structure(container);
        if tree.is_empty() {
            return "{}".to_string();
        }
        let name = self.names.register(&format!("internal_{}", tree.index));
        let call = format!("{}({})", name, SCOPE);
        self.internals.push((name, tree));
        call
    }

    #[allow(clippy::too_many_arguments)]
    fn create_control(
        &mut self,
        kind: &str,
        name: &str,
        reference: String,
        attributes: &OrderedMap<Value>,
        events: &OrderedMap<Event>,
        options: &OrderedMap<OptionValue>,
        template: Option<&TemplateRef>,
        key: &str,
        container: ContainerId,
    ) -> Result<String> {
        let merge_type = self.merge_type(template);
        let mut arguments = vec![quote_string(kind), quote_string(name), reference];
        arguments.push(self.attributes(attributes)?);
        arguments.push(self.events(events)?);
        let was_root = std::mem::replace(&mut self.at_root, false);
        let options = self.options(options);
        self.at_root = was_root;
        arguments.push(options?);
        let internal = self.internal(container);
        arguments.push(self.object(|_| {
            Ok(vec![
                ("mergeType".to_string(), quote_string(merge_type)),
                ("key".to_string(), key_code(key)),
                ("internal".to_string(), internal),
            ])
        })?);
        arguments.extend(["context", "defCollection", "viewController"].iter().map(|name| (*name).to_string()));
        let arguments = self.formatter.format_sequence(&arguments);
        Ok(CREATE_CONTROL.fill(&[("ARGUMENTS", arguments.as_str())]))
    }

    fn component(&mut self, component: &Component) -> Result<String> {
        let (kind, reference) = match &component.kind {
            ComponentKind::WsControl { path } => {
                self.depend(path);
                ("wsControl", quote_string(path))
            }
            ComponentKind::Module { library, module } => {
                self.depend(library);
                (
                    "resolver",
                    format!(
                        "{{\"library\": {}, \"module\": {}}}",
                        quote_string(library),
                        quote_string(module)
                    ),
                )
            }
        };
        self.create_control(
            kind,
            &component.name,
            reference,
            &component.ws_attributes,
            &component.ws_events,
            &component.ws_options,
            None,
            &component.key,
            component.container,
        )
    }

    fn partial(&mut self, partial: &Partial) -> Result<String> {
        let (kind, name, reference) = match &partial.template {
            TemplateRef::Inline(name) => {
                let function = self.templates.get(name).cloned().ok_or_else(|| {
                    Diagnostic::error()
                        .with_message(format!("Inline template \"{}\" is not defined", name))
                        .at(partial.position)
                        .in_file(self.config.file_name.as_str())
                })?;
                ("template", name.clone(), function)
            }
            TemplateRef::Static(name) => {
                self.depend(name);
                ("inline", name.clone(), quote_string(name))
            }
            TemplateRef::Control(path) => {
                self.depend(path);
                ("wsControl", path.clone(), quote_string(path))
            }
            TemplateRef::Dynamic(program) => ("resolver", program.expr.to_source(), self.expr(&program.expr)),
        };
        self.create_control(
            kind,
            &name,
            reference,
            &partial.ws_attributes,
            &partial.ws_events,
            &partial.ws_options,
            Some(&partial.template),
            &partial.key,
            partial.container,
        )
    }

    fn loop_name(&mut self, container: ContainerId) -> (usize, String) {
        let index = self.containers.get(container).index;
        (index, self.names.register(&format!("forTemplate_{}", index)))
    }

    /// `for (init; test; update)`. Loop variables live in a scope object of
    /// their own so they never write through to the caller's data.
    fn for_loop(&mut self, cycle: &For) -> Result<String> {
        let (index, name) = self.loop_name(cycle.container);
        let header = format!(
            "for ({}; {}; {}) {{",
            cycle.init.as_ref().map(|program| self.expr(&program.expr)).unwrap_or_default(),
            cycle.test.as_ref().map(|program| self.expr(&program.expr)).unwrap_or_default(),
            cycle.update.as_ref().map(|program| self.expr(&program.expr)).unwrap_or_default(),
        );
        self.function_expression(
            &format!("(function {}(data, key) {{", name),
            |generator| {
                let mut out = generator.line(&format!("var out_{} = [];", index));
                out.push_str(&generator.line(&format!("var key_{} = key;", index)));
                out.push_str(&generator.line(&format!("var index_{} = 0;", index)));
                out.push_str(&generator.line("data = Object.create(data);"));
                out.push_str(&generator.line(&header));
                out.push_str(&generator.nested(|generator| {
                    let mut out = generator.line(&format!("var key = key_{} + index_{}++ + \"_\";", index, index));
                    let children = generator.children(&cycle.children)?;
                    out.push_str(&generator.line(&format!("out_{}.push({});", index, children)));
                    Ok(out)
                })?);
                out.push_str(&generator.line("}"));
                out.push_str(&generator.line(&format!("return out_{};", index)));
                Ok(out)
            },
            "})(data, key)",
        )
    }

    /// `for (key, value in collection)`
    fn foreach(&mut self, cycle: &Foreach) -> Result<String> {
        let (index, name) = self.loop_name(cycle.container);
        let collection = self.expr(&cycle.collection.expr);
        self.function_expression(
            &format!("(function {}(data, key) {{", name),
            |generator| {
                let mut out = generator.line(&format!("var out_{} = [];", index));
                out.push_str(&generator.line(&format!("var scope_{} = data;", index)));
                out.push_str(&generator.line(&format!("var key_{} = key;", index)));
                out.push_str(&generator.line(&format!(
                    "{}.iterate({}, function(value_{}, index_{}) {{",
                    HELPERS, collection, index, index
                )));
                out.push_str(&generator.nested(|generator| {
                    let mut out = generator.line(&format!("var data = Object.create(scope_{});", index));
                    out.push_str(&generator.line(&format!(
                        "data[{}] = value_{};",
                        quote_string(&cycle.value_name),
                        index
                    )));
                    if let Some(key_name) = &cycle.key_name {
                        out.push_str(&generator.line(&format!("data[{}] = index_{};", quote_string(key_name), index)));
                    }
                    out.push_str(&generator.line(&format!("var key = key_{} + index_{} + \"_\";", index, index)));
                    let children = generator.children(&cycle.children)?;
                    out.push_str(&generator.line(&format!("out_{}.push({});", index, children)));
                    Ok(out)
                })?);
                out.push_str(&generator.line("});"));
                out.push_str(&generator.line(&format!("return out_{};", index)));
                Ok(out)
            },
            "})(data, key)",
        )
    }
}
