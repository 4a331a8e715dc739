//! Turns the markup tree into the annotated tree. Tags are classified,
//! attributes routed, containers opened and every expression registered as
//! a program of the container it occurs in.

use crate::attributes::{classify, AttributeRole};
use crate::names::{
    control_path, is_control_string, is_slashed_control, is_template_string, split_module_name,
};

use data_structures::{HashMap, HashSet, OrderedMap};
use diagnostics::{ErrorHandler, Meta, ParseResult as Result};
use hir::*;
use log::debug;
use parser::{
    has_mustache, parse_expression, parse_for_header, parse_text, single_expression, validate,
    ForHeader, Site, TextChunk,
};
use source::diagnostics::Diagnostic;
use source::Position;
use syntax::ast::{Expr, ExprKind, Literal, PathPart};
use syntax::markup::{Attribute, Node, Tag, Text};

const DATA_TYPES: &[&str] = &[
    "ws:Array",
    "ws:Object",
    "ws:String",
    "ws:Number",
    "ws:Boolean",
    "ws:Value",
    "ws:Function",
];

const DIRECTIVES: &[&str] = &["ws:if", "ws:else", "ws:for", "ws:template", "ws:partial"];

#[derive(Debug, Clone, Default)]
pub struct TraverseConfig {
    pub file_name: String,
}

/// Per-compilation state the traversal writes to.
pub struct Context<'a> {
    pub containers: &'a mut ContainerArena,
    pub handler: &'a mut dyn ErrorHandler,
}

pub fn traverse(nodes: &[Node], config: &TraverseConfig, ctx: &mut Context<'_>) -> Result<Vec<AstNode>> {
    debug!("traverse {}", config.file_name);
    let mut declared = HashSet::default();
    collect_template_names(nodes, &mut declared);
    let global = ctx.containers.global();
    let mut traverser = Traverser {
        config,
        ctx,
        declared,
        templates: HashMap::default(),
        partials: vec![],
    };
    let nodes = traverser.nodes(nodes, global, "")?;
    traverser.join_partials();
    Ok(nodes)
}

fn collect_template_names(nodes: &[Node], names: &mut HashSet<String>) {
    for node in nodes {
        if let Node::Tag(tag) = node {
            if tag.name == "ws:template" {
                if let Some(name) = tag.attribute_value("name") {
                    names.insert(name.trim().to_string());
                }
            }
            collect_template_names(&tag.children, names);
        }
    }
}

fn is_data_type(name: &str) -> bool {
    DATA_TYPES.contains(&name)
}

/// `ws:caption` and the like: a named option of the enclosing component.
fn is_option_tag(name: &str) -> bool {
    match name.strip_prefix("ws:") {
        Some(option) => {
            !DIRECTIVES.contains(&name) && option.chars().next().map_or(false, char::is_lowercase)
        }
        None => false,
    }
}

/// Children that carry meaning: whitespace-only text and comments are not.
fn significant(children: &[Node]) -> Vec<&Node> {
    children
        .iter()
        .filter(|node| !node.is_whitespace_text() && !matches!(node, Node::Comment(_)))
        .collect()
}

/// Directive values may be written bare or as one mustache.
fn unwrap_mustache(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.strip_prefix("{{").and_then(|inner| inner.strip_suffix("}}")) {
        Some(inner) if !inner.contains("{{") && !inner.contains("}}") => inner,
        _ => value,
    }
}

/// Names declared by the init part of a `for (init; test; update)`.
fn assigned_names(expr: &Expr) -> Vec<String> {
    match &expr.kind {
        ExprKind::Assign(_, target, _) => match target.member_path().as_deref() {
            Some([PathPart::Name(name)]) => vec![(*name).to_string()],
            _ => vec![],
        },
        ExprKind::Sequence(exprs) => exprs.iter().flat_map(assigned_names).collect(),
        _ => vec![],
    }
}

fn is_blank(node: &AstNode) -> bool {
    match node {
        AstNode::Text(text) => text.parts.iter().all(|part| match part {
            TextPart::Text(text) => text.trim().is_empty(),
            _ => false,
        }),
        AstNode::Comment(_) => true,
        _ => false,
    }
}

/// Whether the last meaningful node opens a conditional chain.
fn chain_is_open(nodes: &[AstNode]) -> bool {
    matches!(
        nodes.iter().rev().find(|node| !is_blank(node)),
        Some(AstNode::If(_)) | Some(AstNode::Else(Else { test: Some(_), .. }))
    )
}

#[derive(Default)]
struct Routed {
    attributes: OrderedMap<Value>,
    events: OrderedMap<Event>,
    options: OrderedMap<OptionValue>,
}

struct Traverser<'a, 'b> {
    config: &'a TraverseConfig,
    ctx: &'a mut Context<'b>,
    /// Every `ws:template` name of the file, defined yet or not.
    declared: HashSet<String>,
    templates: HashMap<String, ContainerId>,
    /// Partials of inline templates with the option names they pass.
    partials: Vec<(ContainerId, String, Vec<String>)>,
}

impl Traverser<'_, '_> {
    fn locate(&self, diagnostic: Diagnostic, position: Position) -> Diagnostic {
        diagnostic.at(position).in_file(self.config.file_name.as_str())
    }

    fn fatal(&self, message: String, position: Position) -> Diagnostic {
        self.locate(Diagnostic::error().with_message(message), position)
    }

    fn warn(&mut self, message: &str, position: Position) {
        let meta = Meta::new(Some(self.config.file_name.as_str()), Some(position));
        self.ctx.handler.warn(message, meta);
    }

    fn report_lost(&mut self, tag: &Tag, allowed: &[&str]) {
        for (name, attribute) in tag.attributes.iter() {
            if !allowed.contains(&name) {
                self.warn(
                    &format!(
                        "Attribute \"{}\" of <{}> cannot be routed anywhere and is lost",
                        name, tag.name
                    ),
                    attribute.position,
                );
            }
        }
    }

    fn required<'t>(&self, tag: &'t Tag, name: &str) -> Result<&'t Attribute> {
        tag.attribute(name).ok_or_else(|| {
            self.fatal(
                format!("Missing \"{}\" attribute on <{}>", name, tag.name),
                tag.position,
            )
        })
    }

    fn program(&mut self, container: ContainerId, expr: Expr, role: ProgramType, debug_name: &str) -> Program {
        let id = self.ctx.containers.register_program(container, &expr, role, debug_name);
        Program { id, expr }
    }

    fn nodes(&mut self, nodes: &[Node], container: ContainerId, key: &str) -> Result<Vec<AstNode>> {
        let mut result: Vec<AstNode> = vec![];
        for (index, node) in nodes.iter().enumerate() {
            let key = format!("{}{}_", key, index);
            let node = match node {
                Node::Text(text) => Some(self.text(text, container, key)?),
                Node::Comment(comment) => Some(AstNode::Comment(Raw {
                    data: comment.data.clone(),
                    position: comment.position,
                })),
                Node::CData(cdata) => Some(AstNode::CData(Raw {
                    data: cdata.data.clone(),
                    position: cdata.position,
                })),
                Node::Doctype(doctype) => Some(AstNode::Doctype(Raw {
                    data: doctype.data.clone(),
                    position: doctype.position,
                })),
                Node::Instruction(instruction) => Some(AstNode::Instruction(Raw {
                    data: instruction.data.clone(),
                    position: instruction.position,
                })),
                Node::Tag(tag) => self.tag(tag, container, key, chain_is_open(&result))?,
            };
            result.extend(node);
        }
        Ok(result)
    }

    fn text(&mut self, text: &Text, container: ContainerId, key: String) -> Result<AstNode> {
        let chunks = parse_text(&text.data).map_err(|error| self.locate(error, text.position))?;
        for chunk in &chunks {
            if let TextChunk::Expression(expr) = chunk {
                validate(expr, Site::Value).map_err(|error| self.locate(error, text.position))?;
            }
        }
        let parts = chunks
            .into_iter()
            .map(|chunk| self.text_part(chunk, container, ProgramType::Simple, "text"))
            .collect();
        Ok(AstNode::Text(TextNode {
            parts,
            key,
            position: text.position,
        }))
    }

    fn text_part(&mut self, chunk: TextChunk, container: ContainerId, role: ProgramType, debug_name: &str) -> TextPart {
        match chunk {
            TextChunk::Text(text) => TextPart::Text(text),
            TextChunk::Expression(expr) => TextPart::Expression(self.program(container, expr, role, debug_name)),
            TextChunk::Translation { text, context } => TextPart::Translation { text, context },
        }
    }

    /// Parses an attribute or option value. Broken expressions are reported
    /// and the value is kept as plain text.
    fn value(
        &mut self,
        raw: Option<&str>,
        name: &str,
        position: Position,
        container: ContainerId,
        role: ProgramType,
    ) -> Value {
        let raw = match raw {
            Some(raw) => raw,
            None => return Value::Empty,
        };
        if !has_mustache(raw) {
            return Value::text(raw);
        }
        let parsed = parse_text(raw).and_then(|chunks| {
            for chunk in &chunks {
                if let TextChunk::Expression(expr) = chunk {
                    validate(expr, Site::Value)?;
                }
            }
            Ok(chunks)
        });
        let chunks = match parsed {
            Ok(chunks) => chunks,
            Err(error) => {
                self.warn(
                    &format!(
                        "Value of \"{}\" cannot be parsed and is kept as text: {}",
                        name, error.message
                    ),
                    position,
                );
                return Value::text(raw);
            }
        };
        if let Some(expr) = single_expression(&chunks) {
            return Value::Expression(self.program(container, expr.clone(), role, name));
        }
        Value::Text(
            chunks
                .into_iter()
                .map(|chunk| self.text_part(chunk, container, role, name))
                .collect(),
        )
    }

    fn attribute_value(&mut self, attribute: &Attribute, container: ContainerId, role: ProgramType) -> Value {
        self.value(
            attribute.value.as_deref(),
            &attribute.name,
            attribute.position,
            container,
            role,
        )
    }

    /// Parses a directive or binding value that must be one expression.
    fn expression(&self, attribute: &Attribute, site: Site) -> Result<Expr> {
        let raw = attribute.value.as_deref().unwrap_or("");
        let expr = parse_expression(unwrap_mustache(raw))
            .map_err(|error| self.locate(error, attribute.position))?;
        validate(&expr, site).map_err(|error| self.locate(error, attribute.position))?;
        Ok(expr)
    }

    fn route_attributes(
        &mut self,
        tag: &Tag,
        container: ContainerId,
        attributes_only: bool,
        skip: &[&str],
    ) -> Routed {
        let mut routed = Routed::default();
        for (name, attribute) in tag.attributes.iter() {
            if skip.contains(&name) {
                continue;
            }
            match classify(name, attributes_only) {
                AttributeRole::Attribute(mapped) => {
                    let value = self.attribute_value(attribute, container, ProgramType::Attribute);
                    routed.attributes.insert(mapped, value);
                }
                AttributeRole::Option(mapped) => {
                    let value = self.attribute_value(attribute, container, ProgramType::Option);
                    routed.options.insert(mapped, OptionValue::Value(value));
                }
                AttributeRole::Bind(property) => match self.expression(attribute, Site::Bind) {
                    Ok(expr) => {
                        let program = self.program(container, expr, ProgramType::Bind, name);
                        routed.events.insert(
                            name,
                            Event {
                                kind: EventKind::Bind,
                                name: property.clone(),
                                program: program.clone(),
                            },
                        );
                        if !attributes_only {
                            routed.options.insert(property, OptionValue::Bind(program));
                        }
                    }
                    Err(error) => {
                        self.warn(
                            &format!(
                                "Invalid binding \"{}\" is processed as a plain value: {}",
                                name, error.message
                            ),
                            attribute.position,
                        );
                        self.fallback(attribute, property, container, attributes_only, &mut routed);
                    }
                },
                AttributeRole::Event(event) => match self.expression(attribute, Site::Event) {
                    Ok(expr) => {
                        let program = self.program(container, expr, ProgramType::Event, name);
                        routed.events.insert(
                            name,
                            Event {
                                kind: EventKind::Handler,
                                name: event,
                                program,
                            },
                        );
                    }
                    Err(error) => {
                        self.warn(
                            &format!(
                                "Invalid event handler \"{}\" is processed as a plain value: {}",
                                name, error.message
                            ),
                            attribute.position,
                        );
                        self.fallback(attribute, event, container, attributes_only, &mut routed);
                    }
                },
            }
        }
        routed
    }

    fn fallback(
        &mut self,
        attribute: &Attribute,
        name: String,
        container: ContainerId,
        attributes_only: bool,
        routed: &mut Routed,
    ) {
        if attributes_only {
            let value = self.attribute_value(attribute, container, ProgramType::Attribute);
            routed.attributes.insert(name, value);
        } else {
            let value = self.attribute_value(attribute, container, ProgramType::Option);
            routed.options.insert(name, OptionValue::Value(value));
        }
    }

    fn tag(&mut self, tag: &Tag, container: ContainerId, key: String, chain_open: bool) -> Result<Option<AstNode>> {
        let node = match tag.name.as_str() {
            "ws:if" => self.if_node(tag, container, key)?,
            "ws:else" => self.else_node(tag, container, key, chain_open)?,
            "ws:for" => self.for_node(tag, container, key)?,
            "ws:template" => self.template(tag, container, key)?,
            "ws:partial" => self.partial(tag, container, key)?,
            name if is_data_type(name) => {
                self.warn(
                    &format!("Data type <{}> outside of an option is ignored", name),
                    tag.position,
                );
                return Ok(None);
            }
            name if is_option_tag(name) => {
                self.warn(
                    &format!("Option <{}> outside of a component is ignored", name),
                    tag.position,
                );
                return Ok(None);
            }
            name => {
                if let Some((library, module)) = split_module_name(name) {
                    debug!("<{}> is a module of {}", name, library);
                    self.component(tag, container, key, ComponentKind::Module { library, module })?
                } else if is_control_string(name) {
                    debug!("<{}> is a control", name);
                    let kind = ComponentKind::WsControl {
                        path: control_path(name),
                    };
                    self.component(tag, container, key, kind)?
                } else {
                    self.element(tag, container, key)?
                }
            }
        };
        Ok(Some(node))
    }

    fn element(&mut self, tag: &Tag, container: ContainerId, key: String) -> Result<AstNode> {
        let routed = self.route_attributes(tag, container, true, &[]);
        let children = self.nodes(&tag.children, container, &key)?;
        Ok(AstNode::Element(Element {
            name: tag.name.clone(),
            attributes: routed.attributes,
            events: routed.events,
            children,
            is_void: tag.is_void,
            is_self_closing: tag.is_self_closing,
            key,
            container,
            position: tag.position,
        }))
    }

    fn if_node(&mut self, tag: &Tag, container: ContainerId, key: String) -> Result<AstNode> {
        self.report_lost(tag, &["data"]);
        let data = self.required(tag, "data")?;
        let expr = self.expression(data, Site::Value)?;
        let conditional = self.ctx.containers.create_container(container, ContainerType::Conditional);
        let id = self
            .ctx
            .containers
            .register_test_program(conditional, &expr)
            .map_err(|error| self.locate(error, data.position))?;
        let children = self.nodes(&tag.children, conditional, &key)?;
        Ok(AstNode::If(If {
            test: Program { id, expr },
            children,
            container: conditional,
            key,
            position: tag.position,
        }))
    }

    fn else_node(&mut self, tag: &Tag, container: ContainerId, key: String, chain_open: bool) -> Result<AstNode> {
        if !chain_open {
            return Err(self.fatal(
                "<ws:else> must follow <ws:if> or <ws:else data=\"...\">".to_string(),
                tag.position,
            ));
        }
        self.report_lost(tag, &["data"]);
        let conditional = self.ctx.containers.create_container(container, ContainerType::Conditional);
        self.ctx.containers.set_else(conditional);
        let test = match tag.attribute("data") {
            Some(data) => {
                let expr = self.expression(data, Site::Value)?;
                let id = self
                    .ctx
                    .containers
                    .register_test_program(conditional, &expr)
                    .map_err(|error| self.locate(error, data.position))?;
                Some(Program { id, expr })
            }
            None => None,
        };
        let children = self.nodes(&tag.children, conditional, &key)?;
        Ok(AstNode::Else(Else {
            test,
            children,
            container: conditional,
            key,
            position: tag.position,
        }))
    }

    fn for_node(&mut self, tag: &Tag, container: ContainerId, key: String) -> Result<AstNode> {
        self.report_lost(tag, &["data"]);
        let data = self.required(tag, "data")?;
        let raw = data.value.as_deref().unwrap_or("");
        let header = parse_for_header(unwrap_mustache(raw)).map_err(|error| self.locate(error, data.position))?;
        let cycle = self.ctx.containers.create_container(container, ContainerType::Cycle);
        match header {
            ForHeader::Each { key: key_name, value, collection } => {
                validate(&collection, Site::Value).map_err(|error| self.locate(error, data.position))?;
                if let Some(key_name) = &key_name {
                    self.ctx.containers.add_identifier(cycle, key_name.to_str());
                }
                self.ctx.containers.add_identifier(cycle, value.to_str());
                let collection = self.program(cycle, collection, ProgramType::Float, "for");
                let children = self.nodes(&tag.children, cycle, &key)?;
                Ok(AstNode::Foreach(Foreach {
                    key_name: key_name.map(|name| name.to_str().to_string()),
                    value_name: value.to_str().to_string(),
                    collection,
                    children,
                    container: cycle,
                    key,
                    position: tag.position,
                }))
            }
            ForHeader::Loop { init, test, update } => {
                if let Some(init) = &init {
                    for name in assigned_names(init) {
                        self.ctx.containers.add_identifier(cycle, &name);
                    }
                }
                let init = init.map(|expr| self.program(cycle, expr, ProgramType::Float, "for"));
                let test = test.map(|expr| self.program(cycle, expr, ProgramType::Float, "for"));
                let update = update.map(|expr| self.program(cycle, expr, ProgramType::Float, "for"));
                let children = self.nodes(&tag.children, cycle, &key)?;
                Ok(AstNode::For(For {
                    init,
                    test,
                    update,
                    children,
                    container: cycle,
                    key,
                    position: tag.position,
                }))
            }
        }
    }

    fn template(&mut self, tag: &Tag, container: ContainerId, key: String) -> Result<AstNode> {
        self.report_lost(tag, &["name"]);
        let name = self.required(tag, "name")?;
        let name = name.value.as_deref().unwrap_or("").trim().to_string();
        if name.is_empty() || has_mustache(&name) {
            return Err(self.fatal(
                format!("Invalid name \"{}\" of <ws:template>", name),
                tag.position,
            ));
        }
        let template = self.ctx.containers.create_container(container, ContainerType::Template);
        let children = self.nodes(&tag.children, template, &key)?;
        for parameter in self.ctx.containers.free_identifiers(template) {
            self.ctx.containers.add_identifier(template, &parameter);
        }
        debug!("inline template \"{}\" in #{}", name, template.index());
        self.templates.entry(name.clone()).or_insert(template);
        Ok(AstNode::Template(Template {
            name,
            children,
            container: template,
            position: tag.position,
        }))
    }

    /// Runs once every template of the file is known, so a partial may
    /// come before the template it includes.
    fn join_partials(&mut self) {
        for (partial, name, allowed) in std::mem::take(&mut self.partials) {
            if let Some(&template) = self.templates.get(&name) {
                self.ctx.containers.join_container(partial, template, &allowed);
            }
        }
    }

    fn static_template(&self, name: &str) -> Option<TemplateRef> {
        let name = name.trim();
        if self.declared.contains(name) {
            Some(TemplateRef::Inline(name.to_string()))
        } else if is_template_string(name) {
            Some(TemplateRef::Static(name.to_string()))
        } else if is_slashed_control(name) {
            Some(TemplateRef::Control(name.to_string()))
        } else if is_control_string(name) {
            Some(TemplateRef::Control(control_path(name)))
        } else {
            None
        }
    }

    /// A bad template name is fatal: there is nothing to fall back to.
    fn template_ref(&mut self, attribute: &Attribute, container: ContainerId) -> Result<TemplateRef> {
        let raw = attribute.value.as_deref().unwrap_or("");
        let invalid = |reason: &str| format!("Invalid template name \"{}\": {}", raw, reason);
        if !has_mustache(raw) {
            return self
                .static_template(raw)
                .ok_or_else(|| self.fatal(invalid("no inline template or module has this name"), attribute.position));
        }
        let chunks = parse_text(raw).map_err(|error| self.locate(error, attribute.position))?;
        let expr = single_expression(&chunks)
            .ok_or_else(|| self.fatal(invalid("expected a string or a single expression"), attribute.position))?;
        if let ExprKind::Lit(Literal::Str(name)) = &expr.kind {
            return self
                .static_template(name)
                .ok_or_else(|| self.fatal(invalid("no inline template or module has this name"), attribute.position));
        }
        validate(expr, Site::Value).map_err(|error| self.locate(error, attribute.position))?;
        Ok(TemplateRef::Dynamic(self.program(
            container,
            expr.clone(),
            ProgramType::Option,
            "template",
        )))
    }

    fn partial(&mut self, tag: &Tag, container: ContainerId, key: String) -> Result<AstNode> {
        let attribute = self.required(tag, "template")?;
        let template = self.template_ref(attribute, container)?;
        let component = self.ctx.containers.create_container(container, ContainerType::Component);
        let mut routed = self.route_attributes(tag, component, false, &["template"]);
        self.content(tag, component, &mut routed.options, &key)?;
        if let TemplateRef::Inline(name) = &template {
            let allowed: Vec<String> = routed.options.keys().map(String::from).collect();
            self.partials.push((component, name.clone(), allowed));
        }
        Ok(AstNode::Partial(Partial {
            template,
            ws_attributes: routed.attributes,
            ws_events: routed.events,
            ws_options: routed.options,
            key,
            container: component,
            position: tag.position,
        }))
    }

    fn component(&mut self, tag: &Tag, container: ContainerId, key: String, kind: ComponentKind) -> Result<AstNode> {
        let component = self.ctx.containers.create_container(container, ContainerType::Component);
        let mut routed = self.route_attributes(tag, component, false, &[]);
        self.content(tag, component, &mut routed.options, &key)?;
        Ok(AstNode::Component(Component {
            name: tag.name.clone(),
            kind,
            ws_attributes: routed.attributes,
            ws_events: routed.events,
            ws_options: routed.options,
            key,
            container: component,
            position: tag.position,
        }))
    }

    /// Children of a component or partial: either named option tags, or
    /// markup that becomes the `content` option.
    fn content(
        &mut self,
        tag: &Tag,
        component: ContainerId,
        options: &mut OrderedMap<OptionValue>,
        key: &str,
    ) -> Result<()> {
        let children = significant(&tag.children);
        if children.is_empty() {
            return Ok(());
        }
        let all_options = children
            .iter()
            .all(|node| matches!(node, Node::Tag(child) if is_option_tag(&child.name)));
        if !all_options {
            let content = self.content_option("content", &tag.children, component, tag.position, key, false)?;
            if options.insert("content", OptionValue::Content(content)).is_some() {
                self.warn(
                    &format!("Option \"content\" of <{}> is replaced by its markup", tag.name),
                    tag.position,
                );
            }
            return Ok(());
        }
        for child in children.into_iter().filter_map(Node::as_tag) {
            let name = child.name["ws:".len()..].to_string();
            let value = match self.option_data(child, component, key, false)? {
                DataValue::Value(value) => OptionValue::Value(value),
                DataValue::Markup(content) => OptionValue::Content(content),
                data => OptionValue::Data(data),
            };
            if !options.insert_first(name.as_str(), value) {
                self.warn(
                    &format!(
                        "Option \"{}\" of <{}> is set twice, the first value is kept",
                        name, tag.name
                    ),
                    child.position,
                );
            }
        }
        Ok(())
    }

    fn content_option(
        &mut self,
        name: &str,
        children: &[Node],
        component: ContainerId,
        position: Position,
        key: &str,
        in_data: bool,
    ) -> Result<ContentOption> {
        let container = self.ctx.containers.create_container(component, ContainerType::ContentOption);
        if in_data {
            self.ctx.containers.set_in_data_type(container);
        }
        self.ctx.containers.add_identifier(container, name);
        let children = self.nodes(children, container, key)?;
        Ok(ContentOption {
            name: name.to_string(),
            children,
            container,
            position,
        })
    }

    /// The value of an option tag like `<ws:caption>`.
    fn option_data(
        &mut self,
        tag: &Tag,
        component: ContainerId,
        key: &str,
        in_data: bool,
    ) -> Result<DataValue> {
        self.report_lost(tag, &[]);
        let name = tag.name.trim_start_matches("ws:");
        let children = significant(&tag.children);
        match children.as_slice() {
            [] => return Ok(DataValue::Value(Value::text(""))),
            [Node::Tag(child)] if is_data_type(&child.name) => {
                return self.data(child, component, key);
            }
            [Node::Text(text)] => {
                return Ok(DataValue::Value(self.value(
                    Some(&text.data),
                    name,
                    text.position,
                    component,
                    ProgramType::Option,
                )));
            }
            _ => {}
        }
        let all_options = children
            .iter()
            .all(|node| matches!(node, Node::Tag(child) if is_option_tag(&child.name)));
        if all_options {
            return self.object(&children, component, key);
        }
        Ok(DataValue::Markup(self.content_option(
            name,
            &tag.children,
            component,
            tag.position,
            key,
            in_data,
        )?))
    }

    fn object(&mut self, fields: &[&Node], component: ContainerId, key: &str) -> Result<DataValue> {
        let mut object = OrderedMap::new();
        for field in fields.iter().filter_map(|node| node.as_tag()) {
            if !is_option_tag(&field.name) {
                self.warn(
                    &format!("<{}> is not a field and is ignored", field.name),
                    field.position,
                );
                continue;
            }
            let value = self.option_data(field, component, key, true)?;
            object.insert(field.name.trim_start_matches("ws:"), value);
        }
        Ok(DataValue::Object(object))
    }

    /// Text content of a scalar data tag.
    fn scalar(&mut self, tag: &Tag, container: ContainerId) -> Value {
        self.report_lost(tag, &[]);
        match significant(&tag.children).as_slice() {
            [] => Value::text(""),
            [Node::Text(text)] => self.value(Some(&text.data), &tag.name, text.position, container, ProgramType::Option),
            _ => {
                self.warn(&format!("<{}> takes text only", tag.name), tag.position);
                Value::text("")
            }
        }
    }

    fn data(&mut self, tag: &Tag, component: ContainerId, key: &str) -> Result<DataValue> {
        let data = match tag.name.as_str() {
            "ws:Array" => {
                self.report_lost(tag, &[]);
                let mut items = vec![];
                for item in significant(&tag.children) {
                    match item {
                        Node::Tag(item) if is_data_type(&item.name) => {
                            items.push(self.data(item, component, key)?);
                        }
                        _ => self.warn("Arrays hold data type tags only, the node is ignored", item.position()),
                    }
                }
                DataValue::Array(items)
            }
            "ws:Object" => {
                self.report_lost(tag, &[]);
                let fields = significant(&tag.children);
                self.object(&fields, component, key)?
            }
            "ws:String" => DataValue::String(self.scalar(tag, component)),
            "ws:Number" => DataValue::Number(self.scalar(tag, component)),
            "ws:Boolean" => DataValue::Boolean(self.scalar(tag, component)),
            "ws:Function" => {
                let path = tag
                    .children
                    .iter()
                    .filter_map(|node| match node {
                        Node::Text(text) => Some(text.data.as_str()),
                        _ => None,
                    })
                    .collect::<String>()
                    .trim()
                    .to_string();
                if path.is_empty() {
                    return Err(self.fatal("Missing function path in <ws:Function>".to_string(), tag.position));
                }
                let mut arguments = OrderedMap::new();
                for (name, attribute) in tag.attributes.iter() {
                    let value = self.attribute_value(attribute, component, ProgramType::Option);
                    arguments.insert(name, value);
                }
                DataValue::Function { path, arguments }
            }
            _ => DataValue::Value(self.scalar(tag, component)),
        };
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::DiagnosticSet;
    use parser::{parse, ParserOptions};

    struct Compiled {
        nodes: Vec<AstNode>,
        containers: ContainerArena,
        messages: DiagnosticSet,
    }

    fn try_lower(text: &str) -> Result<Compiled> {
        let mut messages = DiagnosticSet::new();
        let mut containers = ContainerArena::new();
        let markup = parse(text, "a.wml", &ParserOptions::default(), &mut messages)?;
        let config = TraverseConfig {
            file_name: "a.wml".to_string(),
        };
        let nodes = traverse(
            &markup,
            &config,
            &mut Context {
                containers: &mut containers,
                handler: &mut messages,
            },
        )?;
        Ok(Compiled {
            nodes,
            containers,
            messages,
        })
    }

    fn lower(text: &str) -> Compiled {
        try_lower(text).unwrap()
    }

    fn keys<V>(map: &OrderedMap<V>) -> Vec<&str> {
        map.keys().collect()
    }

    #[test]
    fn routes_element_attributes() {
        let compiled = lower(r#"<div attr:class="c" bind:value="v" on:click="h()" option="o"></div>"#);
        let element = match &compiled.nodes[0] {
            AstNode::Element(element) => element,
            other => panic!("expected an element, got {:?}", other),
        };
        assert_eq!(keys(&element.attributes), vec!["class", "option"]);
        assert_eq!(keys(&element.events), vec!["bind:value", "on:click"]);
        assert_eq!(element.events.get("on:click").map(|event| event.name.as_str()), Some("click"));
        assert_eq!(element.events.get("bind:value").map(|event| event.kind), Some(EventKind::Bind));
        assert!(compiled.messages.is_empty());
    }

    #[test]
    fn routes_component_attributes() {
        let compiled = lower(r#"<Controls.Button class="c" caption="{{ title }}" bind:value="v" on:Click="h"/>"#);
        let component = match &compiled.nodes[0] {
            AstNode::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        };
        assert_eq!(
            component.kind,
            ComponentKind::WsControl {
                path: "Controls/Button".to_string()
            }
        );
        assert_eq!(keys(&component.ws_attributes), vec!["class"]);
        assert_eq!(keys(&component.ws_options), vec!["caption", "value"]);
        assert_eq!(keys(&component.ws_events), vec!["bind:value", "on:Click"]);
        assert!(matches!(component.ws_options.get("caption"), Some(OptionValue::Value(Value::Expression(_)))));
    }

    #[test]
    fn broken_bindings_fall_back_to_values() {
        let compiled = lower(r#"<Controls.Input bind:value="a + b" on:click="1"/>"#);
        let component = match &compiled.nodes[0] {
            AstNode::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        };
        assert!(component.ws_events.is_empty());
        assert_eq!(keys(&component.ws_options), vec!["value", "click"]);
        assert_eq!(compiled.messages.warnings().count(), 2);
    }

    #[test]
    fn unparsable_values_are_kept_as_text() {
        let compiled = lower(r#"<div title="{{ a b }}"></div>"#);
        match &compiled.nodes[0] {
            AstNode::Element(element) => {
                assert_eq!(element.attributes.get("title"), Some(&Value::text("{{ a b }}")))
            }
            other => panic!("expected an element, got {:?}", other),
        }
        assert_eq!(compiled.messages.len(), 1);
    }

    #[test]
    fn modules_and_content() {
        let compiled = lower(r#"<Controls.list:View><div>{{ item }}</div></Controls.list:View>"#);
        let component = match &compiled.nodes[0] {
            AstNode::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        };
        assert_eq!(
            component.kind,
            ComponentKind::Module {
                library: "Controls/list".to_string(),
                module: "View".to_string()
            }
        );
        let content = match component.ws_options.get("content") {
            Some(OptionValue::Content(content)) => content,
            other => panic!("expected content, got {:?}", other),
        };
        assert_eq!(compiled.containers.own_identifiers(content.container), ["content".to_string()]);
        assert_eq!(
            compiled.containers.get(content.container).container_type,
            ContainerType::ContentOption
        );
    }

    #[test]
    fn option_tags_and_data() {
        let compiled = lower(
            "<Controls.Grid>\
               <ws:caption>Hello, {{ name }}</ws:caption>\
               <ws:columns><ws:Array><ws:Object><ws:title>A</ws:title></ws:Object></ws:Array></ws:columns>\
               <ws:footer><div>f</div></ws:footer>\
               <ws:size><ws:Number>3</ws:Number></ws:size>\
             </Controls.Grid>",
        );
        let component = match &compiled.nodes[0] {
            AstNode::Component(component) => component,
            other => panic!("expected a component, got {:?}", other),
        };
        assert_eq!(keys(&component.ws_options), vec!["caption", "columns", "footer", "size"]);
        assert!(matches!(component.ws_options.get("caption"), Some(OptionValue::Value(Value::Text(_)))));
        match component.ws_options.get("columns") {
            Some(OptionValue::Data(DataValue::Array(items))) => {
                assert!(matches!(&items[0], DataValue::Object(fields) if fields.contains_key("title")))
            }
            other => panic!("expected an array, got {:?}", other),
        }
        assert!(matches!(component.ws_options.get("footer"), Some(OptionValue::Content(_))));
        assert!(matches!(
            component.ws_options.get("size"),
            Some(OptionValue::Data(DataValue::Number(_)))
        ));
    }

    #[test]
    fn conditional_content_is_markup() {
        let compiled = lower(r#"<Controls.Panel><ws:if data="{{ a }}"><ws:caption>x</ws:caption></ws:if></Controls.Panel>"#);
        match &compiled.nodes[0] {
            AstNode::Component(component) => {
                assert!(matches!(component.ws_options.get("content"), Some(OptionValue::Content(_))))
            }
            other => panic!("expected a component, got {:?}", other),
        }
    }

    #[test]
    fn directives_open_containers() {
        let compiled = lower(
            r#"<ws:for data="index, item in items"><ws:if data="item.visible">{{ item.title }}</ws:if><ws:else>-</ws:else></ws:for>"#,
        );
        let foreach = match &compiled.nodes[0] {
            AstNode::Foreach(foreach) => foreach,
            other => panic!("expected a loop, got {:?}", other),
        };
        assert_eq!(foreach.key_name.as_deref(), Some("index"));
        assert_eq!(foreach.value_name, "item");
        assert_eq!(
            compiled.containers.own_identifiers(foreach.container),
            ["index".to_string(), "item".to_string()]
        );
        match &foreach.children[1] {
            AstNode::Else(node) => {
                assert!(node.test.is_none());
                assert!(compiled.containers.get(node.container).is_else);
            }
            other => panic!("expected an else branch, got {:?}", other),
        }
    }

    #[test]
    fn lost_attributes_are_reported() {
        let compiled = lower(r#"<ws:if data="{{ a }}" class="x">y</ws:if>"#);
        let warnings: Vec<String> = compiled.messages.warnings().map(|message| message.text.clone()).collect();
        assert_eq!(
            warnings,
            vec!["Attribute \"class\" of <ws:if> cannot be routed anywhere and is lost"]
        );
    }

    #[test]
    fn loop_headers() {
        let compiled = lower(r#"<ws:for data="i = 0; i < 3; i++">{{ i }}</ws:for>"#);
        match &compiled.nodes[0] {
            AstNode::For(node) => {
                assert_eq!(compiled.containers.own_identifiers(node.container), ["i".to_string()]);
                assert_eq!(node.update.as_ref().map(|update| update.expr.to_source()), Some("i++".to_string()));
            }
            other => panic!("expected a loop, got {:?}", other),
        }
    }

    #[test]
    fn partials() {
        let compiled = lower(
            r#"<ws:template name="row"><b>{{ title }}{{ secret }}</b></ws:template><ws:partial template="row" title="{{ caption }}"/>"#,
        );
        let partial = match &compiled.nodes[1] {
            AstNode::Partial(partial) => partial,
            other => panic!("expected a partial, got {:?}", other),
        };
        assert_eq!(partial.template, TemplateRef::Inline("row".to_string()));
        assert!(compiled.containers.resolve(partial.container, "title").is_some());
        assert!(compiled.containers.resolve(partial.container, "secret").is_none());

        let compiled = lower(
            r#"<ws:partial template="row" title="{{ caption }}"/><ws:template name="row"><b>{{ title }}{{ secret }}</b></ws:template>"#,
        );
        let partial = match &compiled.nodes[0] {
            AstNode::Partial(partial) => partial,
            other => panic!("expected a partial, got {:?}", other),
        };
        assert_eq!(partial.template, TemplateRef::Inline("row".to_string()));
        assert!(compiled.containers.resolve(partial.container, "title").is_some());
        assert!(compiled.containers.resolve(partial.container, "secret").is_none());

        let compiled = lower(r#"<ws:partial template="wml!Controls/row"/><ws:partial template="{{ 'Controls/Row' }}"/><ws:partial template="{{ tpl }}"/>"#);
        let templates: Vec<&TemplateRef> = compiled
            .nodes
            .iter()
            .filter_map(|node| match node {
                AstNode::Partial(partial) => Some(&partial.template),
                _ => None,
            })
            .collect();
        assert_eq!(templates[0], &TemplateRef::Static("wml!Controls/row".to_string()));
        assert_eq!(templates[1], &TemplateRef::Control("Controls/Row".to_string()));
        assert!(matches!(templates[2], TemplateRef::Dynamic(_)));
    }

    #[test]
    fn bad_template_names_are_fatal() {
        for source in &[
            "<ws:partial/>",
            r#"<ws:partial template="nothing"/>"#,
            r#"<ws:partial template="a{{ b }}"/>"#,
            r#"<ws:partial template="{{ a b }}"/>"#,
        ] {
            let error = try_lower(source).err().unwrap();
            assert_eq!(error.file_name.as_deref(), Some("a.wml"), "{}", source);
        }
    }

    #[test]
    fn else_needs_a_chain() {
        let error = try_lower("<div></div><ws:else>x</ws:else>").err().unwrap();
        assert!(error.message.contains("must follow"));
        assert!(try_lower(r#"<ws:if data="a">x</ws:if> <ws:else data="b">y</ws:else><ws:else>z</ws:else>"#).is_ok());
    }

    #[test]
    fn keys_follow_positions() {
        let compiled = lower("<div><span>a</span><span>b</span></div>");
        match &compiled.nodes[0] {
            AstNode::Element(element) => {
                assert_eq!(element.key, "0_");
                match &element.children[1] {
                    AstNode::Element(span) => assert_eq!(span.key, "0_1_"),
                    other => panic!("expected an element, got {:?}", other),
                }
            }
            other => panic!("expected an element, got {:?}", other),
        }
    }

    #[test]
    fn text_expressions_must_be_valid() {
        let error = try_lower("<div>{{ a = 1 }}</div>").err().unwrap();
        assert!(error.message.contains("assignments"));
        assert_eq!(error.position.map(|position| position.line), Some(1));
    }
}
