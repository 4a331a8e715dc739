//! Scopes of a template. Every component, content option, inline template,
//! conditional and loop opens a container; expressions found in the markup
//! are registered as programs of the container they occur in.

use crate::internal::{InternalNode, InternalNodeKind};

use data_structures::HashSet;
use diagnostics::ParseResult as Result;
use id_arena::{Arena, Id};
use log::debug;
use source::diagnostics::Diagnostic;
use syntax::ast::Expr;

use std::fmt;

pub type ContainerId = Id<Container>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    Global,
    Component,
    ContentOption,
    Template,
    Conditional,
    Cycle,
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerType::Global => "GLOBAL",
            ContainerType::Component => "COMPONENT",
            ContainerType::ContentOption => "CONTENT_OPTION",
            ContainerType::Template => "TEMPLATE",
            ContainerType::Conditional => "CONDITIONAL",
            ContainerType::Cycle => "CYCLE",
        };
        f.write_str(name)
    }
}

/// The syntactic role an expression was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramType {
    /// Text mustaches.
    Simple,
    Attribute,
    Bind,
    Event,
    Option,
    /// Loop headers.
    Float,
}

impl ProgramType {
    /// Whether programs of this role are evaluated by the internal tree.
    pub fn is_stored(self) -> bool {
        !matches!(self, ProgramType::Event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId {
    pub container: ContainerId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramMeta {
    pub id: ProgramId,
    pub expr: Expr,
    pub source: String,
    pub role: ProgramType,
    pub debug_name: String,
    pub identifiers: Vec<String>,
    pub processing_index: usize,
}

#[derive(Debug)]
pub struct Container {
    pub index: usize,
    pub container_type: ContainerType,
    pub parent: Option<ContainerId>,
    pub children: Vec<ContainerId>,
    pub is_else: bool,
    pub is_in_data_type: bool,
    identifiers: Vec<String>,
    programs: Vec<ProgramMeta>,
    test: Option<ProgramMeta>,
    joined: Vec<(ContainerId, HashSet<String>)>,
}

impl Container {
    pub fn own_identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn programs(&self) -> &[ProgramMeta] {
        &self.programs
    }

    pub fn test(&self) -> Option<&ProgramMeta> {
        self.test.as_ref()
    }

    fn declares(&self, name: &str) -> bool {
        self.identifiers.iter().any(|identifier| identifier == name)
    }
}

/// Owns every container of one compilation. Arena indices are container
/// indices, so they grow strictly with each `create_container` call.
pub struct ContainerArena {
    arena: Arena<Container>,
    global: ContainerId,
}

impl Default for ContainerArena {
    fn default() -> Self {
        ContainerArena::new()
    }
}

impl ContainerArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let global: ContainerId = arena.next_id();
        arena.alloc(Container {
            index: global.index(),
            container_type: ContainerType::Global,
            parent: None,
            children: vec![],
            is_else: false,
            is_in_data_type: false,
            identifiers: vec![],
            programs: vec![],
            test: None,
            joined: vec![],
        });
        ContainerArena { arena, global }
    }

    pub fn global(&self) -> ContainerId {
        self.global
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn get(&self, id: ContainerId) -> &Container {
        &self.arena[id]
    }

    pub fn create_container(&mut self, parent: ContainerId, container_type: ContainerType) -> ContainerId {
        let is_in_data_type = self.arena[parent].is_in_data_type;
        let id = self.arena.next_id();
        self.arena.alloc(Container {
            index: id.index(),
            container_type,
            parent: Some(parent),
            children: vec![],
            is_else: false,
            is_in_data_type,
            identifiers: vec![],
            programs: vec![],
            test: None,
            joined: vec![],
        });
        self.arena[parent].children.push(id);
        debug!(
            "container #{} ({}) created under #{}",
            id.index(),
            container_type,
            parent.index()
        );
        id
    }

    pub fn set_else(&mut self, container: ContainerId) {
        self.arena[container].is_else = true;
    }

    /// Marks the container as holding a data value rather than markup.
    /// Containers created below it inherit the flag.
    pub fn set_in_data_type(&mut self, container: ContainerId) {
        self.arena[container].is_in_data_type = true;
    }

    fn meta(&self, id: ProgramId, expr: &Expr, role: ProgramType, debug_name: &str) -> ProgramMeta {
        ProgramMeta {
            id,
            source: expr.to_source(),
            identifiers: expr.identifiers(),
            expr: expr.clone(),
            role,
            debug_name: debug_name.to_string(),
            processing_index: self.processing_container_index(id.container),
        }
    }

    /// Registers an expression found in `container`. The same source text in
    /// the same role is stored once and keeps its first id.
    pub fn register_program(
        &mut self,
        container: ContainerId,
        expr: &Expr,
        role: ProgramType,
        debug_name: &str,
    ) -> ProgramId {
        let source = expr.to_source();
        if let Some(existing) = self.arena[container]
            .programs
            .iter()
            .find(|program| program.role == role && program.source == source)
        {
            return existing.id;
        }
        let id = ProgramId {
            container,
            index: self.arena[container].programs.len(),
        };
        let meta = self.meta(id, expr, role, debug_name);
        debug!(
            "program {:?} \"{}\" registered in #{}",
            role,
            source,
            container.index()
        );
        self.arena[container].programs.push(meta);
        id
    }

    pub fn register_test_program(&mut self, container: ContainerId, expr: &Expr) -> Result<ProgramId> {
        let found = self.arena[container].container_type;
        if found != ContainerType::Conditional {
            return Err(Diagnostic::error().with_message(format!(
                "Test program \"{}\" can only be registered in a CONDITIONAL container, not {}",
                expr.to_source(),
                found
            )));
        }
        let id = ProgramId {
            container,
            index: usize::MAX,
        };
        let meta = self.meta(id, expr, ProgramType::Simple, "test");
        self.arena[container].test = Some(meta);
        Ok(id)
    }

    pub fn add_identifier(&mut self, container: ContainerId, name: &str) {
        let container = &mut self.arena[container];
        if !container.declares(name) {
            container.identifiers.push(name.to_string());
        }
    }

    pub fn own_identifiers(&self, container: ContainerId) -> &[String] {
        self.arena[container].own_identifiers()
    }

    /// Makes the identifiers `other` declares visible from `this`, restricted
    /// to `allowed`.
    pub fn join_container(&mut self, this: ContainerId, other: ContainerId, allowed: &[String]) {
        let allowed: HashSet<String> = allowed.iter().cloned().collect();
        debug!(
            "container #{} joins #{} ({} names allowed)",
            this.index(),
            other.index(),
            allowed.len()
        );
        self.arena[this].joined.push((other, allowed));
    }

    /// The container on the scope chain of `container` that makes `name`
    /// visible: one declaring it, or one joining a container that declares
    /// it under an allowed name. None means the name is template data.
    pub fn resolve(&self, container: ContainerId, name: &str) -> Option<ContainerId> {
        let mut current = Some(container);
        while let Some(id) = current {
            let scope = &self.arena[id];
            if scope.declares(name) {
                return Some(id);
            }
            let joined = scope
                .joined
                .iter()
                .any(|(other, allowed)| allowed.contains(name) && self.arena[*other].declares(name));
            if joined {
                return Some(id);
            }
            current = scope.parent;
        }
        None
    }

    /// Whether `ancestor` is `container` itself or one of its parents.
    pub fn is_within(&self, container: ContainerId, ancestor: ContainerId) -> bool {
        let mut current = Some(container);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.arena[id].parent;
        }
        false
    }

    /// A name used in `container` can be evaluated at `root` when it is data,
    /// or declared by `root` or above.
    fn is_visible_from(&self, root: ContainerId, container: ContainerId, name: &str) -> bool {
        match self.resolve(container, name) {
            None => true,
            Some(scope) => self.is_within(root, scope),
        }
    }

    fn all_visible(&self, root: ContainerId, program: &ProgramMeta) -> bool {
        program
            .identifiers
            .iter()
            .all(|name| self.is_visible_from(root, program.id.container, name))
    }

    /// Names used in the subtree of `root` that nothing inside the subtree
    /// declares, in order of first use. Inline templates take these as
    /// their parameters.
    pub fn free_identifiers(&self, root: ContainerId) -> Vec<String> {
        let mut names: Vec<String> = vec![];
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            let scope = &self.arena[id];
            for program in scope.programs.iter().chain(scope.test.iter()) {
                for name in &program.identifiers {
                    let declared_inside = self
                        .resolve(id, name)
                        .map_or(false, |found| self.is_within(found, root));
                    if !declared_inside && !names.contains(name) {
                        names.push(name.clone());
                    }
                }
            }
            pending.extend(scope.children.iter().rev());
        }
        names
    }

    /// Index of the nearest container that owns a generated function:
    /// conditionals, loops and content options evaluate in their parent's.
    pub fn processing_container_index(&self, container: ContainerId) -> usize {
        let mut id = container;
        loop {
            let scope = &self.arena[id];
            match (scope.container_type, scope.parent) {
                (
                    ContainerType::Conditional | ContainerType::Cycle | ContainerType::ContentOption,
                    Some(parent),
                ) => id = parent,
                _ => return scope.index,
            }
        }
    }

    fn storage(&self, root: ContainerId, container: ContainerId) -> Vec<Expr> {
        let mut seen = HashSet::default();
        self.arena[container]
            .programs
            .iter()
            .filter(|program| program.role.is_stored() && self.all_visible(root, program))
            .filter(|program| seen.insert(program.source.clone()))
            .map(|program| program.expr.clone())
            .collect()
    }

    fn is_resolvable(&self, root: ContainerId, test: &ProgramMeta) -> bool {
        !test.expr.has_side_effects() && self.all_visible(root, test)
    }

    /// Projects the container subtree into the tree of evaluation blocks
    /// used for dirty checking.
    pub fn internal_structure(&self, root: ContainerId) -> InternalNode {
        let scope = &self.arena[root];
        let mut tree = InternalNode {
            kind: InternalNodeKind::Block,
            index: scope.index,
            is_in_data_type: scope.is_in_data_type,
            test: None,
            storage: self.storage(root, root),
            container: root,
            children: self.project_children(root, root),
        };
        if scope.container_type == ContainerType::ContentOption {
            self.revert_lone_else_if(&mut tree.children);
        }
        tree
    }

    /// A content option holding a single else-if branch starts its own
    /// chain with it.
    fn revert_lone_else_if(&self, nodes: &mut [InternalNode]) {
        let [node] = nodes else {
            return;
        };
        let scope = &self.arena[node.container];
        if scope.container_type != ContainerType::Conditional || !scope.is_else {
            return;
        }
        if let Some(test) = &scope.test {
            debug!("lone else-if #{} of a content option reverted to if", node.index);
            node.kind = InternalNodeKind::If;
            node.test = Some(test.expr.clone());
        }
    }

    fn project_children(&self, root: ContainerId, container: ContainerId) -> Vec<InternalNode> {
        let parent_type = self.arena[container].container_type;
        let mut nodes = vec![];
        for &child in &self.arena[container].children {
            let scope = &self.arena[child];
            match scope.container_type {
                ContainerType::Template | ContainerType::Global => continue,
                ContainerType::ContentOption if parent_type == ContainerType::Component => continue,
                _ => {}
            }
            let mut node = InternalNode {
                kind: InternalNodeKind::Block,
                index: scope.index,
                is_in_data_type: scope.is_in_data_type,
                test: None,
                storage: self.storage(root, child),
                container: child,
                children: self.project_children(root, child),
            };
            if scope.container_type == ContainerType::Conditional {
                self.classify_conditional(root, scope, &mut node);
            }
            nodes.push(node);
        }
        nodes
    }

    fn classify_conditional(&self, root: ContainerId, scope: &Container, node: &mut InternalNode) {
        let test = match &scope.test {
            Some(test) => test,
            None => {
                if scope.is_else {
                    node.kind = InternalNodeKind::Else;
                }
                return;
            }
        };
        if self.is_resolvable(root, test) {
            node.kind = if scope.is_else {
                InternalNodeKind::ElseIf
            } else {
                InternalNodeKind::If
            };
            node.test = Some(test.expr.clone());
            return;
        }
        debug!(
            "test \"{}\" of #{} is not resolvable, demoted to a block",
            test.source, scope.index
        );
        let stored = node.storage.iter().any(|expr| expr.to_source() == test.source);
        if !scope.is_else && !stored && self.all_visible(root, test) {
            node.storage.push(test.expr.clone());
        }
    }
}
