use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use tree_sitter::Node;

use crate::base::builtins::is_builtin;
use crate::base::dotted::{relative_star_key, star_key};
use crate::parser::{node_text, ParsedModule};

use super::symbol::{RelativeStarTarget, Symbol};
use super::symbol_table::SymbolTable;

/// Single-module symbol extractor.
///
/// Walks one module's parse tree and produces the symbol table restricted
/// to that module: definitions keyed by their fully-qualified scope path,
/// import aliases with the absolute names they shadow, star-imports parked
/// under synthetic keys, and a usage volume per enclosing definition.
///
/// Name references resolve through the alias map; a reference to anything
/// already known (an import, a prior declaration, a builtin, or a name
/// previously flagged undeclared) lands in the volume of the nearest
/// enclosing function, class or module on the scope stack. Constants are
/// not tracking boundaries: references inside a constant's initializer
/// attach to the module instead.
pub struct ModuleWalker<'s> {
    source: &'s str,
    module_name: String,
    table: SymbolTable,
    scope_stack: Vec<String>,
    attr_stack: Vec<String>,
    aliases: FxHashMap<String, String>,
    imported: Vec<String>,
    used: FxHashSet<String>,
    used_builtins: FxHashSet<String>,
    undeclared: FxHashSet<String>,
    param_stack: Vec<FxHashSet<String>>,
}

impl<'s> ModuleWalker<'s> {
    /// Walker for a plain module.
    pub fn new(module_name: impl Into<String>, source: &'s str) -> Self {
        Self::with_root(module_name.into(), source, Symbol::module())
    }

    /// Walker for a package marker module (`__init__.py`); the root entry
    /// carries `Package` kind so key normalization collapses it onto the
    /// package's own name.
    pub fn package(module_name: impl Into<String>, source: &'s str) -> Self {
        Self::with_root(module_name.into(), source, Symbol::package())
    }

    fn with_root(module_name: String, source: &'s str, root: Symbol) -> Self {
        let mut table = SymbolTable::new();
        table.insert(module_name.clone(), root);
        Self {
            source,
            scope_stack: vec![module_name.clone()],
            module_name,
            table,
            attr_stack: Vec::new(),
            aliases: FxHashMap::default(),
            imported: Vec::new(),
            used: FxHashSet::default(),
            used_builtins: FxHashSet::default(),
            undeclared: FxHashSet::default(),
            param_stack: Vec::new(),
        }
    }

    /// Walk the whole module tree.
    pub fn walk(&mut self, module: &ParsedModule) {
        self.visit(module.root());
    }

    /// Run the post-pass and return the module's symbol table.
    ///
    /// The post-pass rewrites volume references that used the short form
    /// of a name declared later in the same file to the fully-qualified
    /// form, and drops those names from the undeclared set.
    pub fn finish(mut self) -> SymbolTable {
        self.post_process();
        self.table
    }

    pub fn aliases(&self) -> &FxHashMap<String, String> {
        &self.aliases
    }

    pub fn imported_symbols(&self) -> &[String] {
        &self.imported
    }

    pub fn used_symbols(&self) -> &FxHashSet<String> {
        &self.used
    }

    pub fn used_builtins(&self) -> &FxHashSet<String> {
        &self.used_builtins
    }

    pub fn undeclared_symbols(&self) -> &FxHashSet<String> {
        &self.undeclared
    }

    // ============================================================
    // Dispatch
    // ============================================================

    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "import_statement" => self.handle_import(node),
            "import_from_statement" => self.handle_import_from(node),
            "function_definition" => self.handle_function(node, &[]),
            "class_definition" => self.handle_class(node, &[]),
            "decorated_definition" => self.handle_decorated(node),
            "assignment" => self.handle_assignment(node),
            "call" => self.handle_call(node),
            "attribute" => self.handle_attribute(node),
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value);
                }
            }
            "lambda" => self.handle_lambda(node),
            "global_statement" | "nonlocal_statement" => {}
            "identifier" => self.handle_name(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    // ============================================================
    // Imports
    // ============================================================

    fn handle_import(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            match name_node.kind() {
                "dotted_name" => {
                    let target = self.text(name_node).to_string();
                    self.imported.push(target.clone());
                    let key = format!("{}.{}", self.module_name, target);
                    self.table.insert(key, Symbol::import(target));
                }
                "aliased_import" => {
                    let (Some(target_node), Some(alias_node)) = (
                        name_node.child_by_field_name("name"),
                        name_node.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    let target = self.text(target_node).to_string();
                    let alias = self.text(alias_node).to_string();
                    self.imported.push(target.clone());
                    // Aliasing an alias resolves to the ultimate target.
                    let ultimate = self.aliases.get(&target).cloned().unwrap_or(target);
                    self.aliases.insert(alias.clone(), ultimate.clone());
                    let key = format!("{}.{}", self.module_name, alias);
                    self.table.insert(key, Symbol::import(ultimate));
                }
                _ => {}
            }
        }
    }

    fn handle_import_from(&mut self, node: Node<'_>) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };
        let (level, target_ns) = if module_node.kind() == "relative_import" {
            let mut level = 0u32;
            let mut ns = String::new();
            let mut cursor = module_node.walk();
            for child in module_node.named_children(&mut cursor) {
                match child.kind() {
                    "import_prefix" => {
                        level = self.text(child).matches('.').count() as u32;
                    }
                    "dotted_name" => ns = self.text(child).to_string(),
                    _ => {}
                }
            }
            (level, ns)
        } else {
            (0, self.text(module_node).to_string())
        };
        let relative = level > 0;

        let mut cursor = node.walk();
        let wildcard = node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import");
        if wildcard {
            // Star-imports introduce an unbounded symbol set, so they park
            // under a synthetic key instead of the module's surface area.
            if relative {
                self.add_relative_star_import(&target_ns, level);
            } else {
                self.add_star_import(&target_ns);
            }
            return;
        }

        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name_node in names {
            let (bare, alias) = match name_node.kind() {
                "dotted_name" => (self.text(name_node).to_string(), None),
                "aliased_import" => {
                    let (Some(target_node), Some(alias_node)) = (
                        name_node.child_by_field_name("name"),
                        name_node.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    (
                        self.text(target_node).to_string(),
                        Some(self.text(alias_node).to_string()),
                    )
                }
                _ => continue,
            };
            let full = if target_ns.is_empty() {
                bare.clone()
            } else {
                format!("{target_ns}.{bare}")
            };
            self.aliases.insert(bare.clone(), full.clone());
            if let Some(alias) = &alias {
                self.aliases.insert(alias.clone(), full.clone());
            }
            self.imported.push(full.clone());

            let local = alias.unwrap_or(bare);
            let key = format!("{}.{}", self.module_name, local);
            if relative {
                // The importing module is not yet known to be a package or
                // a plain module; dereferencing waits for normalization.
                let entry = Symbol::relative_import_raw(full, level, self.module_name.clone());
                self.table.insert(key, entry);
            } else {
                self.table.insert(key, Symbol::import(full));
            }
        }
    }

    fn add_star_import(&mut self, namespace: &str) {
        let key = star_key(&self.module_name);
        if !self.table.contains(&key) {
            let entry = Symbol::StarImport {
                imports: BTreeSet::new(),
            };
            self.table.insert(key.clone(), entry);
        }
        if let Some(Symbol::StarImport { imports }) = self.table.get_mut(&key) {
            imports.insert(namespace.to_string());
        }
    }

    fn add_relative_star_import(&mut self, namespace: &str, level: u32) {
        let key = relative_star_key(&self.module_name);
        if !self.table.contains(&key) {
            let entry = Symbol::RelativeStarImport {
                imports: Vec::new(),
            };
            self.table.insert(key.clone(), entry);
        }
        if let Some(Symbol::RelativeStarImport { imports }) = self.table.get_mut(&key) {
            imports.push(RelativeStarTarget::Raw {
                target: namespace.to_string(),
                level,
                module: self.module_name.clone(),
            });
        }
    }

    // ============================================================
    // Definitions
    // ============================================================

    fn handle_decorated(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        let decorators: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();
        let Some(definition) = node.child_by_field_name("definition") else {
            return self.visit_children(node);
        };
        match definition.kind() {
            "function_definition" => self.handle_function(definition, &decorators),
            "class_definition" => self.handle_class(definition, &decorators),
            _ => self.visit(definition),
        }
    }

    fn handle_function(&mut self, node: Node<'_>, decorators: &[Node<'_>]) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        self.scope_stack.push(self.text(name_node).to_string());
        let symbol_name = self.scope_name();
        self.param_stack.push(self.parameter_names(node));
        self.table
            .insert(symbol_name, Symbol::function(line_of(node)));

        for decorator in decorators {
            self.visit(*decorator);
        }
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.visit_parameters(parameters);
        }
        if let Some(return_type) = node.child_by_field_name("return_type") {
            self.visit(return_type);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }

        self.scope_stack.pop();
        self.param_stack.pop();
    }

    fn handle_class(&mut self, node: Node<'_>, decorators: &[Node<'_>]) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        self.scope_stack.push(self.text(name_node).to_string());
        let symbol_name = self.scope_name();
        self.table.insert(symbol_name, Symbol::class(line_of(node)));

        for decorator in decorators {
            self.visit(*decorator);
        }
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            self.visit_children(superclasses);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }

        self.scope_stack.pop();
    }

    fn handle_lambda(&mut self, node: Node<'_>) {
        // Lambda parameter names are not references; defaults and the body
        // are, and they evaluate in the enclosing scope.
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.visit_parameters(parameters);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        }
    }

    /// Visit only the expression positions of a parameter list: default
    /// values and annotations. Parameter names themselves are bindings.
    fn visit_parameters(&mut self, parameters: Node<'_>) {
        let mut cursor = parameters.walk();
        let params: Vec<Node> = parameters.named_children(&mut cursor).collect();
        for param in params {
            match param.kind() {
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(ty) = param.child_by_field_name("type") {
                        self.visit(ty);
                    }
                    if let Some(value) = param.child_by_field_name("value") {
                        self.visit(value);
                    }
                }
                "typed_parameter" => {
                    if let Some(ty) = param.child_by_field_name("type") {
                        self.visit(ty);
                    }
                }
                _ => {}
            }
        }
    }

    fn parameter_names(&self, function: Node<'_>) -> FxHashSet<String> {
        let mut names = FxHashSet::default();
        if let Some(parameters) = function.child_by_field_name("parameters") {
            let mut cursor = parameters.walk();
            for param in parameters.named_children(&mut cursor) {
                if let Some(name) = self.parameter_name(param) {
                    names.insert(name);
                }
            }
        }
        names
    }

    fn parameter_name(&self, param: Node<'_>) -> Option<String> {
        match param.kind() {
            "identifier" => Some(self.text(param).to_string()),
            "default_parameter" | "typed_default_parameter" => {
                let name = param.child_by_field_name("name")?;
                (name.kind() == "identifier").then(|| self.text(name).to_string())
            }
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                self.parameter_name(param.named_child(0)?)
            }
            _ => None,
        }
    }

    // ============================================================
    // Statements and expressions
    // ============================================================

    fn handle_assignment(&mut self, node: Node<'_>) {
        let left = node.child_by_field_name("left");
        let right = node.child_by_field_name("right");
        // Chained assignments nest on the right in the grammar; neither
        // hop declares a constant, matching `a = b = 5` declaring none.
        let nested = node.parent().is_some_and(|p| p.kind() == "assignment");
        let single_name = left.is_some_and(|l| l.kind() == "identifier")
            && right.is_some_and(|r| r.kind() != "assignment");

        if let (Some(left), Some(right)) = (left, right) {
            if single_name && !nested && self.scope_stack.len() == 1 {
                self.scope_stack.push(self.text(left).to_string());
                let symbol_name = self.scope_name();
                self.table.insert(
                    symbol_name,
                    Symbol::Constant {
                        lineno: line_of(node),
                    },
                );
                self.visit(left);
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty);
                }
                self.visit(right);
                self.scope_stack.pop();
                return;
            }
        }
        self.visit_children(node);
    }

    fn handle_call(&mut self, node: Node<'_>) {
        if let Some(function) = node.child_by_field_name("function") {
            if function.kind() == "identifier" {
                let name = self.text(function);
                if !self.aliases.contains_key(name)
                    && !is_builtin(name)
                    && self.surface_symbol(name).is_none()
                    && !self.current_params_contain(name)
                {
                    // A candidate that a star-import is expected to supply.
                    self.undeclared.insert(name.to_string());
                }
            }
        }
        // The call's own attribute chain must not leak into arguments.
        let saved = std::mem::take(&mut self.attr_stack);
        self.visit_children(node);
        self.attr_stack = saved;
    }

    fn handle_attribute(&mut self, node: Node<'_>) {
        let Some(attribute) = node.child_by_field_name("attribute") else {
            return self.visit_children(node);
        };
        self.attr_stack.push(self.text(attribute).to_string());
        if let Some(object) = node.child_by_field_name("object") {
            self.visit(object);
        }
        self.attr_stack.pop();
    }

    fn handle_name(&mut self, node: Node<'_>) {
        let raw = self.text(node);
        let name = self
            .aliases
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string());
        if is_builtin(&name) {
            self.used_builtins.insert(name.clone());
        }
        if !self.previously_seen(&name) {
            return;
        }
        let symbol_name = self.surface_symbol(&name).unwrap_or_else(|| {
            let mut parts = vec![name.clone()];
            parts.extend(self.attr_stack.iter().rev().cloned());
            parts.join(".")
        });
        if !self.is_constant_key(&symbol_name) {
            self.used.insert(symbol_name.clone());
        }
        // A symbol never records a reference to itself.
        let surface = self.scope_name();
        if symbol_name != surface {
            let line = line_of(node);
            if self.is_constant_key(&surface) {
                let module = self.module_name.clone();
                self.table.record_use(&module, &symbol_name, line);
            } else {
                self.table.record_use(&surface, &symbol_name, line);
            }
        }
    }

    // ============================================================
    // Lookups
    // ============================================================

    fn previously_seen(&self, name: &str) -> bool {
        self.imported.iter().any(|symbol| symbol == name)
            || self.undeclared.contains(name)
            || is_builtin(name)
            || self.surface_symbol(name).is_some()
    }

    /// The fully-qualified form of `name` if this module declares it
    /// directly (imports shadowing another name do not count).
    fn surface_symbol(&self, name: &str) -> Option<String> {
        let qualified = format!("{}.{}", self.module_name, name);
        match self.table.get(&qualified) {
            Some(symbol) if symbol.shadows().is_none() => Some(qualified),
            _ => None,
        }
    }

    fn is_constant_key(&self, key: &str) -> bool {
        self.table.get(key).is_some_and(Symbol::is_constant)
    }

    fn current_params_contain(&self, name: &str) -> bool {
        self.param_stack
            .last()
            .is_some_and(|params| params.contains(name))
    }

    fn scope_name(&self) -> String {
        self.scope_stack.join(".")
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node_text(node, self.source)
    }

    // ============================================================
    // Post-pass
    // ============================================================

    /// Rewrite forward references: a bare name that coincides with the
    /// short form of a symbol declared in this module becomes its
    /// fully-qualified form wherever it appears in a volume, and leaves
    /// the undeclared set.
    fn post_process(&mut self) {
        let prefix = format!("{}.", self.module_name);
        let stripped: FxHashMap<String, String> = self
            .table
            .keys()
            .filter(|key| key.as_str() != self.module_name && !key.contains('*'))
            .filter_map(|key| {
                key.strip_prefix(&prefix)
                    .map(|short| (short.to_string(), key.clone()))
            })
            .collect();

        let keys: Vec<String> = self.table.keys().cloned().collect();
        for key in keys {
            let Some(volume) = self.table.get_mut(&key).and_then(Symbol::volume_mut) else {
                continue;
            };
            let hits: Vec<String> = volume
                .keys()
                .filter(|name| stripped.contains_key(*name))
                .cloned()
                .collect();
            for short in hits {
                if let Some(entry) = volume.shift_remove(&short) {
                    volume.insert(stripped[&short].clone(), entry);
                }
                self.undeclared.remove(&short);
            }
        }
    }
}

fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Extract a single module's symbols from source text.
pub fn extract_source(
    source: &str,
    module_name: &str,
) -> Result<SymbolTable, crate::error::ExtractError> {
    let mut parser = crate::parser::PythonParser::new();
    let parsed = parser.parse(source, module_name)?;
    let mut walker = ModuleWalker::new(module_name, source);
    walker.walk(&parsed);
    Ok(walker.finish())
}
