//! Static evaluation of JavaScript/TypeScript config modules.
//!
//! Alias configs are almost always plain data: an object literal assigned to
//! `module.exports` or exported as default, with destinations built from
//! `path.resolve(__dirname, ...)`. Instead of executing the file we parse it
//! with oxc and fold the top-level statements into a JSON value.
//!
//! Anything outside the understood subset evaluates to "unknown". Unknown
//! values nested in objects/arrays become `null` (and are later dropped by
//! the normalizer). An unknown exported value, such as a function or a call
//! to a helper, becomes `null` as well, which carries no alias data.
//!
//! `export default X` produces `{ "__esModule": true, "default": X }`, the
//! same interop shape a transpiled module exposes to `require`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;
use serde_json::{Map, Number, Value};

use crate::error::ConfigError;
use crate::paths;
use crate::runtime::Runtime;

/// Parse `source` and return the value a `require()` of it would produce.
pub fn evaluate(path: &Path, source: &str, runtime: &dyn Runtime) -> Result<Value, ConfigError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());

    let ParserReturn {
        program, errors, ..
    } = Parser::new(&allocator, source, source_type).parse();

    if !errors.is_empty() {
        return Err(ConfigError::Script {
            path: path.to_path_buf(),
            message: errors
                .iter()
                .map(|err| format!("{:?}", err))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let cwd = runtime.get_cwd().map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut evaluator = Evaluator::new(path, cwd, runtime);
    for statement in &program.body {
        evaluator.statement(statement);
    }

    match evaluator.exports {
        Eval::Json(value) => Ok(value),
        _ => {
            tracing::debug!("{} has no statically evaluable export", path.display());
            Ok(Value::Null)
        }
    }
}

/// Result of evaluating one expression.
#[derive(Debug, Clone)]
enum Eval {
    Json(Value),
    /// The `path` module (`require('path')`, `import path from 'node:path'`).
    PathModule,
    PathFn(PathFn),
    Unknown,
}

impl Eval {
    fn into_json(self) -> Value {
        match self {
            Eval::Json(value) => value,
            _ => Value::Null,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Eval::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Eval::Json(value) => is_truthy(value),
            Eval::PathModule | Eval::PathFn(_) => true,
            Eval::Unknown => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathFn {
    Resolve,
    Join,
    Dirname,
    Basename,
}

impl PathFn {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "resolve" => Some(Self::Resolve),
            "join" => Some(Self::Join),
            "dirname" => Some(Self::Dirname),
            "basename" => Some(Self::Basename),
            _ => None,
        }
    }
}

/// JavaScript truthiness for JSON values.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_path_module(specifier: &str) -> bool {
    matches!(specifier, "path" | "node:path" | "path/posix" | "node:path/posix")
}

struct Evaluator<'r> {
    filename: String,
    dirname: String,
    cwd: PathBuf,
    runtime: &'r dyn Runtime,
    bindings: HashMap<String, Eval>,
    exports: Eval,
}

impl<'r> Evaluator<'r> {
    fn new(path: &Path, cwd: PathBuf, runtime: &'r dyn Runtime) -> Self {
        let dirname = path
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());

        Self {
            filename: path.to_string_lossy().into_owned(),
            dirname,
            cwd,
            runtime,
            bindings: HashMap::new(),
            exports: Eval::Json(Value::Object(Map::new())),
        }
    }

    fn statement(&mut self, statement: &Statement<'_>) {
        match statement {
            Statement::ImportDeclaration(import) => self.import(import),
            Statement::VariableDeclaration(decl) => self.variables(decl, false),
            Statement::ExpressionStatement(stmt) => self.expression_statement(&stmt.expression),
            Statement::ExportDefaultDeclaration(export) => {
                let value = match export.declaration.as_expression() {
                    Some(expr) => self.eval(expr),
                    None => Eval::Unknown,
                };
                self.set_export("__esModule", Value::Bool(true));
                self.set_export("default", value.into_json());
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(Declaration::VariableDeclaration(decl)) = &export.declaration {
                    self.set_export("__esModule", Value::Bool(true));
                    self.variables(decl, true);
                }
            }
            _ => {}
        }
    }

    fn import(&mut self, import: &ImportDeclaration<'_>) {
        let from_path = is_path_module(import.source.value.as_str());
        let Some(specifiers) = &import.specifiers else {
            return;
        };

        for specifier in specifiers {
            match specifier {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                    let value = if from_path { Eval::PathModule } else { Eval::Unknown };
                    self.bindings.insert(spec.local.name.to_string(), value);
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                    let value = if from_path { Eval::PathModule } else { Eval::Unknown };
                    self.bindings.insert(spec.local.name.to_string(), value);
                }
                ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                    let imported = match &spec.imported {
                        ModuleExportName::IdentifierName(ident) => ident.name.as_str(),
                        ModuleExportName::IdentifierReference(ident) => ident.name.as_str(),
                        ModuleExportName::StringLiteral(lit) => lit.value.as_str(),
                    };
                    let value = match PathFn::from_name(imported) {
                        Some(func) if from_path => Eval::PathFn(func),
                        _ => Eval::Unknown,
                    };
                    self.bindings.insert(spec.local.name.to_string(), value);
                }
            }
        }
    }

    fn variables(&mut self, decl: &VariableDeclaration<'_>, exported: bool) {
        for declarator in &decl.declarations {
            let value = match &declarator.init {
                Some(init) => self.eval(init),
                None => Eval::Json(Value::Null),
            };

            match &declarator.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => {
                    let name = ident.name.to_string();
                    if exported {
                        self.set_export(&name, value.clone().into_json());
                    }
                    self.bindings.insert(name, value);
                }
                BindingPatternKind::ObjectPattern(pattern) => {
                    for property in &pattern.properties {
                        let BindingPatternKind::BindingIdentifier(local) = &property.value.kind
                        else {
                            continue;
                        };
                        let bound = match property.key.static_name() {
                            Some(key) => self.member(&value, &key),
                            None => Eval::Unknown,
                        };
                        self.bindings.insert(local.name.to_string(), bound);
                    }
                }
                _ => {}
            }
        }
    }

    fn expression_statement(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::AssignmentExpression(assign)
                if assign.operator == AssignmentOperator::Assign =>
            {
                let value = self.eval(&assign.right);
                self.assign(&assign.left, value);
            }
            Expression::CallExpression(call) => self.define_property(call),
            Expression::SequenceExpression(seq) => {
                for expr in &seq.expressions {
                    self.expression_statement(expr);
                }
            }
            _ => {}
        }
    }

    /// `module.exports = v`, `module.exports.name = v`, `exports.name = v`.
    fn assign(&mut self, target: &AssignmentTarget<'_>, value: Eval) {
        let AssignmentTarget::StaticMemberExpression(member) = target else {
            return;
        };
        let property = member.property.name.as_str();

        if is_identifier(&member.object, "module") && property == "exports" {
            self.exports = value;
            return;
        }

        let targets_exports = is_identifier(&member.object, "exports")
            || matches!(
                &member.object,
                Expression::StaticMemberExpression(inner) if is_module_exports(inner)
            );
        if targets_exports {
            self.set_export(property, value.into_json());
        }
    }

    /// `Object.defineProperty(exports, "__esModule", { value: true })`
    fn define_property(&mut self, call: &CallExpression<'_>) {
        let Expression::StaticMemberExpression(callee) = &call.callee else {
            return;
        };
        if !is_identifier(&callee.object, "Object")
            || callee.property.name.as_str() != "defineProperty"
        {
            return;
        }

        let args: Vec<&Expression<'_>> = call
            .arguments
            .iter()
            .filter_map(|arg| arg.as_expression())
            .collect();
        if args.len() < 3 || !is_exports_object(args[0]) {
            return;
        }

        let name = self.eval(args[1]);
        let descriptor = self.eval(args[2]);
        if let (Some(name), Eval::Json(Value::Object(descriptor))) = (name.as_str(), descriptor) {
            if let Some(value) = descriptor.get("value") {
                self.set_export(name, value.clone());
            }
        }
    }

    fn set_export(&mut self, name: &str, value: Value) {
        if !matches!(self.exports, Eval::Json(Value::Object(_))) {
            self.exports = Eval::Json(Value::Object(Map::new()));
        }
        if let Eval::Json(Value::Object(map)) = &mut self.exports {
            map.insert(name.to_string(), value);
        }
    }

    fn eval(&mut self, expr: &Expression<'_>) -> Eval {
        match expr {
            Expression::StringLiteral(lit) => Eval::Json(Value::String(lit.value.to_string())),
            Expression::NumericLiteral(lit) => Eval::Json(
                Number::from_f64(lit.value)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            ),
            Expression::BooleanLiteral(lit) => Eval::Json(Value::Bool(lit.value)),
            Expression::NullLiteral(_) => Eval::Json(Value::Null),
            Expression::Identifier(ident) => self.identifier(ident.name.as_str()),
            Expression::TemplateLiteral(template) => self.template(template),
            Expression::BinaryExpression(binary) if binary.operator == BinaryOperator::Addition => {
                let left = self.eval(&binary.left);
                let right = self.eval(&binary.right);
                match (stringify(&left), stringify(&right)) {
                    (Some(l), Some(r)) => Eval::Json(Value::String(format!("{l}{r}"))),
                    _ => Eval::Unknown,
                }
            }
            Expression::LogicalExpression(logical) => {
                let left = self.eval(&logical.left);
                let take_left = match logical.operator {
                    LogicalOperator::Or => left.is_truthy(),
                    LogicalOperator::And => !left.is_truthy(),
                    LogicalOperator::Coalesce => {
                        !matches!(left, Eval::Json(Value::Null) | Eval::Unknown)
                    }
                };
                if take_left { left } else { self.eval(&logical.right) }
            }
            Expression::ArrayExpression(array) => self.array(array),
            Expression::ObjectExpression(object) => self.object(object),
            Expression::CallExpression(call) => self.call(call),
            Expression::StaticMemberExpression(member) => {
                if let Some(name) = env_access(member) {
                    return self
                        .runtime
                        .env_var(name)
                        .map(|value| Eval::Json(Value::String(value)))
                        .unwrap_or(Eval::Unknown);
                }
                let object = self.eval(&member.object);
                self.member(&object, member.property.name.as_str())
            }
            Expression::ComputedMemberExpression(member) => {
                let object = self.eval(&member.object);
                let key = self.eval(&member.expression);
                match stringify(&key) {
                    Some(key) => self.member(&object, &key),
                    None => Eval::Unknown,
                }
            }
            Expression::ParenthesizedExpression(paren) => self.eval(&paren.expression),
            Expression::TSAsExpression(ts) => self.eval(&ts.expression),
            Expression::TSSatisfiesExpression(ts) => self.eval(&ts.expression),
            Expression::TSNonNullExpression(ts) => self.eval(&ts.expression),
            _ => Eval::Unknown,
        }
    }

    fn identifier(&self, name: &str) -> Eval {
        match name {
            "__dirname" => Eval::Json(Value::String(self.dirname.clone())),
            "__filename" => Eval::Json(Value::String(self.filename.clone())),
            _ => self.bindings.get(name).cloned().unwrap_or(Eval::Unknown),
        }
    }

    fn template(&mut self, template: &TemplateLiteral<'_>) -> Eval {
        let mut out = String::new();
        for (index, quasi) in template.quasis.iter().enumerate() {
            match &quasi.value.cooked {
                Some(cooked) => out.push_str(cooked.as_str()),
                None => return Eval::Unknown,
            }
            if let Some(expr) = template.expressions.get(index) {
                let value = self.eval(expr);
                match stringify(&value) {
                    Some(s) => out.push_str(&s),
                    None => return Eval::Unknown,
                }
            }
        }
        Eval::Json(Value::String(out))
    }

    fn array(&mut self, array: &ArrayExpression<'_>) -> Eval {
        let mut items = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            match element {
                ArrayExpressionElement::SpreadElement(spread) => {
                    if let Eval::Json(Value::Array(spread)) = self.eval(&spread.argument) {
                        items.extend(spread);
                    }
                }
                ArrayExpressionElement::Elision(_) => items.push(Value::Null),
                _ => {
                    let value = element
                        .as_expression()
                        .map(|expr| self.eval(expr))
                        .unwrap_or(Eval::Unknown);
                    items.push(value.into_json());
                }
            }
        }
        Eval::Json(Value::Array(items))
    }

    fn object(&mut self, object: &ObjectExpression<'_>) -> Eval {
        let mut map = Map::new();
        for property in &object.properties {
            match property {
                ObjectPropertyKind::ObjectProperty(prop) => {
                    if prop.kind != PropertyKind::Init {
                        continue;
                    }
                    let key = if prop.computed {
                        prop.key
                            .as_expression()
                            .map(|expr| self.eval(expr))
                            .and_then(|key| stringify(&key))
                    } else {
                        prop.key.static_name().map(|name| name.into_owned())
                    };
                    let Some(key) = key else {
                        continue;
                    };
                    let value = self.eval(&prop.value);
                    map.insert(key, value.into_json());
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    if let Eval::Json(Value::Object(spread)) = self.eval(&spread.argument) {
                        for (key, value) in spread {
                            map.insert(key, value);
                        }
                    }
                }
            }
        }
        Eval::Json(Value::Object(map))
    }

    fn call(&mut self, call: &CallExpression<'_>) -> Eval {
        if is_identifier(&call.callee, "require") {
            return match call.arguments.first().and_then(|arg| arg.as_expression()) {
                Some(Expression::StringLiteral(lit)) if is_path_module(lit.value.as_str()) => {
                    Eval::PathModule
                }
                _ => Eval::Unknown,
            };
        }

        if let Expression::StaticMemberExpression(member) = &call.callee {
            if is_identifier(&member.object, "process") && member.property.name.as_str() == "cwd" {
                return Eval::Json(Value::String(self.cwd.to_string_lossy().into_owned()));
            }
        }

        let Eval::PathFn(func) = self.eval(&call.callee) else {
            return Eval::Unknown;
        };

        let mut args = Vec::with_capacity(call.arguments.len());
        for arg in &call.arguments {
            let Some(expr) = arg.as_expression() else {
                return Eval::Unknown;
            };
            match self.eval(expr) {
                Eval::Json(Value::String(s)) => args.push(s),
                _ => return Eval::Unknown,
            }
        }

        self.apply_path_fn(func, &args)
    }

    fn apply_path_fn(&self, func: PathFn, args: &[String]) -> Eval {
        let result = match func {
            PathFn::Resolve => paths::resolve_from(&self.cwd, args)
                .to_string_lossy()
                .into_owned(),
            PathFn::Join => match args.split_first() {
                Some((first, rest)) => paths::join_all(first, rest).to_string_lossy().into_owned(),
                None => ".".to_string(),
            },
            PathFn::Dirname => match args.first() {
                Some(arg) => Path::new(arg)
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| ".".to_string()),
                None => return Eval::Unknown,
            },
            PathFn::Basename => match args.first() {
                Some(arg) => Path::new(arg)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                None => return Eval::Unknown,
            },
        };
        Eval::Json(Value::String(result))
    }

    fn member(&self, object: &Eval, property: &str) -> Eval {
        match object {
            Eval::PathModule => match property {
                "posix" => Eval::PathModule,
                _ => PathFn::from_name(property)
                    .map(Eval::PathFn)
                    .unwrap_or(Eval::Unknown),
            },
            Eval::Json(Value::Object(map)) => map
                .get(property)
                .cloned()
                .map(Eval::Json)
                .unwrap_or(Eval::Unknown),
            Eval::Json(Value::Array(items)) => property
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index).cloned())
                .map(Eval::Json)
                .unwrap_or(Eval::Unknown),
            _ => Eval::Unknown,
        }
    }
}

fn is_identifier(expr: &Expression<'_>, name: &str) -> bool {
    matches!(expr, Expression::Identifier(ident) if ident.name.as_str() == name)
}

fn is_exports_object(expr: &Expression<'_>) -> bool {
    is_identifier(expr, "exports")
        || matches!(
            expr,
            Expression::StaticMemberExpression(member) if is_module_exports(member)
        )
}

fn is_module_exports(member: &StaticMemberExpression<'_>) -> bool {
    is_identifier(&member.object, "module") && member.property.name.as_str() == "exports"
}

/// `process.env.NAME` → `NAME`
fn env_access<'a>(member: &'a StaticMemberExpression<'_>) -> Option<&'a str> {
    let Expression::StaticMemberExpression(env) = &member.object else {
        return None;
    };
    if is_identifier(&env.object, "process") && env.property.name.as_str() == "env" {
        Some(member.property.name.as_str())
    } else {
        None
    }
}

/// String conversion used by `+` and template literals.
fn stringify(value: &Eval) -> Option<String> {
    match value {
        Eval::Json(Value::String(s)) => Some(s.clone()),
        Eval::Json(Value::Number(n)) => Some(n.to_string()),
        Eval::Json(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}
