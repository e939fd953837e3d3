use anyhow::{Context, Result, bail};
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::{SourceType, Span};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::HTTP_METHODS,
    routes::route_tree_entry,
    types::{
        DynamicUsage, DynamicUsageKind, Export, ExportKind, FileFacts, Hook, HttpMethod, Import,
        ImportBinding, Interface, InterfaceKind, Route, ServerAction, TypeReference,
    },
};

/// Reads and extracts facts from one file.
pub fn facts_for(root: &Path, file: &Path) -> Result<FileFacts> {
    trace!("Parsing file for facts: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    extract_facts(root, file, &src)
}

/// Extracts exports, imports, type declarations, framework entry points and dynamic
/// usages from source text. `root` is the project root used to locate the route tree.
pub fn extract_facts(root: &Path, file: &Path, src: &str) -> Result<FileFacts> {
    let st = SourceType::from_path(file).unwrap_or_default();
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, src, st).parse();

    if panicked {
        let reason = errors.first().map(|e| e.to_string()).unwrap_or_default();
        bail!("Failed to parse {}: {}", file.display(), reason);
    }
    if !errors.is_empty() {
        debug!("{} recoverable parse errors in {}", errors.len(), file.display());
    }

    let module_is_server = has_use_server(&program.directives);
    let mut collector = FactCollector {
        file: file.to_path_buf(),
        lines: LineIndex::new(src),
        facts: FileFacts::default(),
        action_candidates: Vec::new(),
        hook_candidates: Vec::new(),
    };

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => collector.collect_import(decl),
            Statement::ExportNamedDeclaration(decl) => {
                collector.collect_named_export(decl, module_is_server)
            }
            Statement::ExportDefaultDeclaration(decl) => collector.collect_default_export(decl),
            Statement::ExportAllDeclaration(decl) => collector.collect_export_all(decl),
            _ => {}
        }
    }
    collector.visit_program(&program);

    let mut facts = collector.finish();
    if let Some(entry) = route_tree_entry(root, file)
        && let Some((route_path, is_api)) = entry.route()
    {
        let methods = facts
            .exports
            .iter()
            .filter(|e| !e.is_default && HTTP_METHODS.contains(&e.exported_name.as_str()))
            .filter_map(|e| HttpMethod::parse(&e.exported_name))
            .collect();
        trace!("Found route '{}' in {}", route_path, file.display());
        facts.routes.push(Route {
            route_path,
            file: file.to_path_buf(),
            is_api,
            methods,
            used_by: Vec::new(),
        });
    }

    debug!(
        "Extracted {} exports, {} imports, {} dynamic usages from {}",
        facts.exports.len(),
        facts.imports.len(),
        facts.dynamic_usages.len(),
        file.display()
    );
    Ok(facts)
}

/// Byte offset to 1-based line lookup.
struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(i, _)| i as u32 + 1));
        Self { starts }
    }

    fn line(&self, span: Span) -> u32 {
        self.starts.partition_point(|&s| s <= span.start) as u32
    }
}

struct FactCollector {
    file: PathBuf,
    lines: LineIndex,
    facts: FileFacts,
    /// Exported callables that become server actions or hooks once the file is done
    action_candidates: Vec<(String, u32)>,
    hook_candidates: Vec<(String, u32)>,
}

impl FactCollector {
    fn finish(mut self) -> FileFacts {
        for (name, line) in self.action_candidates {
            trace!("Found server action '{}' in {}", name, self.file.display());
            self.facts.server_actions.push(ServerAction {
                name,
                file: self.file.clone(),
                line,
                used_by: Vec::new(),
            });
        }
        for (name, line) in self.hook_candidates {
            trace!("Found hook '{}' in {}", name, self.file.display());
            self.facts.hooks.push(Hook {
                name,
                file: self.file.clone(),
                line,
                used_by: Vec::new(),
            });
        }
        self.facts
    }

    fn push_export(
        &mut self,
        exported_name: String,
        local_name: Option<String>,
        line: u32,
        is_default: bool,
        kind: Option<ExportKind>,
    ) {
        trace!(
            "Found export '{}' (default: {}) in {}",
            exported_name,
            is_default,
            self.file.display()
        );
        self.facts.exports.push(Export {
            exported_name,
            local_name,
            file: self.file.clone(),
            line,
            is_default,
            kind,
        });
    }

    /// Named export of a local declaration.
    fn push_declared(&mut self, name: String, line: u32, kind: ExportKind) {
        self.push_export(name.clone(), Some(name), line, false, Some(kind));
    }

    fn collect_import(&mut self, decl: &ImportDeclaration<'_>) {
        let bindings = decl
            .specifiers
            .iter()
            .flatten()
            .map(|spec| match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    ImportBinding::Named(module_export_name(&s.imported))
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    ImportBinding::Default(s.local.name.to_string())
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    ImportBinding::Namespace(s.local.name.to_string())
                }
            })
            .collect();

        let source = decl.source.value.to_string();
        trace!("Found import: '{}' in {}", source, self.file.display());
        self.facts.imports.push(Import {
            file: self.file.clone(),
            bindings,
            source,
            line: self.lines.line(decl.span),
        });
    }

    fn collect_named_export(&mut self, decl: &ExportNamedDeclaration<'_>, module_is_server: bool) {
        let line = self.lines.line(decl.span);

        // Re-exports stay attributed to this file: `export { a } from './b'`
        if decl.source.is_some() {
            for spec in &decl.specifiers {
                let exported = module_export_name(&spec.exported);
                let local = module_export_name(&spec.local);
                let is_default = exported == "default";
                let local_name = (local != "default").then_some(local);
                let kind = Some(ExportKind::Reexport);
                self.push_export(exported, local_name, line, is_default, kind);
            }
            return;
        }

        if let Some(declaration) = &decl.declaration {
            match declaration {
                Declaration::VariableDeclaration(var) => {
                    for d in &var.declarations {
                        if let BindingPatternKind::BindingIdentifier(id) = &d.id.kind {
                            let name = id.name.to_string();
                            let callable = d.init.as_ref().is_some_and(|init| {
                                matches!(
                                    init,
                                    Expression::ArrowFunctionExpression(_)
                                        | Expression::FunctionExpression(_)
                                )
                            });
                            if callable {
                                self.note_callable(&name, line, module_is_server, false);
                            }
                            self.push_export(
                                name.clone(),
                                Some(name),
                                line,
                                false,
                                Some(ExportKind::Variable),
                            );
                        }
                    }
                }
                Declaration::FunctionDeclaration(f) => {
                    if let Some(id) = &f.id {
                        let name = id.name.to_string();
                        let inline_server = f
                            .body
                            .as_ref()
                            .is_some_and(|body| has_use_server(&body.directives));
                        self.note_callable(&name, line, module_is_server, inline_server);
                        self.push_export(
                            name.clone(),
                            Some(name),
                            line,
                            false,
                            Some(ExportKind::Function),
                        );
                    }
                }
                Declaration::ClassDeclaration(c) => {
                    if let Some(id) = &c.id {
                        let name = id.name.to_string();
                        self.push_declared(name, line, ExportKind::Class);
                    }
                }
                Declaration::TSTypeAliasDeclaration(t) => {
                    let name = t.id.name.to_string();
                    self.push_declared(name, line, ExportKind::TypeAlias);
                }
                Declaration::TSInterfaceDeclaration(i) => {
                    let name = i.id.name.to_string();
                    self.push_declared(name, line, ExportKind::Interface);
                }
                Declaration::TSEnumDeclaration(e) => {
                    let name = e.id.name.to_string();
                    self.push_declared(name, line, ExportKind::Enum);
                }
                _ => {}
            }
        }

        // export { foo, bar as baz };
        for spec in &decl.specifiers {
            let exported = module_export_name(&spec.exported);
            let local = module_export_name(&spec.local);
            let is_default = exported == "default";
            if module_is_server && !is_default {
                self.action_candidates.push((exported.clone(), line));
            }
            self.push_export(exported, Some(local), line, is_default, None);
        }
    }

    fn collect_default_export(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        let line = self.lines.line(decl.span);
        let (local_name, kind) = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                (f.id.as_ref().map(|i| i.name.to_string()), ExportKind::Function)
            }
            ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                (c.id.as_ref().map(|i| i.name.to_string()), ExportKind::Class)
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(i) => {
                (Some(i.id.name.to_string()), ExportKind::Interface)
            }
            ExportDefaultDeclarationKind::Identifier(id) => {
                (Some(id.name.to_string()), ExportKind::Expression)
            }
            _ => (None, ExportKind::Expression),
        };
        self.push_export("default".to_string(), local_name, line, true, Some(kind));
    }

    fn collect_export_all(&mut self, decl: &ExportAllDeclaration<'_>) {
        // `export * from` is not traced to its origin; only `export * as ns` names a binding
        if let Some(exported) = &decl.exported {
            let name = module_export_name(exported);
            let line = self.lines.line(decl.span);
            self.push_declared(name, line, ExportKind::Reexport);
        }
    }

    fn note_callable(
        &mut self,
        name: &str,
        line: u32,
        module_is_server: bool,
        inline_server: bool,
    ) {
        if module_is_server || inline_server {
            self.action_candidates.push((name.to_string(), line));
        }
        if is_hook_name(name) {
            self.hook_candidates.push((name.to_string(), line));
        }
    }

    fn push_usage(
        &mut self,
        kind: DynamicUsageKind,
        target: String,
        method: Option<HttpMethod>,
        span: Span,
    ) {
        trace!("Found {:?} usage of '{}' in {}", kind, target, self.file.display());
        self.facts.dynamic_usages.push(DynamicUsage {
            kind,
            target,
            method,
            file: self.file.clone(),
            line: self.lines.line(span),
        });
    }

    fn push_type_reference(&mut self, name: String, span: Span) {
        self.facts.type_references.push(TypeReference {
            name,
            file: self.file.clone(),
            line: self.lines.line(span),
        });
    }
}

impl<'a> Visit<'a> for FactCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        match &call.callee {
            Expression::Identifier(ident) => {
                let name = ident.name.as_str();
                if name == "fetch" {
                    if let Some(target) =
                        call.arguments.first().and_then(|a| a.as_expression()).and_then(url_text)
                    {
                        let method = match call.arguments.get(1).and_then(|a| a.as_expression()) {
                            Some(options) => fetch_method(options),
                            None => Some(HttpMethod::Get),
                        };
                        self.push_usage(DynamicUsageKind::NetworkCall, target, method, call.span);
                    }
                } else if is_hook_name(name) {
                    self.push_usage(DynamicUsageKind::HookCall, name.to_string(), None, call.span);
                    if matches!(name, "useActionState" | "useFormState")
                        && let Some(Expression::Identifier(action)) =
                            call.arguments.first().and_then(|a| a.as_expression())
                    {
                        self.push_usage(
                            DynamicUsageKind::ActionCall,
                            action.name.to_string(),
                            None,
                            call.span,
                        );
                    }
                }
            }
            // axios.get('/api/users'), api.post(`/api/items/${id}`)
            Expression::StaticMemberExpression(member) => {
                if let Some(method) = HttpMethod::parse(member.property.name.as_str())
                    && member.property.name.chars().all(|c| c.is_ascii_lowercase())
                    && let Some(target) =
                        call.arguments.first().and_then(|a| a.as_expression()).and_then(url_text)
                    && target.starts_with('/')
                {
                    self.push_usage(DynamicUsageKind::NetworkCall, target, Some(method), call.span);
                }
            }
            _ => {}
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_jsx_attribute(&mut self, attr: &JSXAttribute<'a>) {
        if let JSXAttributeName::Identifier(name) = &attr.name
            && matches!(name.name.as_str(), "action" | "formAction")
            && let Some(JSXAttributeValue::ExpressionContainer(container)) = &attr.value
        {
            let target = match &container.expression {
                JSXExpression::Identifier(id) => Some(id.name.to_string()),
                // action={save.bind(null, id)}
                JSXExpression::CallExpression(call) => match &call.callee {
                    Expression::StaticMemberExpression(member)
                        if member.property.name.as_str() == "bind" =>
                    {
                        match &member.object {
                            Expression::Identifier(id) => Some(id.name.to_string()),
                            _ => None,
                        }
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some(target) = target {
                self.push_usage(DynamicUsageKind::FormAction, target, None, attr.span);
            }
        }
        walk::walk_jsx_attribute(self, attr);
    }

    fn visit_ts_interface_declaration(&mut self, decl: &TSInterfaceDeclaration<'a>) {
        self.facts.interfaces.push(Interface {
            name: decl.id.name.to_string(),
            file: self.file.clone(),
            line: self.lines.line(decl.span),
            kind: InterfaceKind::Interface,
        });
        walk::walk_ts_interface_declaration(self, decl);
    }

    fn visit_ts_type_alias_declaration(&mut self, decl: &TSTypeAliasDeclaration<'a>) {
        self.facts.interfaces.push(Interface {
            name: decl.id.name.to_string(),
            file: self.file.clone(),
            line: self.lines.line(decl.span),
            kind: InterfaceKind::TypeAlias,
        });
        walk::walk_ts_type_alias_declaration(self, decl);
    }

    fn visit_ts_type_reference(&mut self, reference: &TSTypeReference<'a>) {
        if let Some(name) = type_name_text(&reference.type_name) {
            self.push_type_reference(name, reference.span);
        }
        walk::walk_ts_type_reference(self, reference);
    }

    fn visit_ts_interface_heritage(&mut self, heritage: &TSInterfaceHeritage<'a>) {
        let name = match &heritage.expression {
            Expression::Identifier(id) => Some(id.name.to_string()),
            Expression::StaticMemberExpression(member) => Some(member.property.name.to_string()),
            _ => None,
        };
        if let Some(name) = name {
            self.push_type_reference(name, heritage.span);
        }
        walk::walk_ts_interface_heritage(self, heritage);
    }

    fn visit_ts_class_implements(&mut self, implements: &TSClassImplements<'a>) {
        if let Some(name) = type_name_text(&implements.expression) {
            self.push_type_reference(name, implements.span);
        }
        walk::walk_ts_class_implements(self, implements);
    }
}

fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
    }
}

/// Right-most identifier of a possibly qualified type name (`React.FC` -> `FC`).
fn type_name_text(name: &TSTypeName<'_>) -> Option<String> {
    match name {
        TSTypeName::IdentifierReference(id) => Some(id.name.to_string()),
        TSTypeName::QualifiedName(q) => Some(q.right.name.to_string()),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn has_use_server(directives: &[Directive<'_>]) -> bool {
    directives.iter().any(|d| d.directive.as_str() == "use server")
}

/// `useWidget`, `use3D`; not `user` or `use`.
pub fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Literal URL text of a string or template literal; template holes become `:param`.
fn url_text(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::StringLiteral(s) => Some(s.value.to_string()),
        Expression::TemplateLiteral(t) => {
            let mut out = String::new();
            for (i, quasi) in t.quasis.iter().enumerate() {
                out.push_str(quasi.value.raw.as_str());
                if i < t.expressions.len() {
                    out.push_str(":param");
                }
            }
            Some(out)
        }
        _ => None,
    }
}

/// Method named by a fetch options argument such as `{ method: 'POST' }`.
///
/// Options without a `method` key default to `GET`. A computed method yields `None`.
fn fetch_method(options: &Expression<'_>) -> Option<HttpMethod> {
    let Expression::ObjectExpression(obj) = options else {
        return None;
    };
    let method = obj.properties.iter().filter_map(|p| p.as_property()).find(|prop| {
        match &prop.key {
            PropertyKey::StaticIdentifier(id) => id.name.as_str() == "method",
            PropertyKey::StringLiteral(s) => s.value.as_str() == "method",
            _ => false,
        }
    });
    match method.map(|prop| &prop.value) {
        None => Some(HttpMethod::Get),
        Some(Expression::StringLiteral(s)) => HttpMethod::parse(s.value.as_str()),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extract(rel: &str, src: &str) -> FileFacts {
        let root = PathBuf::from("/proj");
        extract_facts(&root, &root.join(rel), src).unwrap()
    }

    fn names(facts: &FileFacts) -> Vec<&str> {
        facts.exports.iter().map(|e| e.exported_name.as_str()).collect()
    }

    #[test]
    fn test_named_exports() {
        let facts = extract(
            "src/lib.ts",
            r#"export const a = 1;
export function b() {}
export class C {}
export type T = string;
export interface I {}
export enum E { X }
"#,
        );
        assert_eq!(names(&facts), vec!["a", "b", "C", "T", "I", "E"]);
        assert_eq!(facts.exports[1].line, 2);
        assert_eq!(facts.exports[1].kind, Some(ExportKind::Function));
        assert!(facts.exports.iter().all(|e| !e.is_default));
    }

    #[test]
    fn test_export_specifiers_with_alias() {
        let facts = extract("src/lib.ts", "const a = 1;\nexport { a as b, a };\n");
        assert_eq!(names(&facts), vec!["b", "a"]);
        assert_eq!(facts.exports[0].local_name.as_deref(), Some("a"));
    }

    #[test]
    fn test_default_exports() {
        let named = extract("src/Button.tsx", "export default function Button() { return null; }");
        assert!(named.exports[0].is_default);
        assert_eq!(named.exports[0].exported_name, "default");
        assert_eq!(named.exports[0].local_name.as_deref(), Some("Button"));

        let anonymous = extract("src/anon.ts", "export default () => 42;");
        assert_eq!(anonymous.exports[0].local_name, None);

        let ident = extract("src/ident.ts", "const Widget = 1;\nexport default Widget;");
        assert_eq!(ident.exports[0].local_name.as_deref(), Some("Widget"));
        assert_eq!(ident.exports[0].line, 2);
    }

    #[test]
    fn test_reexports_stay_shallow() {
        let facts = extract(
            "src/index.ts",
            r#"export { Button } from './Button';
export { default as Card } from './Card';
export * from './all';
"#,
        );
        assert_eq!(names(&facts), vec!["Button", "Card"]);
        assert!(facts.exports.iter().all(|e| e.kind == Some(ExportKind::Reexport)));
        assert!(facts.imports.is_empty());
    }

    #[test]
    fn test_imports() {
        let facts = extract(
            "src/app.ts",
            r#"import React, { useState as useS } from 'react';
import * as utils from './utils';
import './polyfill';
import type { Props } from './types';
"#,
        );
        assert_eq!(facts.imports.len(), 4);
        assert_eq!(
            facts.imports[0].bindings,
            vec![ImportBinding::Default("React".into()), ImportBinding::Named("useState".into())]
        );
        assert_eq!(facts.imports[1].bindings, vec![ImportBinding::Namespace("utils".into())]);
        assert!(facts.imports[2].bindings.is_empty());
        assert_eq!(facts.imports[3].source, "./types");
        assert_eq!(facts.imports[3].line, 4);
    }

    #[test]
    fn test_interfaces_and_type_references() {
        let facts = extract(
            "src/types.ts",
            r#"interface Base {}
interface User extends Base { id: Id }
type Id = string;
class Impl implements User { id: Id = '' }
function f(u: Models.User): void {}
"#,
        );
        let declared: Vec<_> = facts.interfaces.iter().map(|i| (i.name.as_str(), i.kind)).collect();
        assert_eq!(
            declared,
            vec![
                ("Base", InterfaceKind::Interface),
                ("User", InterfaceKind::Interface),
                ("Id", InterfaceKind::TypeAlias)
            ]
        );
        let refs: Vec<_> = facts.type_references.iter().map(|r| r.name.as_str()).collect();
        assert!(refs.contains(&"Base"));
        assert!(refs.contains(&"Id"));
        assert!(refs.contains(&"User"));
        let base_ref = facts.type_references.iter().find(|r| r.name == "Base").unwrap();
        assert_eq!(base_ref.line, 2);
    }

    #[test]
    fn test_server_actions_module_directive() {
        let facts = extract(
            "src/actions/user.ts",
            r#"'use server';
export async function createUser() {}
export const deleteUser = async () => {};
export const LIMIT = 3;
"#,
        );
        let actions: Vec<_> = facts.server_actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(actions, vec!["createUser", "deleteUser"]);
    }

    #[test]
    fn test_server_action_inline_directive() {
        let facts = extract(
            "src/lib/form.ts",
            "export async function save() { 'use server'; }\nexport async function load() {}\n",
        );
        assert_eq!(facts.server_actions.len(), 1);
        assert_eq!(facts.server_actions[0].name, "save");
    }

    #[test]
    fn test_hooks_declared_and_called() {
        let facts = extract(
            "src/hooks/widget.ts",
            r#"export function useWidget() {}
export const user = 1;
function App() { const w = useWidget(); }
"#,
        );
        assert_eq!(facts.hooks.len(), 1);
        assert_eq!(facts.hooks[0].name, "useWidget");
        let calls: Vec<_> = facts
            .dynamic_usages
            .iter()
            .filter(|u| u.kind == DynamicUsageKind::HookCall)
            .map(|u| (u.target.as_str(), u.line))
            .collect();
        assert_eq!(calls, vec![("useWidget", 3)]);
    }

    #[test]
    fn test_network_calls() {
        let facts = extract(
            "src/client.ts",
            r#"async function go(id: string, verb: string) {
  await fetch('/api/users');
  await fetch(`/api/users/${id}`, { method: 'DELETE' });
  await axios.post('/api/items', {});
  await fetch('/api/items', { method: verb });
  await fetch('/api/items', { cache: 'no-store' });
}
"#,
        );
        let calls: Vec<_> = facts
            .dynamic_usages
            .iter()
            .filter(|u| u.kind == DynamicUsageKind::NetworkCall)
            .map(|u| (u.target.as_str(), u.method, u.line))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("/api/users", Some(HttpMethod::Get), 2),
                ("/api/users/:param", Some(HttpMethod::Delete), 3),
                ("/api/items", Some(HttpMethod::Post), 4),
                ("/api/items", None, 5),
                ("/api/items", Some(HttpMethod::Get), 6),
            ]
        );
    }

    #[test]
    fn test_form_actions() {
        let facts = extract(
            "src/app/form.tsx",
            r#"export function F({ id }) {
  return <form action={createUser}><button formAction={remove.bind(null, id)} /></form>;
}
"#,
        );
        let actions: Vec<_> = facts
            .dynamic_usages
            .iter()
            .filter(|u| u.kind == DynamicUsageKind::FormAction)
            .map(|u| u.target.as_str())
            .collect();
        assert_eq!(actions, vec!["createUser", "remove"]);
    }

    #[test]
    fn test_action_state_hook_records_action_call() {
        let facts = extract(
            "src/app/form.tsx",
            "function F() { const [s, act] = useActionState(createUser, null); }",
        );
        assert!(
            facts
                .dynamic_usages
                .iter()
                .any(|u| u.kind == DynamicUsageKind::ActionCall && u.target == "createUser")
        );
    }

    #[test]
    fn test_route_file() {
        let facts = extract(
            "app/api/users/route.ts",
            r#"export async function GET() {}
export async function POST() {}
export const dynamic = 'force-dynamic';
"#,
        );
        assert_eq!(facts.routes.len(), 1);
        let route = &facts.routes[0];
        assert_eq!(route.route_path, "/api/users");
        assert!(route.is_api);
        assert_eq!(route.methods, vec![HttpMethod::Get, HttpMethod::Post]);
    }

    #[test]
    fn test_page_route_file() {
        let facts = extract(
            "app/(shop)/products/[id]/page.tsx",
            "export default function Page() { return null; }",
        );
        assert_eq!(facts.routes[0].route_path, "/products/[id]");
        assert!(!facts.routes[0].is_api);
        assert!(facts.routes[0].methods.is_empty());
    }

    #[test]
    fn test_is_hook_name() {
        assert!(is_hook_name("useWidget"));
        assert!(is_hook_name("use3D"));
        assert!(!is_hook_name("use"));
        assert!(!is_hook_name("user"));
        assert!(!is_hook_name("fuseThing"));
    }

    #[test]
    fn test_facts_for_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.ts");
        fs::write(&file, "export const x = 1;").unwrap();
        let facts = facts_for(temp_dir.path(), &file).unwrap();
        assert_eq!(facts.exports.len(), 1);
        assert_eq!(facts.exports[0].file, file);
    }

    #[test]
    fn test_facts_for_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(facts_for(temp_dir.path(), &temp_dir.path().join("nope.ts")).is_err());
    }
}
