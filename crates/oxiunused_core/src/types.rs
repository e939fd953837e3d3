use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Marker used as the file of a usage site created by a liveness rule
pub const FRAMEWORK_SITE: &str = "<framework>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    Function,
    Class,
    Variable,
    TypeAlias,
    Interface,
    Enum,
    Reexport,
    Expression,
}

/// A named or default binding a file makes available to importers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    pub exported_name: String,
    /// Binding name inside the declaring file. `None` for anonymous default exports.
    pub local_name: Option<String>,
    pub file: PathBuf,
    pub line: u32,
    pub is_default: bool,
    pub kind: Option<ExportKind>,
}

impl Export {
    pub fn key(&self) -> ExportKey {
        ExportKey {
            file: self.file.clone(),
            name: self.exported_name.clone(),
            is_default: self.is_default,
        }
    }
}

/// Identity of an export within one run. Orders by file, then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExportKey {
    pub file: PathBuf,
    pub name: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum ImportBinding {
    /// `import Foo from '...'`, carries the local name
    Default(String),
    /// `import { foo } from '...'`, carries the imported (exported-side) name
    Named(String),
    /// `import * as ns from '...'`, carries the local name
    Namespace(String),
}

impl ImportBinding {
    pub fn name(&self) -> &str {
        match self {
            ImportBinding::Default(n) | ImportBinding::Named(n) | ImportBinding::Namespace(n) => n,
        }
    }
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub file: PathBuf,
    pub bindings: Vec<ImportBinding>,
    pub source: String,
    pub line: u32,
}

impl Import {
    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(ImportBinding::name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceKind {
    Interface,
    TypeAlias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub kind: InterfaceKind,
}

/// An identifier seen in a type position (annotation, `extends`, `implements`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeReference {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UsageSite {
    pub file: PathBuf,
    pub line: u32,
}

impl UsageSite {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self { file: file.into(), line }
    }

    /// Synthetic site recorded when the framework itself consumes an export
    pub fn framework() -> Self {
        Self { file: PathBuf::from(FRAMEWORK_SITE), line: 0 }
    }

    pub fn is_framework(&self) -> bool {
        self.line == 0 && self.file == Path::new(FRAMEWORK_SITE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "OPTIONS" => Some(Self::Options),
            "HEAD" => Some(Self::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicUsageKind {
    NetworkCall,
    FormAction,
    HookCall,
    ActionCall,
}

/// A runtime reference detected syntactically: `fetch('/api/x')`, `<form action={save}>`,
/// `useWidget()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicUsage {
    pub kind: DynamicUsageKind,
    pub target: String,
    pub method: Option<HttpMethod>,
    pub file: PathBuf,
    pub line: u32,
}

impl DynamicUsage {
    pub fn site(&self) -> UsageSite {
        UsageSite::new(self.file.clone(), self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub route_path: String,
    pub file: PathBuf,
    pub is_api: bool,
    pub methods: Vec<HttpMethod>,
    pub used_by: Vec<DynamicUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerAction {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub used_by: Vec<DynamicUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hook {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub used_by: Vec<DynamicUsage>,
}

/// Everything extracted from one source file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub exports: Vec<Export>,
    pub imports: Vec<Import>,
    pub interfaces: Vec<Interface>,
    pub type_references: Vec<TypeReference>,
    pub routes: Vec<Route>,
    pub server_actions: Vec<ServerAction>,
    pub hooks: Vec<Hook>,
    pub dynamic_usages: Vec<DynamicUsage>,
}

/// Facts for the whole project, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    pub exports: Vec<Export>,
    pub imports: Vec<Import>,
    pub interfaces: Vec<Interface>,
    pub type_references: Vec<TypeReference>,
    pub routes: Vec<Route>,
    pub server_actions: Vec<ServerAction>,
    pub hooks: Vec<Hook>,
    pub dynamic_usages: Vec<DynamicUsage>,
    /// Per-file extraction failures. The files they name contributed no facts.
    pub errors: Vec<String>,
}

impl Facts {
    pub fn push_file(&mut self, facts: FileFacts) {
        self.exports.extend(facts.exports);
        self.imports.extend(facts.imports);
        self.interfaces.extend(facts.interfaces);
        self.type_references.extend(facts.type_references);
        self.routes.extend(facts.routes);
        self.server_actions.extend(facts.server_actions);
        self.hooks.extend(facts.hooks);
        self.dynamic_usages.extend(facts.dynamic_usages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_key_orders_by_file_then_name() {
        let a = ExportKey { file: PathBuf::from("/p/a.ts"), name: "z".into(), is_default: false };
        let b = ExportKey { file: PathBuf::from("/p/b.ts"), name: "a".into(), is_default: false };
        let c = ExportKey { file: PathBuf::from("/p/b.ts"), name: "b".into(), is_default: false };
        let mut keys = vec![c.clone(), a.clone(), b.clone()];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }

    #[test]
    fn test_framework_site() {
        assert!(UsageSite::framework().is_framework());
        assert!(!UsageSite::new("/p/a.ts", 0).is_framework());
        assert!(!UsageSite::new(FRAMEWORK_SITE, 3).is_framework());
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("DELETE"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("FETCH"), None);
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }
}
