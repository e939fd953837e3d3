//! Core utilities for oxiunused.
//!
//! This crate provides the pieces the export analysis is built on:
//! - The fact model handed from extraction to analysis
//! - Extracting those facts from JS/TS files with oxc
//! - Resolving module references (relative paths, tsconfig path aliases)
//! - Discovering source files under a project root
//! - Route tree conventions and configuration utilities (git root, tsconfig)

mod collector;
mod config;
mod constants;
mod parser;
mod resolver;
mod routes;
mod types;

// Re-export public API
pub use collector::{CollectorConfig, DiscoveryError, collect_source_files};
pub use config::{
    AliasEntry, AliasMatch, AliasTable, TsconfigCache, find_git_root, read_alias_table,
    strip_jsonc,
};
pub use constants::{
    ACTIONS_DIR, APP_COMPONENT_FILES, COMPILER_CONFIG_FILES, DEFAULT_EXCLUDED_FOLDERS,
    HTTP_METHODS, INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS, SPECIAL_EXPORT_NAMES,
};
pub use parser::{extract_facts, facts_for, is_hook_name};
pub use resolver::{ResolveError, Resolver};
pub use routes::{RouteTree, RouteTreeEntry, app_route_path, is_in_actions_dir, route_tree_entry};
pub use types::{
    DynamicUsage, DynamicUsageKind, Export, ExportKey, ExportKind, FRAMEWORK_SITE, Facts,
    FileFacts, Hook, HttpMethod, Import, ImportBinding, Interface, InterfaceKind, Route,
    ServerAction, TypeReference, UsageSite,
};
