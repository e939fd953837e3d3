use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, info, trace};
use std::{
    collections::BTreeMap,
    env,
    fmt::{self, Write as _},
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use oxiunused_core::{DynamicUsage, Export, ExportKind, UsageSite};

use crate::types::AnalysisResult;

pub const USED_EXPORTS_DOC: &str = "used-exports.md";
pub const UNUSED_EXPORTS_DOC: &str = "unused-exports.md";
pub const INTERFACES_DOC: &str = "interfaces.md";
pub const ROUTES_DOC: &str = "routes.md";
pub const MISSING_IMPORTS_DOC: &str = "missing-imports.md";
pub const JSON_DOC: &str = "analysis.json";

/// Path relative to the project root, as shown in the documents.
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

fn display_site(root: &Path, site: &UsageSite) -> String {
    if site.is_framework() {
        "framework".to_string()
    } else {
        format!("{}:{}", display_path(root, &site.file), site.line)
    }
}

fn display_usage(root: &Path, usage: &DynamicUsage) -> String {
    let method = usage.method.map(|m| format!(" {}", m)).unwrap_or_default();
    format!("{}:{} ({}{})", display_path(root, &usage.file), usage.line, usage.target, method)
}

fn export_label(export: &Export) -> String {
    match (export.is_default, export.local_name.as_deref()) {
        (true, Some(local)) => format!("default ({})", local),
        (true, None) => "default".to_string(),
        (false, _) => export.exported_name.clone(),
    }
}

fn kind_label(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Function => "function",
        ExportKind::Class => "class",
        ExportKind::Variable => "variable",
        ExportKind::TypeAlias => "type alias",
        ExportKind::Interface => "interface",
        ExportKind::Enum => "enum",
        ExportKind::Reexport => "re-export",
        ExportKind::Expression => "expression",
    }
}

fn render_used(result: &AnalysisResult, root: &Path, out: &mut String) -> fmt::Result {
    writeln!(out, "# Used Exports\n")?;
    let used = result.used_exports.len();
    writeln!(out, "{} of {} exports are used.\n", used, result.total_exports())?;

    let mut current: Option<&Path> = None;
    for entry in result.used_exports.values() {
        let file = entry.export.file.as_path();
        if current != Some(file) {
            writeln!(out, "\n## {}\n", display_path(root, file))?;
            current = Some(file);
        }
        writeln!(out, "- `{}` (line {})", export_label(&entry.export), entry.export.line)?;
        for site in &entry.used_by {
            writeln!(out, "  - {}", display_site(root, site))?;
        }
    }
    Ok(())
}

fn render_unused(result: &AnalysisResult, root: &Path, out: &mut String) -> fmt::Result {
    writeln!(out, "# Unused Exports\n")?;
    if result.unused_exports.is_empty() {
        return writeln!(out, "No unused exports.");
    }
    writeln!(out, "{} exports are never imported.", result.unused_exports.len())?;

    let mut current: Option<&Path> = None;
    for export in &result.unused_exports {
        if current != Some(export.file.as_path()) {
            writeln!(out, "\n## {}\n", display_path(root, &export.file))?;
            current = Some(export.file.as_path());
        }
        let kind = export.kind.map(|k| format!(", {}", kind_label(k))).unwrap_or_default();
        writeln!(out, "- `{}` (line {}{})", export_label(export), export.line, kind)?;
    }
    Ok(())
}

fn render_interfaces(result: &AnalysisResult, root: &Path, out: &mut String) -> fmt::Result {
    writeln!(out, "# Interfaces\n")?;
    if result.interfaces.is_empty() {
        return writeln!(out, "No interfaces or type aliases declared.");
    }
    for (name, decls) in &result.interfaces {
        writeln!(out, "## {}\n", name)?;
        for decl in decls {
            writeln!(
                out,
                "- declared in {}:{} ({} references)",
                display_path(root, &decl.interface.file),
                decl.interface.line,
                decl.used_by.len()
            )?;
            for site in &decl.used_by {
                writeln!(out, "  - {}", display_site(root, site))?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_routes(result: &AnalysisResult, root: &Path, out: &mut String) -> fmt::Result {
    writeln!(out, "# Routes\n")?;
    for route in &result.routes {
        let kind = if route.is_api { "api" } else { "page" };
        let methods: Vec<&str> = route.methods.iter().map(|m| m.as_str()).collect();
        writeln!(out, "## {} ({})\n", route.route_path, kind)?;
        writeln!(out, "- file: {}", display_path(root, &route.file))?;
        if !methods.is_empty() {
            writeln!(out, "- methods: {}", methods.join(", "))?;
        }
        for usage in &route.used_by {
            writeln!(out, "- called from {}", display_usage(root, usage))?;
        }
        writeln!(out)?;
    }

    writeln!(out, "# Server Actions\n")?;
    for action in &result.server_actions {
        let file = display_path(root, &action.file);
        writeln!(out, "- `{}` in {}:{}", action.name, file, action.line)?;
        for usage in &action.used_by {
            writeln!(out, "  - {}", display_usage(root, usage))?;
        }
    }

    writeln!(out, "\n# Hooks\n")?;
    for hook in &result.hooks {
        writeln!(out, "- `{}` in {}:{}", hook.name, display_path(root, &hook.file), hook.line)?;
        for usage in &hook.used_by {
            writeln!(out, "  - {}", display_usage(root, usage))?;
        }
    }
    Ok(())
}

fn render_missing(result: &AnalysisResult, root: &Path, out: &mut String) -> fmt::Result {
    writeln!(out, "# Missing Imports\n")?;
    if result.missing_imports.is_empty() {
        writeln!(out, "All imports resolved.")?;
    }
    let mut current: Option<&Path> = None;
    for missing in &result.missing_imports {
        let file = missing.failure.importing_file.as_path();
        if current != Some(file) {
            writeln!(out, "\n## {}\n", display_path(root, file))?;
            current = Some(file);
        }
        writeln!(
            out,
            "- `{}` from `{}` (line {}): {} ({})",
            missing.name,
            missing.failure.source_module,
            missing.line,
            missing.failure.reason,
            missing.failure.detail
        )?;
    }

    if !result.errors.is_empty() {
        writeln!(out, "\n# Extraction Errors\n")?;
        for err in &result.errors {
            writeln!(out, "- {}", err)?;
        }
    }
    Ok(())
}

type Renderer = fn(&AnalysisResult, &Path, &mut String) -> fmt::Result;

const DOCUMENTS: &[(&str, Renderer)] = &[
    (USED_EXPORTS_DOC, render_used),
    (UNUSED_EXPORTS_DOC, render_unused),
    (INTERFACES_DOC, render_interfaces),
    (ROUTES_DOC, render_routes),
    (MISSING_IMPORTS_DOC, render_missing),
];

/// Writes the markdown documents (and `analysis.json` when asked) into `out_dir`.
pub fn write_documents(
    result: &AnalysisResult,
    root: &Path,
    out_dir: &Path,
    json: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(DOCUMENTS.len() + 1);
    for (name, render) in DOCUMENTS {
        let mut doc = String::new();
        render(result, root, &mut doc).with_context(|| format!("Failed to render {}", name))?;
        let path = out_dir.join(name);
        fs::write(&path, doc).with_context(|| format!("Failed to write {}", path.display()))?;
        trace!("Wrote {}", path.display());
        written.push(path);
    }

    if json {
        let path = out_dir.join(JSON_DOC);
        let body = serde_json::to_string_pretty(result).context("Failed to serialize analysis")?;
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    info!("Wrote {} documents to {}", written.len(), out_dir.display());
    Ok(written)
}

/// Path relative to the current directory so terminals can open it.
fn relativize_to_cwd(path: &Path) -> String {
    let Ok(cwd) = env::current_dir() else {
        debug!("Failed to get current directory");
        return path.display().to_string();
    };
    make_relative(path, &cwd)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Relative path from `base` to `target`. `None` when they share no root.
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    if target.first() != base.first() {
        return None;
    }

    let common = target.iter().zip(&base).take_while(|(t, b)| t == b).count();
    let mut result = PathBuf::new();
    for _ in common..base.len() {
        result.push("..");
    }
    for component in &target[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

pub fn print_unused_tree<W: Write>(writer: &mut W, result: &AnalysisResult) -> io::Result<()> {
    if result.unused_exports.is_empty() {
        writeln!(writer, "{} No unused exports found.", "✓".green().bold())?;
        return writer.flush();
    }

    let mut by_file: BTreeMap<&Path, Vec<&Export>> = BTreeMap::new();
    for export in &result.unused_exports {
        by_file.entry(export.file.as_path()).or_default().push(export);
    }
    debug!(
        "Printing {} unused exports across {} files",
        result.unused_exports.len(),
        by_file.len()
    );

    writeln!(
        writer,
        "{} {} unused exports\n",
        "⚠".yellow().bold(),
        result.unused_exports.len().to_string().yellow()
    )?;
    for (file, exports) in by_file {
        writeln!(writer, "{}", relativize_to_cwd(file).bright_white().bold())?;
        for (idx, export) in exports.iter().enumerate() {
            let prefix = if idx == exports.len() - 1 { "└──" } else { "├──" };
            writeln!(
                writer,
                "{}  {} (line {})",
                prefix.dimmed(),
                export_label(export),
                export.line.to_string().dimmed()
            )?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

pub fn print_summary<W: Write>(
    writer: &mut W,
    result: &AnalysisResult,
    documents: &[PathBuf],
) -> io::Result<()> {
    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(
        writer,
        "  Exports: {} used, {} unused",
        result.used_exports.len().to_string().green(),
        result.unused_exports.len().to_string().yellow().bold()
    )?;
    writeln!(writer, "  Missing imports: {}", result.missing_imports.len().to_string().red())?;
    writeln!(
        writer,
        "  Routes: {}, server actions: {}, hooks: {}",
        result.routes.len(),
        result.server_actions.len(),
        result.hooks.len()
    )?;
    if !result.errors.is_empty() {
        writeln!(writer, "  Files with errors: {}", result.errors.len().to_string().red())?;
    }
    if let Some(dir) = documents.first().and_then(|p| p.parent()) {
        writeln!(writer, "  Reports: {}", relativize_to_cwd(dir).blue())?;
    }
    writer.flush()
}
