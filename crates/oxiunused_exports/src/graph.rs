use log::{debug, info, trace};
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use oxiunused_core::{Export, ExportKey, Facts, Import, ImportBinding, Resolver, UsageSite};

use crate::{
    interfaces::aggregate_interface_usage,
    rules::{LivenessRule, RuleContext, default_rules},
    types::{AnalysisResult, AnalyzedExport, FailureReason, MissingImport, ResolutionFailure},
    usage::attach_dynamic_usages,
};

/// Export index plus the usage sites collected for each export.
#[derive(Debug, Default)]
pub struct ExportGraph {
    exports: BTreeMap<ExportKey, AnalyzedExport>,
    /// Keys per declaring file, in declaration order
    by_file: HashMap<PathBuf, Vec<ExportKey>>,
}

impl ExportGraph {
    pub fn new(exports: &[Export]) -> Self {
        let mut graph = Self::default();
        for export in exports {
            let key = export.key();
            if graph.exports.contains_key(&key) {
                trace!("Duplicate export {:?}, keeping the first declaration", key);
                continue;
            }
            graph.by_file.entry(export.file.clone()).or_default().push(key.clone());
            graph
                .exports
                .insert(key, AnalyzedExport { export: export.clone(), used_by: Vec::new() });
        }
        debug!("Indexed {} exports across {} files", graph.exports.len(), graph.by_file.len());
        graph
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn get(&self, key: &ExportKey) -> Option<&AnalyzedExport> {
        self.exports.get(key)
    }

    pub fn exports_in(&self, file: &Path) -> &[ExportKey] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Records a usage site. Returns false when the export is unknown or already has the site.
    pub fn mark_used(&mut self, key: &ExportKey, site: UsageSite) -> bool {
        match self.exports.get_mut(key) {
            Some(entry) if !entry.used_by.contains(&site) => {
                entry.used_by.push(site);
                true
            }
            _ => false,
        }
    }

    /// Adds `site` to every export accepted by `pred`. Returns how many were newly marked.
    pub fn mark_matching<F>(&mut self, pred: F, site: &UsageSite) -> usize
    where
        F: Fn(&Export) -> bool,
    {
        let mut marked = 0;
        for entry in self.exports.values_mut() {
            if pred(&entry.export) && !entry.used_by.contains(site) {
                entry.used_by.push(site.clone());
                marked += 1;
            }
        }
        marked
    }

    /// First export of `file` that satisfies `binding`, or every export for namespace imports.
    pub fn match_binding(&self, file: &Path, binding: &ImportBinding) -> Vec<ExportKey> {
        let keys = self.exports_in(file);
        if let ImportBinding::Namespace(_) = binding {
            return keys.to_vec();
        }
        keys.iter()
            .find(|key| self.exports.get(*key).is_some_and(|e| binding_matches(&e.export, binding)))
            .cloned()
            .into_iter()
            .collect()
    }

    /// Splits the index into used and unused exports.
    pub fn into_partition(self) -> (BTreeMap<ExportKey, AnalyzedExport>, Vec<Export>) {
        let mut used = BTreeMap::new();
        let mut unused = Vec::new();
        for (key, mut entry) in self.exports {
            if entry.is_used() {
                entry.used_by.sort();
                used.insert(key, entry);
            } else {
                unused.push(entry.export);
            }
        }
        (used, unused)
    }
}

/// Name matching between one import binding and one export.
///
/// Named exports match by exact name. A default export matches a binding whose name equals
/// the default export's local name, and an anonymous default export satisfies any default
/// binding.
pub fn binding_matches(export: &Export, binding: &ImportBinding) -> bool {
    match binding {
        ImportBinding::Named(name) if name == "default" => export.is_default,
        ImportBinding::Named(name) => {
            if export.is_default {
                export.local_name.as_deref() == Some(name.as_str())
            } else {
                export.exported_name == *name
            }
        }
        ImportBinding::Default(local) => {
            export.is_default
                && export.local_name.as_deref().is_none_or(|l| l == local.as_str())
        }
        ImportBinding::Namespace(_) => true,
    }
}

/// Resolves every import and records usage sites or missing imports.
pub fn resolve_imports(
    graph: &mut ExportGraph,
    imports: &[Import],
    resolver: &Resolver,
) -> Vec<MissingImport> {
    let mut missing = Vec::new();
    for import in imports {
        if import.bindings.is_empty() {
            trace!("Skipping side-effect import '{}' in {}", import.source, import.file.display());
            continue;
        }
        let target = resolver.resolve(&import.source, &import.file);
        let site = UsageSite::new(import.file.clone(), import.line);

        for binding in &import.bindings {
            let name = binding.name().to_string();
            let target = match &target {
                Ok(path) => path,
                Err(err) => {
                    match ResolutionFailure::from_resolve_error(import, err) {
                        Some(failure) => {
                            missing.push(MissingImport { name, line: import.line, failure })
                        }
                        None => trace!("Skipping unreported import '{}'", import.source),
                    }
                    continue;
                }
            };

            if graph.exports_in(target).is_empty() {
                missing.push(MissingImport {
                    name,
                    line: import.line,
                    failure: ResolutionFailure::new(
                        import,
                        FailureReason::NoExportsParsed,
                        format!("{} has no exports", target.display()),
                    ),
                });
                continue;
            }

            let matched = graph.match_binding(target, binding);
            if matched.is_empty() {
                missing.push(MissingImport {
                    name: name.clone(),
                    line: import.line,
                    failure: ResolutionFailure::new(
                        import,
                        FailureReason::ExportNotFound,
                        format!("'{}' is not exported by {}", name, target.display()),
                    ),
                });
                continue;
            }
            for key in matched {
                trace!("'{}' in {} uses {:?}", name, import.file.display(), key);
                graph.mark_used(&key, site.clone());
            }
        }
    }
    missing
}

/// Runs the classification pipeline over extracted facts.
pub struct Analyzer {
    rules: Vec<Box<dyn LivenessRule>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self { rules: default_rules() }
    }

    pub fn with_rules(rules: Vec<Box<dyn LivenessRule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn LivenessRule>] {
        &self.rules
    }

    pub fn analyze(&self, facts: Facts, resolver: &Resolver) -> AnalysisResult {
        let Facts {
            exports,
            imports,
            interfaces,
            type_references,
            mut routes,
            mut server_actions,
            mut hooks,
            dynamic_usages,
            errors,
        } = facts;
        info!("Analyzing {} exports and {} imports", exports.len(), imports.len());

        let mut graph = ExportGraph::new(&exports);
        let mut missing_imports = resolve_imports(&mut graph, &imports, resolver);
        debug!("Resolved imports with {} cache entries", resolver.cache_len());

        routes.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.route_path.cmp(&b.route_path)));
        attach_dynamic_usages(&mut routes, &mut server_actions, &mut hooks, &dynamic_usages);

        let ctx = RuleContext {
            root: resolver.root(),
            routes: &routes,
            server_actions: &server_actions,
            hooks: &hooks,
        };
        for rule in &self.rules {
            let marked = rule.apply(&mut graph, &ctx);
            debug!(
                "Liveness rule '{}' ({}) added {} usage sites",
                rule.name(),
                rule.description(),
                marked
            );
        }

        let (used_exports, unused_exports) = graph.into_partition();
        let interfaces = aggregate_interface_usage(&interfaces, &type_references);

        missing_imports.sort_by(|a, b| {
            a.failure
                .importing_file
                .cmp(&b.failure.importing_file)
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| a.name.cmp(&b.name))
        });
        server_actions.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.name.cmp(&b.name)));
        hooks.sort_by(|a, b| a.file.cmp(&b.file).then_with(|| a.name.cmp(&b.name)));

        info!(
            "Classified {} used and {} unused exports, {} missing imports",
            used_exports.len(),
            unused_exports.len(),
            missing_imports.len()
        );

        AnalysisResult {
            used_exports,
            unused_exports,
            missing_imports,
            interfaces,
            routes,
            server_actions,
            hooks,
            errors,
        }
    }
}
