//! Convention-based liveness: exports the framework consumes without a static import.
//!
//! Every rule only adds usage sites. Running a rule twice changes nothing.

use std::path::Path;

use oxiunused_core::{
    APP_COMPONENT_FILES, Hook, HttpMethod, Route, RouteTree, SPECIAL_EXPORT_NAMES, ServerAction,
    UsageSite, is_in_actions_dir, route_tree_entry,
};

use crate::graph::ExportGraph;

/// Read-only inputs shared by all rules.
pub struct RuleContext<'a> {
    pub root: &'a Path,
    pub routes: &'a [Route],
    pub server_actions: &'a [ServerAction],
    pub hooks: &'a [Hook],
}

pub trait LivenessRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which exports the rule keeps alive, for diagnostics.
    fn description(&self) -> &'static str;

    /// Adds usage sites to `graph`. Returns how many sites were newly recorded.
    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize;
}

/// Rules in the order they run.
pub fn default_rules() -> Vec<Box<dyn LivenessRule>> {
    vec![
        Box::new(RouteHandlerRule),
        Box::new(ServerActionRule),
        Box::new(HookEvidenceRule),
        Box::new(PageComponentRule),
        Box::new(SpecialExportRule),
        Box::new(ActionsDirectoryRule),
    ]
}

/// Method exports (`GET`, `POST`, ...) of route handler files.
pub struct RouteHandlerRule;

impl LivenessRule for RouteHandlerRule {
    fn name(&self) -> &'static str {
        "route-handler"
    }

    fn description(&self) -> &'static str {
        "HTTP method exports of route handler files"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let mut marked = 0;
        for route in ctx.routes.iter().filter(|r| !r.methods.is_empty()) {
            let handlers: Vec<_> = graph
                .exports_in(&route.file)
                .iter()
                .filter(|key| !key.is_default)
                .filter_map(|key| HttpMethod::parse(&key.name).map(|m| (key.clone(), m)))
                .filter(|(key, _)| key.name == key.name.to_ascii_uppercase())
                .filter(|(_, m)| route.methods.contains(m))
                .collect();

            for (key, method) in handlers {
                marked += usize::from(graph.mark_used(&key, UsageSite::framework()));
                for usage in &route.used_by {
                    if usage.method.is_none_or(|m| m == method) {
                        marked += usize::from(graph.mark_used(&key, usage.site()));
                    }
                }
            }
        }
        marked
    }
}

/// Server actions are reachable from client forms and transitions.
pub struct ServerActionRule;

impl LivenessRule for ServerActionRule {
    fn name(&self) -> &'static str {
        "server-action"
    }

    fn description(&self) -> &'static str {
        "exports declared as server actions"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let mut marked = 0;
        for action in ctx.server_actions {
            let keys: Vec<_> = graph
                .exports_in(&action.file)
                .iter()
                .filter(|key| {
                    graph.get(key).is_some_and(|e| {
                        e.export.exported_name == action.name
                            || e.export.local_name.as_deref() == Some(action.name.as_str())
                    })
                })
                .cloned()
                .collect();
            for key in keys {
                marked += usize::from(graph.mark_used(&key, UsageSite::framework()));
                for usage in &action.used_by {
                    marked += usize::from(graph.mark_used(&key, usage.site()));
                }
            }
        }
        marked
    }
}

/// Hooks only count as used when a call site was seen.
pub struct HookEvidenceRule;

impl LivenessRule for HookEvidenceRule {
    fn name(&self) -> &'static str {
        "hook-evidence"
    }

    fn description(&self) -> &'static str {
        "hook exports with a recorded call site"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let mut marked = 0;
        for hook in ctx.hooks.iter().filter(|h| !h.used_by.is_empty()) {
            let keys: Vec<_> = graph
                .exports_in(&hook.file)
                .iter()
                .filter(|key| {
                    graph.get(key).is_some_and(|e| {
                        e.export.exported_name == hook.name
                            || e.export.local_name.as_deref() == Some(hook.name.as_str())
                    })
                })
                .cloned()
                .collect();
            for key in keys {
                for usage in &hook.used_by {
                    marked += usize::from(graph.mark_used(&key, usage.site()));
                }
            }
        }
        marked
    }
}

/// Default exports the router renders: `page`, `layout` and friends in `app/`, anything in
/// `pages/`.
pub struct PageComponentRule;

impl LivenessRule for PageComponentRule {
    fn name(&self) -> &'static str {
        "page-component"
    }

    fn description(&self) -> &'static str {
        "default exports of page, layout and other router-rendered files"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let root = ctx.root;
        graph.mark_matching(
            |export| {
                export.is_default
                    && route_tree_entry(root, &export.file).is_some_and(|entry| match entry.tree {
                        RouteTree::App => APP_COMPONENT_FILES.contains(&entry.stem.as_str()),
                        RouteTree::Pages => true,
                    })
            },
            &UsageSite::framework(),
        )
    }
}

/// Framework-read configuration exports such as `generateMetadata` or `revalidate`.
pub struct SpecialExportRule;

impl LivenessRule for SpecialExportRule {
    fn name(&self) -> &'static str {
        "special-export"
    }

    fn description(&self) -> &'static str {
        "framework config exports inside the route tree"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let root = ctx.root;
        graph.mark_matching(
            |export| {
                !export.is_default
                    && SPECIAL_EXPORT_NAMES.contains(&export.exported_name.as_str())
                    && route_tree_entry(root, &export.file).is_some()
            },
            &UsageSite::framework(),
        )
    }
}

/// Everything exported from a file below an `actions` directory.
pub struct ActionsDirectoryRule;

impl LivenessRule for ActionsDirectoryRule {
    fn name(&self) -> &'static str {
        "actions-directory"
    }

    fn description(&self) -> &'static str {
        "every export below an actions directory"
    }

    fn apply(&self, graph: &mut ExportGraph, ctx: &RuleContext<'_>) -> usize {
        let root = ctx.root;
        graph.mark_matching(|export| is_in_actions_dir(root, &export.file), &UsageSite::framework())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiunused_core::{DynamicUsage, DynamicUsageKind, Export, ExportKind};
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/proj")
    }

    fn export(rel: &str, name: &str, is_default: bool) -> Export {
        Export {
            exported_name: if is_default { "default".into() } else { name.into() },
            local_name: Some(name.into()),
            file: root().join(rel),
            line: 1,
            is_default,
            kind: Some(ExportKind::Function),
        }
    }

    fn used(graph: &ExportGraph, e: &Export) -> Vec<UsageSite> {
        graph.get(&e.key()).map(|a| a.used_by.clone()).unwrap_or_default()
    }

    fn run(rule: &dyn LivenessRule, exports: &[Export], routes: &[Route]) -> ExportGraph {
        let mut graph = ExportGraph::new(exports);
        let root = root();
        let ctx = RuleContext { root: &root, routes, server_actions: &[], hooks: &[] };
        rule.apply(&mut graph, &ctx);
        graph
    }

    fn network_call(method: Option<HttpMethod>, line: u32) -> DynamicUsage {
        DynamicUsage {
            kind: DynamicUsageKind::NetworkCall,
            target: "/api/users".into(),
            method,
            file: root().join("src/client.ts"),
            line,
        }
    }

    #[test]
    fn test_route_handler_marks_method_exports() {
        let get = export("app/api/users/route.ts", "GET", false);
        let post = export("app/api/users/route.ts", "POST", false);
        let helper = export("app/api/users/route.ts", "helper", false);
        let route = Route {
            route_path: "/api/users".into(),
            file: root().join("app/api/users/route.ts"),
            is_api: true,
            methods: vec![HttpMethod::Get, HttpMethod::Post],
            used_by: vec![network_call(Some(HttpMethod::Post), 4), network_call(None, 9)],
        };

        let graph = run(&RouteHandlerRule, &[get.clone(), post.clone(), helper.clone()], &[route]);
        let client = root().join("src/client.ts");
        assert_eq!(used(&graph, &get), vec![UsageSite::framework(), UsageSite::new(&client, 9)]);
        assert_eq!(
            used(&graph, &post),
            vec![
                UsageSite::framework(),
                UsageSite::new(&client, 4),
                UsageSite::new(&client, 9)
            ]
        );
        assert!(used(&graph, &helper).is_empty());
    }

    #[test]
    fn test_page_component_rule() {
        let page = export("app/dashboard/page.tsx", "Dashboard", true);
        let layout = export("src/app/layout.tsx", "RootLayout", true);
        let legacy = export("pages/about.tsx", "About", true);
        let named = export("app/dashboard/page.tsx", "Sidebar", false);
        let outside = export("components/page.tsx", "Page", true);
        let exports =
            [page.clone(), layout.clone(), legacy.clone(), named.clone(), outside.clone()];

        let graph = run(&PageComponentRule, &exports, &[]);
        assert_eq!(used(&graph, &page), vec![UsageSite::framework()]);
        assert_eq!(used(&graph, &layout), vec![UsageSite::framework()]);
        assert_eq!(used(&graph, &legacy), vec![UsageSite::framework()]);
        assert!(used(&graph, &named).is_empty());
        assert!(used(&graph, &outside).is_empty());
    }

    #[test]
    fn test_special_export_rule_only_in_route_tree() {
        let meta = export("app/blog/page.tsx", "generateMetadata", false);
        let revalidate = export("app/blog/page.tsx", "revalidate", false);
        let elsewhere = export("lib/seo.ts", "generateMetadata", false);

        let exports = [meta.clone(), revalidate.clone(), elsewhere.clone()];
        let graph = run(&SpecialExportRule, &exports, &[]);
        assert!(!used(&graph, &meta).is_empty());
        assert!(!used(&graph, &revalidate).is_empty());
        assert!(used(&graph, &elsewhere).is_empty());
    }

    #[test]
    fn test_actions_directory_rule() {
        let inside = export("src/actions/user.ts", "updateUser", false);
        let nested = export("app/actions/forms/submit.ts", "submit", false);
        let outside = export("src/lib/actions.ts", "helper", false);

        let exports = [inside.clone(), nested.clone(), outside.clone()];
        let graph = run(&ActionsDirectoryRule, &exports, &[]);
        assert!(!used(&graph, &inside).is_empty());
        assert!(!used(&graph, &nested).is_empty());
        assert!(used(&graph, &outside).is_empty());
    }

    #[test]
    fn test_hook_rule_never_uses_framework_site() {
        let hook_export = export("src/hooks/useWidget.ts", "useWidget", false);
        let mut graph = ExportGraph::new(std::slice::from_ref(&hook_export));
        let root = root();
        let idle = [Hook {
            name: "useWidget".into(),
            file: root.join("src/hooks/useWidget.ts"),
            line: 1,
            used_by: vec![],
        }];
        let ctx = RuleContext { root: &root, routes: &[], server_actions: &[], hooks: &idle };
        assert_eq!(HookEvidenceRule.apply(&mut graph, &ctx), 0);
        assert!(used(&graph, &hook_export).is_empty());
    }

    #[test]
    fn test_rules_are_idempotent() {
        let exports = [
            export("app/page.tsx", "Home", true),
            export("app/page.tsx", "metadata", false),
            export("actions/save.ts", "save", false),
        ];
        let root = root();
        let ctx = RuleContext { root: &root, routes: &[], server_actions: &[], hooks: &[] };
        let mut graph = ExportGraph::new(&exports);

        let first: usize = default_rules().iter().map(|r| r.apply(&mut graph, &ctx)).sum();
        let second: usize = default_rules().iter().map(|r| r.apply(&mut graph, &ctx)).sum();
        assert_eq!(first, 3);
        assert_eq!(second, 0);
    }
}
