//! Ties dynamic usages (network calls, form actions, hook calls) to the routes, server actions
//! and hooks they reach.

use log::{debug, trace, warn};
use regex::Regex;

use oxiunused_core::{DynamicUsage, DynamicUsageKind, Hook, Route, ServerAction};

const PARAM_PLACEHOLDER: &str = ":param";

/// Reduces a fetch target to a path: no origin, query, fragment or trailing slash, and no
/// leading placeholder segments standing in for a base URL.
pub fn normalize_target(target: &str) -> Option<String> {
    let mut rest = target.trim();
    if let Some(end) = rest.find(['?', '#']) {
        rest = &rest[..end];
    }
    if let Some(idx) = rest.find("://") {
        let after = &rest[idx + 3..];
        rest = after.find('/').map_or("", |slash| &after[slash..]);
    }

    let segments: Vec<&str> = rest
        .split('/')
        .filter(|s| !s.is_empty())
        .skip_while(|s| s.starts_with(PARAM_PLACEHOLDER))
        .collect();
    if segments.is_empty() {
        return (rest.starts_with('/')).then(|| "/".to_string());
    }
    Some(format!("/{}", segments.join("/")))
}

/// Regex for a route path with bracket segments, anchored and allowing a trailing path.
///
/// `[id]` matches one segment, `[...slug]` one or more, `[[...slug]]` zero or more.
pub fn route_pattern(route_path: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with("[[...") && segment.ends_with("]]") {
            pattern.push_str("(?:/.+)?");
        } else if segment.starts_with("[...") && segment.ends_with(']') {
            pattern.push_str("/.+");
        } else if segment.starts_with('[') && segment.ends_with(']') {
            pattern.push_str("/[^/]+");
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }
    pattern.push_str("(?:/.*)?$");
    Regex::new(&pattern)
}

/// Exact match, `/`-bounded prefix, or bracket pattern. The root route only matches `/`.
pub fn route_matches(route_path: &str, pattern: Option<&Regex>, target: &str) -> bool {
    if target == route_path {
        return true;
    }
    if route_path == "/" {
        return false;
    }
    if target.strip_prefix(route_path).is_some_and(|rest| rest.starts_with('/')) {
        return true;
    }
    pattern.is_some_and(|re| re.is_match(target))
}

/// Appends every dynamic usage to the entities it references.
pub fn attach_dynamic_usages(
    routes: &mut [Route],
    server_actions: &mut [ServerAction],
    hooks: &mut [Hook],
    usages: &[DynamicUsage],
) {
    let patterns: Vec<Option<Regex>> = routes
        .iter()
        .map(|route| match route_pattern(&route.route_path) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Could not build a pattern for route {}: {}", route.route_path, e);
                None
            }
        })
        .collect();

    let mut attached = 0usize;
    for usage in usages {
        match usage.kind {
            DynamicUsageKind::NetworkCall => {
                let Some(target) = normalize_target(&usage.target) else {
                    trace!("Ignoring network call target '{}'", usage.target);
                    continue;
                };
                let hit = routes.iter().zip(&patterns).position(|(route, pattern)| {
                    route_matches(&route.route_path, pattern.as_ref(), &target)
                });
                if let Some(idx) = hit {
                    routes[idx].used_by.push(usage.clone());
                    attached += 1;
                }
            }
            DynamicUsageKind::FormAction | DynamicUsageKind::ActionCall => {
                for action in server_actions.iter_mut().filter(|a| a.name == usage.target) {
                    action.used_by.push(usage.clone());
                    attached += 1;
                }
            }
            DynamicUsageKind::HookCall => {
                for hook in hooks.iter_mut().filter(|h| h.name == usage.target) {
                    hook.used_by.push(usage.clone());
                    attached += 1;
                }
            }
        }
    }
    debug!("Attached {} of {} dynamic usages", attached, usages.len());
}
