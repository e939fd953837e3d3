//! Route tree conventions: where the `app` and `pages` directories live and how a file
//! inside them maps to a URL path.

use std::path::{Component, Path};

use crate::constants::ACTIONS_DIR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTree {
    /// `app/` directory router
    App,
    /// `pages/` directory router
    Pages,
}

/// Position of a source file inside a route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTreeEntry {
    pub tree: RouteTree,
    /// Directory segments between the tree root and the file
    pub segments: Vec<String>,
    /// File name without its extension
    pub stem: String,
}

impl RouteTreeEntry {
    /// URL path and API flag when this file defines a route.
    pub fn route(&self) -> Option<(String, bool)> {
        match self.tree {
            RouteTree::App => {
                let is_api = match self.stem.as_str() {
                    "route" => true,
                    "page" => false,
                    _ => return None,
                };
                Some((app_route_path(&self.segments), is_api))
            }
            RouteTree::Pages => {
                if self.stem.starts_with('_') {
                    return None;
                }
                let mut parts: Vec<&str> = self.segments.iter().map(String::as_str).collect();
                if self.stem != "index" {
                    parts.push(&self.stem);
                }
                let is_api = parts.first() == Some(&"api");
                Some((format!("/{}", parts.join("/")), is_api))
            }
        }
    }
}

/// Locates `file` inside an `app` or `pages` tree at the project root or under `src/`.
pub fn route_tree_entry(root: &Path, file: &Path) -> Option<RouteTreeEntry> {
    let rel = file.strip_prefix(root).ok()?;
    let mut parts: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    if parts.first() == Some(&"src") {
        parts.remove(0);
    }
    if parts.len() < 2 {
        return None;
    }

    let tree = match parts[0] {
        "app" => RouteTree::App,
        "pages" => RouteTree::Pages,
        _ => return None,
    };
    let file_name = parts[parts.len() - 1];
    let stem = Path::new(file_name).file_stem()?.to_str()?.to_string();
    let segments = parts[1..parts.len() - 1].iter().map(|s| s.to_string()).collect();

    Some(RouteTreeEntry { tree, segments, stem })
}

/// Builds an App Router URL path, dropping `(group)`, `@slot` and `_private` segments.
pub fn app_route_path<S: AsRef<str>>(segments: &[S]) -> String {
    let kept: Vec<&str> = segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .filter(|s| !s.starts_with('@') && !s.starts_with('_'))
        .collect();
    format!("/{}", kept.join("/"))
}

/// True when one of the file's parent directories below `root` is named `actions`.
pub fn is_in_actions_dir(root: &Path, file: &Path) -> bool {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.parent().is_some_and(|dir| {
        dir.components().any(|c| matches!(c, Component::Normal(s) if s == ACTIONS_DIR))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(rel: &str) -> Option<RouteTreeEntry> {
        let root = PathBuf::from("/proj");
        route_tree_entry(&root, &root.join(rel))
    }

    #[test]
    fn test_app_api_route() {
        let e = entry("app/api/users/route.ts").unwrap();
        assert_eq!(e.tree, RouteTree::App);
        assert_eq!(e.route(), Some(("/api/users".to_string(), true)));
    }

    #[test]
    fn test_app_page_under_src() {
        let e = entry("src/app/dashboard/settings/page.tsx").unwrap();
        assert_eq!(e.route(), Some(("/dashboard/settings".to_string(), false)));
    }

    #[test]
    fn test_root_page() {
        assert_eq!(entry("app/page.tsx").unwrap().route(), Some(("/".to_string(), false)));
    }

    #[test]
    fn test_groups_slots_and_private_segments_skipped() {
        let e = entry("app/(marketing)/@modal/_lib/blog/[slug]/page.tsx").unwrap();
        assert_eq!(e.route(), Some(("/blog/[slug]".to_string(), false)));
    }

    #[test]
    fn test_catch_all_kept() {
        let e = entry("app/api/files/[...path]/route.ts").unwrap();
        assert_eq!(e.route(), Some(("/api/files/[...path]".to_string(), true)));
    }

    #[test]
    fn test_layout_is_in_tree_but_not_a_route() {
        let e = entry("app/dashboard/layout.tsx").unwrap();
        assert_eq!(e.stem, "layout");
        assert_eq!(e.route(), None);
    }

    #[test]
    fn test_pages_router() {
        assert_eq!(entry("pages/index.tsx").unwrap().route(), Some(("/".to_string(), false)));
        assert_eq!(
            entry("pages/api/hello.ts").unwrap().route(),
            Some(("/api/hello".to_string(), true))
        );
        assert_eq!(
            entry("src/pages/posts/[id].tsx").unwrap().route(),
            Some(("/posts/[id]".to_string(), false))
        );
        assert_eq!(entry("pages/_app.tsx").unwrap().route(), None);
    }

    #[test]
    fn test_outside_route_tree() {
        assert!(entry("lib/app/page.tsx").is_none());
        assert!(entry("components/Button.tsx").is_none());
        assert!(entry("app.ts").is_none());
    }

    #[test]
    fn test_actions_dir() {
        let root = PathBuf::from("/proj");
        assert!(is_in_actions_dir(&root, &root.join("src/actions/user.ts")));
        assert!(is_in_actions_dir(&root, &root.join("app/dashboard/actions/save.ts")));
        assert!(!is_in_actions_dir(&root, &root.join("src/actions.ts")));
        assert!(!is_in_actions_dir(&root, &root.join("src/lib/transactions/x.ts")));
    }
}
