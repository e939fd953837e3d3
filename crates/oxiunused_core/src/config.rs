use anyhow::{Context, Result, anyhow};
use dashmap::DashMap;
use log::{debug, trace, warn};
use path_clean::clean;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::constants::COMPILER_CONFIG_FILES;

pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}

/// One `compilerOptions.paths` entry, e.g. `"@/*": ["./src/*"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub pattern: String,
    pub targets: Vec<String>,
}

impl AliasEntry {
    /// Returns the length of the literal prefix and the text captured by the wildcard
    /// when `reference` matches this entry.
    fn match_reference<'r>(&self, reference: &'r str) -> Option<(usize, Option<&'r str>)> {
        match self.pattern.split_once('*') {
            Some((prefix, suffix)) => {
                if reference.len() >= prefix.len() + suffix.len()
                    && reference.starts_with(prefix)
                    && reference.ends_with(suffix)
                {
                    let captured = &reference[prefix.len()..reference.len() - suffix.len()];
                    Some((prefix.len(), Some(captured)))
                } else {
                    None
                }
            }
            None if reference == self.pattern => Some((self.pattern.len(), None)),
            None => None,
        }
    }
}

/// Alias mappings from the project's compiler configuration, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    pub base_dir: PathBuf,
    pub entries: Vec<AliasEntry>,
}

/// Result of looking a reference up in the [`AliasTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMatch {
    pub pattern: String,
    /// Target paths with the wildcard substituted, in listed order
    pub candidates: Vec<PathBuf>,
}

impl AliasTable {
    /// Picks the entry with the longest literal prefix. Ties keep the earliest entry.
    pub fn lookup(&self, reference: &str) -> Option<AliasMatch> {
        let mut best: Option<(usize, &AliasEntry, Option<&str>)> = None;
        for entry in &self.entries {
            if let Some((len, captured)) = entry.match_reference(reference)
                && best.as_ref().is_none_or(|(best_len, _, _)| len > *best_len)
            {
                best = Some((len, entry, captured));
            }
        }

        let (_, entry, captured) = best?;
        trace!("Alias '{}' matched '{}' (captured {:?})", entry.pattern, reference, captured);
        let candidates = entry
            .targets
            .iter()
            .map(|target| {
                let substituted = match captured {
                    Some(c) if target.contains('*') => target.replacen('*', c, 1),
                    _ => target.clone(),
                };
                clean(self.base_dir.join(substituted))
            })
            .collect();

        Some(AliasMatch { pattern: entry.pattern.clone(), candidates })
    }
}

/// Reads the alias table from the first compiler configuration found at `root`.
///
/// A missing file, or a file without `compilerOptions.paths`, yields `Ok(None)`.
pub fn read_alias_table(root: &Path) -> Result<Option<AliasTable>> {
    debug!("Reading compiler configuration from root: {:?}", root);
    let Some(config_path) =
        COMPILER_CONFIG_FILES.iter().map(|name| root.join(name)).find(|p| p.is_file())
    else {
        debug!("No compiler configuration found, alias resolution disabled");
        return Ok(None);
    };
    trace!("Found compiler configuration at: {:?}", config_path);

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&strip_jsonc(&content))
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    let Some(compiler_options) = json.get("compilerOptions") else {
        return Ok(None);
    };
    let Some(paths_obj) = compiler_options.get("paths").and_then(|p| p.as_object()) else {
        debug!("No compilerOptions.paths in {}", config_path.display());
        return Ok(None);
    };

    let base_url = compiler_options.get("baseUrl").and_then(|b| b.as_str()).unwrap_or(".");
    let config_dir = config_path.parent().unwrap_or(root);
    let base_dir = clean(config_dir.join(base_url));

    let entries: Vec<AliasEntry> = paths_obj
        .iter()
        .filter_map(|(pattern, targets)| {
            let targets: Vec<String> = targets
                .as_array()?
                .iter()
                .filter_map(|t| t.as_str())
                .map(str::to_string)
                .collect();
            if targets.is_empty() {
                return None;
            }
            trace!("Found path alias: '{}' -> {:?}", pattern, targets);
            Some(AliasEntry { pattern: pattern.clone(), targets })
        })
        .collect();

    debug!("Loaded {} path aliases with base {}", entries.len(), base_dir.display());
    Ok(Some(AliasTable { base_dir, entries }))
}

/// Removes `//` and `/* */` comments plus trailing commas, leaving string literals intact.
pub fn strip_jsonc(content: &str) -> String {
    strip_trailing_commas(&strip_comments(content))
}

/// Copies a string literal starting at `chars[i]` into `out`, returning the index after it.
fn copy_string(chars: &[char], mut i: usize, out: &mut String) -> usize {
    out.push(chars[i]);
    i += 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' && i < chars.len() {
            out.push(chars[i]);
            i += 1;
        } else if c == '"' {
            break;
        }
    }
    i
}

fn strip_comments(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => i = copy_string(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Expects comment-free input.
fn strip_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => i = copy_string(&chars, i, &mut out),
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Alias tables keyed by project root. Owned by the caller and invalidated between runs.
#[derive(Debug, Default)]
pub struct TsconfigCache {
    tables: DashMap<PathBuf, Option<Arc<AliasTable>>>,
}

impl TsconfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, root: &Path) -> Option<Arc<AliasTable>> {
        if let Some(cached) = self.tables.get(root) {
            trace!("Cache hit for compiler configuration: {}", root.display());
            return cached.clone();
        }
        let table = match read_alias_table(root) {
            Ok(table) => table.map(Arc::new),
            Err(e) => {
                warn!("Ignoring compiler configuration: {:#}", e);
                None
            }
        };
        self.tables.insert(root.to_path_buf(), table.clone());
        table
    }

    pub fn invalidate(&self) {
        debug!("Invalidating {} cached compiler configurations", self.tables.len());
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
