use log::debug;
use std::collections::{BTreeMap, HashMap};

use oxiunused_core::{Interface, TypeReference, UsageSite};

use crate::types::AnalyzedInterface;

/// Groups interface declarations by name and attaches every type reference with that name.
///
/// Matching is by name only, so same-named declarations in different files share usages.
pub fn aggregate_interface_usage(
    interfaces: &[Interface],
    references: &[TypeReference],
) -> BTreeMap<String, Vec<AnalyzedInterface>> {
    let mut sites_by_name: HashMap<&str, Vec<UsageSite>> = HashMap::new();
    for reference in references {
        sites_by_name
            .entry(reference.name.as_str())
            .or_default()
            .push(UsageSite::new(reference.file.clone(), reference.line));
    }
    for sites in sites_by_name.values_mut() {
        sites.sort();
        sites.dedup();
    }

    let mut grouped: BTreeMap<String, Vec<AnalyzedInterface>> = BTreeMap::new();
    for interface in interfaces {
        let used_by = sites_by_name.get(interface.name.as_str()).cloned().unwrap_or_default();
        grouped
            .entry(interface.name.clone())
            .or_default()
            .push(AnalyzedInterface { interface: interface.clone(), used_by });
    }
    for decls in grouped.values_mut() {
        decls.sort_by(|a, b| {
            a.interface.file.cmp(&b.interface.file).then(a.interface.line.cmp(&b.interface.line))
        });
    }

    debug!("Aggregated {} interface names from {} references", grouped.len(), references.len());
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiunused_core::InterfaceKind;
    use std::path::PathBuf;

    fn interface(file: &str, name: &str) -> Interface {
        Interface {
            name: name.into(),
            file: PathBuf::from(file),
            line: 1,
            kind: InterfaceKind::Interface,
        }
    }

    fn reference(file: &str, name: &str, line: u32) -> TypeReference {
        TypeReference { name: name.into(), file: PathBuf::from(file), line }
    }

    #[test]
    fn test_reference_attaches_to_same_named_declarations() {
        let interfaces = [interface("/p/a.ts", "Props"), interface("/p/b.ts", "Props")];
        let refs = [reference("/p/c.tsx", "Props", 4)];

        let grouped = aggregate_interface_usage(&interfaces, &refs);
        let props = &grouped["Props"];
        assert_eq!(props.len(), 2);
        assert!(props.iter().all(|d| d.used_by == vec![UsageSite::new("/p/c.tsx", 4)]));
    }

    #[test]
    fn test_unreferenced_and_case_sensitive() {
        let interfaces = [interface("/p/a.ts", "User")];
        let refs = [reference("/p/c.ts", "user", 2), reference("/p/c.ts", "UserProps", 3)];

        let grouped = aggregate_interface_usage(&interfaces, &refs);
        assert!(grouped["User"][0].used_by.is_empty());
        assert_eq!(grouped.len(), 1);
    }

    #[test]
    fn test_sites_sorted_and_deduped() {
        let interfaces = [interface("/p/a.ts", "Item")];
        let refs = [
            reference("/p/z.ts", "Item", 9),
            reference("/p/b.ts", "Item", 2),
            reference("/p/b.ts", "Item", 2),
        ];

        let grouped = aggregate_interface_usage(&interfaces, &refs);
        assert_eq!(
            grouped["Item"][0].used_by,
            vec![UsageSite::new("/p/b.ts", 2), UsageSite::new("/p/z.ts", 9)]
        );
    }
}
