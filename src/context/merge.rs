//! Routing context merge
//!
//! `merge(base, delta)` is pure and total. Sequences are unioned (base order
//! first, duplicates removed), mappings are merged shallowly, scalars are
//! overwritten. The reserved `modules` key gets a record-by-record merge keyed on
//! each record's `name`, applied exactly one level deep.

use super::value::{ContextMap, ContextValue, MODULES_KEY, MODULE_NAME_FIELD};

/// Combine `delta` into a copy of `base`
pub fn merge(base: &ContextMap, delta: &ContextMap) -> ContextMap {
    merge_level(base, delta, true)
}

fn merge_level(base: &ContextMap, delta: &ContextMap, merge_modules_by_name: bool) -> ContextMap {
    let mut merged = base.clone();

    for (key, delta_value) in delta {
        let value = match merged.get(key) {
            Some(base_value) => merge_value(key, base_value, delta_value, merge_modules_by_name),
            None => fresh_value(key, delta_value, merge_modules_by_name),
        };
        merged.insert(key.clone(), value);
    }

    merged
}

fn merge_value(
    key: &str,
    base: &ContextValue,
    delta: &ContextValue,
    merge_modules_by_name: bool,
) -> ContextValue {
    use ContextValue::{List, Map, Records};

    let by_name = merge_modules_by_name && key == MODULES_KEY;

    match (base, delta) {
        (Records(base), Records(delta)) if by_name => Records(merge_modules(base, delta)),
        (Records(base), Records(delta)) => Records(union(base, delta)),
        (List(base), List(delta)) => List(union(base, delta)),
        // `[]` decodes as an empty list, so an empty sequence on either side still counts as records
        (Records(base), List(delta)) if delta.is_empty() => Records(base.clone()),
        (List(base), Records(_)) if base.is_empty() => fresh_value(key, delta, merge_modules_by_name),
        (Map(base), Map(delta)) => {
            let mut merged = base.clone();
            merged.extend(delta.iter().map(|(k, v)| (k.clone(), v.clone())));
            Map(merged)
        }
        _ => fresh_value(key, delta, merge_modules_by_name),
    }
}

/// A delta value taking a key over, merged as if into an empty sequence
fn fresh_value(key: &str, delta: &ContextValue, merge_modules_by_name: bool) -> ContextValue {
    use ContextValue::{List, Records};

    match delta {
        List(items) => List(union(&[], items)),
        Records(records) if merge_modules_by_name && key == MODULES_KEY => {
            Records(merge_modules(&[], records))
        }
        Records(records) => Records(union(&[], records)),
        other => other.clone(),
    }
}

/// Merge module records by `name`, one level deep
///
/// A delta module whose name matches an existing module is merged into it with
/// the ordinary rules (nested `modules` keys are unioned, not merged by name).
/// Otherwise the delta module is appended unless an identical record is present.
pub fn merge_modules(base: &[ContextMap], delta: &[ContextMap]) -> Vec<ContextMap> {
    let mut modules = base.to_vec();

    for delta_module in delta {
        let existing = delta_module.get(MODULE_NAME_FIELD).and_then(|name| {
            modules
                .iter_mut()
                .find(|module| module.get(MODULE_NAME_FIELD) == Some(name))
        });

        match existing {
            Some(module) => *module = merge_level(module, delta_module, false),
            None => {
                let module = merge_level(&ContextMap::new(), delta_module, false);
                if !modules.contains(&module) {
                    modules.push(module);
                }
            }
        }
    }

    modules
}

fn union<T: Clone + PartialEq>(base: &[T], delta: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(base.len() + delta.len());
    for item in base.iter().chain(delta) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
