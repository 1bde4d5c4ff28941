// Copyright (c) 2025 - Cowboy AI, Inc.
//! Input normalizers
//!
//! A normalizer runs after the type check and before domain validation. It
//! turns the accepted alternative representations of a field (a delimited
//! string for a list, a label for an enum) into the stored representation.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::domain::{Arch, Value};
use crate::errors::{ItemError, ItemResult};

/// Store the value as given
pub fn keep(_field: &'static str, value: Value) -> ItemResult<Value> {
    Ok(value)
}

/// Split a whitespace- or comma-delimited string into a list of strings
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `key=value` tokens separated by whitespace
///
/// A token without `=` maps its key to [`Value::None`]; a key given more
/// than once collects its values into a list.
pub fn parse_key_values(input: &str) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    for token in input.split_whitespace() {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key, Value::from(value)),
            None => (token, Value::None),
        };
        if key.is_empty() {
            continue;
        }
        match map.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::List(values) => values.push(value),
                existing => {
                    let first = std::mem::take(existing);
                    *existing = Value::List(vec![first, value]);
                }
            },
        }
    }
    map
}

/// Delimited string to list; lists pass through
pub fn string_to_list(_field: &'static str, value: Value) -> ItemResult<Value> {
    match value {
        Value::Str(s) => Ok(Value::from(split_list(&s))),
        other => Ok(other),
    }
}

/// Delimited `key=value` string to mapping; mappings pass through
pub fn string_to_map(_field: &'static str, value: Value) -> ItemResult<Value> {
    match value {
        Value::Str(s) => Ok(Value::Map(parse_key_values(&s))),
        other => Ok(other),
    }
}

/// Architecture label to enum value; enum values pass through
pub fn label_to_arch(field: &'static str, value: Value) -> ItemResult<Value> {
    match value {
        Value::Str(label) => Arch::from_label(&label)
            .map(Value::Arch)
            .map_err(|err| ItemError::constraint(field, err.to_string())),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(""), Vec::<String>::new());
        assert_eq!(split_list("grub"), vec!["grub"]);
        assert_eq!(split_list("grub pxe,ipxe ,  yaboot"), vec!["grub", "pxe", "ipxe", "yaboot"]);
    }

    #[test]
    fn test_parse_key_values() {
        let map = parse_key_values("test=test test1 test2=0 a=1 a=2 =skipped");
        assert_eq!(map["test"], Value::from("test"));
        assert_eq!(map["test1"], Value::None);
        assert_eq!(map["test2"], Value::from("0"));
        assert_eq!(map["a"], Value::from(vec!["1", "2"]));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_label_to_arch() {
        assert_eq!(
            label_to_arch("arch", Value::from("x86_64")),
            Ok(Value::Arch(Arch::X86_64))
        );
        assert_eq!(
            label_to_arch("arch", Value::Arch(Arch::Arm)),
            Ok(Value::Arch(Arch::Arm))
        );
        let err = label_to_arch("arch", Value::from("Test")).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
