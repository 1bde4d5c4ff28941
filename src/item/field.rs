// Copyright (c) 2025 - Cowboy AI, Inc.
//! Field Contracts
//!
//! Every mutable field of an item is bound to a [`FieldContract`]: the input
//! shapes it accepts, a normalizer and a validator. Assigning a field runs
//! the three steps in order and commits the normalized value only when all of
//! them succeed:
//!
//! ```text
//! raw ──type check──> accepted ──normalize──> normalized ──validate──> stored
//!          │                        │                        │
//!     TypeMismatch          ConstraintViolation      ConstraintViolation
//! ```
//!
//! A failed assignment leaves the previous value in place.

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use super::normalize;
use crate::adapters::BootFileProbe;
use crate::catalog::{BreedSignature, SignatureCatalog};
use crate::domain::{Arch, Value};
use crate::errors::{ItemError, ItemResult};

/// Input representation a contract accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Str,
    Arch,
    Int,
    Float,
    /// List whose every element is a string
    StrList,
    Map,
}

impl Shape {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Str, Value::Str(_))
            | (Self::Arch, Value::Arch(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::StrList, Value::List(items)) => items.iter().all(|item| item.as_str().is_some()),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Arch => "arch",
            Self::Int => "int",
            Self::Float => "float",
            Self::StrList => "list of strings",
            Self::Map => "mapping",
        }
    }
}

/// Normalizer: accepted input to stored representation
pub type Normalizer = fn(&'static str, Value) -> ItemResult<Value>;

/// Validator: domain rule over the normalized value
pub type Validator = fn(&'static str, &Value, &FieldContext<'_>) -> ItemResult<()>;

/// No domain rule beyond the type check
pub fn accept_any(_field: &'static str, _value: &Value, _ctx: &FieldContext<'_>) -> ItemResult<()> {
    Ok(())
}

/// Contract bound to a single field name
#[derive(Clone, Copy)]
pub struct FieldContract {
    pub name: &'static str,
    pub accepts: &'static [Shape],
    pub default: fn() -> Value,
    pub normalize: Normalizer,
    pub validate: Validator,
}

impl fmt::Debug for FieldContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContract")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

impl FieldContract {
    pub const fn new(name: &'static str, accepts: &'static [Shape], default: fn() -> Value) -> Self {
        Self {
            name,
            accepts,
            default,
            normalize: normalize::keep,
            validate: accept_any,
        }
    }

    pub const fn normalized_by(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }

    pub const fn validated_by(mut self, validate: Validator) -> Self {
        self.validate = validate;
        self
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.accepts.iter().any(|shape| shape.matches(value))
    }

    /// Human-readable list of accepted shapes
    pub fn expected(&self) -> String {
        self.accepts
            .iter()
            .map(Shape::name)
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Type-check, normalize and validate `raw` without storing it
    pub fn apply(&self, raw: Value, ctx: &FieldContext<'_>) -> ItemResult<Value> {
        if !self.accepts(&raw) {
            return Err(ItemError::TypeMismatch {
                field: self.name.to_string(),
                expected: self.expected(),
                received: raw.kind_name(),
            });
        }
        let normalized = (self.normalize)(self.name, raw)?;
        (self.validate)(self.name, &normalized, ctx)?;
        Ok(normalized)
    }
}

/// Read-only view handed to validators
///
/// Validators may consult the owning item's other fields and the catalog,
/// but never see the value being assigned as already stored.
pub struct FieldContext<'a> {
    pub fields: &'a FieldSet,
    pub catalog: &'a SignatureCatalog,
    pub probe: &'a dyn BootFileProbe,
}

impl FieldContext<'_> {
    /// Current breed, empty when unset
    pub fn breed(&self) -> &str {
        self.fields.str_value("breed")
    }

    pub fn arch(&self) -> Option<Arch> {
        self.fields.get("arch").and_then(Value::as_arch)
    }

    /// Catalog entry for the current breed, resolved once per call
    pub fn breed_signature(&self) -> Option<&BreedSignature> {
        self.catalog.breed(self.breed())
    }
}

/// Validated field values of one item, keyed by contract name
#[derive(Clone)]
pub struct FieldSet {
    contracts: &'static [FieldContract],
    values: BTreeMap<&'static str, Value>,
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

/// Two sets are equal when they hold the same values
impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl FieldSet {
    /// Every declared field at its default
    pub fn new(contracts: &'static [FieldContract]) -> Self {
        let values = contracts
            .iter()
            .map(|contract| (contract.name, (contract.default)()))
            .collect();
        Self { contracts, values }
    }

    pub fn contracts(&self) -> &'static [FieldContract] {
        self.contracts
    }

    pub fn contract(&self, name: &str) -> Option<&'static FieldContract> {
        self.contracts.iter().find(|contract| contract.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String field value, empty when unset or not a string
    pub fn str_value(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    /// Assign a field through its contract
    ///
    /// Either the normalized value replaces the old one, or an error is
    /// returned and the set is unchanged.
    pub fn assign(
        &mut self,
        name: &str,
        raw: Value,
        catalog: &SignatureCatalog,
        probe: &dyn BootFileProbe,
    ) -> ItemResult<()> {
        let contract = self
            .contract(name)
            .ok_or_else(|| ItemError::UnknownField(name.to_string()))?;

        let ctx = FieldContext {
            fields: self,
            catalog,
            probe,
        };
        let normalized = contract.apply(raw, &ctx).map_err(|err| {
            warn!("Rejected write to '{}': {}", contract.name, err);
            err
        })?;

        debug!(field = contract.name, value = ?normalized, "Field updated");
        self.values.insert(contract.name, normalized);
        Ok(())
    }
}
