// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use super::{
    DataKind, FieldDescriptor, FileKind, LobKind, NumericSubtype, TypeDescriptor, TypeHandle,
};
use crate::config::MAX_NAME_LEN;
use crate::error::{Error, Result};
use std::sync::{Arc, OnceLock};

/// Builder for creating TypeDescriptor instances.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    schema: String,
    name: String,
    handle: Option<TypeHandle>,
    parent: Option<Arc<TypeDescriptor>>,
    is_final: bool,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    /// Create a builder for `schema.name`. Types are final unless
    /// [`not_final`](Self::not_final) is called.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            handle: None,
            parent: None,
            is_final: true,
            fields: Vec::new(),
        }
    }

    /// Use an explicit type handle instead of one derived from the name.
    pub fn handle(mut self, handle: TypeHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Derive from `parent`; its fields become this type's leading fields.
    pub fn extends(mut self, parent: &Arc<TypeDescriptor>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Allow subtypes (instances may then carry a more-derived runtime type).
    pub fn not_final(mut self) -> Self {
        self.is_final = false;
        self
    }

    /// Add a field of any kind.
    pub fn field(mut self, name: impl Into<String>, kind: DataKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind));
        self
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Boolean)
    }

    pub fn numeric(self, name: impl Into<String>, subtype: NumericSubtype) -> Self {
        self.field(name, DataKind::Numeric(subtype))
    }

    /// Library-native number field.
    pub fn number(self, name: impl Into<String>) -> Self {
        self.numeric(name, NumericSubtype::Number)
    }

    pub fn date(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::DateTime)
    }

    pub fn timestamp(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Timestamp)
    }

    pub fn interval(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Interval)
    }

    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Text)
    }

    pub fn raw(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Raw)
    }

    pub fn lob(self, name: impl Into<String>, kind: LobKind) -> Self {
        self.field(name, DataKind::Lob(kind))
    }

    pub fn file(self, name: impl Into<String>, kind: FileKind) -> Self {
        self.field(name, DataKind::File(kind))
    }

    pub fn reference(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Ref)
    }

    pub fn collection(self, name: impl Into<String>) -> Self {
        self.field(name, DataKind::Collection)
    }

    /// Add a nested composite stored inline.
    pub fn object(self, name: impl Into<String>, nested: &Arc<TypeDescriptor>) -> Self {
        self.field(name, DataKind::Object(Arc::clone(nested)))
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> Result<Arc<TypeDescriptor>> {
        check_name("type name", &self.name)?;
        if self.schema.len() > MAX_NAME_LEN {
            return Err(Error::InvalidArgument(format!(
                "schema name exceeds {MAX_NAME_LEN} characters"
            )));
        }

        let mut fields = Vec::new();
        if let Some(parent) = &self.parent {
            if parent.is_final() {
                return Err(Error::InvalidArgument(format!(
                    "{} is final and cannot be extended",
                    parent.qualified_name()
                )));
            }
            fields.extend_from_slice(parent.fields());
        }

        for field in self.fields {
            check_name("field name", field.name())?;
            if fields
                .iter()
                .any(|f: &FieldDescriptor| f.name().eq_ignore_ascii_case(field.name()))
            {
                return Err(Error::InvalidArgument(format!(
                    "duplicate field '{}' in {}",
                    field.name(),
                    self.name
                )));
            }
            fields.push(field);
        }

        let qualified = if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        };
        let handle = self
            .handle
            .unwrap_or_else(|| TypeHandle::from_name(&qualified));

        Ok(Arc::new(TypeDescriptor {
            handle,
            schema: self.schema,
            name: self.name,
            fields,
            parent: self.parent,
            is_final: self.is_final,
            layout: OnceLock::new(),
        }))
    }
}

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "{what} '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}
