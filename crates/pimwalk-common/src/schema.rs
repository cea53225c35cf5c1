//! Entity schema: one description of a record's fields from which both the
//! host-side buffers and the device-side byte layout are derived.
//!
//! Layout follows C rules: every field is aligned to its base type's width
//! and the record size is padded to the widest field.

use std::fmt;

/// Primitive element types a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Char,
}

impl BaseType {
    /// Width in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            BaseType::Int8 | BaseType::Char => 1,
            BaseType::Int16 => 2,
            BaseType::Int32 | BaseType::Float => 4,
            BaseType::Int64 | BaseType::Double => 8,
        }
    }

    /// The C spelling, used in diagnostics and `info` output.
    pub const fn c_name(self) -> &'static str {
        match self {
            BaseType::Int8 => "int8_t",
            BaseType::Int16 => "int16_t",
            BaseType::Int32 => "int32_t",
            BaseType::Int64 => "int64_t",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Char => "char",
        }
    }
}

/// Scalar or fixed-length array of a [`BaseType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar(BaseType),
    Array(BaseType, usize),
}

impl FieldType {
    pub const fn base(self) -> BaseType {
        match self {
            FieldType::Scalar(b) | FieldType::Array(b, _) => b,
        }
    }

    /// Number of elements (1 for scalars).
    pub const fn len(self) -> usize {
        match self {
            FieldType::Scalar(_) => 1,
            FieldType::Array(_, n) => n,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub const fn size_bytes(self) -> usize {
        self.base().size_bytes() * self.len()
    }
}

/// A named field in an [`EntitySchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// A named record: nodes, edges and walkers are all described this way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>, base: BaseType) -> Self {
        self.fields.push(Field { name: name.into(), ty: FieldType::Scalar(base) });
        self
    }

    #[must_use]
    pub fn array(mut self, name: impl Into<String>, base: BaseType, len: usize) -> Self {
        self.fields.push(Field { name: name.into(), ty: FieldType::Array(base, len) });
        self
    }

    /// Node holding two same-length int32 vectors, the vector-add dataset.
    pub fn vector_pair(len: usize) -> Self {
        Self::new("VectorPair").array("vec1", BaseType::Int32, len).array("vec2", BaseType::Int32, len)
    }

    /// Wire layout of [`crate::Edge`].
    pub fn edge() -> Self {
        Self::new("Edge")
            .scalar("src", BaseType::Int32)
            .scalar("dst", BaseType::Int32)
            .scalar("weight", BaseType::Int32)
            .scalar("kind", BaseType::Int32)
    }

    /// Wire layout of [`crate::TaskletResult`].
    pub fn tasklet_result() -> Self {
        Self::new("TaskletResult")
            .scalar("sum", BaseType::Int64)
            .scalar("status", BaseType::Int32)
            .scalar("matched", BaseType::Int32)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that are arrays; each becomes one device input region.
    pub fn array_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| matches!(f.ty, FieldType::Array(..)))
    }

    /// Byte offset of `name` within the record.
    pub fn field_offset(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for field in &self.fields {
            offset = crate::math::align_up(offset, field.ty.base().size_bytes());
            if field.name == name {
                return Some(offset);
            }
            offset += field.ty.size_bytes();
        }
        None
    }

    fn alignment(&self) -> usize {
        self.fields.iter().map(|f| f.ty.base().size_bytes()).max().unwrap_or(1)
    }

    /// Record size including trailing padding.
    pub fn size_bytes(&self) -> usize {
        let mut offset = 0;
        for field in &self.fields {
            offset = crate::math::align_up(offset, field.ty.base().size_bytes());
            offset += field.ty.size_bytes();
        }
        crate::math::align_up(offset, self.alignment())
    }
}

impl fmt::Display for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            match field.ty {
                FieldType::Scalar(b) => write!(f, "{sep}{}: {}", field.name, b.c_name())?,
                FieldType::Array(b, n) => write!(f, "{sep}{}: {}[{n}]", field.name, b.c_name())?,
            }
        }
        write!(f, " }} ({} bytes)", self.size_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_pair_matches_two_int32_arrays() {
        let schema = EntitySchema::vector_pair(128);
        assert_eq!(schema.size_bytes(), 1024);
        assert_eq!(schema.field_offset("vec1"), Some(0));
        assert_eq!(schema.field_offset("vec2"), Some(512));
        assert_eq!(schema.array_fields().count(), 2);
    }

    #[test]
    fn padding_follows_c_rules() {
        let schema = EntitySchema::new("Mixed")
            .scalar("tag", BaseType::Int8)
            .scalar("value", BaseType::Int64)
            .scalar("flag", BaseType::Char);
        assert_eq!(schema.field_offset("value"), Some(8));
        assert_eq!(schema.field_offset("flag"), Some(16));
        assert_eq!(schema.size_bytes(), 24);
    }

    #[test]
    fn missing_field() {
        assert_eq!(EntitySchema::edge().field_offset("nope"), None);
        assert!(EntitySchema::edge().field("weight").is_some());
    }

    #[test]
    fn display_lists_fields() {
        let text = EntitySchema::edge().to_string();
        assert!(text.starts_with("Edge { src: int32_t"), "{text}");
        assert!(text.ends_with("(16 bytes)"), "{text}");
    }
}
