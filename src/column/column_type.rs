//! Column types declared by a table schema and the filter behavior each one gets.

use crate::condition::CompareOp;
use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column types a table schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Number,
    Text,
    Checkbox,
    Date,
    SingleSelect,
    LongText,
    Image,
    File,
    MultipleSelect,
    Collaborator,
    Link,
    Formula,
    Creator,
    Ctime,
    LastModifier,
    Mtime,
    Geolocation,
    AutoNumber,
    Url,
    /// Any type without a variant of its own
    Other,
}

/// How cells of a column are parsed and compared.
///
/// Types without dedicated semantics share the `Text` behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Number,
    Date,
    /// Stored as a UTC timestamp and compared in local time
    UtcTimestamp,
    Checkbox,
    Text,
    LongText,
    List,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Text => "text",
            ColumnType::Checkbox => "checkbox",
            ColumnType::Date => "date",
            ColumnType::SingleSelect => "single-select",
            ColumnType::LongText => "long-text",
            ColumnType::Image => "image",
            ColumnType::File => "file",
            ColumnType::MultipleSelect => "multiple-select",
            ColumnType::Collaborator => "collaborator",
            ColumnType::Link => "link",
            ColumnType::Formula => "formula",
            ColumnType::Creator => "creator",
            ColumnType::Ctime => "ctime",
            ColumnType::LastModifier => "last-modifier",
            ColumnType::Mtime => "mtime",
            ColumnType::Geolocation => "geolocation",
            ColumnType::AutoNumber => "auto-number",
            ColumnType::Url => "url",
            ColumnType::Other => "other",
        }
    }

    /// Look up a schema type name; unrecognized names map to `Other`
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => ColumnType::Number,
            "text" => ColumnType::Text,
            "checkbox" => ColumnType::Checkbox,
            "date" => ColumnType::Date,
            "single-select" => ColumnType::SingleSelect,
            "long-text" => ColumnType::LongText,
            "image" => ColumnType::Image,
            "file" => ColumnType::File,
            "multiple-select" => ColumnType::MultipleSelect,
            "collaborator" => ColumnType::Collaborator,
            "link" => ColumnType::Link,
            "formula" => ColumnType::Formula,
            "creator" => ColumnType::Creator,
            "ctime" => ColumnType::Ctime,
            "last-modifier" => ColumnType::LastModifier,
            "mtime" => ColumnType::Mtime,
            "geolocation" => ColumnType::Geolocation,
            "auto-number" => ColumnType::AutoNumber,
            "url" => ColumnType::Url,
            _ => ColumnType::Other,
        }
    }

    /// Look up the filter behavior for this column type
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnType::Number => ColumnKind::Number,
            ColumnType::Date => ColumnKind::Date,
            ColumnType::Ctime | ColumnType::Mtime => ColumnKind::UtcTimestamp,
            ColumnType::Checkbox => ColumnKind::Checkbox,
            ColumnType::LongText => ColumnKind::LongText,
            ColumnType::MultipleSelect => ColumnKind::List,
            _ => ColumnKind::Text,
        }
    }

    /// Check whether the operator can be applied to cells of this type
    pub fn supports(&self, op: CompareOp) -> bool {
        match (self.kind(), op) {
            (_, CompareOp::Equal | CompareOp::NotEqual) => true,
            (ColumnKind::Text | ColumnKind::LongText, CompareOp::Like) => true,
            (
                ColumnKind::Number | ColumnKind::Date | ColumnKind::UtcTimestamp,
                CompareOp::Greater
                | CompareOp::GreaterEqual
                | CompareOp::Less
                | CompareOp::LessEqual,
            ) => true,
            _ => false,
        }
    }

    /// Fail with `UnsupportedOperation` unless the operator is supported
    pub fn check_operator(&self, op: CompareOp) -> QueryResult<()> {
        if self.supports(op) {
            Ok(())
        } else {
            Err(QueryError::UnsupportedOperation {
                column_type: *self,
                operator: op,
            })
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column as described by the table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawColumnSchema", into = "RawColumnSchema")]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub key: String,
    /// Type name as declared, kept so unrecognized types are written back unchanged
    type_name: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type,
            key: key.into(),
            type_name: column_type.as_str().to_string(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

#[derive(Serialize, Deserialize)]
struct RawColumnSchema {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    key: String,
}

impl From<RawColumnSchema> for ColumnSchema {
    fn from(raw: RawColumnSchema) -> Self {
        Self {
            name: raw.name,
            column_type: ColumnType::from_name(&raw.type_name),
            key: raw.key,
            type_name: raw.type_name,
        }
    }
}

impl From<ColumnSchema> for RawColumnSchema {
    fn from(schema: ColumnSchema) -> Self {
        Self {
            name: schema.name,
            type_name: schema.type_name,
            key: schema.key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_types_use_text_behavior() {
        for column_type in [
            ColumnType::SingleSelect,
            ColumnType::Url,
            ColumnType::Link,
            ColumnType::Formula,
            ColumnType::AutoNumber,
        ] {
            assert_eq!(column_type.kind(), ColumnKind::Text);
        }
        assert_eq!(ColumnType::Mtime.kind(), ColumnKind::UtcTimestamp);
        assert_eq!(ColumnType::MultipleSelect.kind(), ColumnKind::List);
    }

    #[test]
    fn test_support_matrix() {
        assert!(ColumnType::Number.supports(CompareOp::GreaterEqual));
        assert!(!ColumnType::Number.supports(CompareOp::Like));
        assert!(ColumnType::Date.supports(CompareOp::Less));
        assert!(ColumnType::Checkbox.supports(CompareOp::Equal));
        assert!(!ColumnType::Checkbox.supports(CompareOp::Less));
        assert!(ColumnType::LongText.supports(CompareOp::Like));
        assert!(!ColumnType::Text.supports(CompareOp::Greater));
        assert!(ColumnType::MultipleSelect.supports(CompareOp::NotEqual));
        assert!(!ColumnType::MultipleSelect.supports(CompareOp::Like));

        assert!(matches!(
            ColumnType::Checkbox.check_operator(CompareOp::Like),
            Err(QueryError::UnsupportedOperation {
                column_type: ColumnType::Checkbox,
                operator: CompareOp::Like,
            })
        ));
    }

    #[test]
    fn test_schema_deserialize() -> anyhow::Result<()> {
        let columns: Vec<ColumnSchema> = serde_json::from_str(
            r#"[
                {"name": "Name", "type": "text", "key": "0000"},
                {"name": "Tags", "type": "multiple-select", "key": "a1b2"},
                {"name": "Created", "type": "ctime"}
            ]"#,
        )?;
        assert_eq!(columns[0], ColumnSchema::new("Name", ColumnType::Text, "0000"));
        assert_eq!(columns[1].column_type, ColumnType::MultipleSelect);
        assert_eq!(columns[2].column_type, ColumnType::Ctime);
        assert_eq!(columns[2].key, "");
        Ok(())
    }

    #[test]
    fn test_unknown_schema_type_uses_text_behavior() -> anyhow::Result<()> {
        let column: ColumnSchema =
            serde_json::from_str(r#"{"name": "mail", "type": "email", "key": "0003"}"#)?;
        assert_eq!(column.column_type, ColumnType::Other);
        assert_eq!(column.type_name(), "email");
        assert_eq!(column.column_type.kind(), ColumnKind::Text);
        assert!(column.column_type.supports(CompareOp::Like));

        let json = serde_json::to_value(&column)?;
        assert_eq!(json["type"], "email");
        Ok(())
    }

    #[test]
    fn test_names_round_trip() {
        for column_type in [
            ColumnType::LongText,
            ColumnType::LastModifier,
            ColumnType::AutoNumber,
            ColumnType::MultipleSelect,
        ] {
            assert_eq!(ColumnType::from_name(&column_type.to_string()), column_type);
        }
        assert_eq!(ColumnType::from_name("duration"), ColumnType::Other);
    }
}
