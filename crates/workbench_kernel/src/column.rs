//! Columns and table shapes.

use serde_json::{json, Map, Value};
use workbench_protocol as protocol;

use crate::column_type::{ColumnType, ColumnTypeKind};
use crate::error::{KernelError, KernelResult};

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
    column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn to_arrow(&self) -> protocol::Column {
        protocol::Column::new(self.name.clone(), self.column_type.to_arrow())
    }

    pub fn from_arrow(wire: &protocol::Column) -> KernelResult<Self> {
        Ok(Self::new(
            wire.name.clone(),
            ColumnType::from_arrow(&wire.column_type)?,
        ))
    }

    /// Flat JSON form: `{"name": "A", "type": "number", "format": "{:,}"}`.
    pub fn to_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("name".to_string(), json!(self.name));
        dict.insert("type".to_string(), json!(self.column_type.name()));
        if let Some(format) = self.column_type.format() {
            dict.insert("format".to_string(), json!(format));
        }
        Value::Object(dict)
    }

    pub fn from_dict(value: &Value) -> KernelResult<Self> {
        let dict = value
            .as_object()
            .ok_or_else(|| KernelError::type_error(format!("column must be an object, got {}", value)))?;
        let name = dict
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| KernelError::value_error("column is missing string \"name\""))?;
        let type_name = dict
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| KernelError::value_error("column is missing string \"type\""))?;
        let kind = ColumnTypeKind::parse(type_name).ok_or_else(|| {
            KernelError::value_error(format!("unknown column type \"{}\"", type_name))
        })?;

        let column_type = match (kind, dict.get("format")) {
            (ColumnTypeKind::Number, Some(Value::String(format))) => ColumnType::number(format)?,
            (_, None | Some(Value::Null)) => kind.default_type(),
            (ColumnTypeKind::Number, Some(other)) => {
                return Err(KernelError::type_error(format!(
                    "number format must be a string, got {}",
                    other
                )))
            }
            (_, Some(_)) => {
                return Err(KernelError::value_error(format!(
                    "\"format\" not allowed for column type \"{}\"",
                    type_name
                )))
            }
        };
        Ok(Self::new(name, column_type))
    }
}

/// Row count plus columns, without data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableShape {
    pub nrows: usize,
    pub columns: Vec<Column>,
}

impl TableShape {
    pub fn new(nrows: usize, columns: Vec<Column>) -> Self {
        Self { nrows, columns }
    }

    pub fn to_arrow(&self) -> protocol::TableMetadata {
        protocol::TableMetadata::new(self.nrows, self.columns.iter().map(Column::to_arrow).collect())
    }

    pub fn from_arrow(metadata: &protocol::TableMetadata) -> KernelResult<Self> {
        let columns = metadata
            .columns
            .iter()
            .map(Column::from_arrow)
            .collect::<KernelResult<Vec<_>>>()?;
        Ok(Self::new(metadata.n_rows, columns))
    }
}
