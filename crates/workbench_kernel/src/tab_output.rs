//! Another tab's output, loaded for a step that reads it.

use workbench_protocol as protocol;

use crate::arrow_io::read_dataframe;
use crate::column::Column;
use crate::column_type::ColumnTypeKind;
use crate::dataframe::DataFrame;
use crate::error::KernelResult;

/// A column as a module sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderColumn {
    pub name: String,
    pub column_type: ColumnTypeKind,
    /// Number format; `None` for text and datetime columns
    pub format: Option<String>,
}

impl From<&Column> for RenderColumn {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name().to_string(),
            column_type: column.column_type().kind(),
            format: column.column_type().format().map(str::to_string),
        }
    }
}

/// The final output of another tab: its identity, columns and table.
#[derive(Debug, Clone, PartialEq)]
pub struct TabOutput {
    pub slug: String,
    pub name: String,
    /// In table order
    pub columns: Vec<RenderColumn>,
    pub dataframe: DataFrame,
}

impl TabOutput {
    pub fn from_arrow(wire: &protocol::TabOutput) -> KernelResult<Self> {
        let (dataframe, columns) = read_dataframe(&wire.table)?;
        Ok(Self {
            slug: wire.tab.slug.clone(),
            name: wire.tab.name.clone(),
            columns: columns.iter().map(RenderColumn::from).collect(),
            dataframe,
        })
    }

    pub fn column(&self, name: &str) -> Option<&RenderColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}
