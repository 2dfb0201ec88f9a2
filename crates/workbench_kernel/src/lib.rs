//! Workbench result kernel
//!
//! Turns whatever a module returns into one canonical result, and moves
//! that result to and from Arrow artifacts.
//!
//! # Flow
//!
//! 1. A module returns a [`ModuleValue`]: a table, an error string, a
//!    tuple, a dict of keyword arguments, ...
//! 2. [`ProcessResult::coerce`] validates the table, infers its
//!    [`Column`]s (keeping the previous step's number formats where it
//!    can) and normalizes errors and quick fixes.
//! 3. [`ProcessResult::truncate_in_place_if_too_big`] caps the row count.
//! 4. [`ProcessResult::to_arrow`] writes the Arrow file and returns the
//!    wire [`RenderResult`](workbench_protocol::RenderResult).
//!
//! # Modules
//!
//! - [`number_format`]: `{:,.2f}`-style number formats
//! - [`column_type`], [`column`], [`inference`]: the text/number/datetime
//!   type system
//! - [`dataframe`], [`validate`]: the in-memory table and its checks
//! - [`value`], [`quick_fix`], [`module_error`], [`process_result`]:
//!   coercion of module output
//! - [`arrow_io`]: the Arrow IPC codec
//! - [`prompting`], [`tab_output`]: inputs a step sees before rendering

pub mod arrow_io;
pub mod column;
pub mod column_type;
pub mod dataframe;
pub mod error;
pub mod inference;
pub mod module_error;
pub mod number_format;
pub mod process_result;
pub mod prompting;
pub mod quick_fix;
pub mod tab_output;
pub mod validate;
pub mod value;

pub use arrow_io::{read_dataframe, write_dataframe};
pub use column::{Column, TableShape};
pub use column_type::{ColumnType, ColumnTypeKind};
pub use dataframe::{Categorical, DataFrame, Dtype, Series, SeriesData};
pub use error::{KernelError, KernelResult};
pub use inference::{infer_column, infer_columns, ColumnFormats};
pub use module_error::{coerce_error, coerce_i18n_message, ProcessResultError};
pub use number_format::{FormatError, NumberFormatter, NumberValue};
pub use process_result::{ProcessResult, StepResultShape, StepStatus};
pub use prompting::{PromptingError, WrongColumnType};
pub use quick_fix::QuickFix;
pub use tab_output::{RenderColumn, TabOutput};
pub use validate::{validate_dataframe, ValidationError};
pub use value::ModuleValue;
