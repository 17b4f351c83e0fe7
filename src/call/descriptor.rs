//! Call descriptors: the validated shape of one routine call.
//!
//! A descriptor is built once per routine at startup and shared read-only by
//! every call to that routine. Construction checks every shape invariant; a
//! failure means the code and the backend contract disagree, so callers treat
//! it as fatal rather than retrying.
//!
//! Call templates use `?` positional placeholders, one per parameter.

use thiserror::Error;

use super::kind::ValueKind;
use crate::backend::{CallMode, PreparedCall};

/// How a function returns its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnShape {
    /// One value: one column of one row.
    Scalar,
    /// Zero or more rows of the declared columns.
    #[default]
    Tabular,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Call template must not be blank")]
    BlankCall,

    #[error(
        "Parameter kinds ({kinds}), nullability ({nullable}), names ({names}), \
         and output flags ({outputs:?}) must all have the same length"
    )]
    LengthMismatch {
        kinds: usize,
        nullable: usize,
        names: usize,
        outputs: Option<usize>,
    },

    #[error("Procedures need output flags and output positions, and no return columns")]
    ProcedureShape,

    #[error("Functions need return columns, and no output flags or output positions")]
    FunctionShape,

    #[error("Functions must declare at least one return column")]
    NoReturnColumns,

    #[error("Scalar functions return exactly one column, {count} declared")]
    ScalarArity { count: usize },

    #[error("Position {position} is outside 1..={len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Output position {position} is listed more than once")]
    DuplicateOutput { position: usize },

    #[error("Output flags disagree with output positions at parameter {position}")]
    OutputFlagMismatch { position: usize },

    #[error("Parameter {position} of kind {kind} cannot be output-mode")]
    UnreadableOutput { position: usize, kind: ValueKind },

    #[error("Return column {column} of kind {kind} cannot be read")]
    UnreadableColumn { column: usize, kind: ValueKind },

    #[error("Template has {placeholders} placeholders for {params} parameters")]
    PlaceholderMismatch { placeholders: usize, params: usize },
}

/// Raw, unvalidated descriptor fields as parallel per-parameter arrays.
#[derive(Debug, Clone, Default)]
pub struct DescriptorParts {
    pub is_procedure: bool,
    pub call_template: String,
    pub param_kinds: Vec<ValueKind>,
    pub param_nullable: Vec<bool>,
    pub param_names: Vec<String>,
    /// Procedures only.
    pub param_is_output: Option<Vec<bool>>,
    /// Procedures only, 1-based.
    pub output_positions: Option<Vec<usize>>,
    /// Functions only.
    pub return_column_kinds: Option<Vec<ValueKind>>,
    /// Functions only.
    pub return_shape: ReturnShape,
}

/// Immutable, validated description of one routine's call shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor {
    is_procedure: bool,
    call_template: String,
    param_kinds: Vec<ValueKind>,
    param_nullable: Vec<bool>,
    param_names: Vec<String>,
    param_is_output: Option<Vec<bool>>,
    output_positions: Option<Vec<usize>>,
    return_column_kinds: Option<Vec<ValueKind>>,
    return_shape: ReturnShape,
}

impl CallDescriptor {
    /// Validate `parts` and build a descriptor.
    pub fn new(parts: DescriptorParts) -> Result<Self, DescriptorError> {
        if parts.call_template.trim().is_empty() {
            return Err(DescriptorError::BlankCall);
        }

        let len = parts.param_kinds.len();
        let outputs_len = parts.param_is_output.as_ref().map(Vec::len);
        if parts.param_nullable.len() != len
            || parts.param_names.len() != len
            || outputs_len.is_some_and(|n| n != len)
        {
            return Err(DescriptorError::LengthMismatch {
                kinds: len,
                nullable: parts.param_nullable.len(),
                names: parts.param_names.len(),
                outputs: outputs_len,
            });
        }

        if parts.is_procedure {
            let (Some(flags), Some(positions), None) = (
                &parts.param_is_output,
                &parts.output_positions,
                &parts.return_column_kinds,
            ) else {
                return Err(DescriptorError::ProcedureShape);
            };
            validate_outputs(&parts.param_kinds, flags, positions)?;
        } else {
            let (None, None, Some(columns)) = (
                &parts.param_is_output,
                &parts.output_positions,
                &parts.return_column_kinds,
            ) else {
                return Err(DescriptorError::FunctionShape);
            };
            validate_return_columns(columns, parts.return_shape)?;
        }

        let placeholders = placeholder_offsets(&parts.call_template).len();
        if placeholders != len {
            return Err(DescriptorError::PlaceholderMismatch {
                placeholders,
                params: len,
            });
        }

        Ok(Self {
            is_procedure: parts.is_procedure,
            call_template: parts.call_template,
            param_kinds: parts.param_kinds,
            param_nullable: parts.param_nullable,
            param_names: parts.param_names,
            param_is_output: parts.param_is_output,
            output_positions: parts.output_positions,
            return_column_kinds: parts.return_column_kinds,
            return_shape: parts.return_shape,
        })
    }

    pub fn is_procedure(&self) -> bool {
        self.is_procedure
    }

    pub fn call_template(&self) -> &str {
        &self.call_template
    }

    pub fn param_count(&self) -> usize {
        self.param_kinds.len()
    }

    pub fn param_kinds(&self) -> &[ValueKind] {
        &self.param_kinds
    }

    pub fn param_nullable(&self) -> &[bool] {
        &self.param_nullable
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn param_is_output(&self) -> Option<&[bool]> {
        self.param_is_output.as_deref()
    }

    pub fn output_positions(&self) -> Option<&[usize]> {
        self.output_positions.as_deref()
    }

    pub fn return_column_kinds(&self) -> Option<&[ValueKind]> {
        self.return_column_kinds.as_deref()
    }

    pub fn return_shape(&self) -> ReturnShape {
        self.return_shape
    }

    /// Whether the 0-based parameter `index` is output-mode.
    pub fn is_output(&self, index: usize) -> bool {
        self.param_is_output
            .as_ref()
            .and_then(|flags| flags.get(index).copied())
            .unwrap_or(false)
    }

    pub fn prepared_call(&self) -> PreparedCall {
        PreparedCall {
            template: self.call_template.clone(),
            mode: if self.is_procedure {
                CallMode::Procedure
            } else {
                CallMode::Function
            },
            param_count: self.param_count(),
        }
    }
}

fn validate_outputs(
    kinds: &[ValueKind],
    flags: &[bool],
    positions: &[usize],
) -> Result<(), DescriptorError> {
    let mut seen = vec![false; kinds.len()];
    for &position in positions {
        if position < 1 || position > kinds.len() {
            return Err(DescriptorError::PositionOutOfRange {
                position,
                len: kinds.len(),
            });
        }
        if seen[position - 1] {
            return Err(DescriptorError::DuplicateOutput { position });
        }
        seen[position - 1] = true;
    }

    for (i, (&flag, &listed)) in flags.iter().zip(&seen).enumerate() {
        if flag != listed {
            return Err(DescriptorError::OutputFlagMismatch { position: i + 1 });
        }
        if flag && !kinds[i].is_readable() {
            return Err(DescriptorError::UnreadableOutput {
                position: i + 1,
                kind: kinds[i],
            });
        }
    }
    Ok(())
}

fn validate_return_columns(
    columns: &[ValueKind],
    shape: ReturnShape,
) -> Result<(), DescriptorError> {
    if columns.is_empty() {
        return Err(DescriptorError::NoReturnColumns);
    }
    if shape == ReturnShape::Scalar && columns.len() != 1 {
        return Err(DescriptorError::ScalarArity {
            count: columns.len(),
        });
    }
    if let Some((i, kind)) = columns.iter().enumerate().find(|(_, k)| !k.is_readable()) {
        return Err(DescriptorError::UnreadableColumn {
            column: i + 1,
            kind: *kind,
        });
    }
    Ok(())
}

/// Byte offsets of `?` placeholders outside quoted literals and identifiers.
pub(crate) fn placeholder_offsets(template: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    for (offset, c) in template.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '?') => offsets.push(offset),
            _ => {}
        }
    }
    offsets
}

/// Turn 1-based positions into per-parameter flags.
fn flags_at(len: usize, positions: &[usize]) -> Result<Vec<bool>, DescriptorError> {
    let mut flags = vec![false; len];
    for &position in positions {
        if position < 1 || position > len {
            return Err(DescriptorError::PositionOutOfRange { position, len });
        }
        flags[position - 1] = true;
    }
    Ok(flags)
}

fn names(param_names: &[&str]) -> Vec<String> {
    param_names.iter().map(|s| s.to_string()).collect()
}

/// Build a function descriptor.
///
/// `routine` is the name plus parenthesized placeholders, e.g.
/// `"ViewReviews(?, ?, ?)"`. `nullable_positions` are 1-based.
pub fn build_function(
    routine: &str,
    param_kinds: &[ValueKind],
    nullable_positions: &[usize],
    param_names: &[&str],
    return_column_kinds: &[ValueKind],
    shape: ReturnShape,
) -> Result<CallDescriptor, DescriptorError> {
    let call_template = match shape {
        ReturnShape::Tabular => format!("SELECT * FROM {routine}"),
        ReturnShape::Scalar => format!("SELECT {routine}"),
    };
    CallDescriptor::new(DescriptorParts {
        is_procedure: false,
        call_template,
        param_kinds: param_kinds.to_vec(),
        param_nullable: flags_at(param_kinds.len(), nullable_positions)?,
        param_names: names(param_names),
        param_is_output: None,
        output_positions: None,
        return_column_kinds: Some(return_column_kinds.to_vec()),
        return_shape: shape,
    })
}

/// Build a procedure descriptor.
///
/// `nullable_positions` and `output_positions` are 1-based. Output values
/// come back in `output_positions` order.
pub fn build_procedure(
    routine: &str,
    param_kinds: &[ValueKind],
    nullable_positions: &[usize],
    param_names: &[&str],
    output_positions: &[usize],
) -> Result<CallDescriptor, DescriptorError> {
    CallDescriptor::new(DescriptorParts {
        is_procedure: true,
        call_template: format!("CALL {routine}"),
        param_kinds: param_kinds.to_vec(),
        param_nullable: flags_at(param_kinds.len(), nullable_positions)?,
        param_names: names(param_names),
        param_is_output: Some(flags_at(param_kinds.len(), output_positions)?),
        output_positions: Some(output_positions.to_vec()),
        return_column_kinds: None,
        return_shape: ReturnShape::default(),
    })
}

/// Build a descriptor for a fixed, parameterless lookup query.
///
/// The query text is used verbatim as the call template.
pub fn build_query(
    query: &str,
    return_column_kinds: &[ValueKind],
) -> Result<CallDescriptor, DescriptorError> {
    CallDescriptor::new(DescriptorParts {
        is_procedure: false,
        call_template: query.to_string(),
        return_column_kinds: Some(return_column_kinds.to_vec()),
        return_shape: ReturnShape::Tabular,
        ..DescriptorParts::default()
    })
}
