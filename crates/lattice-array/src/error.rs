use lattice_columnar::{ColumnType, StorageError};

pub type ArrayResult<T> = Result<T, ArrayError>;

/// Why a position list could not be re-encoded as a dimension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Irregularity {
    #[error("min appears {min_count} times but max appears {max_count} times")]
    UnbalancedBounds { min_count: usize, max_count: usize },

    #[error("groups hold different numbers of elements ({expected} vs {actual})")]
    UnequalGroups { expected: usize, actual: usize },

    #[error("elements are repeated a different number of times ({expected} vs {actual})")]
    UnequalRepeats { expected: usize, actual: usize },

    #[error("steps between consecutive elements differ")]
    UnequalSteps,

    #[error("a group does not run from min to max")]
    OpenGroup,
}

#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    #[error("{operation}: {message}")]
    General {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: problem allocating space for new column")]
    Allocation {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("{operation}: dimension type {column_type} not handled")]
    UnsupportedDimensionType {
        operation: &'static str,
        column_type: ColumnType,
    },

    #[error("{operation}: value type {column_type} not handled")]
    UnsupportedValueType {
        operation: &'static str,
        column_type: ColumnType,
    },

    #[error("{operation}: dimension not regular: {reason}")]
    IrregularityDetected {
        operation: &'static str,
        reason: Irregularity,
    },

    #[error("{operation}: {feature} is not supported")]
    UnsupportedFeature {
        operation: &'static str,
        feature: &'static str,
    },

    #[error("{operation}: unknown operator {operator:?}")]
    UnknownOperator {
        operation: &'static str,
        operator: String,
    },
}

impl ArrayError {
    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            ArrayError::General { operation, .. }
            | ArrayError::Allocation { operation, .. }
            | ArrayError::UnsupportedDimensionType { operation, .. }
            | ArrayError::UnsupportedValueType { operation, .. }
            | ArrayError::IrregularityDetected { operation, .. }
            | ArrayError::UnsupportedFeature { operation, .. }
            | ArrayError::UnknownOperator { operation, .. } => operation,
        }
    }

    pub(crate) fn general(operation: &'static str, message: impl Into<String>) -> Self {
        report(ArrayError::General {
            operation,
            message: message.into(),
        })
    }

    pub(crate) fn allocation(operation: &'static str, source: StorageError) -> Self {
        report(ArrayError::Allocation { operation, source })
    }

    pub(crate) fn dimension_type(operation: &'static str, column_type: ColumnType) -> Self {
        report(ArrayError::UnsupportedDimensionType {
            operation,
            column_type,
        })
    }

    pub(crate) fn value_type(operation: &'static str, column_type: ColumnType) -> Self {
        report(ArrayError::UnsupportedValueType {
            operation,
            column_type,
        })
    }

    pub(crate) fn irregular(operation: &'static str, reason: Irregularity) -> Self {
        report(ArrayError::IrregularityDetected { operation, reason })
    }

    pub(crate) fn unsupported(operation: &'static str, feature: &'static str) -> Self {
        report(ArrayError::UnsupportedFeature { operation, feature })
    }

    pub(crate) fn unknown_operator(operation: &'static str, operator: &str) -> Self {
        report(ArrayError::UnknownOperator {
            operation,
            operator: operator.to_string(),
        })
    }
}

/// Single exit point for every error raised by this crate.
fn report(error: ArrayError) -> ArrayError {
    log::debug!("{error}");
    error
}

/// Attach an operation name to storage failures (allocation or typed append).
pub(crate) fn storage(operation: &'static str) -> impl Fn(StorageError) -> ArrayError {
    move |source| match source {
        StorageError::Allocation { .. } => ArrayError::allocation(operation, source),
        other => ArrayError::general(operation, other.to_string()),
    }
}
