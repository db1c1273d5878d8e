use pg_query::protobuf;
use pg_query::protobuf::node::Node as PgNodeEnum;
use rest_request_rs::model::{
    AggregateFunction, AggregateTarget, ColumnFilter, ColumnTarget, EmbeddedTarget, Filter,
    FilterOperator, FilterValue, JoinType, JoinedColumn, JoinedColumns, Limit, LogicalFilter,
    LogicalOperator, Scalar, Select, Sort, SortDirection, SortNulls, Statement, Target,
};
use rest_request_rs::{render_http, render_supabase_js, HttpRequest, RenderError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{message}")]
    Parse {
        message: String,
        hint: Option<String>,
    },
    #[error("{message}")]
    Unsupported {
        message: String,
        hint: Option<String>,
    },
    #[error("{statement} statements are not yet implemented")]
    Unimplemented { statement: &'static str },
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CompileError {
    fn parse(message: impl Into<String>) -> Self {
        CompileError::Parse {
            message: message.into(),
            hint: None,
        }
    }

    fn unsupported(message: impl Into<String>) -> Self {
        CompileError::Unsupported {
            message: message.into(),
            hint: None,
        }
    }

    fn unsupported_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CompileError::Unsupported {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            CompileError::Parse { hint, .. } | CompileError::Unsupported { hint, .. } => {
                hint.as_deref()
            }
            _ => None,
        }
    }
}

include!("compiler/ast.rs");
include!("compiler/tree_utils.rs");
include!("compiler/from_join.rs");
include!("compiler/targets.rs");
include!("compiler/filters.rs");
include!("compiler/group_by.rs");
include!("compiler/sort_limit.rs");
include!("compiler/dispatch.rs");

#[cfg(test)]
mod tests {
    use super::*;

    include!("compiler/tests_internal.rs");
}
