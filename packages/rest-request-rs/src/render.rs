use crate::model::{
    AggregateTarget, ColumnFilter, ColumnTarget, EmbeddedTarget, Filter, FilterOperator,
    FilterValue, JoinType, LogicalFilter, LogicalOperator, Scalar, Target,
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{renderer} renderer: {message}")]
pub struct RenderError {
    pub renderer: &'static str,
    pub message: String,
}

impl RenderError {
    pub(crate) fn new(renderer: &'static str, message: impl Into<String>) -> Self {
        RenderError {
            renderer,
            message: message.into(),
        }
    }
}

pub(crate) fn projects_all_columns(targets: &[Target]) -> bool {
    match targets {
        [Target::Column(column)] => {
            column.column == "*" && column.alias.is_none() && column.cast.is_none()
        }
        _ => false,
    }
}

pub(crate) fn render_target_list(
    targets: &[Target],
    renderer: &'static str,
) -> Result<String, RenderError> {
    let mut parts = Vec::with_capacity(targets.len());
    for target in targets {
        parts.push(render_target(target, renderer)?);
    }
    Ok(parts.join(","))
}

fn render_target(target: &Target, renderer: &'static str) -> Result<String, RenderError> {
    match target {
        Target::Column(column) => Ok(render_column_target(column)),
        Target::Aggregate(aggregate) => Ok(render_aggregate_target(aggregate)),
        Target::Embedded(embedded) => render_embedded_target(embedded, renderer),
    }
}

fn render_column_target(column: &ColumnTarget) -> String {
    let mut out = String::new();
    if let Some(alias) = &column.alias {
        out.push_str(alias);
        out.push(':');
    }
    out.push_str(&column.column);
    if let Some(cast) = &column.cast {
        out.push_str("::");
        out.push_str(cast);
    }
    out
}

fn render_aggregate_target(aggregate: &AggregateTarget) -> String {
    let mut out = String::new();
    if let Some(alias) = &aggregate.alias {
        out.push_str(alias);
        out.push(':');
    }
    if let Some(column) = &aggregate.column {
        out.push_str(column);
        if let Some(cast) = &aggregate.input_cast {
            out.push_str("::");
            out.push_str(cast);
        }
        out.push('.');
    }
    out.push_str(aggregate.function_name.as_str());
    out.push_str("()");
    if let Some(cast) = &aggregate.output_cast {
        out.push_str("::");
        out.push_str(cast);
    }
    out
}

fn render_embedded_target(
    embedded: &EmbeddedTarget,
    renderer: &'static str,
) -> Result<String, RenderError> {
    let mut out = String::new();
    if embedded.flatten {
        // Spread embeds cannot carry an alias, so any alias is dropped here.
        out.push_str("...");
    } else if let Some(alias) = &embedded.alias {
        out.push_str(alias);
        out.push(':');
    }
    out.push_str(&embedded.relation);
    if embedded.join_type == JoinType::Inner {
        out.push_str("!inner");
    }
    out.push('(');
    out.push_str(&render_target_list(&embedded.targets, renderer)?);
    out.push(')');
    Ok(out)
}

pub(crate) fn render_filter_params(
    filter: &Filter,
    url_safe: bool,
    renderer: &'static str,
) -> Result<Vec<(String, String)>, RenderError> {
    match filter {
        Filter::Logical(logical)
            if logical.operator == LogicalOperator::And && !logical.negate =>
        {
            let mut params = Vec::with_capacity(logical.filters.len());
            for child in &logical.filters {
                params.push(render_filter_entry(child, url_safe, renderer)?);
            }
            Ok(params)
        }
        other => Ok(vec![render_filter_entry(other, url_safe, renderer)?]),
    }
}

pub(crate) fn render_filter_entry(
    filter: &Filter,
    url_safe: bool,
    renderer: &'static str,
) -> Result<(String, String), RenderError> {
    match filter {
        Filter::Column(column) => Ok((
            column.column.clone(),
            render_column_predicate(column, url_safe, renderer)?,
        )),
        Filter::Logical(logical) => {
            let mut key = String::new();
            if logical.negate {
                key.push_str("not.");
            }
            key.push_str(logical.operator.as_str());
            Ok((key, render_logical_children(logical, url_safe, renderer)?))
        }
    }
}

fn render_logical_children(
    logical: &LogicalFilter,
    url_safe: bool,
    renderer: &'static str,
) -> Result<String, RenderError> {
    let mut parts = Vec::with_capacity(logical.filters.len());
    for child in &logical.filters {
        parts.push(render_filter_inline(child, url_safe, renderer)?);
    }
    Ok(format!("({})", parts.join(",")))
}

pub(crate) fn render_filter_inline(
    filter: &Filter,
    url_safe: bool,
    renderer: &'static str,
) -> Result<String, RenderError> {
    let (key, value) = render_filter_entry(filter, url_safe, renderer)?;
    match filter {
        Filter::Column(_) => Ok(format!("{key}.{value}")),
        Filter::Logical(_) => Ok(format!("{key}{value}")),
    }
}

pub(crate) fn render_column_predicate(
    column: &ColumnFilter,
    url_safe: bool,
    renderer: &'static str,
) -> Result<String, RenderError> {
    let mut out = String::new();
    if column.negate {
        out.push_str("not.");
    }
    match (column.operator, &column.value) {
        (
            FilterOperator::Eq
            | FilterOperator::Neq
            | FilterOperator::Gt
            | FilterOperator::Gte
            | FilterOperator::Lt
            | FilterOperator::Lte,
            FilterValue::Scalar(value),
        ) => {
            out.push_str(column.operator.as_str());
            out.push('.');
            out.push_str(&value.to_string());
        }
        (
            FilterOperator::Like
            | FilterOperator::Ilike
            | FilterOperator::Match
            | FilterOperator::Imatch,
            FilterValue::Scalar(Scalar::String(pattern)),
        ) => {
            out.push_str(column.operator.as_str());
            out.push('.');
            out.push_str(&render_pattern(column.operator, pattern, url_safe));
        }
        (FilterOperator::Is, FilterValue::Null) => out.push_str("is.null"),
        (FilterOperator::In, FilterValue::List(values)) => {
            let rendered = values
                .iter()
                .map(render_in_element)
                .collect::<Vec<_>>()
                .join(",");
            out.push_str("in.(");
            out.push_str(&rendered);
            out.push(')');
        }
        (
            FilterOperator::Fts
            | FilterOperator::Plfts
            | FilterOperator::Phfts
            | FilterOperator::Wfts,
            FilterValue::TextQuery { query, config },
        ) => {
            out.push_str(column.operator.as_str());
            if let Some(config) = config {
                out.push('(');
                out.push_str(config);
                out.push(')');
            }
            out.push('.');
            out.push_str(query);
        }
        _ => {
            return Err(RenderError::new(
                renderer,
                format!(
                    "the {} operator cannot be rendered with the given value",
                    column.operator.as_str()
                ),
            ));
        }
    }
    Ok(out)
}

pub(crate) fn operator_value_compatible(operator: FilterOperator, value: &FilterValue) -> bool {
    match operator {
        FilterOperator::Eq
        | FilterOperator::Neq
        | FilterOperator::Gt
        | FilterOperator::Gte
        | FilterOperator::Lt
        | FilterOperator::Lte => matches!(value, FilterValue::Scalar(_)),
        FilterOperator::Like
        | FilterOperator::Ilike
        | FilterOperator::Match
        | FilterOperator::Imatch => matches!(value, FilterValue::Scalar(Scalar::String(_))),
        FilterOperator::Is => matches!(value, FilterValue::Null),
        FilterOperator::In => matches!(value, FilterValue::List(_)),
        FilterOperator::Fts
        | FilterOperator::Plfts
        | FilterOperator::Phfts
        | FilterOperator::Wfts => matches!(value, FilterValue::TextQuery { .. }),
    }
}

fn render_pattern(operator: FilterOperator, pattern: &str, url_safe: bool) -> String {
    let translate =
        url_safe && matches!(operator, FilterOperator::Like | FilterOperator::Ilike);
    if translate {
        pattern.replace('%', "*")
    } else {
        pattern.to_string()
    }
}

fn render_in_element(value: &Scalar) -> String {
    match value {
        Scalar::String(text) if text.contains(',') => format!("\"{text}\""),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JoinedColumn;
    use crate::model::JoinedColumns;

    fn embedded(relation: &str, flatten: bool, alias: Option<&str>) -> EmbeddedTarget {
        EmbeddedTarget {
            relation: relation.to_string(),
            alias: alias.map(str::to_string),
            join_type: JoinType::Inner,
            targets: vec![Target::Column(ColumnTarget {
                column: "name".to_string(),
                alias: None,
                cast: None,
            })],
            flatten,
            joined_columns: JoinedColumns {
                left: JoinedColumn {
                    relation: "books".to_string(),
                    column: "author_id".to_string(),
                },
                right: JoinedColumn {
                    relation: relation.to_string(),
                    column: "id".to_string(),
                },
            },
        }
    }

    #[test]
    fn renders_column_targets_with_alias_and_cast() {
        let targets = vec![
            Target::Column(ColumnTarget {
                column: "title".to_string(),
                alias: Some("t".to_string()),
                cast: None,
            }),
            Target::Column(ColumnTarget {
                column: "pages".to_string(),
                alias: None,
                cast: Some("text".to_string()),
            }),
        ];
        assert_eq!(
            render_target_list(&targets, "http").unwrap(),
            "t:title,pages::text"
        );
    }

    #[test]
    fn renders_aggregate_targets() {
        let bare = Target::Aggregate(AggregateTarget {
            function_name: crate::model::AggregateFunction::Count,
            column: None,
            alias: None,
            input_cast: None,
            output_cast: None,
        });
        let full = Target::Aggregate(AggregateTarget {
            function_name: crate::model::AggregateFunction::Sum,
            column: Some("price".to_string()),
            alias: Some("total".to_string()),
            input_cast: Some("int".to_string()),
            output_cast: Some("text".to_string()),
        });
        assert_eq!(
            render_target_list(&[bare, full], "http").unwrap(),
            "count(),total:price::int.sum()::text"
        );
    }

    #[test]
    fn spread_embeds_drop_their_alias() {
        let target = Target::Embedded(embedded("authors", true, Some("a")));
        assert_eq!(
            render_target_list(&[target], "http").unwrap(),
            "...authors!inner(name)"
        );
    }

    #[test]
    fn nested_embeds_keep_their_alias() {
        let target = Target::Embedded(embedded("authors", false, Some("a")));
        assert_eq!(
            render_target_list(&[target], "http").unwrap(),
            "a:authors!inner(name)"
        );
    }

    #[test]
    fn quotes_in_list_elements_containing_commas() {
        let filter = ColumnFilter {
            column: "tag".to_string(),
            operator: FilterOperator::In,
            negate: false,
            value: FilterValue::List(vec![
                Scalar::String("a,b".to_string()),
                Scalar::Integer(2),
            ]),
        };
        assert_eq!(
            render_column_predicate(&filter, true, "http").unwrap(),
            "in.(\"a,b\",2)"
        );
    }

    #[test]
    fn translates_like_wildcards_only_when_url_safe() {
        let filter = ColumnFilter {
            column: "title".to_string(),
            operator: FilterOperator::Ilike,
            negate: false,
            value: FilterValue::Scalar(Scalar::String("%foo%".to_string())),
        };
        assert_eq!(
            render_column_predicate(&filter, true, "http").unwrap(),
            "ilike.*foo*"
        );
        assert_eq!(
            render_column_predicate(&filter, false, "http").unwrap(),
            "ilike.%foo%"
        );
    }

    #[test]
    fn renders_negated_logical_filters_inline() {
        let filter = Filter::Logical(LogicalFilter {
            operator: LogicalOperator::And,
            negate: true,
            filters: vec![
                Filter::Column(ColumnFilter {
                    column: "rating".to_string(),
                    operator: FilterOperator::Gt,
                    negate: false,
                    value: FilterValue::Scalar(Scalar::Integer(4)),
                }),
                Filter::Column(ColumnFilter {
                    column: "id".to_string(),
                    operator: FilterOperator::Is,
                    negate: true,
                    value: FilterValue::Null,
                }),
            ],
        });
        assert_eq!(
            render_filter_inline(&filter, true, "http").unwrap(),
            "not.and(rating.gt.4,id.not.is.null)"
        );
    }

    #[test]
    fn rejects_mismatched_operator_and_value() {
        let filter = ColumnFilter {
            column: "id".to_string(),
            operator: FilterOperator::Is,
            negate: false,
            value: FilterValue::Scalar(Scalar::Integer(1)),
        };
        let error = render_column_predicate(&filter, true, "http").unwrap_err();
        assert_eq!(error.renderer, "http");
        assert!(!operator_value_compatible(filter.operator, &filter.value));
    }
}
