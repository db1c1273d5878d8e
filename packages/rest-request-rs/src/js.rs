use crate::model::{
    ColumnFilter, Filter, FilterOperator, FilterValue, Limit, LogicalFilter, LogicalOperator,
    Scalar, Select, Sort, SortDirection, SortNulls, Statement,
};
use crate::render::{
    operator_value_compatible, projects_all_columns, render_filter_inline, render_target_list,
    RenderError,
};

const RENDERER: &str = "supabase-js";

pub fn render_supabase_js(statement: &Statement) -> Result<String, RenderError> {
    let Statement::Select(select) = statement;
    let mut lines = Vec::new();
    lines.push("const { data, error } = await supabase".to_string());
    lines.push(format!("  .from({})", js_string(&select.from)));
    lines.push(format!("  .select({})", js_string(&select_list(select)?)));

    if let Some(filter) = &select.filter {
        push_filter_lines(filter, &mut lines)?;
    }
    for sort in &select.sorts {
        lines.push(render_order_call(sort));
    }
    if let Some(limit) = &select.limit {
        lines.push(render_limit_call(limit)?);
    }

    Ok(lines.join("\n"))
}

fn select_list(select: &Select) -> Result<String, RenderError> {
    if projects_all_columns(&select.targets) {
        return Ok("*".to_string());
    }
    render_target_list(&select.targets, RENDERER)
}

fn push_filter_lines(filter: &Filter, lines: &mut Vec<String>) -> Result<(), RenderError> {
    match filter {
        Filter::Logical(logical)
            if logical.operator == LogicalOperator::And && !logical.negate =>
        {
            for child in &logical.filters {
                push_filter_call(child, lines)?;
            }
            Ok(())
        }
        other => push_filter_call(other, lines),
    }
}

fn push_filter_call(filter: &Filter, lines: &mut Vec<String>) -> Result<(), RenderError> {
    match filter {
        Filter::Column(column) => {
            lines.push(render_column_call(column)?);
            Ok(())
        }
        Filter::Logical(logical) => {
            lines.push(render_logical_call(logical)?);
            Ok(())
        }
    }
}

// The client has no negated logical builder, so negated trees ride inside a
// single-argument or().
fn render_logical_call(logical: &LogicalFilter) -> Result<String, RenderError> {
    let mut parts = Vec::with_capacity(logical.filters.len());
    for child in &logical.filters {
        parts.push(render_filter_inline(child, true, RENDERER)?);
    }
    let joined = parts.join(",");
    let argument = if logical.negate {
        format!("not.{}({joined})", logical.operator.as_str())
    } else if logical.operator == LogicalOperator::And {
        format!("and({joined})")
    } else {
        joined
    };
    Ok(format!("  .or({})", js_string(&argument)))
}

fn render_column_call(column: &ColumnFilter) -> Result<String, RenderError> {
    if !operator_value_compatible(column.operator, &column.value) {
        return Err(RenderError::new(
            RENDERER,
            format!(
                "the {} operator cannot be rendered with the given value",
                column.operator.as_str()
            ),
        ));
    }
    if column.negate {
        return render_not_call(column);
    }

    let call = match (column.operator, &column.value) {
        (
            FilterOperator::Eq
            | FilterOperator::Neq
            | FilterOperator::Gt
            | FilterOperator::Gte
            | FilterOperator::Lt
            | FilterOperator::Lte,
            FilterValue::Scalar(value),
        ) => format!(
            "{}({}, {})",
            column.operator.as_str(),
            js_string(&column.column),
            js_scalar(value)
        ),
        (
            FilterOperator::Like | FilterOperator::Ilike,
            FilterValue::Scalar(Scalar::String(pattern)),
        ) => format!(
            "{}({}, {})",
            column.operator.as_str(),
            js_string(&column.column),
            js_string(pattern)
        ),
        (
            FilterOperator::Match | FilterOperator::Imatch,
            FilterValue::Scalar(Scalar::String(pattern)),
        ) => format!(
            "filter({}, {}, {})",
            js_string(&column.column),
            js_string(column.operator.as_str()),
            js_string(pattern)
        ),
        (FilterOperator::Is, FilterValue::Null) => {
            format!("is({}, null)", js_string(&column.column))
        }
        (FilterOperator::In, FilterValue::List(values)) => {
            let rendered = values.iter().map(js_scalar).collect::<Vec<_>>().join(", ");
            format!("in({}, [{}])", js_string(&column.column), rendered)
        }
        (
            FilterOperator::Fts
            | FilterOperator::Plfts
            | FilterOperator::Phfts
            | FilterOperator::Wfts,
            FilterValue::TextQuery { query, config },
        ) => render_text_search(column.operator, &column.column, query, config.as_deref()),
        _ => {
            return Err(RenderError::new(
                RENDERER,
                format!(
                    "the {} operator cannot be rendered with the given value",
                    column.operator.as_str()
                ),
            ));
        }
    };
    Ok(format!("  .{call}"))
}

fn render_text_search(
    operator: FilterOperator,
    column: &str,
    query: &str,
    config: Option<&str>,
) -> String {
    let type_name = match operator {
        FilterOperator::Plfts => "plain",
        FilterOperator::Phfts => "phrase",
        FilterOperator::Wfts => "websearch",
        _ => "default",
    };
    let mut options = vec![format!("type: {}", js_string(type_name))];
    if let Some(config) = config {
        options.push(format!("config: {}", js_string(config)));
    }
    format!(
        "textSearch({}, {}, {{ {} }})",
        js_string(column),
        js_string(query),
        options.join(", ")
    )
}

fn render_not_call(column: &ColumnFilter) -> Result<String, RenderError> {
    let operator_token = match &column.value {
        FilterValue::TextQuery {
            config: Some(config),
            ..
        } => format!("{}({})", column.operator.as_str(), config),
        _ => column.operator.as_str().to_string(),
    };
    let value_token = match &column.value {
        FilterValue::Null => "null".to_string(),
        FilterValue::Scalar(value) => js_scalar(value),
        FilterValue::List(values) => {
            let rendered = values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(",");
            js_string(&format!("({rendered})"))
        }
        FilterValue::TextQuery { query, .. } => js_string(query),
    };
    Ok(format!(
        "  .not({}, {}, {})",
        js_string(&column.column),
        js_string(&operator_token),
        value_token
    ))
}

fn render_order_call(sort: &Sort) -> String {
    let mut options = Vec::new();
    if let Some(direction) = sort.direction {
        options.push(format!("ascending: {}", direction == SortDirection::Asc));
    }
    if let Some(nulls) = sort.nulls {
        options.push(format!("nullsFirst: {}", nulls == SortNulls::First));
    }
    if options.is_empty() {
        format!("  .order({})", js_string(&sort.column))
    } else {
        format!(
            "  .order({}, {{ {} }})",
            js_string(&sort.column),
            options.join(", ")
        )
    }
}

fn render_limit_call(limit: &Limit) -> Result<String, RenderError> {
    match (limit.count, limit.offset) {
        (Some(count), None) => Ok(format!("  .limit({count})")),
        (Some(count), Some(offset)) => Ok(format!("  .range({}, {})", offset, offset + count)),
        (None, Some(_)) => Err(RenderError::new(
            RENDERER,
            "an offset without a limit cannot be expressed as a client call",
        )),
        (None, None) => Err(RenderError::new(
            RENDERER,
            "a limit clause must carry a count or an offset",
        )),
    }
}

fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn js_scalar(value: &Scalar) -> String {
    match value {
        Scalar::String(text) => js_string(text),
        Scalar::Integer(number) => number.to_string(),
        Scalar::Float(number) => number.to_string(),
    }
}
