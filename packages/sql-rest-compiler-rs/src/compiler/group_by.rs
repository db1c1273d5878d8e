fn validate_group_by(
    group_clause: &[protobuf::Node],
    targets: &[Target],
    env: &RelationEnv,
) -> Result<(), CompileError> {
    if group_clause.is_empty() {
        return Ok(());
    }

    if !targets_some(targets, &|target| matches!(target, Target::Aggregate(_))) {
        return Err(CompileError::unsupported(
            "GROUP BY requires at least one aggregate function in the select target list",
        ));
    }

    let mut group_columns = Vec::with_capacity(group_clause.len());
    for item in group_clause {
        group_columns.push(lower_column_expr(item, env)?);
    }

    let mut projected = Vec::new();
    flatten_column_targets(targets, None, &mut projected);

    for (qualifier, column) in &projected {
        let grouped = group_columns.iter().any(|group| {
            group.qualifier.as_deref() == qualifier.as_deref() && group.column == column.column
        });
        if !grouped {
            return Err(CompileError::unsupported(format!(
                "column '{}' must appear in the GROUP BY clause or be used in an aggregate function",
                render_prefixed(qualifier.as_deref(), &column.column)
            )));
        }
    }

    for group in &group_columns {
        let selected = projected.iter().any(|(qualifier, column)| {
            group.qualifier.as_deref() == qualifier.as_deref() && group.column == column.column
        });
        if !selected {
            return Err(CompileError::unsupported(
                "Every group by column must also exist as a select target",
            ));
        }
    }

    Ok(())
}

fn render_prefixed(qualifier: Option<&str>, column: &str) -> String {
    match qualifier {
        Some(qualifier) => format!("{qualifier}.{column}"),
        None => column.to_string(),
    }
}
