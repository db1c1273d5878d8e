fn lower_sort_clause(
    sort_clause: &[protobuf::Node],
    env: &RelationEnv,
) -> Result<Vec<Sort>, CompileError> {
    let mut sorts = Vec::with_capacity(sort_clause.len());
    for item in sort_clause {
        sorts.push(lower_sort_item(item, env)?);
    }
    Ok(sorts)
}

fn lower_sort_item(node: &protobuf::Node, env: &RelationEnv) -> Result<Sort, CompileError> {
    let Some(PgNodeEnum::SortBy(sort_by)) = node.node.as_ref() else {
        return Err(CompileError::parse("expected a sort item in parsed SQL"));
    };
    let value = sort_by
        .node
        .as_deref()
        .ok_or_else(|| CompileError::parse("sort item missing its expression"))?;
    if matches!(value.node.as_ref(), Some(PgNodeEnum::TypeCast(_))) {
        return Err(CompileError::unsupported(
            "casting is not supported in the ORDER BY clause",
        ));
    }
    // Embedded sorts use relation(column), the one place dot syntax is invalid.
    let column = lower_column_expr(value, env)?.render(NameSyntax::Parenthesized);

    let direction = match protobuf::SortByDir::try_from(sort_by.sortby_dir) {
        Ok(protobuf::SortByDir::SortbyDefault) => None,
        Ok(protobuf::SortByDir::SortbyAsc) => Some(SortDirection::Asc),
        Ok(protobuf::SortByDir::SortbyDesc) => Some(SortDirection::Desc),
        _ => {
            return Err(CompileError::unsupported(
                "ORDER BY USING is not supported",
            ));
        }
    };
    let nulls = match protobuf::SortByNulls::try_from(sort_by.sortby_nulls) {
        Ok(protobuf::SortByNulls::SortbyNullsDefault) => None,
        Ok(protobuf::SortByNulls::SortbyNullsFirst) => Some(SortNulls::First),
        Ok(protobuf::SortByNulls::SortbyNullsLast) => Some(SortNulls::Last),
        _ => return Err(CompileError::parse("unknown NULLS ordering in parsed SQL")),
    };

    Ok(Sort {
        column,
        direction,
        nulls,
    })
}

fn lower_limit(select: &protobuf::SelectStmt) -> Result<Option<Limit>, CompileError> {
    let count = limit_value(select.limit_count.as_deref(), "limit")?;
    let offset = limit_value(select.limit_offset.as_deref(), "offset")?;
    if count.is_none() && offset.is_none() {
        return Ok(None);
    }
    Ok(Some(Limit { count, offset }))
}

fn limit_value(node: Option<&protobuf::Node>, clause: &str) -> Result<Option<u64>, CompileError> {
    let Some(node) = node else { return Ok(None) };
    let Some(PgNodeEnum::AConst(constant)) = node.node.as_ref() else {
        return Err(CompileError::unsupported(format!(
            "the {clause} clause requires an integer constant"
        )));
    };
    match constant.val.as_ref() {
        Some(protobuf::a_const::Val::Ival(value)) => {
            u64::try_from(value.ival).map(Some).map_err(|_| {
                CompileError::unsupported(format!(
                    "the {clause} clause requires a non-negative integer"
                ))
            })
        }
        // The parser omits the integer value when it is zero.
        None if !constant.isnull => Ok(Some(0)),
        _ => Err(CompileError::unsupported(format!(
            "the {clause} clause requires an integer constant"
        ))),
    }
}
