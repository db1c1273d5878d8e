pub fn process_sql(sql: &str) -> Result<Statement, CompileError> {
    let parsed = pg_query::parse(sql).map_err(wrap_parser_error)?;
    debug!(statements = parsed.protobuf.stmts.len(), "parsed sql source");

    let stmts = &parsed.protobuf.stmts;
    if stmts.is_empty() {
        return Err(CompileError::unsupported(
            "expected a statement, but received none",
        ));
    }
    if stmts.len() > 1 {
        return Err(CompileError::unsupported(
            "expected a single statement, but received multiple",
        ));
    }

    let raw = stmts.first().expect("length checked");
    let stmt = raw
        .stmt
        .as_ref()
        .ok_or_else(|| CompileError::parse("missing SQL statement AST"))?;
    let node = stmt
        .node
        .as_ref()
        .ok_or_else(|| CompileError::parse("missing SQL statement AST"))?;

    let statement = match node {
        PgNodeEnum::SelectStmt(select) => lower_select(select)?,
        PgNodeEnum::InsertStmt(_) => {
            return Err(CompileError::Unimplemented {
                statement: "INSERT",
            });
        }
        PgNodeEnum::UpdateStmt(_) => {
            return Err(CompileError::Unimplemented {
                statement: "UPDATE",
            });
        }
        PgNodeEnum::DeleteStmt(_) => {
            return Err(CompileError::Unimplemented {
                statement: "DELETE",
            });
        }
        PgNodeEnum::ExplainStmt(_) => {
            return Err(CompileError::Unimplemented {
                statement: "EXPLAIN",
            });
        }
        other => {
            return Err(CompileError::unsupported(format!(
                "{} statements are not supported",
                statement_keyword(other)
            )));
        }
    };
    debug!("lowered statement into a request model");
    Ok(statement)
}

pub fn translate_http_request(sql: &str) -> Result<HttpRequest, CompileError> {
    let statement = process_sql(sql)?;
    Ok(render_http(&statement)?)
}

pub fn translate_supabase_js(sql: &str) -> Result<String, CompileError> {
    let statement = process_sql(sql)?;
    Ok(render_supabase_js(&statement)?)
}

fn statement_keyword(node: &PgNodeEnum) -> &'static str {
    match node {
        PgNodeEnum::CreateStmt(_) => "CREATE TABLE",
        PgNodeEnum::DropStmt(_) => "DROP",
        PgNodeEnum::TruncateStmt(_) => "TRUNCATE",
        PgNodeEnum::CopyStmt(_) => "COPY",
        PgNodeEnum::VariableSetStmt(_) => "SET",
        PgNodeEnum::TransactionStmt(_) => "Transaction control",
        _ => "Unrecognized",
    }
}

fn lower_select(select: &protobuf::SelectStmt) -> Result<Statement, CompileError> {
    if select.op != protobuf::SetOperation::SetopNone as i32
        || select.larg.is_some()
        || select.rarg.is_some()
    {
        return Err(CompileError::unsupported(
            "set operations (UNION, INTERSECT, EXCEPT) are not supported",
        ));
    }
    if !select.values_lists.is_empty() {
        return Err(CompileError::unsupported("VALUES lists are not supported"));
    }
    if select.with_clause.is_some() {
        return Err(CompileError::unsupported(
            "WITH (common table expression) clauses are not supported",
        ));
    }
    if !select.distinct_clause.is_empty() {
        return Err(CompileError::unsupported("SELECT DISTINCT is not supported"));
    }
    if select.having_clause.is_some() {
        return Err(CompileError::unsupported("HAVING clauses are not supported"));
    }
    if !select.window_clause.is_empty() {
        return Err(CompileError::unsupported("window clauses are not supported"));
    }
    if !select.locking_clause.is_empty() {
        return Err(CompileError::unsupported(
            "row locking clauses are not supported",
        ));
    }

    let env = lower_from_clause(select)?;
    let targets = lower_targets(&select.target_list, &env)?;
    validate_group_by(&select.group_clause, &targets, &env)?;
    let filter = match select.where_clause.as_deref() {
        Some(node) => Some(lower_where_clause(node, &env)?),
        None => None,
    };
    let sorts = lower_sort_clause(&select.sort_clause, &env)?;
    let limit = lower_limit(select)?;

    Ok(Statement::Select(Select {
        from: env.primary.name.clone(),
        targets,
        filter,
        sorts,
        limit,
    }))
}

fn wrap_parser_error(error: pg_query::Error) -> CompileError {
    let message = match error {
        pg_query::Error::Parse(message) => message,
        other => other.to_string(),
    };
    let hint = parser_hint(&message).map(str::to_string);
    CompileError::Parse {
        message: sentence_case(&message),
        hint,
    }
}

fn parser_hint(message: &str) -> Option<&'static str> {
    const HINTS: &[(&str, &str)] = &[
        (
            "syntax error at or near \"from\"",
            "Did you leave a trailing comma in the select target list?",
        ),
        (
            "syntax error at or near \"where\"",
            "Do you have an incomplete join in the FROM clause?",
        ),
    ];
    HINTS
        .iter()
        .find(|(needle, _)| message.contains(needle))
        .map(|(_, hint)| *hint)
}
