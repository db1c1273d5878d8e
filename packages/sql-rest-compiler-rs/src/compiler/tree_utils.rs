fn node_kind(node: &protobuf::Node) -> &'static str {
    match node.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(_)) => "column_ref",
        Some(PgNodeEnum::AConst(_)) => "a_const",
        Some(PgNodeEnum::FuncCall(_)) => "func_call",
        Some(PgNodeEnum::AExpr(_)) => "a_expr",
        Some(PgNodeEnum::BoolExpr(_)) => "bool_expr",
        Some(PgNodeEnum::SubLink(_)) => "sub_link",
        Some(PgNodeEnum::NullTest(_)) => "null_test",
        Some(PgNodeEnum::CaseExpr(_)) => "case_expr",
        Some(PgNodeEnum::TypeCast(_)) => "type_cast",
        Some(PgNodeEnum::RangeVar(_)) => "range_var",
        Some(PgNodeEnum::JoinExpr(_)) => "join_expr",
        Some(PgNodeEnum::ResTarget(_)) => "res_target",
        Some(PgNodeEnum::SortBy(_)) => "sort_by",
        Some(PgNodeEnum::List(_)) => "list",
        Some(_) => "other",
        None => "empty",
    }
}

fn string_segments(nodes: &[protobuf::Node]) -> Result<Vec<String>, CompileError> {
    let mut parts = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.node.as_ref() {
            Some(PgNodeEnum::String(value)) => parts.push(value.sval.clone()),
            _ => {
                return Err(CompileError::parse(
                    "expected string node in identifier or operator name",
                ));
            }
        }
    }
    if parts.is_empty() {
        return Err(CompileError::parse(
            "empty identifier or operator name in parsed SQL",
        ));
    }
    Ok(parts)
}

fn operator_symbol(nodes: &[protobuf::Node]) -> Result<String, CompileError> {
    Ok(string_segments(nodes)?.join("."))
}

fn function_name(nodes: &[protobuf::Node]) -> Result<String, CompileError> {
    let parts = string_segments(nodes)?;
    Ok(parts.last().expect("non-empty checked").to_ascii_lowercase())
}

fn resolve_qualifier(env: &RelationEnv, qualifier: &str) -> Result<Option<String>, CompileError> {
    if qualifier == env.primary.reference() {
        return Ok(None);
    }
    match env.find_joined(qualifier) {
        Some(target) => Ok(Some(target.reference().to_string())),
        None => Err(CompileError::unsupported_hint(
            format!("column qualifier '{qualifier}' does not match any relation in the FROM clause"),
            "Did you forget to join that relation or alias it to something else?",
        )),
    }
}

fn lower_column_expr(
    node: &protobuf::Node,
    env: &RelationEnv,
) -> Result<ResolvedColumn, CompileError> {
    match node.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(column_ref)) => lower_column_ref(column_ref, env),
        Some(PgNodeEnum::AExpr(a_expr)) if json_operator(&a_expr.name).is_some() => {
            lower_json_path(a_expr, env)
        }
        _ => Err(CompileError::unsupported(format!(
            "expected a column reference, found {}",
            node_kind(node)
        ))),
    }
}

fn lower_column_ref(
    column_ref: &protobuf::ColumnRef,
    env: &RelationEnv,
) -> Result<ResolvedColumn, CompileError> {
    let (qualifier, column) = split_column_fields(&column_ref.fields)?;
    let qualifier = match qualifier {
        Some(name) => resolve_qualifier(env, &name)?,
        None => None,
    };
    Ok(ResolvedColumn { qualifier, column })
}

fn split_column_fields(
    fields: &[protobuf::Node],
) -> Result<(Option<String>, String), CompileError> {
    let mut names = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        match field.node.as_ref() {
            Some(PgNodeEnum::String(value)) => names.push(value.sval.clone()),
            Some(PgNodeEnum::AStar(_)) if index + 1 == fields.len() => {
                names.push("*".to_string())
            }
            _ => return Err(CompileError::unsupported("unsupported column reference")),
        }
    }
    match names.len() {
        0 => Err(CompileError::parse("empty column reference in parsed SQL")),
        1 => Ok((None, names.pop().expect("length checked"))),
        2 => {
            let column = names.pop().expect("length checked");
            let qualifier = names.pop().expect("length checked");
            Ok((Some(qualifier), column))
        }
        _ => Err(CompileError::unsupported(
            "schema-qualified column references are not supported",
        )),
    }
}

fn json_operator(nodes: &[protobuf::Node]) -> Option<&'static str> {
    let [node] = nodes else { return None };
    match node.node.as_ref() {
        Some(PgNodeEnum::String(value)) if value.sval == "->" => Some("->"),
        Some(PgNodeEnum::String(value)) if value.sval == "->>" => Some("->>"),
        _ => None,
    }
}

fn lower_json_path(
    a_expr: &protobuf::AExpr,
    env: &RelationEnv,
) -> Result<ResolvedColumn, CompileError> {
    lower_json_path_inner(a_expr, env, true)
}

fn lower_json_path_inner(
    a_expr: &protobuf::AExpr,
    env: &RelationEnv,
    outermost: bool,
) -> Result<ResolvedColumn, CompileError> {
    let operator = json_operator(&a_expr.name).ok_or_else(invalid_json_path)?;
    // A `->>` in the middle of a chain would already have produced text.
    if !outermost && operator == "->>" {
        return Err(invalid_json_path());
    }

    let left = a_expr
        .lexpr
        .as_deref()
        .ok_or_else(|| CompileError::parse("JSON path expression missing left operand"))?;
    let base = match left.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(column_ref)) => lower_column_ref(column_ref, env)?,
        Some(PgNodeEnum::AExpr(inner)) if json_operator(&inner.name).is_some() => {
            lower_json_path_inner(inner, env, false)?
        }
        _ => return Err(invalid_json_path()),
    };

    let right = a_expr
        .rexpr
        .as_deref()
        .ok_or_else(|| CompileError::parse("JSON path expression missing right operand"))?;
    let key = match right.node.as_ref() {
        Some(PgNodeEnum::AConst(constant)) => match constant.val.as_ref() {
            Some(protobuf::a_const::Val::Sval(value)) => format!("'{}'", value.sval),
            Some(protobuf::a_const::Val::Ival(value)) => value.ival.to_string(),
            // The parser omits the integer value when it is zero.
            None if !constant.isnull => "0".to_string(),
            _ => return Err(invalid_json_path()),
        },
        _ => return Err(invalid_json_path()),
    };

    Ok(ResolvedColumn {
        qualifier: base.qualifier,
        column: format!("{}{}{}", base.column, operator, key),
    })
}

fn invalid_json_path() -> CompileError {
    CompileError::unsupported_hint(
        "invalid JSON path in expression",
        "Did you forget to quote a JSON path?",
    )
}

fn extract_scalar(node: &protobuf::Node) -> Result<Scalar, CompileError> {
    match node.node.as_ref() {
        Some(PgNodeEnum::AConst(constant)) => scalar_from_const(constant),
        _ => Err(CompileError::unsupported(format!(
            "expected a constant value, found {}",
            node_kind(node)
        ))),
    }
}

fn scalar_from_const(constant: &protobuf::AConst) -> Result<Scalar, CompileError> {
    match constant.val.as_ref() {
        Some(protobuf::a_const::Val::Sval(value)) => Ok(Scalar::String(value.sval.clone())),
        Some(protobuf::a_const::Val::Ival(value)) => Ok(Scalar::Integer(i64::from(value.ival))),
        Some(protobuf::a_const::Val::Fval(value)) => {
            let parsed = value.fval.parse::<f64>().map_err(|_| {
                CompileError::parse(format!("invalid floating-point literal: {}", value.fval))
            })?;
            Ok(Scalar::Float(parsed))
        }
        // The parser omits the integer value when it is zero.
        None if !constant.isnull => Ok(Scalar::Integer(0)),
        None => Err(CompileError::unsupported(
            "NULL values are only supported with IS NULL and IS NOT NULL",
        )),
        _ => Err(CompileError::unsupported(
            "only string and numeric constants are supported",
        )),
    }
}

fn extract_scalar_list(node: &protobuf::Node) -> Result<Vec<Scalar>, CompileError> {
    let Some(PgNodeEnum::List(list)) = node.node.as_ref() else {
        return Err(CompileError::unsupported(
            "expected a list of constant values",
        ));
    };
    let mut values = Vec::with_capacity(list.items.len());
    for item in &list.items {
        values.push(extract_scalar(item)?);
    }
    Ok(values)
}

fn canonical_data_type(type_name: &protobuf::TypeName) -> Result<String, CompileError> {
    if !type_name.array_bounds.is_empty() {
        return Err(CompileError::unsupported("array casts are not supported"));
    }
    let parts = string_segments(&type_name.names)?;
    match parts.as_slice() {
        [name] => Ok(name.clone()),
        [schema, name] if schema.as_str() == "pg_catalog" => match name.as_str() {
            "int2" => Ok("smallint".to_string()),
            "int4" => Ok("int".to_string()),
            "int8" => Ok("bigint".to_string()),
            "float8" => Ok("float".to_string()),
            _ => Err(CompileError::unsupported(format!(
                "cast to {schema}.{name} is not supported"
            ))),
        },
        _ => Err(CompileError::unsupported(
            "schema-qualified casts are not supported",
        )),
    }
}

fn targets_some(targets: &[Target], predicate: &dyn Fn(&Target) -> bool) -> bool {
    targets.iter().any(|target| {
        predicate(target)
            || matches!(target, Target::Embedded(embedded) if targets_some(&embedded.targets, predicate))
    })
}

fn flatten_column_targets<'a>(
    targets: &'a [Target],
    qualifier: Option<&str>,
    out: &mut Vec<(Option<String>, &'a ColumnTarget)>,
) {
    for target in targets {
        match target {
            Target::Column(column) => out.push((qualifier.map(str::to_string), column)),
            Target::Aggregate(_) => {}
            Target::Embedded(embedded) => {
                flatten_column_targets(&embedded.targets, Some(embedded.reference()), out)
            }
        }
    }
}

fn sentence_case(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
