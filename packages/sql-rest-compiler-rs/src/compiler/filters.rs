fn lower_where_clause(node: &protobuf::Node, env: &RelationEnv) -> Result<Filter, CompileError> {
    match node.node.as_ref() {
        Some(PgNodeEnum::AExpr(a_expr)) => lower_filter_expr(a_expr, env),
        Some(PgNodeEnum::BoolExpr(bool_expr)) => lower_bool_expr(bool_expr, env),
        Some(PgNodeEnum::NullTest(null_test)) => lower_null_test(null_test, env),
        _ => Err(CompileError::unsupported(format!(
            "unsupported WHERE clause expression: {}",
            node_kind(node)
        ))),
    }
}

fn lower_filter_expr(a_expr: &protobuf::AExpr, env: &RelationEnv) -> Result<Filter, CompileError> {
    let kind =
        protobuf::AExprKind::try_from(a_expr.kind).unwrap_or(protobuf::AExprKind::Undefined);
    let symbol = operator_symbol(&a_expr.name)?;

    match kind {
        protobuf::AExprKind::AexprOp => match symbol.as_str() {
            "=" => lower_comparison(a_expr, FilterOperator::Eq, env),
            "<>" => lower_comparison(a_expr, FilterOperator::Neq, env),
            ">" => lower_comparison(a_expr, FilterOperator::Gt, env),
            ">=" => lower_comparison(a_expr, FilterOperator::Gte, env),
            "<" => lower_comparison(a_expr, FilterOperator::Lt, env),
            "<=" => lower_comparison(a_expr, FilterOperator::Lte, env),
            "~" => lower_pattern(a_expr, FilterOperator::Match, env),
            "~*" => lower_pattern(a_expr, FilterOperator::Imatch, env),
            "@@" => lower_text_search(a_expr, env),
            _ => Err(unsupported_operator(&symbol)),
        },
        protobuf::AExprKind::AexprLike if symbol == "~~" => {
            lower_pattern(a_expr, FilterOperator::Like, env)
        }
        protobuf::AExprKind::AexprIlike if symbol == "~~*" => {
            lower_pattern(a_expr, FilterOperator::Ilike, env)
        }
        protobuf::AExprKind::AexprIn if symbol == "=" => lower_in_list(a_expr, env),
        protobuf::AExprKind::AexprBetween => lower_between(a_expr, env, false, false),
        protobuf::AExprKind::AexprNotBetween => lower_between(a_expr, env, true, false),
        protobuf::AExprKind::AexprBetweenSym => lower_between(a_expr, env, false, true),
        protobuf::AExprKind::AexprNotBetweenSym => lower_between(a_expr, env, true, true),
        _ => Err(unsupported_operator(&symbol)),
    }
}

fn unsupported_operator(symbol: &str) -> CompileError {
    CompileError::unsupported(format!(
        "operator '{symbol}' is not supported in the WHERE clause"
    ))
}

fn left_operand(a_expr: &protobuf::AExpr) -> Result<&protobuf::Node, CompileError> {
    a_expr
        .lexpr
        .as_deref()
        .ok_or_else(|| CompileError::parse("operator expression missing left operand"))
}

fn right_operand(a_expr: &protobuf::AExpr) -> Result<&protobuf::Node, CompileError> {
    a_expr
        .rexpr
        .as_deref()
        .ok_or_else(|| CompileError::parse("operator expression missing right operand"))
}

fn lower_filter_column(node: &protobuf::Node, env: &RelationEnv) -> Result<String, CompileError> {
    if matches!(node.node.as_ref(), Some(PgNodeEnum::TypeCast(_))) {
        return Err(CompileError::unsupported(
            "casting is not supported in the WHERE clause",
        ));
    }
    Ok(lower_column_expr(node, env)?.render(NameSyntax::Dot))
}

fn lower_comparison(
    a_expr: &protobuf::AExpr,
    operator: FilterOperator,
    env: &RelationEnv,
) -> Result<Filter, CompileError> {
    let column = lower_filter_column(left_operand(a_expr)?, env)?;
    let value = match extract_scalar(right_operand(a_expr)?) {
        Ok(value) => value,
        Err(CompileError::Unsupported { message, .. }) => {
            return Err(CompileError::unsupported_hint(
                message,
                "Did you forget to wrap your value in single quotes?",
            ));
        }
        Err(other) => return Err(other),
    };
    Ok(Filter::Column(ColumnFilter {
        column,
        operator,
        negate: false,
        value: FilterValue::Scalar(value),
    }))
}

fn lower_pattern(
    a_expr: &protobuf::AExpr,
    operator: FilterOperator,
    env: &RelationEnv,
) -> Result<Filter, CompileError> {
    let column = lower_filter_column(left_operand(a_expr)?, env)?;
    match extract_scalar(right_operand(a_expr)?)? {
        Scalar::String(pattern) => Ok(Filter::Column(ColumnFilter {
            column,
            operator,
            negate: false,
            value: FilterValue::Scalar(Scalar::String(pattern)),
        })),
        _ => Err(CompileError::unsupported(format!(
            "the {} operator requires a string pattern",
            operator.as_str()
        ))),
    }
}

fn lower_in_list(a_expr: &protobuf::AExpr, env: &RelationEnv) -> Result<Filter, CompileError> {
    let column = lower_filter_column(left_operand(a_expr)?, env)?;
    let values = extract_scalar_list(right_operand(a_expr)?)?;
    Ok(Filter::Column(ColumnFilter {
        column,
        operator: FilterOperator::In,
        negate: false,
        value: FilterValue::List(values),
    }))
}

fn lower_text_search(a_expr: &protobuf::AExpr, env: &RelationEnv) -> Result<Filter, CompileError> {
    let column = lower_text_search_column(left_operand(a_expr)?, env)?;
    let right = right_operand(a_expr)?;
    let Some(PgNodeEnum::FuncCall(func_call)) = right.node.as_ref() else {
        return Err(CompileError::unsupported(
            "full-text search requires a to_tsquery-style call on the right side of @@",
        ));
    };

    let name = function_name(&func_call.funcname)?;
    let operator = match name.as_str() {
        "to_tsquery" => FilterOperator::Fts,
        "plainto_tsquery" => FilterOperator::Plfts,
        "phraseto_tsquery" => FilterOperator::Phfts,
        "websearch_to_tsquery" => FilterOperator::Wfts,
        _ => {
            return Err(CompileError::unsupported(format!(
                "{name}() is not a supported text-search query function"
            )));
        }
    };

    let mut arguments = Vec::with_capacity(func_call.args.len());
    for argument in &func_call.args {
        match extract_scalar(argument)? {
            Scalar::String(text) => arguments.push(text),
            _ => {
                return Err(CompileError::unsupported(format!(
                    "{name}() arguments must be string constants"
                )));
            }
        }
    }
    let (config, query) = match arguments.len() {
        1 => (None, arguments.pop().expect("length checked")),
        2 => {
            let query = arguments.pop().expect("length checked");
            let config = arguments.pop().expect("length checked");
            (Some(config), query)
        }
        _ => {
            return Err(CompileError::unsupported(format!(
                "{name}() takes one or two string arguments"
            )));
        }
    };

    Ok(Filter::Column(ColumnFilter {
        column,
        operator,
        negate: false,
        value: FilterValue::TextQuery { query, config },
    }))
}

fn lower_text_search_column(
    node: &protobuf::Node,
    env: &RelationEnv,
) -> Result<String, CompileError> {
    if let Some(PgNodeEnum::FuncCall(func_call)) = node.node.as_ref() {
        if function_name(&func_call.funcname)? != "to_tsvector" {
            return Err(CompileError::unsupported(
                "only to_tsvector() may wrap the searched column",
            ));
        }
        let [argument] = func_call.args.as_slice() else {
            return Err(CompileError::unsupported(
                "to_tsvector() takes a single column argument",
            ));
        };
        return lower_filter_column(argument, env);
    }
    lower_filter_column(node, env)
}

fn lower_between(
    a_expr: &protobuf::AExpr,
    env: &RelationEnv,
    negate: bool,
    symmetric: bool,
) -> Result<Filter, CompileError> {
    let column = lower_filter_column(left_operand(a_expr)?, env)?;
    let mut bounds = extract_scalar_list(right_operand(a_expr)?)?;
    if bounds.len() != 2 {
        return Err(CompileError::parse(
            "BETWEEN requires exactly two bound expressions",
        ));
    }
    let mut high = bounds.pop().expect("length checked");
    let mut low = bounds.pop().expect("length checked");

    if symmetric {
        match (scalar_numeric(&low), scalar_numeric(&high)) {
            (Some(low_value), Some(high_value)) => {
                if low_value > high_value {
                    std::mem::swap(&mut low, &mut high);
                }
            }
            _ => {
                return Err(CompileError::unsupported(
                    "BETWEEN SYMMETRIC requires numeric bounds",
                ));
            }
        }
    }

    Ok(Filter::Logical(LogicalFilter {
        operator: LogicalOperator::And,
        negate,
        filters: vec![
            Filter::Column(ColumnFilter {
                column: column.clone(),
                operator: FilterOperator::Gte,
                negate: false,
                value: FilterValue::Scalar(low),
            }),
            Filter::Column(ColumnFilter {
                column,
                operator: FilterOperator::Lte,
                negate: false,
                value: FilterValue::Scalar(high),
            }),
        ],
    }))
}

fn scalar_numeric(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Integer(number) => Some(*number as f64),
        Scalar::Float(number) => Some(*number),
        Scalar::String(_) => None,
    }
}

fn lower_bool_expr(
    bool_expr: &protobuf::BoolExpr,
    env: &RelationEnv,
) -> Result<Filter, CompileError> {
    let kind = protobuf::BoolExprType::try_from(bool_expr.boolop)
        .unwrap_or(protobuf::BoolExprType::Undefined);
    match kind {
        protobuf::BoolExprType::AndExpr | protobuf::BoolExprType::OrExpr => {
            let operator = if kind == protobuf::BoolExprType::AndExpr {
                LogicalOperator::And
            } else {
                LogicalOperator::Or
            };
            let mut filters = Vec::with_capacity(bool_expr.args.len());
            for argument in &bool_expr.args {
                filters.push(lower_where_clause(argument, env)?);
            }
            if filters.is_empty() {
                return Err(CompileError::parse("boolean expression has no arguments"));
            }
            Ok(Filter::Logical(LogicalFilter {
                operator,
                negate: false,
                filters,
            }))
        }
        protobuf::BoolExprType::NotExpr => {
            let [argument] = bool_expr.args.as_slice() else {
                return Err(CompileError::parse("NOT must have exactly one argument"));
            };
            // NOT is folded into the child filter, so no `not` logical node
            // ever reaches the request model.
            Ok(negated(lower_where_clause(argument, env)?))
        }
        _ => Err(CompileError::unsupported(
            "unsupported boolean expression in the WHERE clause",
        )),
    }
}

fn negated(filter: Filter) -> Filter {
    match filter {
        Filter::Column(mut column) => {
            column.negate = true;
            Filter::Column(column)
        }
        Filter::Logical(mut logical) => {
            logical.negate = true;
            Filter::Logical(logical)
        }
    }
}

fn lower_null_test(
    null_test: &protobuf::NullTest,
    env: &RelationEnv,
) -> Result<Filter, CompileError> {
    let argument = null_test
        .arg
        .as_deref()
        .ok_or_else(|| CompileError::parse("NULL test missing its argument"))?;
    let column = lower_filter_column(argument, env)?;
    let negate = match protobuf::NullTestType::try_from(null_test.nulltesttype) {
        Ok(protobuf::NullTestType::IsNull) => false,
        Ok(protobuf::NullTestType::IsNotNull) => true,
        _ => return Err(CompileError::unsupported("unsupported NULL test")),
    };
    Ok(Filter::Column(ColumnFilter {
        column,
        operator: FilterOperator::Is,
        negate,
        value: FilterValue::Null,
    }))
}
