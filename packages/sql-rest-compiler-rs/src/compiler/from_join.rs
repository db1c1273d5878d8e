fn lower_from_clause(select: &protobuf::SelectStmt) -> Result<RelationEnv, CompileError> {
    if select.from_clause.is_empty() {
        return Err(CompileError::unsupported(
            "the FROM clause must name a relation",
        ));
    }
    if select.from_clause.len() > 1 {
        return Err(CompileError::unsupported(
            "only one FROM source is supported",
        ));
    }
    lower_from_item(&select.from_clause[0])
}

fn lower_from_item(node: &protobuf::Node) -> Result<RelationEnv, CompileError> {
    match node.node.as_ref() {
        Some(PgNodeEnum::RangeVar(range)) => {
            let (name, alias) = range_var_parts(range)?;
            Ok(RelationEnv {
                primary: PrimaryRelation { name, alias },
                joined: Vec::new(),
            })
        }
        Some(PgNodeEnum::JoinExpr(join)) => lower_join(join),
        Some(PgNodeEnum::RangeSubselect(_)) => Err(CompileError::unsupported(
            "subqueries in the FROM clause are not supported",
        )),
        _ => Err(CompileError::unsupported(format!(
            "unsupported FROM clause source: {}",
            node_kind(node)
        ))),
    }
}

fn range_var_parts(range: &protobuf::RangeVar) -> Result<(String, Option<String>), CompileError> {
    if !range.schemaname.is_empty() {
        return Err(CompileError::unsupported(
            "schema-qualified relations are not supported",
        ));
    }
    let alias = range
        .alias
        .as_ref()
        .map(|alias| alias.aliasname.clone())
        .filter(|alias| !alias.is_empty());
    Ok((range.relname.clone(), alias))
}

fn lower_join(join: &protobuf::JoinExpr) -> Result<RelationEnv, CompileError> {
    let join_type = match protobuf::JoinType::try_from(join.jointype) {
        Ok(protobuf::JoinType::JoinInner) => JoinType::Inner,
        Ok(protobuf::JoinType::JoinLeft) => JoinType::Left,
        _ => {
            return Err(CompileError::unsupported(
                "only INNER JOIN and LEFT JOIN are supported",
            ));
        }
    };
    if join.is_natural || !join.using_clause.is_empty() {
        return Err(CompileError::unsupported(
            "join conditions must be written as an explicit ON clause",
        ));
    }

    let left = join
        .larg
        .as_deref()
        .ok_or_else(|| CompileError::parse("JOIN is missing its left relation"))?;
    let right = join
        .rarg
        .as_deref()
        .ok_or_else(|| CompileError::parse("JOIN is missing its right relation"))?;

    let mut env = lower_from_item(left)?;

    let Some(PgNodeEnum::RangeVar(range)) = right.node.as_ref() else {
        return Err(CompileError::unsupported(
            "the right side of a join must be a table",
        ));
    };
    let (relation, alias) = range_var_parts(range)?;
    let joined_reference = alias.clone().unwrap_or_else(|| relation.clone());

    let quals = join
        .quals
        .as_deref()
        .ok_or_else(|| CompileError::unsupported("joins must declare an ON condition"))?;
    let joined_columns = lower_join_qualifier(quals, &env, &joined_reference)?;

    env.joined.push(EmbeddedTarget {
        relation,
        alias,
        join_type,
        targets: Vec::new(),
        flatten: true,
        joined_columns,
    });
    Ok(env)
}

fn lower_join_qualifier(
    node: &protobuf::Node,
    env: &RelationEnv,
    joined_reference: &str,
) -> Result<JoinedColumns, CompileError> {
    let Some(PgNodeEnum::AExpr(a_expr)) = node.node.as_ref() else {
        return Err(CompileError::unsupported(
            "join conditions must be a single equality comparison",
        ));
    };
    let kind =
        protobuf::AExprKind::try_from(a_expr.kind).unwrap_or(protobuf::AExprKind::Undefined);
    if kind != protobuf::AExprKind::AexprOp || operator_symbol(&a_expr.name)? != "=" {
        return Err(CompileError::unsupported(
            "join conditions must be a single equality comparison",
        ));
    }

    let left = qualified_join_column(a_expr.lexpr.as_deref(), env, joined_reference)?;
    let right = qualified_join_column(a_expr.rexpr.as_deref(), env, joined_reference)?;

    if left.relation == right.relation {
        // TODO: support recursive relationships by letting an embedded target
        // join back onto its own relation.
        return Err(CompileError::unsupported(
            "joins comparing a relation to itself are not supported",
        ));
    }

    let left_is_joined = left.relation == joined_reference;
    let right_is_joined = right.relation == joined_reference;
    match (left_is_joined, right_is_joined) {
        // The parent side is always stored on the left.
        (true, false) => Ok(JoinedColumns {
            left: right,
            right: left,
        }),
        (false, true) => Ok(JoinedColumns { left, right }),
        _ => Err(CompileError::unsupported(
            "join qualifier must reference a column from the joined table",
        )),
    }
}

fn qualified_join_column(
    node: Option<&protobuf::Node>,
    env: &RelationEnv,
    joined_reference: &str,
) -> Result<JoinedColumn, CompileError> {
    let node = node.ok_or_else(|| CompileError::parse("join condition is missing an operand"))?;
    let Some(PgNodeEnum::ColumnRef(column_ref)) = node.node.as_ref() else {
        return Err(CompileError::unsupported(
            "join conditions must compare two qualified columns",
        ));
    };
    let (qualifier, column) = split_column_fields(&column_ref.fields)?;
    let Some(relation) = qualifier else {
        return Err(CompileError::unsupported(
            "join condition columns must be qualified with their relation",
        ));
    };
    if column == "*" {
        return Err(CompileError::unsupported(
            "join conditions must compare two qualified columns",
        ));
    }
    if relation != joined_reference
        && relation != env.primary.reference()
        && env.find_joined(&relation).is_none()
    {
        return Err(CompileError::unsupported(format!(
            "join condition references '{relation}', which is not part of the FROM clause"
        )));
    }
    Ok(JoinedColumn { relation, column })
}
