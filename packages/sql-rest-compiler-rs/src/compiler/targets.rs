fn lower_targets(
    target_list: &[protobuf::Node],
    env: &RelationEnv,
) -> Result<Vec<Target>, CompileError> {
    let mut top_level: Vec<Target> = Vec::with_capacity(target_list.len());
    let mut joined: Vec<EmbeddedTarget> = env.joined.clone();

    for item in target_list {
        let lowered = lower_target_item(item, env)?;
        match lowered.qualifier {
            None => top_level.push(lowered.target),
            Some(qualifier) => {
                let embedded = joined
                    .iter_mut()
                    .find(|target| target.reference() == qualifier)
                    .ok_or_else(|| {
                        CompileError::parse(format!(
                            "no embedded target found for qualifier '{qualifier}'"
                        ))
                    })?;
                embedded.targets.push(lowered.target);
            }
        }
    }

    nest_embedded_targets(top_level, joined, env)
}

fn nest_embedded_targets(
    mut targets: Vec<Target>,
    joined: Vec<EmbeddedTarget>,
    env: &RelationEnv,
) -> Result<Vec<Target>, CompileError> {
    for embedded in joined {
        if embedded.joined_columns.left.relation == env.primary.reference() {
            targets.push(Target::Embedded(embedded));
            continue;
        }
        let parent_reference = embedded.joined_columns.left.relation.clone();
        let parent = find_embedded_mut(&mut targets, &parent_reference).ok_or_else(|| {
            CompileError::parse(format!(
                "no parent embedded target found for relation '{parent_reference}'"
            ))
        })?;
        parent.targets.push(Target::Embedded(embedded));
    }
    Ok(targets)
}

fn find_embedded_mut<'a>(
    targets: &'a mut [Target],
    reference: &str,
) -> Option<&'a mut EmbeddedTarget> {
    for target in targets.iter_mut() {
        if let Target::Embedded(embedded) = target {
            if embedded.alias.as_deref() == Some(reference) || embedded.relation == reference {
                return Some(embedded);
            }
            if let Some(found) = find_embedded_mut(&mut embedded.targets, reference) {
                return Some(found);
            }
        }
    }
    None
}

fn lower_target_item(
    node: &protobuf::Node,
    env: &RelationEnv,
) -> Result<LoweredTarget, CompileError> {
    let Some(PgNodeEnum::ResTarget(res_target)) = node.node.as_ref() else {
        return Err(CompileError::parse(
            "expected a select target item in parsed SQL",
        ));
    };
    if !res_target.indirection.is_empty() {
        return Err(CompileError::unsupported(
            "select target indirection is not supported",
        ));
    }
    let value = res_target
        .val
        .as_deref()
        .ok_or_else(|| CompileError::parse("missing select target value"))?;
    let alias = if res_target.name.is_empty() {
        None
    } else {
        Some(res_target.name.clone())
    };
    lower_target_value(value, alias, env)
}

fn lower_target_value(
    node: &protobuf::Node,
    alias: Option<String>,
    env: &RelationEnv,
) -> Result<LoweredTarget, CompileError> {
    match node.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(column_ref)) => {
            let resolved = lower_column_ref(column_ref, env)?;
            Ok(LoweredTarget {
                qualifier: resolved.qualifier,
                target: Target::Column(ColumnTarget {
                    column: resolved.column,
                    alias,
                    cast: None,
                }),
            })
        }
        Some(PgNodeEnum::AExpr(a_expr)) if json_operator(&a_expr.name).is_some() => {
            let resolved = lower_json_path(a_expr, env)?;
            Ok(LoweredTarget {
                qualifier: resolved.qualifier,
                target: Target::Column(ColumnTarget {
                    column: resolved.column,
                    alias,
                    cast: None,
                }),
            })
        }
        Some(PgNodeEnum::FuncCall(func_call)) => lower_aggregate(func_call, alias, None, env),
        Some(PgNodeEnum::TypeCast(type_cast)) => lower_cast_target(type_cast, alias, env),
        _ => Err(CompileError::unsupported(
            "expressions are not supported as select targets",
        )),
    }
}

fn lower_cast_target(
    type_cast: &protobuf::TypeCast,
    alias: Option<String>,
    env: &RelationEnv,
) -> Result<LoweredTarget, CompileError> {
    let type_name = type_cast
        .type_name
        .as_ref()
        .ok_or_else(|| CompileError::parse("cast is missing its type name"))?;
    let cast = canonical_data_type(type_name)?;
    let inner = type_cast
        .arg
        .as_deref()
        .ok_or_else(|| CompileError::parse("cast is missing its value expression"))?;

    match inner.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(column_ref)) => {
            let resolved = lower_column_ref(column_ref, env)?;
            Ok(LoweredTarget {
                qualifier: resolved.qualifier,
                target: Target::Column(ColumnTarget {
                    column: resolved.column,
                    alias,
                    cast: Some(cast),
                }),
            })
        }
        Some(PgNodeEnum::AExpr(a_expr)) if json_operator(&a_expr.name) == Some("->>") => {
            let resolved = lower_json_path(a_expr, env)?;
            Ok(LoweredTarget {
                qualifier: resolved.qualifier,
                target: Target::Column(ColumnTarget {
                    column: resolved.column,
                    alias,
                    cast: Some(cast),
                }),
            })
        }
        Some(PgNodeEnum::AExpr(a_expr)) if json_operator(&a_expr.name).is_some() => {
            Err(CompileError::unsupported(
                "casting a JSON path is only supported after a final ->> operator",
            ))
        }
        Some(PgNodeEnum::FuncCall(func_call)) => lower_aggregate(func_call, alias, Some(cast), env),
        _ => Err(CompileError::unsupported(
            "expressions are not supported as select targets",
        )),
    }
}

fn lower_aggregate(
    func_call: &protobuf::FuncCall,
    alias: Option<String>,
    output_cast: Option<String>,
    env: &RelationEnv,
) -> Result<LoweredTarget, CompileError> {
    if func_call.over.is_some() {
        return Err(CompileError::unsupported(
            "window functions are not supported",
        ));
    }
    if func_call.agg_distinct {
        return Err(CompileError::unsupported(
            "DISTINCT aggregates are not supported",
        ));
    }
    if func_call.agg_filter.is_some() || !func_call.agg_order.is_empty() || func_call.agg_within_group
    {
        return Err(CompileError::unsupported(
            "aggregate modifiers are not supported",
        ));
    }

    let name = function_name(&func_call.funcname)?;
    let function = AggregateFunction::from_name(&name).ok_or_else(|| {
        CompileError::unsupported(format!(
            "only avg, count, max, min and sum aggregate functions are supported, found {name}()"
        ))
    })?;

    if func_call.agg_star || func_call.args.is_empty() {
        if function != AggregateFunction::Count {
            return Err(CompileError::unsupported(format!(
                "{name}() requires a column argument"
            )));
        }
        // A bare count() has no column and always stays on the primary relation.
        return Ok(LoweredTarget {
            qualifier: None,
            target: Target::Aggregate(AggregateTarget {
                function_name: function,
                column: None,
                alias,
                input_cast: None,
                output_cast,
            }),
        });
    }
    if func_call.args.len() > 1 {
        return Err(CompileError::unsupported(
            "aggregate functions accept a single column argument",
        ));
    }

    let argument = &func_call.args[0];
    let (resolved, input_cast) = match argument.node.as_ref() {
        Some(PgNodeEnum::ColumnRef(column_ref)) => (lower_column_ref(column_ref, env)?, None),
        Some(PgNodeEnum::TypeCast(type_cast)) => {
            let type_name = type_cast
                .type_name
                .as_ref()
                .ok_or_else(|| CompileError::parse("cast is missing its type name"))?;
            let cast = canonical_data_type(type_name)?;
            let inner = type_cast
                .arg
                .as_deref()
                .ok_or_else(|| CompileError::parse("cast is missing its value expression"))?;
            let Some(PgNodeEnum::ColumnRef(column_ref)) = inner.node.as_ref() else {
                return Err(CompileError::unsupported(
                    "aggregate arguments must be plain columns",
                ));
            };
            (lower_column_ref(column_ref, env)?, Some(cast))
        }
        _ => {
            return Err(CompileError::unsupported(
                "aggregate arguments must be plain columns",
            ));
        }
    };
    if resolved.column == "*" {
        return Err(CompileError::unsupported(
            "aggregate arguments must be plain columns",
        ));
    }

    Ok(LoweredTarget {
        qualifier: resolved.qualifier,
        target: Target::Aggregate(AggregateTarget {
            function_name: function,
            column: Some(resolved.column),
            alias,
            input_cast,
            output_cast,
        }),
    })
}
