fn select_of(sql: &str) -> Select {
    let Statement::Select(select) = process_sql(sql).expect("expected sql to lower");
    select
}

fn unsupported_message(sql: &str) -> String {
    match process_sql(sql).unwrap_err() {
        CompileError::Unsupported { message, .. } => message,
        other => panic!("expected an unsupported error, got {other:?}"),
    }
}

fn column_target(column: &str) -> Target {
    Target::Column(ColumnTarget {
        column: column.to_string(),
        alias: None,
        cast: None,
    })
}

#[test]
fn lowers_plain_columns() {
    let select = select_of("select title, description from books");
    assert_eq!(select.from, "books");
    assert_eq!(
        select.targets,
        vec![column_target("title"), column_target("description")]
    );
    assert!(select.filter.is_none());
    assert!(select.sorts.is_empty());
    assert!(select.limit.is_none());
}

#[test]
fn keeps_aliases_and_canonicalizes_casts() {
    let select = select_of("select title as t, pages::int, name::text from books");
    assert_eq!(
        select.targets,
        vec![
            Target::Column(ColumnTarget {
                column: "title".to_string(),
                alias: Some("t".to_string()),
                cast: None,
            }),
            Target::Column(ColumnTarget {
                column: "pages".to_string(),
                alias: None,
                cast: Some("int".to_string()),
            }),
            Target::Column(ColumnTarget {
                column: "name".to_string(),
                alias: None,
                cast: Some("text".to_string()),
            }),
        ]
    );
}

#[test]
fn rejects_unknown_schema_qualified_casts() {
    let message = unsupported_message("select pages::varchar from books");
    assert!(message.contains("pg_catalog.varchar"), "{message}");
}

#[test]
fn lowers_json_paths_verbatim() {
    let select = select_of("select meta->'a'->2->>'b' from books");
    assert_eq!(select.targets, vec![column_target("meta->'a'->2->>'b'")]);
}

#[test]
fn lowers_zero_array_indexes_in_json_paths() {
    let select = select_of("select meta->0->>'name' from books");
    assert_eq!(select.targets, vec![column_target("meta->0->>'name'")]);
}

#[test]
fn casts_json_paths_that_end_in_text_extraction() {
    let select = select_of("select (meta->>'price')::bigint from books");
    assert_eq!(
        select.targets,
        vec![Target::Column(ColumnTarget {
            column: "meta->>'price'".to_string(),
            alias: None,
            cast: Some("bigint".to_string()),
        })]
    );
}

#[test]
fn flags_unquoted_json_paths_with_a_hint() {
    let error = process_sql("select meta->foo from books").unwrap_err();
    assert!(matches!(error, CompileError::Unsupported { .. }));
    assert_eq!(error.hint(), Some("Did you forget to quote a JSON path?"));
}

#[test]
fn rejects_literal_select_targets() {
    let message = unsupported_message("select 1 from books");
    assert_eq!(message, "expressions are not supported as select targets");
}

#[test]
fn lowers_bare_count_and_count_star() {
    for sql in ["select count() from books", "select count(*) from books"] {
        let select = select_of(sql);
        assert_eq!(
            select.targets,
            vec![Target::Aggregate(AggregateTarget {
                function_name: AggregateFunction::Count,
                column: None,
                alias: None,
                input_cast: None,
                output_cast: None,
            })]
        );
    }
}

#[test]
fn lowers_aggregates_with_both_casts() {
    let select = select_of("select sum(price::int)::text as total from books");
    assert_eq!(
        select.targets,
        vec![Target::Aggregate(AggregateTarget {
            function_name: AggregateFunction::Sum,
            column: Some("price".to_string()),
            alias: Some("total".to_string()),
            input_cast: Some("int".to_string()),
            output_cast: Some("text".to_string()),
        })]
    );
}

#[test]
fn rejects_non_aggregate_functions() {
    let message = unsupported_message("select upper(title) from books");
    assert!(message.contains("only avg, count, max, min and sum"), "{message}");
}

#[test]
fn joins_become_embedded_targets_with_canonical_columns() {
    for sql in [
        "select a.title, b.name from books a inner join authors b on a.author_id = b.id",
        "select a.title, b.name from books a inner join authors b on b.id = a.author_id",
    ] {
        let select = select_of(sql);
        assert_eq!(select.from, "books");
        assert_eq!(
            select.targets,
            vec![
                column_target("title"),
                Target::Embedded(EmbeddedTarget {
                    relation: "authors".to_string(),
                    alias: Some("b".to_string()),
                    join_type: JoinType::Inner,
                    targets: vec![column_target("name")],
                    flatten: true,
                    joined_columns: JoinedColumns {
                        left: JoinedColumn {
                            relation: "a".to_string(),
                            column: "author_id".to_string(),
                        },
                        right: JoinedColumn {
                            relation: "b".to_string(),
                            column: "id".to_string(),
                        },
                    },
                }),
            ]
        );
    }
}

#[test]
fn nests_chained_joins_under_their_parent() {
    let select = select_of(
        "select a.title, b.name, c.city from books a \
         inner join authors b on a.author_id = b.id \
         inner join cities c on b.city_id = c.id",
    );

    let [title, authors] = select.targets.as_slice() else {
        panic!("expected two top-level targets, got {:?}", select.targets);
    };
    assert_eq!(*title, column_target("title"));
    let Target::Embedded(authors) = authors else {
        panic!("expected an embedded target, got {authors:?}");
    };
    assert_eq!(authors.relation, "authors");

    let [name, cities] = authors.targets.as_slice() else {
        panic!("expected two nested targets, got {:?}", authors.targets);
    };
    assert_eq!(*name, column_target("name"));
    let Target::Embedded(cities) = cities else {
        panic!("expected an embedded target, got {cities:?}");
    };
    assert_eq!(cities.relation, "cities");
    assert_eq!(cities.targets, vec![column_target("city")]);
}

#[test]
fn rejects_self_referential_join_conditions() {
    let message = unsupported_message(
        "select * from books a inner join authors b on a.author_id = a.id",
    );
    assert!(message.contains("itself"), "{message}");
}

#[test]
fn rejects_join_conditions_that_skip_the_joined_table() {
    let message = unsupported_message(
        "select * from books a \
         inner join authors b on a.author_id = b.id \
         inner join cities c on a.author_id = b.id",
    );
    assert_eq!(
        message,
        "join qualifier must reference a column from the joined table"
    );
}

#[test]
fn rejects_join_conditions_naming_unknown_relations() {
    let message = unsupported_message(
        "select * from books a inner join authors b on a.author_id = x.id",
    );
    assert!(message.contains("'x'"), "{message}");
}

#[test]
fn rejects_non_equi_joins() {
    let message = unsupported_message(
        "select * from books a inner join authors b on a.author_id > b.id",
    );
    assert_eq!(message, "join conditions must be a single equality comparison");
}

#[test]
fn rejects_unsupported_join_kinds() {
    let message = unsupported_message(
        "select * from books a full outer join authors b on a.author_id = b.id",
    );
    assert_eq!(message, "only INNER JOIN and LEFT JOIN are supported");
}

#[test]
fn resolves_prefixed_targets_against_the_environment() {
    let error = process_sql("select missing.title from books").unwrap_err();
    assert_eq!(
        error.hint(),
        Some("Did you forget to join that relation or alias it to something else?")
    );
}

#[test]
fn lowers_comparison_filters() {
    let select = select_of("select * from books where rating > 4");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "rating".to_string(),
            operator: FilterOperator::Gt,
            negate: false,
            value: FilterValue::Scalar(Scalar::Integer(4)),
        }))
    );

    let select = select_of("select * from books where price <= 9.99");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "price".to_string(),
            operator: FilterOperator::Lte,
            negate: false,
            value: FilterValue::Scalar(Scalar::Float(9.99)),
        }))
    );
}

#[test]
fn lowers_pattern_filters() {
    let cases = [
        ("select * from books where title like 'a%'", FilterOperator::Like),
        ("select * from books where title ilike 'a%'", FilterOperator::Ilike),
        ("select * from books where title ~ '^a'", FilterOperator::Match),
        ("select * from books where title ~* '^a'", FilterOperator::Imatch),
    ];
    for (sql, operator) in cases {
        let select = select_of(sql);
        let Some(Filter::Column(filter)) = select.filter else {
            panic!("expected a column filter for {sql}");
        };
        assert_eq!(filter.operator, operator);
    }
}

#[test]
fn lowers_in_lists_preserving_order() {
    let select = select_of("select * from books where id in (3, 1, 2)");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "id".to_string(),
            operator: FilterOperator::In,
            negate: false,
            value: FilterValue::List(vec![
                Scalar::Integer(3),
                Scalar::Integer(1),
                Scalar::Integer(2),
            ]),
        }))
    );
}

#[test]
fn expands_between_into_a_range_conjunction() {
    let select = select_of("select * from books where pages between 100 and 500");
    let Some(Filter::Logical(filter)) = select.filter else {
        panic!("expected a logical filter");
    };
    assert_eq!(filter.operator, LogicalOperator::And);
    assert!(!filter.negate);
    assert_eq!(
        filter.filters,
        vec![
            Filter::Column(ColumnFilter {
                column: "pages".to_string(),
                operator: FilterOperator::Gte,
                negate: false,
                value: FilterValue::Scalar(Scalar::Integer(100)),
            }),
            Filter::Column(ColumnFilter {
                column: "pages".to_string(),
                operator: FilterOperator::Lte,
                negate: false,
                value: FilterValue::Scalar(Scalar::Integer(500)),
            }),
        ]
    );

    let select = select_of("select * from books where pages not between 100 and 500");
    let Some(Filter::Logical(filter)) = select.filter else {
        panic!("expected a logical filter");
    };
    assert!(filter.negate);
}

#[test]
fn swaps_reversed_symmetric_between_bounds() {
    let select = select_of("select * from books where pages between symmetric 500 and 100");
    let Some(Filter::Logical(filter)) = select.filter else {
        panic!("expected a logical filter");
    };
    let Filter::Column(low) = &filter.filters[0] else {
        panic!("expected a column filter");
    };
    assert_eq!(low.value, FilterValue::Scalar(Scalar::Integer(100)));
}

#[test]
fn rejects_non_numeric_symmetric_bounds() {
    let message =
        unsupported_message("select * from books where title between symmetric 'a' and 'b'");
    assert_eq!(message, "BETWEEN SYMMETRIC requires numeric bounds");
}

#[test]
fn lowers_null_tests() {
    let select = select_of("select * from books where deleted_at is null");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "deleted_at".to_string(),
            operator: FilterOperator::Is,
            negate: false,
            value: FilterValue::Null,
        }))
    );

    let select = select_of("select * from books where deleted_at is not null");
    let Some(Filter::Column(filter)) = select.filter else {
        panic!("expected a column filter");
    };
    assert!(filter.negate);
}

#[test]
fn folds_not_into_the_child_filter() {
    let select = select_of("select * from books where not title = 'foo'");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "title".to_string(),
            operator: FilterOperator::Eq,
            negate: true,
            value: FilterValue::Scalar(Scalar::String("foo".to_string())),
        }))
    );

    let select = select_of("select * from books where not (rating > 4 or title = 'foo')");
    let Some(Filter::Logical(filter)) = select.filter else {
        panic!("expected a logical filter");
    };
    assert_eq!(filter.operator, LogicalOperator::Or);
    assert!(filter.negate);
    assert_eq!(filter.filters.len(), 2);
}

#[test]
fn lowers_text_search_filters() {
    let select = select_of(
        "select * from books where to_tsvector(description) @@ websearch_to_tsquery('english', 'cheese cake')",
    );
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "description".to_string(),
            operator: FilterOperator::Wfts,
            negate: false,
            value: FilterValue::TextQuery {
                query: "cheese cake".to_string(),
                config: Some("english".to_string()),
            },
        }))
    );

    let select = select_of("select * from books where description @@ plainto_tsquery('cheese')");
    assert_eq!(
        select.filter,
        Some(Filter::Column(ColumnFilter {
            column: "description".to_string(),
            operator: FilterOperator::Plfts,
            negate: false,
            value: FilterValue::TextQuery {
                query: "cheese".to_string(),
                config: None,
            },
        }))
    );
}

#[test]
fn rejects_casts_in_the_where_clause() {
    let message = unsupported_message("select * from books where pages::int > 10");
    assert_eq!(message, "casting is not supported in the WHERE clause");
}

#[test]
fn hints_at_unquoted_filter_values() {
    let error = process_sql("select * from books where title = foo").unwrap_err();
    assert_eq!(
        error.hint(),
        Some("Did you forget to wrap your value in single quotes?")
    );
}

#[test]
fn rejects_unmapped_operators() {
    let message = unsupported_message("select * from books where title !~~ 'a%'");
    assert!(message.contains("'!~~'"), "{message}");
}

#[test]
fn validates_group_by_in_both_directions() {
    assert!(process_sql("select genre, count() from books group by genre").is_ok());

    let message = unsupported_message("select count() from books group by genre");
    assert_eq!(
        message,
        "Every group by column must also exist as a select target"
    );

    let message = unsupported_message("select genre, title, count() from books group by genre");
    assert!(message.contains("'title'"), "{message}");
}

#[test]
fn group_by_requires_an_aggregate() {
    let message = unsupported_message("select genre from books group by genre");
    assert_eq!(
        message,
        "GROUP BY requires at least one aggregate function in the select target list"
    );
}

#[test]
fn validates_group_by_across_joined_relations() {
    assert!(process_sql(
        "select b.name, count() from books a \
         inner join authors b on a.author_id = b.id group by b.name"
    )
    .is_ok());

    let message = unsupported_message(
        "select b.name, count() from books a \
         inner join authors b on a.author_id = b.id group by b.name, a.title"
    );
    assert_eq!(
        message,
        "Every group by column must also exist as a select target"
    );
}

#[test]
fn lowers_sort_directions_and_nulls() {
    let select = select_of("select * from books order by title desc nulls last, id");
    assert_eq!(
        select.sorts,
        vec![
            Sort {
                column: "title".to_string(),
                direction: Some(SortDirection::Desc),
                nulls: Some(SortNulls::Last),
            },
            Sort {
                column: "id".to_string(),
                direction: None,
                nulls: None,
            },
        ]
    );
}

#[test]
fn renders_embedded_sort_columns_with_parentheses() {
    let select = select_of(
        "select a.title, b.name from books a \
         inner join authors b on a.author_id = b.id order by b.name asc",
    );
    assert_eq!(
        select.sorts,
        vec![Sort {
            column: "authors(name)".to_string(),
            direction: Some(SortDirection::Asc),
            nulls: None,
        }]
    );
}

#[test]
fn lowers_limits_and_offsets() {
    let select = select_of("select * from books limit 5 offset 10");
    assert_eq!(
        select.limit,
        Some(Limit {
            count: Some(5),
            offset: Some(10),
        })
    );

    let select = select_of("select * from books limit 0");
    assert_eq!(
        select.limit,
        Some(Limit {
            count: Some(0),
            offset: None,
        })
    );

    let message = unsupported_message("select * from books limit 'five'");
    assert!(message.contains("integer constant"), "{message}");
}

#[test]
fn requires_exactly_one_statement() {
    let message = unsupported_message("");
    assert_eq!(message, "expected a statement, but received none");

    let message = unsupported_message("select 1; select 2");
    assert_eq!(message, "expected a single statement, but received multiple");
}

#[test]
fn reserves_write_statements_as_unimplemented() {
    let cases = [
        ("insert into books (id) values (1)", "INSERT"),
        ("update books set title = 'x'", "UPDATE"),
        ("delete from books", "DELETE"),
        ("explain select * from books", "EXPLAIN"),
    ];
    for (sql, expected) in cases {
        match process_sql(sql).unwrap_err() {
            CompileError::Unimplemented { statement } => assert_eq!(statement, expected),
            other => panic!("expected an unimplemented error for {sql}, got {other:?}"),
        }
    }
}

#[test]
fn rejects_other_statement_kinds_as_unsupported() {
    let message = unsupported_message("create table books (id int)");
    assert_eq!(message, "CREATE TABLE statements are not supported");
}

#[test]
fn rejects_clauses_outside_the_subset() {
    assert_eq!(
        unsupported_message("select * from books, authors"),
        "only one FROM source is supported"
    );
    assert_eq!(
        unsupported_message("select distinct title from books"),
        "SELECT DISTINCT is not supported"
    );
    assert_eq!(
        unsupported_message("select count() from books group by genre having count(*) > 1"),
        "HAVING clauses are not supported"
    );
    assert_eq!(
        unsupported_message("with b as (select * from books) select * from b"),
        "WITH (common table expression) clauses are not supported"
    );
    assert_eq!(
        unsupported_message("select * from books union select * from authors"),
        "set operations (UNION, INTERSECT, EXCEPT) are not supported"
    );
}

#[test]
fn wraps_parser_errors_with_hints() {
    let error = process_sql("select title, from books").unwrap_err();
    let CompileError::Parse { message, hint } = error else {
        panic!("expected a parse error");
    };
    assert!(message.starts_with("Syntax error"), "{message}");
    assert_eq!(
        hint.as_deref(),
        Some("Did you leave a trailing comma in the select target list?")
    );

    let error = process_sql("select * from books inner join where id = 1").unwrap_err();
    let CompileError::Parse { hint, .. } = error else {
        panic!("expected a parse error");
    };
    assert_eq!(
        hint.as_deref(),
        Some("Do you have an incomplete join in the FROM clause?")
    );
}
