use rest_request_rs::model::{
    AggregateFunction, AggregateTarget, ColumnFilter, ColumnTarget, EmbeddedTarget, Filter,
    FilterOperator, FilterValue, JoinType, JoinedColumn, JoinedColumns, Limit, LogicalFilter,
    LogicalOperator, Scalar, Select, Sort, SortDirection, SortNulls, Statement, Target,
};
use rest_request_rs::{render_http, render_supabase_js};

fn column(name: &str) -> Target {
    Target::Column(ColumnTarget {
        column: name.to_string(),
        alias: None,
        cast: None,
    })
}

fn select(targets: Vec<Target>) -> Select {
    Select {
        from: "books".to_string(),
        targets,
        filter: None,
        sorts: Vec::new(),
        limit: None,
    }
}

fn authors_embed(targets: Vec<Target>) -> EmbeddedTarget {
    EmbeddedTarget {
        relation: "authors".to_string(),
        alias: None,
        join_type: JoinType::Inner,
        targets,
        flatten: true,
        joined_columns: JoinedColumns {
            left: JoinedColumn {
                relation: "books".to_string(),
                column: "author_id".to_string(),
            },
            right: JoinedColumn {
                relation: "authors".to_string(),
                column: "id".to_string(),
            },
        },
    }
}

#[test]
fn wildcard_projection_omits_the_select_param() {
    let statement = Statement::Select(select(vec![column("*")]));
    let request = render_http(&statement).unwrap();
    assert!(request.params.is_empty());
    assert_eq!(request.full_path(), "/books");
}

#[test]
fn renders_projection_filters_sorts_and_limits() {
    let mut query = select(vec![column("title"), column("description")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "description".to_string(),
        operator: FilterOperator::Ilike,
        negate: false,
        value: FilterValue::Scalar(Scalar::String("%cheese%".to_string())),
    }));
    query.sorts = vec![Sort {
        column: "title".to_string(),
        direction: Some(SortDirection::Desc),
        nulls: None,
    }];
    query.limit = Some(Limit {
        count: Some(5),
        offset: Some(10),
    });

    let request = render_http(&Statement::Select(query)).unwrap();
    assert_eq!(
        request.full_path(),
        "/books?select=title,description&description=ilike.*cheese*&order=title.desc&limit=5&offset=10"
    );
}

#[test]
fn flattens_top_level_conjunctions_into_sibling_params() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Logical(LogicalFilter {
        operator: LogicalOperator::And,
        negate: false,
        filters: vec![
            Filter::Column(ColumnFilter {
                column: "id".to_string(),
                operator: FilterOperator::Is,
                negate: true,
                value: FilterValue::Null,
            }),
            Filter::Logical(LogicalFilter {
                operator: LogicalOperator::Or,
                negate: false,
                filters: vec![
                    Filter::Column(ColumnFilter {
                        column: "rating".to_string(),
                        operator: FilterOperator::Gt,
                        negate: false,
                        value: FilterValue::Scalar(Scalar::Integer(4)),
                    }),
                    Filter::Column(ColumnFilter {
                        column: "title".to_string(),
                        operator: FilterOperator::Ilike,
                        negate: false,
                        value: FilterValue::Scalar(Scalar::String("%foo%".to_string())),
                    }),
                ],
            }),
        ],
    }));

    let request = render_http(&Statement::Select(query)).unwrap();
    assert_eq!(
        request.full_path(),
        "/books?id=not.is.null&or=(rating.gt.4,title.ilike.*foo*)"
    );
}

#[test]
fn renders_text_search_params_with_config() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "description".to_string(),
        operator: FilterOperator::Wfts,
        negate: false,
        value: FilterValue::TextQuery {
            query: "cheese".to_string(),
            config: Some("english".to_string()),
        },
    }));

    let request = render_http(&Statement::Select(query)).unwrap();
    assert_eq!(
        request.params,
        vec![(
            "description".to_string(),
            "wfts(english).cheese".to_string()
        )]
    );
}

#[test]
fn renders_embedded_targets_in_the_select_param() {
    let query = select(vec![
        column("title"),
        Target::Embedded(authors_embed(vec![column("name")])),
    ]);
    let request = render_http(&Statement::Select(query)).unwrap();
    assert_eq!(
        request.params,
        vec![(
            "select".to_string(),
            "title,...authors!inner(name)".to_string()
        )]
    );
}

#[test]
fn js_chain_covers_filters_order_and_range() {
    let mut query = select(vec![column("title"), column("description")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "description".to_string(),
        operator: FilterOperator::Ilike,
        negate: false,
        value: FilterValue::Scalar(Scalar::String("%cheese%".to_string())),
    }));
    query.sorts = vec![Sort {
        column: "title".to_string(),
        direction: Some(SortDirection::Desc),
        nulls: Some(SortNulls::Last),
    }];
    query.limit = Some(Limit {
        count: Some(5),
        offset: Some(10),
    });

    let code = render_supabase_js(&Statement::Select(query)).unwrap();
    assert_eq!(
        code,
        "const { data, error } = await supabase\n  .from('books')\n  .select('title,description')\n  .ilike('description', '%cheese%')\n  .order('title', { ascending: false, nullsFirst: false })\n  .range(10, 15)"
    );
}

#[test]
fn js_renders_negated_filters_through_not() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "id".to_string(),
        operator: FilterOperator::Is,
        negate: true,
        value: FilterValue::Null,
    }));

    let code = render_supabase_js(&Statement::Select(query)).unwrap();
    assert!(code.contains("  .not('id', 'is', null)"));
    assert!(code.contains("  .select('*')"));
}

#[test]
fn js_renders_negated_logicals_inside_or() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Logical(LogicalFilter {
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
                column: "title".to_string(),
                operator: FilterOperator::Eq,
                negate: false,
                value: FilterValue::Scalar(Scalar::String("foo".to_string())),
            }),
        ],
    }));

    let code = render_supabase_js(&Statement::Select(query)).unwrap();
    assert!(code.contains("  .or('not.and(rating.gt.4,title.eq.foo)')"));
}

#[test]
fn js_renders_text_search_options() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "description".to_string(),
        operator: FilterOperator::Plfts,
        negate: false,
        value: FilterValue::TextQuery {
            query: "cheese".to_string(),
            config: Some("english".to_string()),
        },
    }));

    let code = render_supabase_js(&Statement::Select(query)).unwrap();
    assert!(code.contains(".textSearch('description', 'cheese', { type: 'plain', config: 'english' })"));
}

#[test]
fn js_renders_the_default_text_search_type() {
    let mut query = select(vec![column("*")]);
    query.filter = Some(Filter::Column(ColumnFilter {
        column: "description".to_string(),
        operator: FilterOperator::Fts,
        negate: false,
        value: FilterValue::TextQuery {
            query: "cheese".to_string(),
            config: None,
        },
    }));

    let code = render_supabase_js(&Statement::Select(query)).unwrap();
    assert!(code.contains(".textSearch('description', 'cheese', { type: 'default' })"));
}

#[test]
fn js_rejects_an_offset_without_a_count() {
    let mut query = select(vec![column("*")]);
    query.limit = Some(Limit {
        count: None,
        offset: Some(10),
    });

    let error = render_supabase_js(&Statement::Select(query)).unwrap_err();
    assert_eq!(error.renderer, "supabase-js");
}

#[test]
fn model_round_trips_through_json() {
    let mut query = select(vec![
        column("title"),
        Target::Aggregate(AggregateTarget {
            function_name: AggregateFunction::Count,
            column: None,
            alias: None,
            input_cast: None,
            output_cast: None,
        }),
        Target::Embedded(authors_embed(vec![column("name")])),
    ]);
    query.filter = Some(Filter::Logical(LogicalFilter {
        operator: LogicalOperator::Or,
        negate: false,
        filters: vec![
            Filter::Column(ColumnFilter {
                column: "rating".to_string(),
                operator: FilterOperator::Gte,
                negate: false,
                value: FilterValue::Scalar(Scalar::Float(4.5)),
            }),
            Filter::Column(ColumnFilter {
                column: "tags".to_string(),
                operator: FilterOperator::In,
                negate: true,
                value: FilterValue::List(vec![
                    Scalar::String("a".to_string()),
                    Scalar::Integer(2),
                ]),
            }),
        ],
    }));
    let statement = Statement::Select(query);

    let json = serde_json::to_string(&statement).unwrap();
    let parsed: Statement = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, statement);
}
