use rest_request_rs::format::{format_curl, format_raw_http, DEFAULT_UNENCODED};
use rest_request_rs::{render_http, render_supabase_js, HttpMethod};
use sql_rest_compiler_rs::{process_sql, translate_http_request, translate_supabase_js, CompileError};

fn full_path(sql: &str) -> String {
    let statement = process_sql(sql).expect("expected sql to lower");
    render_http(&statement).expect("expected http render").full_path()
}

#[test]
fn translates_projection_filter_order_and_pagination() {
    assert_eq!(
        full_path(
            "select title, description from books \
             where description ilike '%cheese%' \
             order by title desc limit 5 offset 10"
        ),
        "/books?select=title,description&description=ilike.*cheese*&order=title.desc&limit=5&offset=10"
    );
}

#[test]
fn omits_the_select_param_for_a_bare_star() {
    assert_eq!(full_path("select * from books"), "/books");
}

#[test]
fn keeps_a_bare_count_in_the_select_param() {
    assert_eq!(
        full_path("select count() from books"),
        "/books?select=count()"
    );
}

#[test]
fn spreads_inner_joins_into_embedded_targets() {
    assert_eq!(
        full_path("select a.title, b.name from books a inner join authors b on a.author_id = b.id"),
        "/books?select=title,...authors!inner(name)"
    );
}

#[test]
fn left_joins_embed_without_the_inner_marker() {
    assert_eq!(
        full_path("select a.title, b.name from books a left join authors b on a.author_id = b.id"),
        "/books?select=title,...authors(name)"
    );
}

#[test]
fn filters_on_joined_columns_use_dot_syntax_keys() {
    assert_eq!(
        full_path(
            "select a.title, b.name from books a \
             inner join authors b on a.author_id = b.id \
             where b.name = 'Tolkien'"
        ),
        "/books?select=title,...authors!inner(name)&authors.name=eq.Tolkien"
    );
}

#[test]
fn flattens_conjunctions_and_nests_disjunctions() {
    assert_eq!(
        full_path(
            "select * from books where id is not null and (rating > 4 or title ilike '%foo%')"
        ),
        "/books?id=not.is.null&or=(rating.gt.4,title.ilike.*foo*)"
    );
}

#[test]
fn accepts_grouped_aggregates_and_rejects_missing_group_targets() {
    assert_eq!(
        full_path("select genre, count() from books group by genre"),
        "/books?select=genre,count()"
    );

    let error = process_sql("select count() from books group by genre").unwrap_err();
    assert_eq!(
        error.to_string(),
        "Every group by column must also exist as a select target"
    );
    assert!(matches!(error, CompileError::Unsupported { .. }));
}

#[test]
fn renders_the_request_as_a_curl_invocation() {
    let statement = process_sql("select count() from books").unwrap();
    let request = render_http(&statement).unwrap();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(
        format_curl(&request, "http://localhost:54321/rest/v1", DEFAULT_UNENCODED),
        "curl -G http://localhost:54321/rest/v1/books \\\n  -d \"select=count()\""
    );
}

#[test]
fn renders_the_request_as_raw_http() {
    let statement = process_sql("select count() from books").unwrap();
    let request = render_http(&statement).unwrap();
    assert_eq!(
        format_raw_http(&request, "/rest/v1", "localhost:54321", DEFAULT_UNENCODED),
        "GET /rest/v1/books?select=count() HTTP/1.1\nHost: localhost:54321"
    );
}

#[test]
fn renders_a_supabase_js_chain() {
    let statement = process_sql(
        "select title, description from books \
         where description ilike '%cheese%' \
         order by title desc limit 5 offset 10",
    )
    .unwrap();
    assert_eq!(
        render_supabase_js(&statement).unwrap(),
        "const { data, error } = await supabase\n  .from('books')\n  .select('title,description')\n  .ilike('description', '%cheese%')\n  .order('title', { ascending: false })\n  .range(10, 15)"
    );
}

#[test]
fn surfaces_client_render_errors_with_the_renderer_name() {
    let statement = process_sql("select * from books offset 10").unwrap();
    let error = render_supabase_js(&statement).unwrap_err();
    assert_eq!(error.renderer, "supabase-js");

    match translate_supabase_js("select * from books offset 10").unwrap_err() {
        CompileError::Render(error) => assert_eq!(error.renderer, "supabase-js"),
        other => panic!("expected a render error, got {other:?}"),
    }
}

#[test]
fn translates_in_a_single_call() {
    let request = translate_http_request("select count() from books").unwrap();
    assert_eq!(request.full_path(), "/books?select=count()");
}

#[test]
fn encodes_characters_outside_the_whitelist() {
    assert_eq!(
        full_path("select * from books where title = 'a & b'"),
        "/books?title=eq.a%20%26%20b"
    );
}
