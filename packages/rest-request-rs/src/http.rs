use crate::format::{encode_query, DEFAULT_UNENCODED};
use crate::model::{Sort, SortNulls, Statement};
use crate::render::{
    projects_all_columns, render_filter_params, render_target_list, RenderError,
};

const RENDERER: &str = "http";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn full_path(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        format!(
            "{}?{}",
            self.path,
            encode_query(&self.params, DEFAULT_UNENCODED)
        )
    }
}

pub fn render_http(statement: &Statement) -> Result<HttpRequest, RenderError> {
    let Statement::Select(select) = statement;
    let mut params: Vec<(String, String)> = Vec::new();

    if !projects_all_columns(&select.targets) {
        params.push((
            "select".to_string(),
            render_target_list(&select.targets, RENDERER)?,
        ));
    }

    if let Some(filter) = &select.filter {
        params.extend(render_filter_params(filter, true, RENDERER)?);
    }

    if !select.sorts.is_empty() {
        params.push(("order".to_string(), render_order(&select.sorts)));
    }

    if let Some(limit) = &select.limit {
        if let Some(count) = limit.count {
            params.push(("limit".to_string(), count.to_string()));
        }
        if let Some(offset) = limit.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
    }

    Ok(HttpRequest {
        method: HttpMethod::Get,
        path: format!("/{}", select.from),
        params,
    })
}

fn render_order(sorts: &[Sort]) -> String {
    sorts
        .iter()
        .map(|sort| {
            let mut part = sort.column.clone();
            if let Some(direction) = sort.direction {
                part.push('.');
                part.push_str(direction.as_str());
            }
            if let Some(nulls) = sort.nulls {
                part.push_str(match nulls {
                    SortNulls::First => ".nullsfirst",
                    SortNulls::Last => ".nullslast",
                });
            }
            part
        })
        .collect::<Vec<_>>()
        .join(",")
}
