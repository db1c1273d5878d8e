use crate::http::HttpRequest;

// Characters PostgREST query syntax relies on; everything else outside the
// RFC 3986 unreserved set is percent-encoded.
pub const DEFAULT_UNENCODED: &[char] = &['*', '(', ')', ',', ':', '!', '>', '-', '[', ']'];

pub fn percent_encode(input: &str, keep: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        let c = byte as char;
        if byte.is_ascii_alphanumeric()
            || matches!(c, '-' | '_' | '.' | '~')
            || (byte.is_ascii() && keep.contains(&c))
        {
            out.push(c);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

pub fn encode_query(params: &[(String, String)], keep: &[char]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!("{}={}", percent_encode(key, keep), percent_encode(value, keep))
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn format_curl(request: &HttpRequest, base_url: &str, keep: &[char]) -> String {
    let mut out = String::new();
    out.push_str("curl ");
    if !request.params.is_empty() {
        out.push_str("-G ");
    }
    out.push_str(base_url);
    out.push_str(&request.path);
    for (key, value) in &request.params {
        out.push_str(" \\\n  -d \"");
        out.push_str(&percent_encode(key, keep));
        out.push('=');
        out.push_str(&percent_encode(value, keep));
        out.push('"');
    }
    out
}

pub fn format_raw_http(request: &HttpRequest, base_path: &str, host: &str, keep: &[char]) -> String {
    let mut path = format!("{base_path}{}", request.path);
    if !request.params.is_empty() {
        path.push('?');
        path.push_str(&encode_query(&request.params, keep));
    }
    format!("{} {} HTTP/1.1\nHost: {}", request.method.as_str(), path, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request(params: &[(&str, &str)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: "/books".to_string(),
            params: params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    #[test]
    fn keeps_whitelisted_characters() {
        assert_eq!(
            percent_encode("select=title,...authors!inner(name)", DEFAULT_UNENCODED),
            "select%3Dtitle,...authors!inner(name)"
        );
    }

    #[test]
    fn encodes_spaces_and_percent_signs() {
        assert_eq!(
            percent_encode("ilike.%foo bar%", DEFAULT_UNENCODED),
            "ilike.%25foo%20bar%25"
        );
    }

    #[test]
    fn encodes_multibyte_input_per_byte() {
        assert_eq!(percent_encode("café", DEFAULT_UNENCODED), "caf%C3%A9");
    }

    #[test]
    fn curl_includes_get_flag_only_with_params() {
        let bare = request(&[]);
        assert_eq!(
            format_curl(&bare, "http://localhost:54321/rest/v1", DEFAULT_UNENCODED),
            "curl http://localhost:54321/rest/v1/books"
        );

        let with_params = request(&[("select", "count()"), ("limit", "5")]);
        assert_eq!(
            format_curl(
                &with_params,
                "http://localhost:54321/rest/v1",
                DEFAULT_UNENCODED
            ),
            "curl -G http://localhost:54321/rest/v1/books \\\n  -d \"select=count()\" \\\n  -d \"limit=5\""
        );
    }

    #[test]
    fn raw_http_prefixes_the_base_path() {
        let with_params = request(&[("select", "count()")]);
        assert_eq!(
            format_raw_http(&with_params, "/rest/v1", "localhost:54321", DEFAULT_UNENCODED),
            "GET /rest/v1/books?select=count() HTTP/1.1\nHost: localhost:54321"
        );
    }
}
