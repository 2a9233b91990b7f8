use server_proxy::config::ServerConfig;
use server_proxy::http::*;
use std::str::FromStr;
use std::sync::Arc;

#[test]
fn method_parses_case_insensitively() {
    assert_eq!(Method::from_str("get").unwrap(), Method::GET);
    assert_eq!(Method::from_str("POST").unwrap(), Method::POST);
    assert_eq!(Method::from_str("Delete").unwrap(), Method::DELETE);
}

#[test]
fn unknown_method_is_rejected() {
    assert_eq!(Method::from_str("PATCH").unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn method_display_round_trips_through_is_allowed() {
    let allowed = vec!["GET".to_string(), "POST".to_string()];
    assert!(Method::GET.is_allowed(&allowed));
    assert!(Method::POST.is_allowed(&allowed));
    assert!(!Method::DELETE.is_allowed(&allowed));
}

#[test]
fn response_serializes_status_line_headers_and_body() {
    let mut res = HttpResponse::new(200, "OK");
    res.set_header("X-Test", "yes");
    res.set_body(b"hello".to_vec(), "text/plain");

    let bytes = res.to_bytes();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("X-Test: yes\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("hello"));
}

#[test]
fn set_status_code_updates_status_text() {
    let mut res = HttpResponse::new(200, "OK");
    res.set_status_code(404);
    assert_eq!(res.status_code, 404);
    assert_eq!(res.status_text, "Not Found");
}

#[test]
fn status_text_covers_known_and_unknown_codes() {
    assert_eq!(HttpResponse::status_text(200), "OK");
    assert_eq!(HttpResponse::status_text(404), "Not Found");
    assert_eq!(HttpResponse::status_text(502), "Bad Gateway");
    assert_eq!(HttpResponse::status_text(999), "Unknown");
}

#[test]
fn redirect_sets_location_and_empty_body() {
    let res = HttpResponse::redirect(301, "/new-location");
    assert_eq!(res.status_code, 301);
    assert_eq!(res.headers.get("location").map(String::as_str), Some("/new-location"));
    assert_eq!(res.headers.get("content-length").map(String::as_str), Some("0"));
}

#[test]
fn handle_error_falls_back_to_plain_text_without_a_config() {
    let res = handle_error(404, None);
    assert_eq!(res.status_code, 404);
    assert_eq!(res.headers.get("connection").map(String::as_str), Some("keep-alive"));
    assert_eq!(String::from_utf8(res.body).unwrap(), "404 Not Found");
}

#[test]
fn handle_error_closes_connection_for_server_errors() {
    let res = handle_error(500, None);
    assert_eq!(res.headers.get("connection").map(String::as_str), Some("close"));
}

#[test]
fn handle_error_loads_custom_error_page_from_config() {
    let dir = std::env::temp_dir().join(format!(
        "server_proxy_test_errpage_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("404.html"), b"<h1>not here</h1>").unwrap();

    let mut error_pages = std::collections::HashMap::new();
    error_pages.insert(404u16, "404.html".to_string());

    let cfg = Arc::new(ServerConfig {
        root: dir.to_string_lossy().to_string(),
        error_pages,
        ..Default::default()
    });

    let res = handle_error(404, Some(&cfg));
    assert_eq!(String::from_utf8(res.body).unwrap(), "<h1>not here</h1>");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn mime_type_is_resolved_from_extension() {
    assert_eq!(get_mime_type(Some("html")), "text/html");
    assert_eq!(get_mime_type(Some("png")), "image/png");
    assert_eq!(get_mime_type(Some("unknown_ext")), "application/octet-stream");
    assert_eq!(get_mime_type(None), "application/octet-stream");
}

#[test]
fn extension_is_resolved_from_content_type() {
    assert_eq!(get_ext_from_content_type("image/png"), ".png");
    assert_eq!(get_ext_from_content_type("application/json"), ".json");
    assert_eq!(get_ext_from_content_type("application/x-nonsense"), ".bin");
}

#[test]
fn autoindex_lists_directory_entries() {
    let dir = std::env::temp_dir().join(format!(
        "server_proxy_test_autoindex_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.txt"), b"a").unwrap();
    std::fs::write(dir.join("b.txt"), b"b").unwrap();

    let res = generate_autoindex(&dir, "/files");
    let body = String::from_utf8(res.body).unwrap();

    assert!(body.contains("Index of /files"));
    assert!(body.contains("href=\"/files/a.txt\""));
    assert!(body.contains("href=\"/files/b.txt\""));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn find_subsequence_locates_a_boundary_in_a_larger_buffer() {
    let haystack = b"--boundary\r\nContent-Disposition: form-data\r\n\r\nbody--boundary--";
    let pos = find_subsequence(haystack, b"--boundary", 0);
    assert_eq!(pos, Some(0));

    let next = find_subsequence(haystack, b"--boundary", 1);
    assert_eq!(next, Some(haystack.len() - "--boundary--".len()));
}

#[test]
fn find_subsequence_returns_none_when_absent() {
    let haystack = b"no needle in here";
    assert_eq!(find_subsequence(haystack, b"needle_not_present", 0), None);
}
