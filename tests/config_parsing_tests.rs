use server_proxy::config::{Config, FromYaml, ServerConfig};

fn single_server_yaml() -> &'static str {
    "server:\n\
     \x20\x20- host: 127.0.0.1\n\
     \x20\x20\x20\x20ports: [8080]\n\
     \x20\x20\x20\x20server_name: example.com\n\
     \x20\x20\x20\x20client_max_body_size: 2048\n\
     \x20\x20\x20\x20location:\n\
     \x20\x20\x20\x20\x20\x20- path: /\n\
     \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n\
     \x20\x20\x20\x20\x20\x20\x20\x20methods: [GET, POST]\n"
}

#[test]
fn parses_single_server_block() {
    let config = Config::from_str(single_server_yaml()).expect("config should parse");

    assert_eq!(config.servers.len(), 1);
    let server = &config.servers[0];
    assert_eq!(server.host, "127.0.0.1");
    assert_eq!(server.ports, vec![8080]);
    assert_eq!(server.server_name, "example.com");
    assert_eq!(server.client_max_body_size, 2048);
    assert_eq!(server.routes.len(), 1);
    assert_eq!(server.routes[0].path, "/");
    assert_eq!(server.routes[0].root, "./www");
    assert_eq!(server.routes[0].methods, vec!["GET", "POST"]);
}

#[test]
fn defaults_apply_when_fields_are_omitted() {
    let yaml = "server:\n\
                \x20\x20- location:\n\
                \x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20root: ./www\n";
    let config = Config::from_str(yaml).expect("config should parse");
    let server = &config.servers[0];

    assert_eq!(server.host, "127.0.0.1");
    assert_eq!(server.ports, vec![8080]);
    assert_eq!(server.server_name, "_");
    assert_eq!(server.client_max_body_size, 1_048_576);
    assert_eq!(server.routes[0].methods, vec!["GET".to_string()]);
    assert!(!server.routes[0].autoindex);
}

#[test]
fn parses_multiple_virtual_hosts_on_one_block() {
    let yaml = "server:\n\
                \x20\x20- host: 0.0.0.0\n\
                \x20\x20\x20\x20server_name: first.test\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n\
                \x20\x20- host: 0.0.0.0\n\
                \x20\x20\x20\x20server_name: second.test\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./other\n";
    let config = Config::from_str(yaml).expect("config should parse");

    assert_eq!(config.servers.len(), 2);
    assert_eq!(config.servers[0].server_name, "first.test");
    assert_eq!(config.servers[1].server_name, "second.test");
}

#[test]
fn parses_error_page_map() {
    let yaml = "server:\n\
                \x20\x20- error_page:\n\
                \x20\x20\x20\x20\x20404: /errors/404.html\n\
                \x20\x20\x20\x20\x20500: /errors/500.html\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n";
    let config = Config::from_str(yaml).expect("config should parse");
    let pages = &config.servers[0].error_pages;

    assert_eq!(pages.get(&404).map(String::as_str), Some("/errors/404.html"));
    assert_eq!(pages.get(&500).map(String::as_str), Some("/errors/500.html"));
}

#[test]
fn redirection_route_does_not_require_root() {
    let yaml = "server:\n\
                \x20\x20- location:\n\
                \x20\x20\x20\x20- path: /old\n\
                \x20\x20\x20\x20\x20\x20redirection: /new\n\
                \x20\x20\x20\x20\x20\x20redirect_code: 301\n";
    let config = Config::from_str(yaml).expect("config should parse");
    let route = &config.servers[0].routes[0];

    assert_eq!(route.redirection.as_deref(), Some("/new"));
    assert_eq!(route.redirect_code, Some(301));
    assert!(route.root.is_empty());
}

#[test]
fn location_without_root_or_redirection_is_rejected() {
    let yaml = "server:\n\
                \x20\x20- location:\n\
                \x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20autoindex: on\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("requires either 'root' or 'redirection'"));
}

#[test]
fn server_without_any_location_is_rejected() {
    let yaml = "server:\n\
                \x20\x20- host: 127.0.0.1\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("requires at least one 'location'"));
}

#[test]
fn empty_config_is_rejected() {
    let err = Config::from_str("").unwrap_err();
    assert!(err.message.contains("must declare at least one server"));
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let yaml = "servers:\n\
                \x20\x20- host: 127.0.0.1\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("Unknown top-level key"));
}

#[test]
fn unknown_server_key_is_rejected() {
    let yaml = "server:\n\
                \x20\x20- bananas: yes\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("Unknown server key 'bananas'"));
}

#[test]
fn unknown_location_key_is_rejected() {
    let yaml = "server:\n\
                \x20\x20- location:\n\
                \x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20root: ./www\n\
                \x20\x20\x20\x20\x20\x20bananas: yes\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("Unknown location key 'bananas'"));
}

#[test]
fn ports_accepts_single_scalar_or_inline_list() {
    let single = "server:\n\
                  \x20\x20- ports: 9090\n\
                  \x20\x20\x20\x20location:\n\
                  \x20\x20\x20\x20\x20\x20- path: /\n\
                  \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n";
    let config = Config::from_str(single).expect("config should parse");
    assert_eq!(config.servers[0].ports, vec![9090]);

    let list = "server:\n\
                \x20\x20- ports: [80, 8080, 8443]\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n";
    let config = Config::from_str(list).expect("config should parse");
    assert_eq!(config.servers[0].ports, vec![80, 8080, 8443]);
}

#[test]
fn non_numeric_port_value_is_rejected() {
    let yaml = "server:\n\
                \x20\x20- ports: [not_a_port]\n\
                \x20\x20\x20\x20location:\n\
                \x20\x20\x20\x20\x20\x20- path: /\n\
                \x20\x20\x20\x20\x20\x20\x20\x20root: ./www\n";
    let err = Config::from_str(yaml).unwrap_err();
    assert!(err.message.contains("Expected number"));
}

#[test]
fn cgi_and_autoindex_fields_parse() {
    let yaml = "server:\n\
                \x20\x20- location:\n\
                \x20\x20\x20\x20- path: /cgi-bin\n\
                \x20\x20\x20\x20\x20\x20root: ./cgi-bin\n\
                \x20\x20\x20\x20\x20\x20cgi_ext: .py\n\
                \x20\x20\x20\x20\x20\x20cgi_path: /usr/bin/python3\n\
                \x20\x20\x20\x20\x20\x20autoindex: true\n";
    let config = Config::from_str(yaml).expect("config should parse");
    let route = &config.servers[0].routes[0];

    assert_eq!(route.cgi_ext.as_deref(), Some(".py"));
    assert_eq!(route.cgi_path.as_deref(), Some("/usr/bin/python3"));
    assert!(route.autoindex);
}

#[test]
fn server_config_parses_standalone_without_the_top_level_wrapper() {
    // ServerConfig implements FromYaml on its own, independent of the
    // "server:" wrapper key that Config requires.
    let yaml = "host: 127.0.0.1\n\
                location:\n\
                \x20\x20- path: /\n\
                \x20\x20\x20\x20root: ./www\n";
    let server = ServerConfig::from_str(yaml).expect("should parse standalone");
    assert_eq!(server.host, "127.0.0.1");
    assert_eq!(server.routes[0].root, "./www");
}
