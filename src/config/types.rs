use std::collections::HashMap;

use super::parser::{ConfigError, ConfigParser, FromYaml, ParseResult};
use crate::lexer::tokens::TokenType;

// --- Constants ---
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SERVER_NAME: &str = "_";
pub const DEFAULT_MAX_BODY_SIZE: usize = 1_048_576; // 1MB
pub const DEFAULT_ROUTE_PATH: &str = "/";
pub const DEFAULT_ROOT: &str = "./www";
pub const DEFAULT_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub path: String,
    pub methods: Vec<String>,
    pub redirection: Option<String>,
    pub redirect_code: Option<u16>,
    pub root: String,
    pub default_file: String,
    pub upload_dir: String,
    pub cgi_ext: Option<String>,
    pub cgi_path: Option<String>,
    pub autoindex: bool,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_ROUTE_PATH.to_string(),
            methods: vec!["GET".to_string()],
            redirection: None,
            redirect_code: None,
            root: DEFAULT_ROOT.to_string(),
            default_file: DEFAULT_FILE.to_string(),
            upload_dir: String::new(),
            cgi_ext: None,
            cgi_path: None,
            autoindex: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub ports: Vec<u16>,
    pub server_name: String,
    pub default_server: bool,
    pub root: String,
    pub error_pages: HashMap<u16, String>,
    pub client_max_body_size: usize,
    pub routes: Vec<RouteConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ports: vec![DEFAULT_PORT],
            server_name: DEFAULT_SERVER_NAME.to_string(),
            default_server: false,
            root: DEFAULT_ROOT.to_string(),
            error_pages: HashMap::new(),
            client_max_body_size: DEFAULT_MAX_BODY_SIZE,
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub servers: Vec<ServerConfig>,
}

// Hand-written FromYaml impls. The struct shape is stable and small enough
// that a derive buys little over an explicit key/value loop, and the
// explicit version gives every field its own default and its own error
// context instead of a derive macro's generic field reporting.

impl FromYaml for RouteConfig {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        let mut route = RouteConfig::default();
        let mut struct_indent = None;

        while parser.check_indentation(min_indent, &mut struct_indent)? {
            let Some(key) = parser.parse_map_key()? else {
                break;
            };
            parser.consume_key(&key)?;
            let field_indent = struct_indent.unwrap_or(min_indent);

            match key.as_str() {
                "path" => route.path = String::from_yaml(parser, field_indent)?,
                "methods" => route.methods = Vec::<String>::from_yaml(parser, field_indent)?,
                "root" => route.root = String::from_yaml(parser, field_indent)?,
                "default_file" => route.default_file = String::from_yaml(parser, field_indent)?,
                "upload_dir" => route.upload_dir = String::from_yaml(parser, field_indent)?,
                "autoindex" => route.autoindex = bool::from_yaml(parser, field_indent)?,
                "cgi_ext" => route.cgi_ext = Some(String::from_yaml(parser, field_indent)?),
                "cgi_path" => route.cgi_path = Some(String::from_yaml(parser, field_indent)?),
                "redirection" => {
                    route.redirection = Some(String::from_yaml(parser, field_indent)?)
                }
                "redirect_code" => {
                    route.redirect_code = Some(u16::from_yaml(parser, field_indent)?)
                }
                _ => {
                    return Err(ConfigError {
                        message: format!("Unknown location key '{}'", key),
                        loc: parser.peek_loc(),
                        context: vec!["parsing location block".to_string()],
                    });
                }
            }
        }

        if route.redirection.is_none() && route.root.is_empty() {
            return Err(ConfigError {
                message: "location requires either 'root' or 'redirection'".to_string(),
                loc: parser.peek_loc(),
                context: vec![format!("parsing location '{}'", route.path)],
            });
        }

        Ok(route)
    }
}

impl FromYaml for ServerConfig {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        let mut server = ServerConfig::default();
        let mut struct_indent = None;
        let mut saw_location = false;

        while parser.check_indentation(min_indent, &mut struct_indent)? {
            let Some(key) = parser.parse_map_key()? else {
                break;
            };
            parser.consume_key(&key)?;
            let field_indent = struct_indent.unwrap_or(min_indent);

            match key.as_str() {
                "host" => server.host = String::from_yaml(parser, field_indent)?,
                "root" => server.root = String::from_yaml(parser, field_indent)?,
                "server_name" => server.server_name = String::from_yaml(parser, field_indent)?,
                "default_server" => {
                    server.default_server = bool::from_yaml(parser, field_indent)?
                }
                "client_max_body_size" => {
                    server.client_max_body_size = usize::from_yaml(parser, field_indent)?
                }
                "error_page" => {
                    server.error_pages = HashMap::<u16, String>::from_yaml(parser, field_indent)?
                }
                "ports" => {
                    server.ports = match parser.peek_kind() {
                        Some(TokenType::Number(_)) => vec![u16::from_yaml(parser, field_indent)?],
                        _ => Vec::<u16>::from_yaml(parser, field_indent)?,
                    }
                }
                "location" => {
                    saw_location = true;
                    server.routes = Vec::<RouteConfig>::from_yaml(parser, field_indent)?;
                }
                _ => {
                    return Err(ConfigError {
                        message: format!("Unknown server key '{}'", key),
                        loc: parser.peek_loc(),
                        context: vec!["parsing server block".to_string()],
                    });
                }
            }
        }

        if !saw_location || server.routes.is_empty() {
            return Err(ConfigError {
                message: "server block requires at least one 'location'".to_string(),
                loc: parser.peek_loc(),
                context: vec![format!("parsing server '{}'", server.server_name)],
            });
        }

        Ok(server)
    }
}

impl FromYaml for Config {
    fn from_yaml(parser: &mut ConfigParser, min_indent: usize) -> ParseResult<Self> {
        let mut config = Config::default();
        let mut struct_indent = None;

        while parser.check_indentation(min_indent, &mut struct_indent)? {
            let Some(key) = parser.parse_map_key()? else {
                break;
            };
            parser.consume_key(&key)?;
            let field_indent = struct_indent.unwrap_or(min_indent);

            match key.as_str() {
                "server" => {
                    config.servers = Vec::<ServerConfig>::from_yaml(parser, field_indent)?
                }
                _ => {
                    return Err(ConfigError {
                        message: format!("Unknown top-level key '{}'", key),
                        loc: parser.peek_loc(),
                        context: vec![],
                    });
                }
            }
        }

        if config.servers.is_empty() {
            return Err(ConfigError {
                message: "configuration must declare at least one server".to_string(),
                loc: None,
                context: vec![],
            });
        }

        Ok(config)
    }
}
