pub use crate::prelude::*;

pub fn handle_get(
    request: &HttpRequest,
    r_cfg: &RouteConfig,
    s_cfg: &Arc<ServerConfig>,
) -> (HttpResponse, ActiveAction) {
    let root = &r_cfg.root;
    let relative_path = request
        .url
        .strip_prefix(&r_cfg.path)
        .unwrap_or(&request.url);
    let relative_path = relative_path.split('?').next().unwrap_or(relative_path);
    let mut path = PathBuf::from(root);
    path.push(relative_path.trim_start_matches('/'));

    if path.is_dir() {
        if !r_cfg.default_file.is_empty() {
            path.push(&r_cfg.default_file);
        } else if r_cfg.autoindex {
            return (generate_autoindex(&path, &request.url), ActiveAction::None);
        } else {
            let mut response =
                HttpResponse::new(HTTP_FORBIDDEN, &HttpResponse::status_text(HTTP_FORBIDDEN));
            response.set_body(
                b"403 Forbidden: Directory listing denied".to_vec(),
                "text/plain",
            );
            return (response, ActiveAction::None);
        }
    }

    match File::open(&path) {
        Ok(file) => {
            let Ok(metadata) = file.metadata() else {
                return (
                    handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(s_cfg)),
                    ActiveAction::None,
                );
            };
            let file_size = metadata.size() as usize;
            let mime_type = get_mime_type(path.extension().and_then(|s| s.to_str()));

            let mut response = HttpResponse::new(HTTP_OK, &HttpResponse::status_text(HTTP_OK));
            response
                .headers
                .insert("content-length".to_string(), file_size.to_string());
            response
                .headers
                .insert("content-type".to_string(), mime_type.to_string());

            (response, ActiveAction::FileDownload(file, file_size))
        }
        Err(e) => {
            let response = match e.kind() {
                std::io::ErrorKind::NotFound => handle_error(HTTP_NOT_FOUND, Some(s_cfg)),
                std::io::ErrorKind::PermissionDenied => {
                    handle_error(HTTP_FORBIDDEN, Some(s_cfg))
                }
                _ => handle_error(HTTP_INTERNAL_SERVER_ERROR, Some(s_cfg)),
            };
            (response, ActiveAction::None)
        }
    }
}
