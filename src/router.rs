use crate::prelude::*;

#[derive(Debug)]
pub enum RoutingError {
    NotFound,
    NoAccess,
    MethodNotAllowed,
}

/// Returns true if `relative` (a request path with a route's prefix already
/// stripped) would walk above the route's root once `..` segments are
/// resolved against it.
fn escapes_root(relative: &str) -> bool {
    let mut depth: i32 = 0;
    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            _ => depth += 1,
        }
    }
    false
}

impl ServerConfig {
    /// Longest-prefix match over this server's routes.
    ///
    /// Ties favor the first declared route. A local route (one with a
    /// non-empty `root`) whose remaining path would escape that root via
    /// `..` segments is rejected immediately as NoAccess rather than letting
    /// a shorter, safe route win instead — an inaccessible match is more
    /// informative than silently falling through.
    pub fn find_route(&self, url: &str, method: &Method) -> core::result::Result<&RouteConfig, RoutingError> {
        let path_only = url.split('?').next().unwrap_or(url);

        let mut best: Option<&RouteConfig> = None;
        for route in &self.routes {
            if !path_only.starts_with(route.path.as_str()) {
                continue;
            }

            let is_longer = match best {
                None => true,
                Some(current) => route.path.len() > current.path.len(),
            };
            if !is_longer {
                continue;
            }

            if route.redirection.is_none() {
                let relative = &path_only[route.path.len()..];
                if escapes_root(relative) {
                    return Err(RoutingError::NoAccess);
                }
            }

            best = Some(route);
        }

        match best {
            Some(route) => {
                if !method.is_allowed(&route.methods) {
                    return Err(RoutingError::MethodNotAllowed);
                }
                Ok(route)
            }
            None => Err(RoutingError::NotFound),
        }
    }
}
