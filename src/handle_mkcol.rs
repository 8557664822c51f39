use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::path::{PathResolver, ResolvedPath};
use crate::request::{DavRequest, DavResponseSink};

/// MKCOL: reject a body with 415, an existing target with 405, a missing
/// parent with 409; otherwise `mkdir` and answer 201.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    if req.content_length() > 0 {
        return Err(DavError::UnsupportedMediaType);
    }

    if PathResolver::resolve(ctx.mount, ctx.rel_path).is_ok() {
        return Err(DavError::MethodNotAllowed);
    }

    if ctx.config.lock_policy_value() == crate::config::LockPolicy::Enforced {
        let key = ctx.lock_key(req.host());
        let submitted = req.header("If").map(extract_token).unwrap_or_default();
        let tokens: Vec<&str> = submitted.iter().map(String::as_str).collect();
        if ctx.lock_cache.check(&key, &tokens).is_err() {
            return Err(DavError::Locked);
        }
    }

    let mut uri_path = ctx.rel_path.to_string();
    if uri_path.len() > 1 && uri_path.ends_with('/') {
        uri_path.pop();
    }

    let abs = match PathResolver::resolve_prospective(ctx.mount, &uri_path) {
        Ok(ResolvedPath::Prospective(p)) => p,
        Ok(ResolvedPath::Existing(_)) => unreachable!(),
        Err(_) => return Err(DavError::Conflict),
    };

    std::fs::create_dir(&abs).map_err(|_| DavError::Conflict)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&abs, std::fs::Permissions::from_mode(0o755));
    }

    res.prepare_headers(StatusCode::CREATED);
    res.add_content_length(0);
    Ok(())
}

/// Pull bare tokens out of a (simplified) `If` header of the shape
/// `(<opaquelocktoken:TOKEN>)`.
fn extract_token(header: &str) -> Vec<String> {
    header
        .split(|c| c == '(' || c == ')' || c == '<' || c == '>')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
