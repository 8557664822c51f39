use std::fs::OpenOptions;
use std::io::Write;

use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::path::{PathResolver, ResolvedPath};
use crate::request::{DavRequest, DavResponseSink};

const CHUNK_SIZE: usize = 32 * 1024;

/// PUT: resolve (falling back to `resolve_prospective` for a new file),
/// open for write, and stream the request body in bounded chunks. Returns
/// 201 unconditionally, including on overwrite.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let abs = match PathResolver::resolve(ctx.mount, ctx.rel_path) {
        Ok(ResolvedPath::Existing(p)) => p,
        Ok(ResolvedPath::Prospective(_)) => unreachable!(),
        Err(_) => match PathResolver::resolve_prospective(ctx.mount, ctx.rel_path) {
            Ok(ResolvedPath::Prospective(p)) => p,
            Ok(ResolvedPath::Existing(_)) => unreachable!(),
            Err(_) => return Err(DavError::Conflict),
        },
    };

    if ctx.config.lock_policy_value() == crate::config::LockPolicy::Enforced {
        let key = ctx.lock_key(req.host());
        let submitted = req.header("If").map(extract_token).unwrap_or_default();
        let tokens: Vec<&str> = submitted.iter().map(String::as_str).collect();
        if ctx.lock_cache.check(&key, &tokens).is_err() {
            return Err(DavError::Locked);
        }
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&abs)
        .map_err(|_| DavError::Forbidden)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&abs, std::fs::Permissions::from_mode(0o644));
    }

    loop {
        let chunk = req.read_body(CHUNK_SIZE).map_err(DavError::from)?;
        if chunk.is_empty() {
            break;
        }
        file.write_all(&chunk).map_err(DavError::from)?;
    }

    res.prepare_headers(StatusCode::CREATED);
    res.add_content_length(0);
    Ok(())
}

/// Pull a bare token out of a (simplified) `If` header of the shape
/// `(<opaquelocktoken:TOKEN>)`.
fn extract_token(header: &str) -> Vec<String> {
    header
        .split(|c| c == '(' || c == ')' || c == '<' || c == '>')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
