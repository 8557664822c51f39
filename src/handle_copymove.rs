use std::path::Path;

use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::path::{PathResolver, ResolvedPath};
use crate::request::{self, DavRequest, DavResponseSink};

/// MOVE: resolve source and destination, refuse an existing destination
/// when `Overwrite: F`, `rename` across them. 201 if the destination was
/// new, 204 if it was replaced.
pub fn handle_move(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let source = match PathResolver::resolve(ctx.mount, ctx.rel_path)? {
        ResolvedPath::Existing(p) => p,
        ResolvedPath::Prospective(_) => unreachable!(),
    };

    let (dest_abs, existed) = resolve_destination(req, ctx)?;
    check_lock(req, ctx)?;

    std::fs::rename(&source, &dest_abs).map_err(|_| DavError::Forbidden)?;

    let key = ctx.lock_key(req.host());
    ctx.lock_cache.delete(&key);

    res.prepare_headers(if existed { StatusCode::NO_CONTENT } else { StatusCode::CREATED });
    res.add_content_length(0);
    Ok(())
}

/// COPY: like MOVE, but the source tree is duplicated rather than moved,
/// via a full recursive copy.
pub fn handle_copy(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let source = match PathResolver::resolve(ctx.mount, ctx.rel_path)? {
        ResolvedPath::Existing(p) => p,
        ResolvedPath::Prospective(_) => unreachable!(),
    };

    let (dest_abs, existed) = resolve_destination(req, ctx)?;
    check_lock(req, ctx)?;

    if existed {
        std::fs::remove_dir_all(&dest_abs).or_else(|_| std::fs::remove_file(&dest_abs)).ok();
    }
    copy_tree(&source, &dest_abs)?;

    res.prepare_headers(if existed { StatusCode::NO_CONTENT } else { StatusCode::CREATED });
    res.add_content_length(0);
    Ok(())
}

/// Check the `If` header against the lock on this request's source path,
/// when `LockPolicy::Enforced` is in effect.
fn check_lock(req: &mut dyn DavRequest, ctx: &HandlerCtx) -> DavResult<()> {
    if ctx.config.lock_policy_value() != crate::config::LockPolicy::Enforced {
        return Ok(());
    }
    let key = ctx.lock_key(req.host());
    let submitted = req.header("If").map(extract_token).unwrap_or_default();
    let tokens: Vec<&str> = submitted.iter().map(String::as_str).collect();
    if ctx.lock_cache.check(&key, &tokens).is_err() {
        return Err(DavError::Locked);
    }
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

/// Read the `Destination`/`Overwrite` headers, resolve the destination
/// against this request's mountpoint, and enforce `Overwrite: F`. Returns
/// the destination's absolute path and whether it already existed.
fn resolve_destination(req: &mut dyn DavRequest, ctx: &HandlerCtx) -> DavResult<(std::path::PathBuf, bool)> {
    let destination = req.header("Destination").ok_or(DavError::Forbidden)?.to_string();
    let dest_path_info = request::strip_destination_prefix(&destination, req.scheme(), req.host())
        .ok_or(DavError::Forbidden)?;
    let dest_rel = ctx.mount.strip_prefix(&dest_path_info).ok_or(DavError::Forbidden)?;

    let overwrite = request::overwrite_allowed(req.header("Overwrite"));

    match PathResolver::resolve(ctx.mount, dest_rel) {
        Ok(ResolvedPath::Existing(p)) => {
            if !overwrite {
                return Err(DavError::PreconditionFailed);
            }
            Ok((p, true))
        }
        Ok(ResolvedPath::Prospective(_)) => unreachable!(),
        Err(_) => match PathResolver::resolve_prospective(ctx.mount, dest_rel) {
            Ok(ResolvedPath::Prospective(p)) => Ok((p, false)),
            Ok(ResolvedPath::Existing(_)) => unreachable!(),
            Err(_) => Err(DavError::Conflict),
        },
    }
}

fn copy_tree(source: &Path, dest: &Path) -> DavResult<()> {
    let meta = std::fs::metadata(source)?;
    if meta.is_dir() {
        std::fs::create_dir_all(dest).map_err(|_| DavError::Forbidden)?;
        for entry in std::fs::read_dir(source).map_err(|_| DavError::Forbidden)? {
            let entry = entry.map_err(|_| DavError::Forbidden)?;
            let child_dest = dest.join(entry.file_name());
            copy_tree(&entry.path(), &child_dest)?;
        }
    } else {
        std::fs::copy(source, dest).map_err(|_| DavError::Forbidden)?;
    }
    Ok(())
}
