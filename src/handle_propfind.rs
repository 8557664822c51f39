use std::path::Path;

use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::fsmeta::creation_time;
use crate::path::{PathResolver, ResolvedPath};
use crate::propstore::PropertyStore;
use crate::request::{DavRequest, Depth, DavResponseSink};
use crate::xml::{PropfindEntry, PropfindMode, XmlCodec};

/// PROPFIND: resolve, read Depth and the optional body, and answer 207
/// Multi-Status.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx) -> DavResult<()> {
    let resolved = PathResolver::resolve(ctx.mount, ctx.rel_path)?;
    let abs = match resolved {
        ResolvedPath::Existing(p) => p,
        ResolvedPath::Prospective(_) => unreachable!(),
    };
    let meta = std::fs::metadata(&abs)?;

    let depth = Depth::parse(req.header("Depth"));
    let body = req.read_body(1 << 20).map_err(DavError::from)?;
    let mode = XmlCodec::parse_propfind(&body)?;

    let href_base = ctx.rel_path.to_string();
    let mut entries = vec![build_entry(&abs, &meta, &href_base, mode)?];

    if meta.is_dir() && depth != Depth::Zero {
        for dirent in std::fs::read_dir(&abs)? {
            let dirent = dirent?;
            let name = dirent.file_name().to_string_lossy().into_owned();
            let child_path = dirent.path();
            let child_meta = match dirent.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let separator = if href_base.ends_with('/') { "" } else { "/" };
            let href = format!("{}{}{}", href_base, separator, name);
            entries.push(build_entry(&child_path, &child_meta, &href, mode)?);
        }
    }

    let protocol = req.protocol().to_string();
    let body = XmlCodec::build_propfind_response(&protocol, &entries, mode)?;

    res.prepare_headers(StatusCode::MULTI_STATUS);
    res.add_content_type("application/xml; charset=\"utf-8\"");
    res.add_content_length(body.len() as u64);
    res.write_body(&body).map_err(DavError::from)?;
    Ok(())
}

fn build_entry(abs: &Path, meta: &std::fs::Metadata, href: &str, mode: PropfindMode) -> DavResult<PropfindEntry> {
    let is_collection = meta.is_dir();
    let dead_properties = PropertyStore::list(abs, mode == PropfindMode::WithValues)?
        .into_iter()
        .map(|(name, ns, value)| (name, ns, value.unwrap_or_default()))
        .collect();

    Ok(PropfindEntry {
        href: href.to_string(),
        is_collection,
        content_length: if is_collection { None } else { Some(meta.len()) },
        content_type: if is_collection {
            None
        } else {
            Some(mime_guess::from_path(abs).first_raw().unwrap_or("application/octet-stream").to_string())
        },
        creationdate: creation_time(meta),
        lastmodified: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        dead_properties,
    })
}
