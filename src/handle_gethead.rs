use std::fs::File;
use std::io::Read;

use http::StatusCode;

use crate::dispatcher::HandlerCtx;
use crate::errors::{DavError, DavResult};
use crate::listing::{DirectoryLister, ListingEntry};
use crate::path::{PathResolver, ResolvedPath};
use crate::request::{DavRequest, DavResponseSink};

const CHUNK_SIZE: usize = 32 * 1024;

/// GET (`send_body = true`) and HEAD (`send_body = false`) share every step
/// but the body write.
pub fn handle(req: &mut dyn DavRequest, res: &mut dyn DavResponseSink, ctx: &HandlerCtx, send_body: bool) -> DavResult<()> {
    let resolved = PathResolver::resolve(ctx.mount, ctx.rel_path)?;
    let abs = match resolved {
        ResolvedPath::Existing(p) => p,
        ResolvedPath::Prospective(_) => unreachable!(),
    };

    let meta = std::fs::metadata(&abs).map_err(|_| DavError::Forbidden)?;

    if meta.is_dir() {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&abs).map_err(|_| DavError::Forbidden)? {
            let entry = entry.map_err(|_| DavError::Forbidden)?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(ListingEntry { name: entry.file_name().to_string_lossy().into_owned(), is_dir });
        }
        res.prepare_headers(StatusCode::OK);
        res.add_content_type("text/html");
        if send_body {
            let lister = DirectoryLister::new(
                ctx.config.css_links(),
                ctx.config.javascript_links(),
                ctx.config.class_directory_name(),
                ctx.config.div_id(),
            );
            let html = lister.render(&abs.to_string_lossy(), &entries);
            res.write_body(html.as_bytes()).map_err(DavError::from)?;
        }
        return Ok(());
    }

    let mut file = File::open(&abs).map_err(|_| DavError::Forbidden)?;
    let len = meta.len();
    let modified = meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
    let content_type = mime_guess::from_path(&abs).first_raw().unwrap_or("application/octet-stream");

    res.prepare_headers(StatusCode::OK);
    res.add_content_length(len);
    res.add_last_modified(modified);
    res.add_content_type(content_type);

    if send_body {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf).map_err(|_| DavError::Forbidden)?;
            if n == 0 {
                break;
            }
            res.write_body(&buf[..n]).map_err(DavError::from)?;
        }
    }

    Ok(())
}
