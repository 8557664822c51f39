use std::time::{Duration, SystemTime};

/// An approximate "creation date": the inode's change-time (ctime), not a
/// true birth-time. POSIX ctime also changes on metadata-only edits, so
/// this is only an approximation.
#[cfg(unix)]
pub fn creation_time(meta: &std::fs::Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    let secs = meta.ctime();
    let nanos = meta.ctime_nsec();
    if secs >= 0 {
        SystemTime::UNIX_EPOCH + Duration::new(secs as u64, nanos as u32)
    } else {
        SystemTime::UNIX_EPOCH
    }
}

#[cfg(not(unix))]
pub fn creation_time(meta: &std::fs::Metadata) -> SystemTime {
    meta.created().or_else(|_| meta.modified()).unwrap_or(SystemTime::UNIX_EPOCH)
}
