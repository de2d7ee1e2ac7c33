//! Recursive removal of the attachment directory

use futures::FutureExt;
use futures::future::BoxFuture;
use std::io;
use std::path::Path;
use tokio::fs;

/// Remove `path` and everything beneath it.
///
/// A missing `path` is not an error: teardown must succeed whether or
/// not any attachments were ever written. Every other filesystem
/// error during the walk propagates to the caller, which decides
/// whether it is fatal.
pub fn remove_tree(path: &Path) -> BoxFuture<'_, io::Result<()>> {
    async move {
        let mut entries = match fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                remove_tree(&entry.path()).await?;
            } else {
                fs::remove_file(entry.path()).await?;
            }
        }
        fs::remove_dir(path).await
    }
    .boxed()
}
