//! Streams remote files into the staging directory.

use crate::retrieval::error::RetrievalError;
use crate::types::locator::Locator;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Where `locator` lands inside `staging_dir`.
pub fn staged_path(staging_dir: &Path, locator: &Locator) -> PathBuf {
    let name = locator
        .filename
        .rsplit('/')
        .next()
        .unwrap_or(&locator.filename);
    staging_dir.join(name)
}

/// Downloads the locator's HTTP copy into `staging_dir`, returning the local
/// path. An already staged file is reused. The body is written to a `.part`
/// file first and renamed once complete.
pub async fn stage_locator(
    client: &Client,
    locator: &Locator,
    staging_dir: &Path,
) -> Result<PathBuf, RetrievalError> {
    let target = staged_path(staging_dir, locator);
    if fs::metadata(&target).await.is_ok() {
        info!("Reusing staged file {:?}", target);
        return Ok(target);
    }
    let Some(url) = locator.download_url.as_deref() else {
        return Err(RetrievalError::Open {
            locator: locator.filename.clone(),
            message: "no HTTP download URL published".to_string(),
        });
    };

    fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| RetrievalError::StagingIo(staging_dir.to_path_buf(), e))?;

    info!("Downloading {} to {:?}", url, target);
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| {
            warn!("Download of {} failed: {:?}", url, e);
            RetrievalError::Download {
                url: url.to_string(),
                source: e,
            }
        })?;

    let stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    let mut reader = StreamReader::new(stream);

    let partial = target.with_extension("part");
    let staging_io = |e: std::io::Error| RetrievalError::StagingIo(partial.clone(), e);
    let mut file = fs::File::create(&partial).await.map_err(staging_io)?;
    let written = tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(staging_io)?;
    file.flush().await.map_err(staging_io)?;
    drop(file);

    fs::rename(&partial, &target)
        .await
        .map_err(|e| RetrievalError::StagingIo(target.clone(), e))?;
    info!("Staged {} bytes for {}", written, locator.filename);
    Ok(target)
}
