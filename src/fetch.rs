use std::fs;
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, info};

use crate::error::LensError;

/// Load the survey text from a URL or a local path.
///
/// The source is read once; a failure here is the only error the data path
/// can produce. No retries.
pub fn load(source: &str) -> Result<String, LensError> {
    if is_remote(source) {
        fetch_remote(source)
    } else {
        read_local(Path::new(source))
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_remote(url: &str) -> Result<String, LensError> {
    info!(url, "fetching survey");
    let fetch_err = |e: reqwest::Error| LensError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let resp = reqwest::blocking::get(url).map_err(fetch_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LensError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let text = resp.text().map_err(fetch_err)?;
    debug!(url, bytes = text.len(), "fetched survey");
    Ok(text)
}

fn read_local(path: &Path) -> Result<String, LensError> {
    let meta = fs::metadata(path).map_err(|e| LensError::from_io(path, e))?;
    if meta.is_dir() {
        return Err(LensError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other("is a directory"),
        });
    }

    // mmap on a 0-byte file may fail on some platforms
    if meta.len() == 0 {
        return Ok(String::new());
    }

    let file = fs::File::open(path).map_err(|e| LensError::from_io(path, e))?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| LensError::from_io(path, e))?;
    let text = String::from_utf8_lossy(&mmap).into_owned();
    debug!(path = %path.display(), bytes = text.len(), "read survey");
    Ok(text)
}
