//! Byte fetching with chunk-level progress.
//!
//! Remote sources stream through [`reqwest`]; local files are read in fixed
//! chunks so both report progress the same way. Every chunk invokes
//! `on_chunk(received_so_far, declared_length)`.

use std::path::Path;

use futures::StreamExt as _;
use tokio::io::AsyncReadExt as _;

use crate::LoadError;

/// Read size for local files.
const LOCAL_CHUNK_SIZE: usize = 64 * 1024;

/// Fetches the full contents of `url`.
///
/// `url` may be an `http(s)://` URL, a `file://` URL, or a plain path.
///
/// # Errors
///
/// Returns [`LoadError::Http`] or [`LoadError::HttpStatus`] for remote
/// failures and [`LoadError::Io`] for local ones.
pub async fn fetch_bytes<F>(
    client: &reqwest::Client,
    url: &str,
    on_chunk: F,
) -> Result<Vec<u8>, LoadError>
where
    F: FnMut(u64, Option<u64>),
{
    if url.starts_with("http://") || url.starts_with("https://") {
        fetch_remote(client, url, on_chunk).await
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        read_local(Path::new(path), on_chunk).await
    }
}

async fn fetch_remote<F>(
    client: &reqwest::Client,
    url: &str,
    mut on_chunk: F,
) -> Result<Vec<u8>, LoadError>
where
    F: FnMut(u64, Option<u64>),
{
    log::debug!("GET {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| LoadError::Http {
            url: url.to_string(),
            source: e,
        })?;

    if !response.status().is_success() {
        return Err(LoadError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length();
    if let Some(size) = total_size {
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::debug!("  file size: {mb:.1} MB");
    }

    let capacity = total_size
        .and_then(|size| usize::try_from(size).ok())
        .unwrap_or_default();
    let mut bytes = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| LoadError::Http {
            url: url.to_string(),
            source: e,
        })?;
        bytes.extend_from_slice(&chunk);
        on_chunk(bytes.len() as u64, total_size);
    }

    Ok(bytes)
}

async fn read_local<F>(path: &Path, mut on_chunk: F) -> Result<Vec<u8>, LoadError>
where
    F: FnMut(u64, Option<u64>),
{
    let io_err = |e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let total_size = file.metadata().await.map_err(io_err)?.len();

    let mut bytes = Vec::with_capacity(usize::try_from(total_size).unwrap_or_default());
    let mut buf = vec![0_u8; LOCAL_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&buf[..n]);
        on_chunk(bytes.len() as u64, Some(total_size));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;
    use crate::ProgressTracker;

    /// Serves `response` verbatim to the first connection and returns its URL.
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}/data.json")
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn chunked_response_reports_no_length() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\n\
              Transfer-Encoding: chunked\r\n\
              Connection: close\r\n\r\n\
              5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        )
        .await;

        let mut reports = Vec::new();
        let bytes = fetch_bytes(&local_client(), &url, |received, total| {
            reports.push((received, total));
        })
        .await
        .unwrap();

        assert_eq!(bytes, b"hello world");
        assert!(!reports.is_empty());
        assert!(reports.iter().all(|(_, total)| total.is_none()));
        assert_eq!(reports.last().map(|(received, _)| *received), Some(11));

        let mut tracker = ProgressTracker::new(2);
        for (received, total) in reports {
            assert_eq!(tracker.on_chunk(received, total), None);
        }
        assert!((tracker.complete_file() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn non_success_status_is_http_status_error() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\n\
              Content-Length: 9\r\n\
              Connection: close\r\n\r\n\
              not found",
        )
        .await;

        let err = fetch_bytes(&local_client(), &url, |_, _| {})
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            LoadError::HttpStatus { status: 404, url: failed } if *failed == url
        ));
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[tokio::test]
    async fn reads_local_file_in_chunks() {
        let path = std::env::temp_dir().join(format!(
            "climate_risk_fetch_{}.bin",
            std::process::id()
        ));
        let contents = vec![7_u8; LOCAL_CHUNK_SIZE * 2 + 10];
        tokio::fs::write(&path, &contents).await.unwrap();

        let mut reports = Vec::new();
        let client = reqwest::Client::new();
        let url = format!("file://{}", path.display());
        let bytes = fetch_bytes(&client, &url, |received, total| reports.push((received, total)))
            .await
            .unwrap();

        assert_eq!(bytes, contents);
        assert!(reports.len() >= 3);
        assert!(reports.windows(2).all(|w| w[0].0 <= w[1].0));
        let total = contents.len() as u64;
        assert_eq!(reports.last(), Some(&(total, Some(total))));

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let client = reqwest::Client::new();
        let err = fetch_bytes(&client, "/nonexistent/climate_risk/none.json", |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { path, .. } if path.ends_with("none.json")));
    }
}
