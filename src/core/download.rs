use crate::core::config::Config;
use crate::error::{FetchError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

pub struct Downloader {
    client: Client,
    chunk_size: usize,
}

impl Downloader {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::network("<client>", e))?;

        Ok(Self {
            client,
            chunk_size: config.chunk_size,
        })
    }

    /// Streams `url` into `destination`, returning the number of bytes written.
    ///
    /// The timeout bounds connecting and each wait for data, not the whole
    /// transfer. A failed transfer may leave a partial file behind.
    pub async fn download_file(&self, url: &str, destination: &Path) -> Result<u64> {
        info!("Downloading: {url}");
        debug!("Saving to: {}", destination.display());

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total_size = response.content_length();
        let file = File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        writer.flush().await?;

        match total_size {
            Some(total) => debug!("Downloaded {downloaded} of {total} bytes"),
            None => debug!("Downloaded {downloaded} bytes"),
        }
        info!("Downloaded successfully");
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_streams_body_to_file() {
        let server = MockServer::start().await;
        let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        Mock::given(method("GET"))
            .and(path("/listings.csv.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("nested").join("listings.csv.gz");
        let downloader = Downloader::new(&Config::default()).unwrap();

        let written = downloader
            .download_file(&format!("{}/listings.csv.gz", server.uri()), &destination)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("calendar.csv.gz");
        let downloader = Downloader::new(&Config::default()).unwrap();

        let err = downloader
            .download_file(&format!("{}/calendar.csv.gz", server.uri()), &destination)
            .await
            .unwrap_err();

        match err {
            FetchError::HttpStatus { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_download_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let config = Config::default().with_timeout(std::time::Duration::from_millis(200));
        let downloader = Downloader::new(&config).unwrap();

        let err = downloader
            .download_file(&server.uri(), &temp.path().join("slow.csv.gz"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network { .. }));
        assert!(err.is_task_local());
    }

    #[tokio::test]
    async fn test_slow_steady_body_outlasts_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 50\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            for _ in 0..5 {
                tokio::time::sleep(std::time::Duration::from_millis(400)).await;
                socket.write_all(&[b'x'; 10]).await.unwrap();
                socket.flush().await.unwrap();
            }
        });

        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("a.csv.gz");
        let config = Config::default().with_timeout(std::time::Duration::from_secs(1));
        let downloader = Downloader::new(&config).unwrap();

        let written = downloader
            .download_file(&format!("http://{addr}/a.csv.gz"), &destination)
            .await
            .unwrap();

        assert_eq!(written, 50);
        assert_eq!(std::fs::read(&destination).unwrap(), vec![b'x'; 50]);
    }

    #[tokio::test]
    async fn test_download_connection_refused() {
        // Bind then drop a listener to get a port nobody is serving.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(&Config::default()).unwrap();
        let err = downloader
            .download_file(
                &format!("http://127.0.0.1:{port}/a.csv.gz"),
                &temp.path().join("a.csv.gz"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network { .. }));
    }
}
