pub mod doctor;
pub mod rank;
pub mod run;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use sigenrich::config::EmbeddingConfig;
use sigenrich::embedding::models::{self, SUPPORTED_MODELS};

/// Print the model registry, marking the configured model.
pub fn list_models(config: &EmbeddingConfig) {
    println!("Supported embedding models:\n");
    for spec in SUPPORTED_MODELS {
        let marker = if spec.name == config.model { " (configured)" } else { "" };
        println!("- {}{marker}", spec.name);
        println!(
            "  {} ({} dims, domain: {})\n",
            spec.description, spec.dimensions, spec.domain
        );
    }
}

/// Download the ONNX model and tokenizer for the configured model.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let spec = models::lookup(&config.model)?;
    let model_dir = config.model_dir();
    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("failed to create model dir: {}", model_dir.display()))?;

    let client = reqwest::Client::new();
    let model_path = model_dir.join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");

    if model_path.exists() {
        println!("Model already exists at {}", model_path.display());
    } else {
        println!("Downloading {} model.onnx...", spec.name);
        download_file(&client, &spec.model_url(), &model_path).await?;
        println!("Model saved to {}", model_path.display());
    }

    if tokenizer_path.exists() {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        download_file(&client, &spec.tokenizer_url(), &tokenizer_path).await?;
        println!("Tokenizer saved to {}", tokenizer_path.display());
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download of {url} failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .context("invalid progress template")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve one HTTP response with `body`, written in small pieces.
    async fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            for piece in body.chunks(4096) {
                socket.write_all(piece).await.unwrap();
                socket.flush().await.unwrap();
            }
        });
        format!("http://{addr}/model.onnx")
    }

    #[tokio::test]
    async fn download_writes_the_whole_body_across_chunks() {
        let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let url = serve_once(body.clone()).await;
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        download_file(&client, &url, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert!(!dest.with_extension("tmp").exists());
    }
}
