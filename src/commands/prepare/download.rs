use super::PrepareError;
use crate::ui::StatusUI;
use flate2::read::GzDecoder;
use futures::StreamExt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use url::Url;

/// Streams `url` to `dest`, showing a progress bar when the size is known.
/// Returns the number of bytes written.
pub async fn download(url: &str, dest: &Path) -> Result<u64, PrepareError> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(PrepareError::Http {
            code: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let source = Url::parse(url)
        .ok()
        .and_then(|u| u.domain().map(|d| d.to_string()))
        .unwrap_or_else(|| "source".to_string());
    let total_size = response.content_length().unwrap_or(0);
    let progress_bar = if total_size > 0 {
        StatusUI::download_progress(&format!("Downloading from {}", source), total_size)
    } else {
        StatusUI::spinner(&format!("Downloading from {}...", source))
    };

    let file = File::create(dest).map_err(PrepareError::io(dest))?;
    let mut writer = BufWriter::new(file);
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).map_err(PrepareError::io(dest))?;
        written += chunk.len() as u64;
        progress_bar.set_position(written);
    }
    writer.flush().map_err(PrepareError::io(dest))?;

    StatusUI::finish_progress_success(
        progress_bar,
        &format!("Downloaded {}", StatusUI::format_file_size(written as usize)),
    );
    Ok(written)
}

/// Decompresses a gzip file. Returns the decompressed size.
pub fn gunzip(src: &Path, dest: &Path) -> Result<u64, PrepareError> {
    let input = File::open(src).map_err(PrepareError::io(src))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let output = File::create(dest).map_err(PrepareError::io(dest))?;
    let mut writer = BufWriter::new(output);
    let size = io::copy(&mut decoder, &mut writer).map_err(PrepareError::io(src))?;
    writer.flush().map_err(PrepareError::io(dest))?;
    Ok(size)
}
