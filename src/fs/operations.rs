use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{self, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt},
};

/// Moves backwards in a file to beginning of a previous line.
/// Useful if you want to overwrite last line with new data.
pub async fn seek_line_backwards(
    file: &mut (impl AsyncSeek + AsyncWrite + AsyncRead + Unpin),
    buffer: &mut [u8],
) -> Result<(), io::Error> {
    // The newline right before the cursor terminates the current line, it's skipped so the
    // search doesn't stop immediately. For example: previous\ncurrent\n<cursor>
    let mut need_to_skip = 1usize;
    loop {
        let leftover = file.stream_position().await?;
        if leftover == 0 {
            return Ok(());
        }
        let next_chunk = u64::min(leftover, buffer.len() as u64) as usize;
        file.seek(std::io::SeekFrom::Current(-(next_chunk as i64)))
            .await?;

        file.read_exact(&mut buffer[..next_chunk]).await?;
        let iter = buffer[..next_chunk].iter().rev().enumerate();
        let iter = iter.skip(need_to_skip);
        for (index, value) in iter {
            if *value == b'\n' {
                file.seek(std::io::SeekFrom::Current(-(index as i64)))
                    .await?;
                return Ok(());
            }
        }

        need_to_skip = need_to_skip.saturating_sub(1);
        file.seek(std::io::SeekFrom::Current(-(next_chunk as i64)))
            .await?;
    }
}

/// Reads a JSON document under a shared lock. A missing or empty file produces the default
/// value, content that doesn't parse is an error.
pub async fn read_locked_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    file.lock_shared()?;
    let mut content = String::new();
    let read = file.read_to_string(&mut content).await;
    file.unlock_async().await?;
    read?;

    parse_or_default(path, &content)
}

/// Read-modify-write of a JSON document under an exclusive lock. Returns the stored value.
/// Content that doesn't parse is left untouched and reported as an error.
pub async fn update_locked_json<T, F>(path: &Path, update: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T),
{
    let mut file = open_for_write(path).await?;
    file.lock_exclusive()?;
    let result = rewrite_json(&mut file, path, update).await;
    file.unlock_async().await?;
    result
}

/// Replaces a JSON document under an exclusive lock, whatever was stored before.
pub async fn write_locked_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = open_for_write(path).await?;
    file.lock_exclusive()?;
    let result = overwrite_json(&mut file, value).await;
    file.unlock_async().await?;
    result
}

async fn open_for_write(path: &Path) -> Result<File> {
    Ok(File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?)
}

async fn rewrite_json<T, F>(file: &mut File, path: &Path, update: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T),
{
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    let mut value: T = parse_or_default(path, &content)?;
    update(&mut value);
    overwrite_json(file, &value).await?;
    Ok(value)
}

async fn overwrite_json<T: Serialize>(file: &mut File, value: &T) -> Result<()> {
    let buffer = serde_json::to_vec_pretty(value)?;
    file.rewind().await?;
    file.write_all(&buffer).await?;
    file.set_len(buffer.len() as u64).await?;
    file.flush().await?;
    Ok(())
}

fn parse_or_default<T: DeserializeOwned + Default>(path: &Path, content: &str) -> Result<T> {
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(content).with_context(|| format!("Found illegal json in {path:?}"))
}
