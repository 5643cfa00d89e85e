use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Reads the bytes after the last newline of a file, walking backwards in `buffer` sized chunks.
/// Returns an empty vector for an empty file or one that ends with a newline. Leaves the cursor
/// at the end of the file.
///
/// Useful to find a record that was cut off by a crash in the middle of a write.
pub async fn read_unterminated_tail(
    file: &mut (impl AsyncSeek + AsyncRead + Unpin),
    buffer: &mut [u8],
) -> Result<Vec<u8>, io::Error> {
    let end = file.seek(std::io::SeekFrom::End(0)).await?;
    let mut position = end;
    let mut chunks: Vec<Vec<u8>> = vec![];

    while position > 0 {
        let next_chunk = u64::min(position, buffer.len() as u64) as usize;
        position -= next_chunk as u64;
        file.seek(std::io::SeekFrom::Start(position)).await?;
        file.read_exact(&mut buffer[..next_chunk]).await?;

        match buffer[..next_chunk].iter().rposition(|v| *v == b'\n') {
            Some(index) => {
                chunks.push(buffer[index + 1..next_chunk].to_vec());
                break;
            }
            None => chunks.push(buffer[..next_chunk].to_vec()),
        }
    }

    file.seek(std::io::SeekFrom::End(0)).await?;
    Ok(chunks.into_iter().rev().flatten().collect())
}
