// Splitting a trip source into lines.
//
// Two ways in:
//      - scan_lines(): streams any reader through a fixed size BufReader, so memory use does
//      not grow with the file. Lines that straddle two chunks go through a small carry buf.
//      - scan_mapped(): maps the whole file read-only and walks it without copying.
//
// Lines are handed out as raw bytes without the trailing \n. A \r before it is left in
// place, the record parser trims it with the rest of the field whitespace.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
};

use memchr::memchr_iter;
use memmap2::Mmap;

pub const BUF_CAPACITY: usize = 256 * 1024;

/// Streams `source` line by line. Stops at the first read error, after handing out every
/// complete line read before it.
pub fn scan_lines<R: Read>(source: R, on_line: impl FnMut(&[u8])) -> io::Result<()> {
    let buf_reader = BufReader::with_capacity(BUF_CAPACITY, source);
    return scan_buffered(buf_reader, on_line);
}

pub fn scan_buffered<R: Read>(mut buf_reader: BufReader<R>, mut on_line: impl FnMut(&[u8])) -> io::Result<()> {
    let mut carry = Vec::with_capacity(256);

    loop {
        let buf_len;
        {
            // get a direct reference to the next chunk from the reader
            let buf = match buf_reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            buf_len = buf.len();

            // if buf is empty, we've reached the end so break
            if buf.is_empty() {
                // last line may have no newline
                if !carry.is_empty() {
                    on_line(&carry);
                }
                break;
            }

            let mut line_start = 0;
            for newline_pos in memchr_iter(b'\n', buf) {
                // if carry isn't empty, the line started in the previous chunk
                if !carry.is_empty() {
                    carry.extend_from_slice(&buf[..newline_pos]);
                    on_line(&carry);
                    carry.clear();
                } else {
                    on_line(&buf[line_start..newline_pos]);
                }
                line_start = newline_pos + 1;
            }

            // put the leftover in carry
            if line_start < buf.len() {
                carry.extend_from_slice(&buf[line_start..]);
            }
        }

        buf_reader.consume(buf_len);
    }

    return Ok(());
}

/// Maps `file` and hands out its lines. Errors only if the file cannot be mapped.
pub fn scan_mapped(file: &File, on_line: impl FnMut(&[u8])) -> io::Result<()> {
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "trip source is not a regular file"));
    }

    // mapping zero bytes is an error on some platforms, and files like procfs report a
    // length of 0 while still having content, so stream those instead
    if metadata.len() == 0 {
        return scan_lines(file, on_line);
    }

    // SAFETY: the map is read-only and dropped before returning. The file being truncated
    // by another process while mapped is not guarded against.
    let map = unsafe { Mmap::map(file)? };
    scan_slice(&map, on_line);
    return Ok(());
}

pub fn scan_slice(bytes: &[u8], mut on_line: impl FnMut(&[u8])) {
    let mut line_start = 0;
    for newline_pos in memchr_iter(b'\n', bytes) {
        on_line(&bytes[line_start..newline_pos]);
        line_start = newline_pos + 1;
    }
    if line_start < bytes.len() {
        on_line(&bytes[line_start..]);
    }
}
