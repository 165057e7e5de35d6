//! Random-access byte sources the reader pulls header bytes from.

use std::io::{self, Read, Seek, SeekFrom};

/// A seekable, sized source of bytes.
///
/// Implemented for every `Read + Seek` type (files, `io::Cursor`) and for
/// [`SliceSource`].
pub trait ByteSource {
    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; fewer than requested means the end
    /// of the source was reached.
    fn seek_and_read(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total size of the source in bytes.
    fn size(&mut self) -> io::Result<u64>;
}

impl<T: Read + Seek> ByteSource for T {
    fn seek_and_read(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn size(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }
}

/// In-memory source over a borrowed slice.
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a>(pub &'a [u8]);

impl ByteSource for SliceSource<'_> {
    fn seek_and_read(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.0.len());
        let n = buf.len().min(self.0.len() - start);
        buf[..n].copy_from_slice(&self.0[start..start + n]);
        Ok(n)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.0.len() as u64)
    }
}

/// Read the whole source into memory.
#[cfg_attr(not(feature = "ice"), allow(dead_code))]
pub(crate) fn read_all<S: ByteSource + ?Sized>(src: &mut S) -> io::Result<Vec<u8>> {
    let size = usize::try_from(src.size()?)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "source too large"))?;
    let mut buf = vec![0u8; size];
    let n = src.seek_and_read(0, &mut buf)?;
    if n != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: {n} of {size} bytes"),
        ));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_source_reads() {
        let mut src = SliceSource(b"0123456789");
        let mut buf = [0u8; 4];
        assert_eq!(src.seek_and_read(3, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"3456");
        assert_eq!(src.seek_and_read(8, &mut buf).unwrap(), 2);
        assert_eq!(src.seek_and_read(20, &mut buf).unwrap(), 0);
        assert_eq!(src.size().unwrap(), 10);
    }

    #[test]
    fn test_read_seek_source() {
        let mut src = Cursor::new(b"abcdefgh".to_vec());
        let mut buf = [0u8; 16];
        assert_eq!(src.seek_and_read(2, &mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"cdefgh");
        assert_eq!(src.size().unwrap(), 8);
    }

    #[test]
    fn test_read_all() {
        let mut src = SliceSource(b"SNDH");
        assert_eq!(read_all(&mut src).unwrap(), b"SNDH");
    }
}
