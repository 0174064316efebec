//! I/O layer for VCF input
//!
//! Opens plain or gzip-compressed VCF files behind a single `BufRead`
//! implementation. Plain files use a sized `BufReader` or a memory map for
//! very large inputs; gzip input is streamed through `MultiGzDecoder` so
//! bgzip files (concatenated gzip members) decode completely.

use crate::core::error::{Result, VcfParserError};
use flate2::read::MultiGzDecoder;
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Large buffer size for high-throughput I/O (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Above this size plain files get the large buffer
const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// I/O strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStrategy {
    /// Buffered reading with the given buffer size
    Buffered(usize),
    /// Memory-map the whole file (plain files only)
    MemoryMapped,
    /// Select based on file size
    #[default]
    Auto,
}

/// Compression of a VCF input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text
    Plain,
    /// Gzip or bgzip (.gz)
    Gzip,
}

/// Detect compression from the file extension, then from magic bytes
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if extension == "gz" {
        return Ok(CompressionFormat::Gzip);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled == magic.len() && magic == GZIP_MAGIC {
        Ok(CompressionFormat::Gzip)
    } else {
        Ok(CompressionFormat::Plain)
    }
}

/// A reader over a VCF source that picks its strategy at open time
pub enum SmartReader {
    /// Buffered plain file
    Buffered(BufReader<File>),
    /// Memory-mapped plain file
    Mapped(MappedReader),
    /// Gzip-decoded stream
    Gzip(BufReader<MultiGzDecoder<File>>),
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: the file is opened read-only and not modified while mapped
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> &[u8] {
        &self.mmap[self.position..]
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        let to_read = std::cmp::min(buf.len(), remaining.len());
        buf[..to_read].copy_from_slice(&remaining[..to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = std::cmp::min(self.position + amt, self.mmap.len());
    }
}

impl SmartReader {
    /// Open a file with the specified I/O strategy
    ///
    /// Compressed input always streams through the gzip decoder; the
    /// strategy only decides the buffer size in that case.
    pub fn open<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> io::Result<Self> {
        let path = path.as_ref();
        let compression = detect_compression(path)?;
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            "opening {} ({} bytes, {:?}, {:?})",
            path.display(),
            file_size,
            compression,
            strategy
        );

        if compression == CompressionFormat::Gzip {
            let capacity = match strategy {
                IoStrategy::Buffered(size) => size,
                _ => DEFAULT_BUFFER_SIZE,
            };
            let decoder = MultiGzDecoder::new(file);
            return Ok(SmartReader::Gzip(BufReader::with_capacity(capacity, decoder)));
        }

        match strategy {
            IoStrategy::Buffered(buf_size) => {
                Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
            }
            IoStrategy::MemoryMapped => Ok(SmartReader::Mapped(MappedReader::new(&file)?)),
            IoStrategy::Auto => {
                if file_size >= MMAP_THRESHOLD {
                    Ok(SmartReader::Mapped(MappedReader::new(&file)?))
                } else {
                    let buf_size = if file_size > LARGE_FILE_THRESHOLD {
                        LARGE_BUFFER_SIZE
                    } else {
                        DEFAULT_BUFFER_SIZE
                    };
                    Ok(SmartReader::Buffered(BufReader::with_capacity(buf_size, file)))
                }
            }
        }
    }

    /// Open with the auto strategy
    pub fn open_auto<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open(path, IoStrategy::Auto)
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped(_))
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, SmartReader::Gzip(_))
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SmartReader::Buffered(reader) => reader.read(buf),
            SmartReader::Mapped(reader) => reader.read(buf),
            SmartReader::Gzip(reader) => reader.read(buf),
        }
    }
}

impl BufRead for SmartReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SmartReader::Buffered(reader) => reader.fill_buf(),
            SmartReader::Mapped(reader) => reader.fill_buf(),
            SmartReader::Gzip(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SmartReader::Buffered(reader) => reader.consume(amt),
            SmartReader::Mapped(reader) => reader.consume(amt),
            SmartReader::Gzip(reader) => reader.consume(amt),
        }
    }
}

/// Open a VCF file, reporting a missing path as [`VcfParserError::FileNotFound`]
pub fn open_vcf<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> Result<SmartReader> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VcfParserError::FileNotFound(path.to_path_buf()));
    }
    Ok(SmartReader::open(path, strategy)?)
}

/// Line iterator that reuses a buffer to avoid allocations
pub struct LineIterator<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next line into the internal buffer
    /// Returns None at EOF, Some(Ok(&str)) on success, Some(Err) on error
    pub fn next_line(&mut self) -> Option<io::Result<&str>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                if self.buffer.ends_with('\n') {
                    self.buffer.pop();
                    if self.buffer.ends_with('\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.reader.fill_buf()?.first().copied())
    }
}
