use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SyncMode;
use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValue;

/// WAL record: one committed write batch.
///
/// On-disk format:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized WalRecord)]
/// ```
///
/// A whole batch lives in a single frame, so a torn write loses the batch
/// entirely rather than applying half of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalRecord {
    pub writes: Vec<KeyValue>,
}

/// Result of reading a log front-to-back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recovery {
    pub records: Vec<WalRecord>,
    /// End of the last complete frame. Bytes past it are a torn tail.
    pub valid_len: u64,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct WalWriter {
    file: File,
    /// Current write offset in the log file.
    offset: u64,
}

/// Crash-recoverable write-ahead log of committed batches.
///
/// Records are serialized with bincode, framed with a length prefix and a
/// CRC32 checksum, and appended to a single file. On recovery the file is
/// read front-to-back; records that fail the CRC check are skipped and a
/// truncated tail ends recovery. The tail must be cut with
/// [`WriteAheadLog::truncate`] before appending again.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    sync_mode: SyncMode,
}

impl WriteAheadLog {
    /// Open (or create) a log file at the given path.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter { file, offset }),
            sync_mode,
        })
    }

    /// Append a record. Returns the byte offset it was written at.
    ///
    /// A failed write is rolled back to the start of the frame, so the log
    /// never ends in a partial frame this process wrote.
    pub fn append(&self, record: &WalRecord) -> StoreResult<u64> {
        let payload =
            bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StoreError::Serialization("WAL record exceeds 4 GiB".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        let record_offset = w.offset;

        if let Err(e) = write_frame(&mut w.file, &frame, self.sync_mode) {
            warn!(offset = record_offset, error = %e, "WAL append failed; rolling back frame");
            w.file.set_len(record_offset)?;
            return Err(e.into());
        }

        w.offset += frame.len() as u64;

        debug!(offset = record_offset, len = payload.len(), "WAL append");
        Ok(record_offset)
    }

    /// Recover all valid records from the log.
    pub fn recover(&self) -> StoreResult<Recovery> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut records = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + u64::from(length) > file_len {
                warn!(offset, length, file_len, "invalid WAL record length; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated WAL record; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping record"
                );
            } else {
                match bincode::deserialize::<WalRecord>(&payload) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(offset, error = %e, "failed to decode WAL record; skipping"),
                }
            }

            offset += HEADER_SIZE as u64 + u64::from(length);
        }

        if offset < file_len {
            warn!(valid_len = offset, file_len, "WAL has a torn tail");
        }
        debug!(recovered = records.len(), "WAL recovery complete");
        Ok(Recovery {
            records,
            valid_len: offset,
        })
    }

    /// Cut the log back to `len` bytes and continue appending from there.
    pub fn truncate(&self, len: u64) -> StoreResult<()> {
        let mut w = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        w.file.set_len(len)?;
        w.file.sync_all()?;
        w.offset = len;
        debug!(len, "WAL truncated");
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.writer.lock().map_err(|_| StoreError::LockPoisoned)?.offset)
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_frame(file: &mut File, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    file.write_all(frame)?;
    file.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        file.sync_all()?;
    }
    Ok(())
}
