//! Spill run files
//!
//! A run is a sequence of records with no header, footer or checksum:
//!
//! ```text
//! [u32 BE key_len][u64 BE sequence | key values][u32 BE payload_len][payload values]
//! ```
//!
//! repeated until end of file. Values use the context's `ValueSerializer`.
//! Files are created with `tempfile` and removed when the run is dropped.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::observability::{log_event, Event};
use crate::operator::{ExecutorError, ExecutorResult};
use crate::types::{read_values, write_values, ValueSerializer};

use super::entry::SortEntry;

const SEQUENCE_LEN: usize = 8;

/// One sorted run on disk
#[derive(Debug)]
pub struct SpillRun {
    file: NamedTempFile,
    rows: u64,
    bytes: u64,
}

impl SpillRun {
    /// Write `entries` (already sorted) to a new file in `dir`
    pub fn write(
        dir: &Path,
        session: &str,
        serializer: &dyn ValueSerializer,
        entries: &[SortEntry],
    ) -> ExecutorResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("sort-{}-", session))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        let mut bytes = 0u64;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            let mut key = Vec::new();
            let mut payload = Vec::new();
            for entry in entries {
                key.clear();
                payload.clear();
                key.extend_from_slice(&entry.sequence.to_be_bytes());
                write_values(serializer, &entry.key, &mut key);
                write_values(serializer, &entry.payload, &mut payload);

                writer.write_all(&frame_len(key.len())?)?;
                writer.write_all(&key)?;
                writer.write_all(&frame_len(payload.len())?)?;
                writer.write_all(&payload)?;
                bytes += 8 + key.len() as u64 + payload.len() as u64;
            }
            writer.flush()?;
        }

        Ok(Self {
            file,
            rows: entries.len() as u64,
            bytes,
        })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Independent reader positioned at the first record
    pub fn reader(&self, serializer: Arc<dyn ValueSerializer>) -> ExecutorResult<SpillReader> {
        Ok(SpillReader {
            input: BufReader::new(self.file.reopen()?),
            serializer,
            offset: 0,
        })
    }

    /// Delete the file now instead of on drop
    pub fn remove(self) -> io::Result<()> {
        self.file.close()
    }
}

/// Delete `runs`, logging how many files could not be removed. Returns the
/// number of failures.
pub fn remove_runs(runs: impl IntoIterator<Item = SpillRun>) -> usize {
    let mut files = 0usize;
    let mut failed = 0usize;
    for run in runs {
        files += 1;
        if run.remove().is_err() {
            failed += 1;
        }
    }
    if files > 0 {
        let files = files.to_string();
        let failed_field = failed.to_string();
        log_event(
            Event::SpillCleanup,
            &[("files", &files), ("failed", &failed_field)],
        );
    }
    failed
}

fn frame_len(len: usize) -> io::Result<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "spill record exceeds 4 GiB"))
}

/// Streaming decoder for one run
pub struct SpillReader {
    input: BufReader<File>,
    serializer: Arc<dyn ValueSerializer>,
    offset: u64,
}

impl SpillReader {
    /// Next entry, or `None` at a clean end of file
    pub fn next_entry(&mut self) -> ExecutorResult<Option<SortEntry>> {
        let record_start = self.offset;
        let key_len = match self.read_len(true)? {
            Some(len) => len,
            None => return Ok(None),
        };
        let key_bytes = self.read_exact(key_len)?;
        if key_bytes.len() < SEQUENCE_LEN {
            return Err(self.corrupt(record_start, "sort key shorter than its sequence number"));
        }
        let (sequence, key_values) = key_bytes.split_at(SEQUENCE_LEN);
        let mut seq = [0u8; SEQUENCE_LEN];
        seq.copy_from_slice(sequence);
        let key = read_values(self.serializer.as_ref(), key_values)
            .map_err(|e| self.corrupt(record_start, &format!("sort key: {}", e)))?;

        let payload_len = match self.read_len(false)? {
            Some(len) => len,
            None => return Err(self.corrupt(record_start, "missing payload")),
        };
        let payload_bytes = self.read_exact(payload_len)?;
        let payload = read_values(self.serializer.as_ref(), &payload_bytes)
            .map_err(|e| self.corrupt(record_start, &format!("payload: {}", e)))?;

        Ok(Some(SortEntry {
            key,
            sequence: u64::from_be_bytes(seq),
            payload,
        }))
    }

    /// Read a length prefix. End of file before the first byte is a clean
    /// end only where a record may start.
    fn read_len(&mut self, at_record_start: bool) -> ExecutorResult<Option<usize>> {
        let mut buf = [0u8; 4];
        let filled = self.fill(&mut buf)?;
        if filled == 0 && at_record_start {
            return Ok(None);
        }
        if filled < buf.len() {
            return Err(self.corrupt(self.offset, "truncated length prefix"));
        }
        Ok(Some(u32::from_be_bytes(buf) as usize))
    }

    fn read_exact(&mut self, len: usize) -> ExecutorResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let filled = self.fill(&mut buf)?;
        if filled < len {
            return Err(self.corrupt(
                self.offset,
                &format!("truncated record: needed {} bytes, {} available", len, filled),
            ));
        }
        Ok(buf)
    }

    /// Read until `buf` is full or the file ends; returns bytes read
    fn fill(&mut self, buf: &mut [u8]) -> ExecutorResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.input.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    fn corrupt(&self, offset: u64, reason: &str) -> ExecutorError {
        let offset_field = offset.to_string();
        log_event(
            Event::SpillCorruption,
            &[("offset", &offset_field), ("reason", reason)],
        );
        ExecutorError::spill_corrupt(offset, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DefaultTypes, Value};
    use std::io::Seek;

    fn entries() -> Vec<SortEntry> {
        vec![
            SortEntry {
                key: vec![Value::Int(1)],
                sequence: 7,
                payload: vec![Value::Int(1), "a".into()],
            },
            SortEntry {
                key: vec![Value::Int(2)],
                sequence: 3,
                payload: vec![Value::Int(2), Value::Null],
            },
        ]
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let run = SpillRun::write(dir.path(), "s1", &DefaultTypes, &entries()).unwrap();
        assert_eq!(run.rows(), 2);
        let name = run.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sort-s1-"));
        assert!(name.ends_with(".tmp"));

        let mut reader = run.reader(Arc::new(DefaultTypes)).unwrap();
        assert_eq!(reader.next_entry().unwrap().unwrap(), entries()[0]);
        assert_eq!(reader.next_entry().unwrap().unwrap(), entries()[1]);
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let run = SpillRun::write(dir.path(), "s2", &DefaultTypes, &entries()).unwrap();
        let path = run.path().to_path_buf();
        assert!(path.exists());
        drop(run);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_runs_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let kept = SpillRun::write(dir.path(), "s5", &DefaultTypes, &entries()).unwrap();
        let gone = SpillRun::write(dir.path(), "s5", &DefaultTypes, &entries()).unwrap();
        let kept_path = kept.path().to_path_buf();
        std::fs::remove_file(gone.path()).unwrap();

        assert_eq!(remove_runs(vec![kept, gone]), 1);
        assert!(!kept_path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_no_runs() {
        assert_eq!(remove_runs(Vec::new()), 0);
    }

    #[test]
    fn test_truncated_run_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let run = SpillRun::write(dir.path(), "s3", &DefaultTypes, &entries()).unwrap();
        let full = run.bytes();
        let file = run.file.reopen().unwrap();
        file.set_len(full - 3).unwrap();

        let mut reader = run.reader(Arc::new(DefaultTypes)).unwrap();
        assert!(reader.next_entry().unwrap().is_some());
        let err = reader.next_entry().unwrap_err();
        assert_eq!(err.code(), "GQP_SPILL_CORRUPT");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let run = SpillRun::write(dir.path(), "s4", &DefaultTypes, &[]).unwrap();
        let mut file = run.file.reopen().unwrap();
        file.seek(io::SeekFrom::Start(0)).unwrap();
        // key_len 9: sequence plus one byte with an unknown value tag
        file.write_all(&[0, 0, 0, 9, 0, 0, 0, 0, 0, 0, 0, 1, 0xEE]).unwrap();

        let mut reader = run.reader(Arc::new(DefaultTypes)).unwrap();
        let err = reader.next_entry().unwrap_err();
        assert!(matches!(err, ExecutorError::SpillCorrupt { offset: 0, .. }));
    }
}
