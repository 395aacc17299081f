use std::{
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use valman_contracts::EventRecord;

use crate::error::{Result, ScannerError};

/// Destination for scanned events.
pub trait EventSink {
    fn write(&mut self, record: &EventRecord) -> Result<()>;

    /// Called before the checkpoint advances, so everything up to it is durable.
    fn flush(&mut self) -> Result<()>;
}

/// Writes each record as one line of JSON.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    name: PathBuf,
}

impl JsonLinesSink<BufWriter<io::Stdout>> {
    pub fn stdout() -> Self {
        Self { writer: BufWriter::new(io::stdout()), name: PathBuf::from("<stdout>") }
    }
}

impl JsonLinesSink<BufWriter<std::fs::File>> {
    /// Appends to `path`, creating it if needed.
    pub fn file(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ScannerError::OutputError { path: path.to_path_buf(), source })?;
        Ok(Self { writer: BufWriter::new(file), name: path.to_path_buf() })
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, name: PathBuf::from("<writer>") }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn io_error(&self, source: io::Error) -> ScannerError {
        ScannerError::OutputError { path: self.name.clone(), source }
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn write(&mut self, record: &EventRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n").map_err(|e| self.io_error(e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use valman_contracts::ethers::types::{Address, H256};

    use super::*;

    fn record(block_number: u64) -> EventRecord {
        EventRecord {
            address: Address::from([1; 20]),
            block_number,
            block_hash: H256::zero(),
            transaction_hash: H256::zero(),
            log_index: 0,
            event: "UptimeUpdated".to_owned(),
            fields: serde_json::json!({ "uptime": 60 }),
            removed: false,
        }
    }

    #[test]
    fn test_one_record_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write(&record(1)).unwrap();
        sink.write(&record(2)).unwrap();
        sink.flush().unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let second: EventRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, record(2));
        assert!(lines[0].contains("\"blockNumber\":1"));
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        for block in [1, 2] {
            let mut sink = JsonLinesSink::file(&path).unwrap();
            sink.write(&record(block)).unwrap();
            sink.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
