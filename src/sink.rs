use crate::utils::errors::SamplerError;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

/// Destination of rendered text: stdout, or a file opened in append mode.
///
/// Dropping a file sink flushes and closes it; stdout is never closed.
pub enum Sink {
    Stdout(Stdout),
    File(BufWriter<File>),
}

impl Sink {
    pub fn open(path: Option<&Path>) -> Result<Self, SamplerError> {
        match path {
            None => Ok(Sink::Stdout(io::stdout())),
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| SamplerError::Sink {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(Sink::File(BufWriter::new(file)))
            }
        }
    }

    /// Write a complete chunk of text and push it out immediately so the log
    /// can be read while sampling continues.
    pub fn emit(&mut self, text: &str) -> io::Result<()> {
        self.write_all(text.as_bytes())?;
        self.flush()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(file) => file.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "existing\n").unwrap();

        {
            let mut sink = Sink::open(Some(&path)).unwrap();
            sink.emit("first\n").unwrap();
        }
        let mut sink = Sink::open(Some(&path)).unwrap();
        sink.emit("second\n").unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nfirst\nsecond\n");
    }

    #[test]
    fn test_unopenable_file_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.csv");
        let err = Sink::open(Some(&path)).err().unwrap();
        assert!(matches!(err, SamplerError::Sink { .. }));
    }
}
