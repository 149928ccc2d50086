use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};

use crate::error::{Error, Result};

/// A writable script file
///
/// The underlying handle is released when the writer is dropped, whether or not writing
/// succeeded. [ScriptWriter::finish] flushes it and reports any error.
pub struct ScriptWriter {
    path: PathBuf,
    sink: Box<dyn Write>,
}

impl ScriptWriter {
    pub fn new(path: &Path, sink: Box<dyn Write>) -> Self {
        ScriptWriter { path: path.to_path_buf(), sink }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.sink
            .write_all(text.as_bytes())
            .map_err(|err| Error::io(&self.path, err))
    }

    pub fn finish(mut self) -> Result<()> {
        self.sink.flush().map_err(|err| Error::io(&self.path, err))?;
        debug!("Finished writing {}", self.path.display());
        Ok(())
    }
}

pub trait WriterFactory {
    /// Open a script for writing, replacing any previous content
    fn create(&self, path: &Path) -> Result<ScriptWriter>;

    /// Remove a previously written script, if there is one
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Writes scripts to the filesystem, creating parent directories as needed
#[derive(Debug, Default)]
pub struct FileWriterFactory;

impl WriterFactory for FileWriterFactory {
    fn create(&self, path: &Path) -> Result<ScriptWriter> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        if path.exists() {
            info!("Overwriting {}", path.display());
        }
        let file = File::create(path).map_err(|err| Error::io(path, err))?;
        Ok(ScriptWriter::new(path, Box::new(BufWriter::new(file))))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed stale {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io(path, err)),
        }
    }
}

type Files = Rc<RefCell<BTreeMap<PathBuf, String>>>;

/// Keeps scripts in memory, used for dry runs
#[derive(Debug, Default)]
pub struct MemoryWriterFactory {
    files: Files,
}

impl MemoryWriterFactory {
    pub fn new() -> Self {
        MemoryWriterFactory::default()
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    /// Snapshot of every script written so far, ordered by path
    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files.borrow().clone()
    }
}

impl WriterFactory for MemoryWriterFactory {
    fn create(&self, path: &Path) -> Result<ScriptWriter> {
        self.files.borrow_mut().insert(path.to_path_buf(), String::new());
        let sink = MemorySink { path: path.to_path_buf(), files: Rc::clone(&self.files) };
        Ok(ScriptWriter::new(path, Box::new(sink)))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }
}

struct MemorySink {
    path: PathBuf,
    files: Files,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = std::str::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.files
            .borrow_mut()
            .entry(self.path.clone())
            .or_default()
            .push_str(text);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_writer_creates_parents_and_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripts/TestDataset/job.sh");

        let mut writer = FileWriterFactory.create(&path).unwrap();
        writer.write_str("first\n").unwrap();
        writer.finish().unwrap();

        let mut writer = FileWriterFactory.create(&path).unwrap();
        writer.write_str("second\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn file_writer_removes_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submit.sh");
        fs::write(&path, "stale\n").unwrap();

        FileWriterFactory.remove(&path).unwrap();
        assert!(!path.exists());
        // nothing left to remove
        FileWriterFactory.remove(&path).unwrap();
    }

    #[test]
    fn memory_writer_forgets_removed_scripts() {
        let factory = MemoryWriterFactory::new();
        let path = Path::new("/scripts/submit.sh");
        factory.create(path).unwrap().finish().unwrap();
        factory.remove(path).unwrap();
        assert!(factory.get(path).is_none());
        factory.remove(path).unwrap();
    }

    #[test]
    fn memory_writer_collects_text() {
        let factory = MemoryWriterFactory::new();
        let path = Path::new("/scripts/job.sh");
        let mut writer = factory.create(path).unwrap();
        writer.write_str("#!/bin/bash\n").unwrap();
        writer.write_str("echo hi\n").unwrap();
        writer.finish().unwrap();
        assert_eq!(factory.get(path).unwrap(), "#!/bin/bash\necho hi\n");
        assert_eq!(factory.files().len(), 1);
    }
}
