//! Stderr redirection for stdio subprocesses.
//!
//! The message protocol rides on stdin/stdout; stderr is a side channel
//! whose destination is decided here, before the process is spawned.
//! The resolved sink is passed to the transport as an explicit argument,
//! never injected through process-wide state.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::descriptor::{ServerDescriptor, StderrMode};

/// Destination for a subprocess's stderr stream.
///
/// `Null` and `File` sinks are owned by the session that opened them and
/// are released when the session closes. The inherited terminal stream
/// is never closed by this component.
#[derive(Debug)]
pub enum StderrSink {
    /// Writes succeed, content vanishes.
    Null,
    /// Redirect to an open file. The handle is duplicated for the child;
    /// the original is held here and closed on drop.
    File {
        /// The open log file.
        file: File,
        /// Resolved path, for diagnostics.
        path: PathBuf,
    },
    /// Pass through to the controlling terminal.
    Inherit,
}

impl StderrSink {
    /// Resolve a descriptor's stderr configuration to a concrete sink.
    ///
    /// `File` mode with no path set is a configuration error caught by
    /// [`ServerDescriptor::validate`]; by the time we get here it is
    /// treated the same as a failed open: warn and fall back to the null
    /// sink, which is non-fatal by design.
    pub fn resolve(descriptor: &ServerDescriptor) -> Self {
        match descriptor.stderr_mode {
            StderrMode::Disable => Self::Null,
            StderrMode::Terminal => Self::Inherit,
            StderrMode::File => {
                let Some(raw_path) = &descriptor.stderr_file else {
                    tracing::warn!(
                        server = %descriptor.name,
                        "stderr_mode is 'file' but no stderr_file set, discarding stderr"
                    );
                    return Self::Null;
                };
                let path = expand_home(raw_path);
                match open_log_file(&path, descriptor.stderr_append) {
                    Ok(file) => Self::File { file, path },
                    Err(e) => {
                        tracing::warn!(
                            server = %descriptor.name,
                            path = %path.display(),
                            error = %e,
                            "failed to open stderr file, discarding stderr"
                        );
                        Self::Null
                    }
                }
            }
        }
    }

    /// Produce the [`Stdio`] handle to wire into the spawned child.
    pub fn as_stdio(&self) -> std::io::Result<Stdio> {
        match self {
            Self::Null => Ok(Stdio::null()),
            Self::File { file, .. } => Ok(Stdio::from(file.try_clone()?)),
            Self::Inherit => Ok(Stdio::inherit()),
        }
    }

    /// Whether the session owns closing this sink. The inherited
    /// terminal stream belongs to the process, not to us.
    pub fn caller_owned(&self) -> bool {
        !matches!(self, Self::Inherit)
    }
}

/// Open the stderr log file, creating parent directories as needed.
/// Truncates unless `append` is set.
fn open_log_file(path: &Path, append: bool) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}

/// Expand a leading `~` or `~/` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if s == "~" {
        return dirs::home_dir().unwrap_or_else(|| path.to_path_buf());
    }
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_disable_resolves_to_null() {
        let d = ServerDescriptor::stdio("test", "cat");
        let sink = StderrSink::resolve(&d);
        assert!(matches!(sink, StderrSink::Null));
        assert!(sink.caller_owned());
    }

    #[test]
    fn test_terminal_resolves_to_inherit() {
        let mut d = ServerDescriptor::stdio("test", "cat");
        d.stderr_mode = StderrMode::Terminal;
        let sink = StderrSink::resolve(&d);
        assert!(matches!(sink, StderrSink::Inherit));
        assert!(!sink.caller_owned());
    }

    #[test]
    fn test_file_mode_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("nested/logs/server.log");

        let d = ServerDescriptor::stdio("test", "cat").with_stderr_file(&log_path, false);
        let sink = StderrSink::resolve(&d);

        assert!(matches!(sink, StderrSink::File { .. }));
        assert!(log_path.exists());
    }

    #[test]
    fn test_truncate_discards_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("server.log");
        std::fs::write(&log_path, "old run output\n").unwrap();

        let d = ServerDescriptor::stdio("test", "cat").with_stderr_file(&log_path, false);
        let sink = StderrSink::resolve(&d);
        drop(sink);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_append_preserves_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("server.log");
        std::fs::write(&log_path, "first run\n").unwrap();

        let d = ServerDescriptor::stdio("test", "cat").with_stderr_file(&log_path, true);
        let sink = StderrSink::resolve(&d);
        if let StderrSink::File { mut file, .. } = sink {
            file.write_all(b"second run\n").unwrap();
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }

    #[test]
    fn test_unopenable_path_falls_back_to_null() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for writing as a file.
        let d = ServerDescriptor::stdio("test", "cat").with_stderr_file(dir.path(), false);
        let sink = StderrSink::resolve(&d);
        assert!(matches!(sink, StderrSink::Null));
    }

    #[test]
    fn test_as_stdio_variants() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("server.log");

        assert!(StderrSink::Null.as_stdio().is_ok());
        assert!(StderrSink::Inherit.as_stdio().is_ok());

        let d = ServerDescriptor::stdio("test", "cat").with_stderr_file(&log_path, false);
        let sink = StderrSink::resolve(&d);
        assert!(sink.as_stdio().is_ok());
    }
}
