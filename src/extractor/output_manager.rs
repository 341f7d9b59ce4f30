use crate::config::OutputConfig;
use crate::error::{IvolError, Result};
use console::Term;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const POSITIVE_ANSWERS: &[&str] = &["Y", "y", "Yes", "yes"];
pub const NEGATIVE_ANSWERS: &[&str] = &["N", "n", "No", "no"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteDecision {
    Overwrite,
    Rename(PathBuf),
    Abort,
}

/// Asked once per existing target file
pub trait ConfirmOverwrite {
    fn confirm(&mut self, path: &Path) -> Result<OverwriteDecision>;
}

/// Interactive yes/no prompt on the controlling terminal
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn ask(&self, question: &str) -> Result<String> {
        self.term.write_line(question)?;
        let answer = self.term.read_line()?;
        Ok(answer.trim().to_string())
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmOverwrite for TerminalPrompt {
    fn confirm(&mut self, path: &Path) -> Result<OverwriteDecision> {
        if !std::io::stdin().is_terminal() {
            return Ok(OverwriteDecision::Abort);
        }

        let answer = self.ask(&format!(
            "Output file {} already exists. Overwrite? (Y/N)",
            path.display()
        ))?;

        decide(&answer, || self.ask("Enter a new output file name:"))
    }
}

/// Turns an answer to the overwrite question into a decision. A negative
/// answer asks `read_new_name` for the replacement file name.
pub fn decide<F>(answer: &str, read_new_name: F) -> Result<OverwriteDecision>
where
    F: FnOnce() -> Result<String>,
{
    match parse_answer(answer) {
        Some(true) => Ok(OverwriteDecision::Overwrite),
        Some(false) => {
            let name = read_new_name()?;
            let name = name.trim();
            if name.is_empty() {
                return Err(IvolError::InvalidResponse {
                    response: name.to_string(),
                });
            }
            Ok(OverwriteDecision::Rename(PathBuf::from(name)))
        }
        None => Err(IvolError::InvalidResponse {
            response: answer.trim().to_string(),
        }),
    }
}

/// Answers every question the same way
#[derive(Debug, Clone)]
pub struct FixedDecision(pub OverwriteDecision);

impl ConfirmOverwrite for FixedDecision {
    fn confirm(&mut self, _path: &Path) -> Result<OverwriteDecision> {
        Ok(self.0.clone())
    }
}

/// `Some(true)` for yes, `Some(false)` for no, `None` otherwise
pub fn parse_answer(answer: &str) -> Option<bool> {
    let answer = answer.trim();
    if POSITIVE_ANSWERS.contains(&answer) {
        Some(true)
    } else if NEGATIVE_ANSWERS.contains(&answer) {
        Some(false)
    } else {
        None
    }
}

pub struct OutputManager {
    target: PathBuf,
    force_overwrite: bool,
}

impl OutputManager {
    pub fn new<P: Into<PathBuf>>(target: P) -> Self {
        Self {
            target: target.into(),
            force_overwrite: false,
        }
    }

    /// `Job-2.odb` becomes `Job-2.ivol.csv`, next to the archive unless an
    /// output directory is configured
    pub fn default_output_path(archive: &Path, extension: &str, config: &OutputConfig) -> PathBuf {
        let file_name = archive
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = file_name.strip_suffix(extension).unwrap_or(&file_name);
        let output_name = format!("{}{}", stem, config.suffix);

        match config.directory {
            Some(ref directory) => directory.join(output_name),
            None => archive.with_file_name(output_name),
        }
    }

    pub fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Settles on a file name, asking `prompt` whenever the current target
    /// exists. A renamed target is checked again.
    pub fn resolve_target(&mut self, prompt: &mut dyn ConfirmOverwrite) -> Result<PathBuf> {
        loop {
            if self.force_overwrite || !self.target.exists() {
                return Ok(self.target.clone());
            }

            match prompt.confirm(&self.target)? {
                OverwriteDecision::Overwrite => return Ok(self.target.clone()),
                OverwriteDecision::Rename(path) => self.target = path,
                OverwriteDecision::Abort => {
                    return Err(IvolError::OutputExists {
                        path: self.target.display().to_string(),
                    })
                }
            }
        }
    }

    pub fn validate_paths(&self) -> Result<()> {
        let directory = self.directory();
        if !directory.is_dir() {
            return Err(IvolError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Output directory does not exist: {}", directory.display()),
            )));
        }

        if self.target.is_dir() {
            return Err(IvolError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Output path is a directory: {}", self.target.display()),
            )));
        }

        Ok(())
    }

    /// Runs `write` against a temporary file in the target directory and
    /// moves it into place only when every line was written.
    pub fn write_atomically<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        self.validate_paths()?;

        let mut temp = NamedTempFile::new_in(self.directory())?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            write(&mut writer)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| IvolError::Io(e.error))?;

        Ok(())
    }

    fn directory(&self) -> PathBuf {
        match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
