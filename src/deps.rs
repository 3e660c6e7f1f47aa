//! The poppler command-line tools behind PDF rendering and text extraction.

use anyhow::{Context, Result, bail};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopplerTool {
    /// Page rasterizer.
    Pdftoppm,
    /// Text-layer extractor.
    Pdftotext,
}

impl PopplerTool {
    pub fn name(self) -> &'static str {
        match self {
            PopplerTool::Pdftoppm => "pdftoppm",
            PopplerTool::Pdftotext => "pdftotext",
        }
    }

    /// Variable holding an explicit path to the tool. Checked before any search.
    pub fn env_var(self) -> &'static str {
        match self {
            PopplerTool::Pdftoppm => "FOLIO_PDFTOPPM",
            PopplerTool::Pdftotext => "FOLIO_PDFTOTEXT",
        }
    }

    fn file_name(self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }

    /// Finds the tool via its env override, next to the executable, in the folio data
    /// dir, then on `PATH`.
    pub fn locate(self) -> Result<PathBuf> {
        if let Some(path) = env::var_os(self.env_var()).map(PathBuf::from) {
            if path.is_file() {
                return Ok(path);
            }
            debug!(var = self.env_var(), path = %path.display(), "override missing, searching");
        }

        find_in(search_dirs(), &self.file_name()).with_context(|| {
            format!(
                "Missing {}. Install poppler-utils or set {} to its location.",
                self.name(),
                self.env_var()
            )
        })
    }

    /// Runs the tool and returns its stdout. A non-zero exit is an error carrying stderr.
    pub fn run<I, S>(self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let path = self.locate()?;
        let output = Command::new(&path)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {}", path.display()))?;

        if !output.status.success() {
            bail!(
                "{} failed: {}",
                self.name(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

fn search_dirs() -> Vec<PathBuf> {
    let mut search = Vec::new();
    if let Some(exe_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        search.push(exe_dir.join("bin"));
        search.insert(0, exe_dir);
    }
    search.extend(dirs::data_dir().map(|d| d.join("folio").join("bin")));
    if let Some(path) = env::var_os("PATH") {
        search.extend(env::split_paths(&path));
    }
    search
}

fn find_in<I: IntoIterator<Item = PathBuf>>(search: I, file_name: &str) -> Option<PathBuf> {
    search
        .into_iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}
