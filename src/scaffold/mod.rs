//! Project creation and tooling setup.

pub mod package_json;
pub mod setup;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use package_json::{upsert_package_json, write_package_json, PACKAGE_JSON};
pub use setup::{setup, SetupReport, SetupTarget};

pub const DEFAULT_PROJECT_NAME: &str = "my-vx-project";

/// Template used by `init` and `create`.
pub const PROJECT_TEMPLATE: &str = "template";

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown setup target '{0}'. Try: hardhat, react")]
    UnknownTarget(String),
}

/// Where templates are looked up, first match wins.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// A `--template` directory used as-is.
    explicit: Option<PathBuf>,
    /// Directory with one sub-directory per template.
    templates_dir: Option<PathBuf>,
    cwd: PathBuf,
}

impl TemplateSource {
    pub fn new(explicit: Option<PathBuf>, templates_dir: Option<PathBuf>, cwd: PathBuf) -> Self {
        Self {
            explicit,
            templates_dir,
            cwd,
        }
    }

    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(explicit) = &self.explicit {
            candidates.push(explicit.clone());
        }
        if let Some(dir) = &self.templates_dir {
            candidates.push(dir.join(name));
        }
        candidates.push(self.cwd.join("packages").join(name));
        candidates
    }

    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.candidates(name).into_iter().find(|p| p.is_dir())
    }
}

/// Copy `src` onto `dest` recursively, overwriting files.
///
/// Anything that is neither a file nor a directory is skipped.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), ScaffoldError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ScaffoldError::Io { path, source }
    };

    let meta = fs::metadata(src).map_err(io_err(src))?;
    if meta.is_dir() {
        fs::create_dir_all(dest).map_err(io_err(dest))?;
        for entry in fs::read_dir(src).map_err(io_err(src))? {
            let entry = entry.map_err(io_err(src))?;
            copy_tree(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else if meta.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::copy(src, dest).map_err(io_err(dest))?;
    } else {
        tracing::debug!("Skipping special file {}", src.display());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created {
        path: PathBuf,
        template_copied: bool,
    },
    /// Nothing was touched.
    AlreadyExists { path: PathBuf },
}

/// Create `parent/<name>` with a `package.json` and the project template.
pub fn init_project(
    parent: &Path,
    name: Option<&str>,
    templates: &TemplateSource,
) -> Result<InitOutcome, ScaffoldError> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PROJECT_NAME);
    let path = parent.join(name);

    if path.exists() {
        return Ok(InitOutcome::AlreadyExists { path });
    }

    fs::create_dir_all(&path).map_err(|e| ScaffoldError::Io {
        path: path.clone(),
        source: e,
    })?;
    write_package_json(&path)?;

    let template_copied = match templates.find(PROJECT_TEMPLATE) {
        Some(template) => {
            copy_tree(&template, &path)?;
            true
        }
        None => {
            tracing::warn!("Template directory not found; created minimal project with package.json only.");
            false
        }
    };

    Ok(InitOutcome::Created {
        path,
        template_copied,
    })
}
