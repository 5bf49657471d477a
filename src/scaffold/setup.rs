use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::scaffold::package_json::{upsert_package_json, Section};
use crate::scaffold::{copy_tree, ScaffoldError, TemplateSource};

/// Tooling that `vx3 setup` can add to an existing project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupTarget {
    Hardhat,
    React,
}

impl SetupTarget {
    /// Template directory name.
    pub fn template_name(&self) -> &'static str {
        match self {
            SetupTarget::Hardhat => "hardhat",
            SetupTarget::React => "react-template",
        }
    }

    fn sections(&self) -> &'static [Section] {
        match self {
            SetupTarget::Hardhat => &[
                Section {
                    name: "scripts",
                    entries: &[
                        ("hh", "hardhat"),
                        ("hh:compile", "hardhat compile"),
                        ("hh:test", "hardhat test"),
                        ("hh:node", "hardhat node"),
                        ("hh:deploy", "hardhat run scripts/deploy.ts --network localhost"),
                    ],
                },
                Section {
                    name: "devDependencies",
                    entries: &[
                        ("hardhat", "^2.22.0"),
                        ("@nomicfoundation/hardhat-toolbox", "^3.0.0"),
                    ],
                },
            ],
            SetupTarget::React => &[
                Section {
                    name: "scripts",
                    entries: &[
                        ("dev", "vite"),
                        ("build", "vite build"),
                        ("preview", "vite preview"),
                    ],
                },
                Section {
                    name: "devDependencies",
                    entries: &[
                        ("vite", "^5.0.0"),
                        ("typescript", "^5.0.0"),
                        ("tailwindcss", "^3.4.0"),
                        ("postcss", "^8.0.0"),
                        ("autoprefixer", "^10.0.0"),
                    ],
                },
                Section {
                    name: "dependencies",
                    entries: &[("react", "^18.2.0"), ("react-dom", "^18.2.0")],
                },
            ],
        }
    }

    /// Paths copied from the template; empty means the whole tree.
    fn copied_paths(&self) -> &'static [&'static str] {
        match self {
            SetupTarget::Hardhat => &["hardhat.config.ts", "contracts", "scripts"],
            SetupTarget::React => &[],
        }
    }

    pub fn next_steps(&self) -> &'static [&'static str] {
        match self {
            SetupTarget::Hardhat => &[
                "Install dev deps: npm install -D hardhat @nomicfoundation/hardhat-toolbox",
                "Try: npm run hh:node | npm run hh:compile | npm run hh:deploy",
            ],
            SetupTarget::React => &[
                "Install dependencies: npm install",
                "Start dev server: npm run dev",
            ],
        }
    }
}

impl fmt::Display for SetupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupTarget::Hardhat => write!(f, "hardhat"),
            SetupTarget::React => write!(f, "react"),
        }
    }
}

impl FromStr for SetupTarget {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hardhat" => Ok(SetupTarget::Hardhat),
            "react" => Ok(SetupTarget::React),
            other => Err(ScaffoldError::UnknownTarget(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub target: SetupTarget,
    pub template_copied: bool,
}

/// Add `target` tooling to `project_dir`.
///
/// A missing template only skips the file copy.
pub fn setup(
    target: SetupTarget,
    project_dir: &Path,
    templates: &TemplateSource,
) -> Result<SetupReport, ScaffoldError> {
    upsert_package_json(project_dir, target.sections())?;

    let Some(template) = templates.find(target.template_name()) else {
        tracing::warn!("{} template not found. Skipping file copy.", target);
        return Ok(SetupReport {
            target,
            template_copied: false,
        });
    };

    let paths = target.copied_paths();
    if paths.is_empty() {
        copy_tree(&template, project_dir)?;
    } else {
        for rel in paths {
            let src = template.join(rel);
            if src.exists() {
                copy_tree(&src, &project_dir.join(rel))?;
            }
        }
    }

    Ok(SetupReport {
        target,
        template_copied: true,
    })
}
