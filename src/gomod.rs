use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of a `go.mod` manifest relevant to package discovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    /// Module path from the `module` directive
    pub module: String,
    pub requires: Vec<Requirement>,
    pub replaces: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
    /// Absent when the replacement is a local directory
    pub to_version: Option<String>,
}

impl Replacement {
    pub fn is_local(&self) -> bool {
        self.to.starts_with("./") || self.to.starts_with("../") || Path::new(&self.to).is_absolute()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Replace,
    Skip,
}

impl GoMod {
    /// Reads and parses a `go.mod` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading module manifest: {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| Error::Manifest {
            file: path.to_path_buf(),
            message,
        })
    }

    /// Parses manifest text.
    ///
    /// Only `module`, `require` and `replace` directives are interpreted;
    /// `go`, `toolchain`, `exclude` and `retract` are accepted and ignored.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut manifest = GoMod::default();
        let mut block = Block::None;

        for (index, raw_line) in content.lines().enumerate() {
            let (line, comment) = match raw_line.find("//") {
                Some(pos) => (&raw_line[..pos], raw_line[pos + 2..].trim()),
                None => (raw_line, ""),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if block != Block::None {
                if line == ")" {
                    block = Block::None;
                    continue;
                }
                let fields = fields(line);
                match block {
                    Block::Require => manifest.requires.push(requirement(&fields, comment, index)?),
                    Block::Replace => manifest.replaces.push(replacement(&fields, index)?),
                    _ => {}
                }
                continue;
            }

            let fields = fields(line);
            let (verb, args) = match fields.split_first() {
                Some((verb, args)) => (verb.as_str(), args),
                None => continue,
            };
            let opens_block = args.len() == 1 && args[0] == "(";
            match verb {
                "module" => {
                    let module = args
                        .first()
                        .ok_or_else(|| format!("line {}: module path missing", index + 1))?;
                    manifest.module = module.clone();
                }
                "require" if opens_block => block = Block::Require,
                "require" => manifest.requires.push(requirement(args, comment, index)?),
                "replace" if opens_block => block = Block::Replace,
                "replace" => manifest.replaces.push(replacement(args, index)?),
                "go" | "toolchain" | "godebug" => {}
                "exclude" | "retract" if opens_block => block = Block::Skip,
                "exclude" | "retract" => {}
                other => return Err(format!("line {}: unknown directive {}", index + 1, other)),
            }
        }

        if block != Block::None {
            return Err("unterminated block".to_string());
        }
        if manifest.module.is_empty() {
            return Err("module directive missing".to_string());
        }
        Ok(manifest)
    }

    /// Source root of a required module, honouring `replace` directives.
    ///
    /// Local replacements are resolved against `module_root`; everything
    /// else maps into the module cache via [`module_cache_dir`].
    pub fn dependency_root(
        &self,
        requirement: &Requirement,
        module_root: &Path,
        cache_root: &Path,
    ) -> PathBuf {
        if let Some(replacement) = self.replaces.iter().find(|r| r.from == requirement.path) {
            if replacement.is_local() {
                return module_root.join(&replacement.to);
            }
            let version = replacement
                .to_version
                .as_deref()
                .unwrap_or(&requirement.version);
            return module_cache_dir(cache_root, &replacement.to, version);
        }
        module_cache_dir(cache_root, &requirement.path, &requirement.version)
    }
}

/// Whitespace-separated fields with surrounding quotes removed
fn fields(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|field| field.trim_matches('"').to_string())
        .collect()
}

fn requirement(
    fields: &[String],
    comment: &str,
    index: usize,
) -> std::result::Result<Requirement, String> {
    match fields {
        [path, version, ..] => Ok(Requirement {
            path: path.clone(),
            version: version.clone(),
            indirect: comment.split(';').any(|part| part.trim() == "indirect"),
        }),
        _ => Err(format!("line {}: malformed require", index + 1)),
    }
}

fn replacement(fields: &[String], index: usize) -> std::result::Result<Replacement, String> {
    let arrow = fields
        .iter()
        .position(|f| f == "=>")
        .ok_or_else(|| format!("line {}: replace without =>", index + 1))?;
    let from = fields
        .first()
        .filter(|_| arrow > 0)
        .ok_or_else(|| format!("line {}: replace source missing", index + 1))?;
    let to = fields
        .get(arrow + 1)
        .ok_or_else(|| format!("line {}: replace target missing", index + 1))?;
    Ok(Replacement {
        from: from.clone(),
        to: to.clone(),
        to_version: fields.get(arrow + 2).cloned(),
    })
}

/// Escapes a module path for the on-disk cache: every uppercase letter
/// becomes `!` followed by its lowercase form.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_uppercase() {
            escaped.push('!');
            escaped.extend(c.to_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// `<cache>/<escaped path>@<version>`
pub fn module_cache_dir(cache_root: &Path, path: &str, version: &str) -> PathBuf {
    cache_root.join(format!("{}@{}", escape_module_path(path), version))
}
