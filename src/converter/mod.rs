//! Source-to-distributable asset conversion
//!
//! Converts preprocessor sources (SCSS, Less, TypeScript, ...) into their
//! distributable siblings by invoking an external tool. Conversion is gated
//! on modification times: the tool only runs when the target is missing or
//! older than the source.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{AssetError, Result};
use crate::path_utils;

/// Converts a bundle-relative file reference into its distributable form
pub trait AssetConverter {
    /// Convert `path` (relative to `base_path`) and return the relative path
    /// of the distributable file. Unrecognized extensions pass through
    /// unchanged.
    fn convert(&self, path: &str, base_path: &Path) -> Result<String>;
}

/// Converter that never converts; every path passes through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConverter;

impl AssetConverter for NullConverter {
    fn convert(&self, path: &str, _base_path: &Path) -> Result<String> {
        Ok(path.to_string())
    }
}

/// One conversion rule: target extension plus a shell command template
#[derive(Debug, Clone)]
pub struct ConvertRule {
    /// Extension of the produced file (e.g. `css`)
    pub target_ext: String,

    /// Shell command with `{from}`/`{to}` placeholders for the absolute
    /// source/target paths and `{path}` for the base directory
    pub command: String,
}

/// Converter that shells out to preprocessor tools, keyed by source extension
#[derive(Debug, Clone)]
pub struct CommandConverter {
    commands: HashMap<String, ConvertRule>,
}

impl Default for CommandConverter {
    /// The stock preprocessor commands; templates may use shell redirection
    fn default() -> Self {
        let mut converter = Self {
            commands: HashMap::new(),
        };
        converter.set_command("less", "css", "lessc {from} {to} --no-color");
        converter.set_command("scss", "css", "sass {from} {to}");
        converter.set_command("sass", "css", "sass {from} {to}");
        converter.set_command("styl", "css", "stylus < {from} > {to}");
        converter.set_command("coffee", "js", "coffee -p {from} > {to}");
        converter.set_command("ts", "js", "tsc --out {to} {from}");
        converter
    }
}

impl CommandConverter {
    /// Create a converter with the stock preprocessor commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with no rules; everything passes through until
    /// commands are added
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register or replace the command for a source extension
    pub fn set_command(
        &mut self,
        source_ext: impl Into<String>,
        target_ext: impl Into<String>,
        command: impl Into<String>,
    ) {
        self.commands.insert(
            source_ext.into(),
            ConvertRule {
                target_ext: target_ext.into(),
                command: command.into(),
            },
        );
    }
}

impl AssetConverter for CommandConverter {
    fn convert(&self, path: &str, base_path: &Path) -> Result<String> {
        let rel = Path::new(path);
        let Some(ext) = rel.extension().and_then(|e| e.to_str()) else {
            return Ok(path.to_string());
        };
        let Some(rule) = self.commands.get(ext) else {
            return Ok(path.to_string());
        };

        let target_rel = rel.with_extension(&rule.target_ext);
        let source = base_path.join(rel);
        let target = base_path.join(&target_rel);

        if needs_conversion(&source, &target) {
            run_command(&rule.command, base_path, &source, &target)?;
        } else {
            debug!(target = %target.display(), "conversion target up to date, skipping");
        }

        Ok(path_utils::to_forward_slashes(&target_rel))
    }
}

/// True when the target is missing or the source has been modified since
/// the target was produced
fn needs_conversion(source: &Path, target: &Path) -> bool {
    let Some(target_mtime) = path_utils::mtime_seconds(target) else {
        return true;
    };
    match path_utils::mtime_seconds(source) {
        Some(source_mtime) => source_mtime > target_mtime,
        None => true,
    }
}

/// Substitute placeholders and run the template through the shell
///
/// Templates go through `sh -c` because the stock commands use redirection.
fn run_command(template: &str, base_path: &Path, source: &Path, target: &Path) -> Result<()> {
    let command = template
        .replace("{from}", &shell_quote(source))
        .replace("{to}", &shell_quote(target))
        .replace("{path}", &shell_quote(base_path));

    debug!(command = %command, "converting asset");

    let output = shell(&command)
        .current_dir(base_path)
        .output()
        .map_err(|e| AssetError::ConversionFailed {
            command: command.clone(),
            output: e.to_string(),
        })?;

    if !output.status.success() {
        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(AssetError::ConversionFailed {
            command,
            output: captured,
        });
    }

    Ok(())
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(unix)]
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

#[cfg(windows)]
fn shell_quote(path: &Path) -> String {
    format!("\"{}\"", path.display())
}
