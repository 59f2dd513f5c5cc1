//! Injected run context.
//!
//! Entry points never read the process environment or write to a global
//! step-summary path directly. The binary builds one [`RunContext`] at
//! startup; tests build one from an explicit map and an in-memory writer.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{QgateError, Result};
use crate::io;

/// Environment variable naming the CI step summary file.
pub const STEP_SUMMARY_VAR: &str = "GITHUB_STEP_SUMMARY";

/// Immutable snapshot of the environment a command runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
    working_dir: PathBuf,
}

impl EnvSnapshot {
    pub fn new<I, K, V>(vars: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            working_dir: working_dir.into(),
        }
    }

    /// Trimmed value of `key`, `None` when unset or blank.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `true`, `1` or `yes`, case-insensitive.
    pub fn flag(&self, key: &str) -> bool {
        self.var(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    /// A finite, strictly positive number; anything else is "not configured".
    pub fn positive_number(&self, key: &str) -> Option<f64> {
        self.var(key)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|n| n.is_finite() && *n > 0.0)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Render `path` relative to the working directory when it lives below it.
    pub fn relative_display(&self, path: &str) -> String {
        Path::new(path)
            .strip_prefix(&self.working_dir)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| path.to_string())
    }

    pub fn step_summary_path(&self) -> Option<PathBuf> {
        self.var(STEP_SUMMARY_VAR).map(|p| self.resolve(p))
    }
}

/// Environment snapshot plus the stdout handle of one invocation.
pub struct RunContext<W: Write> {
    pub env: EnvSnapshot,
    pub out: W,
}

impl<W: Write> RunContext<W> {
    pub fn new(env: EnvSnapshot, out: W) -> Self {
        Self { env, out }
    }

    /// Write to stdout only.
    pub fn print(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).map_err(QgateError::Io)
    }

    /// Append to the step summary, if one is configured.
    ///
    /// Returns whether anything was written.
    pub fn append_step_summary(&self, text: &str) -> Result<bool> {
        match self.env.step_summary_path() {
            Some(path) => {
                io::append_text(&path, text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write to stdout and mirror into the step summary.
    pub fn publish(&mut self, text: &str) -> Result<()> {
        self.print(text)?;
        self.append_step_summary(text)?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(vars: &[(&str, &str)]) -> EnvSnapshot {
        EnvSnapshot::new(vars.iter().copied(), "/work")
    }

    #[test]
    fn test_var_trims_and_drops_blank() {
        let env = env(&[("A", "  x "), ("B", "   ")]);
        assert_eq!(env.var("A"), Some("x"));
        assert_eq!(env.var("B"), None);
        assert_eq!(env.var("C"), None);
    }

    #[test]
    fn test_flag_accepts_common_truthy_values() {
        let env = env(&[("A", "TRUE"), ("B", "1"), ("C", "yes"), ("D", "false")]);
        assert!(env.flag("A"));
        assert!(env.flag("B"));
        assert!(env.flag("C"));
        assert!(!env.flag("D"));
        assert!(!env.flag("E"));
    }

    #[test]
    fn test_positive_number_rejects_garbage() {
        let env = env(&[("A", "10"), ("B", "-1"), ("C", "abc"), ("D", "inf"), ("E", "0")]);
        assert_eq!(env.positive_number("A"), Some(10.0));
        assert_eq!(env.positive_number("B"), None);
        assert_eq!(env.positive_number("C"), None);
        assert_eq!(env.positive_number("D"), None);
        assert_eq!(env.positive_number("E"), None);
    }

    #[test]
    fn test_resolve_and_relative_display() {
        let env = env(&[]);
        assert_eq!(env.resolve("a/b.json"), PathBuf::from("/work/a/b.json"));
        assert_eq!(env.resolve("/abs.json"), PathBuf::from("/abs.json"));
        assert_eq!(env.relative_display("/work/__tests__/a.test.ts"), "__tests__/a.test.ts");
        assert_eq!(env.relative_display("/elsewhere/a.ts"), "/elsewhere/a.ts");
    }

    #[test]
    fn test_publish_mirrors_into_step_summary() {
        let dir = tempdir().expect("tempdir");
        let summary = dir.path().join("summary.md");
        let env = EnvSnapshot::new(
            [(STEP_SUMMARY_VAR, summary.to_string_lossy().to_string())],
            dir.path(),
        );
        let mut ctx = RunContext::new(env, Vec::new());
        ctx.publish("## Title\n").unwrap();
        ctx.publish("- line\n").unwrap();
        assert_eq!(String::from_utf8(ctx.into_output()).unwrap(), "## Title\n- line\n");
        assert_eq!(std::fs::read_to_string(&summary).unwrap(), "## Title\n- line\n");
    }
}
