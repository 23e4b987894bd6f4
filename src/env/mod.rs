// src/env/mod.rs

//! Environment assembly for the child process.
//!
//! An [`Environment`] is an ordered list of `KEY=VALUE` pairs with unique
//! keys. When a key is written twice the last value wins, but the key keeps
//! the position where it first appeared. The list is handed verbatim to the
//! child as its complete environment table.

use tracing::debug;

use crate::errors::{ExecError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the current process environment.
    ///
    /// Entries that are not valid UTF-8 are skipped.
    pub fn inherited() -> Self {
        let mut env = Self::new();
        for (key, value) in std::env::vars_os() {
            if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                env.set(key, value);
            }
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(k, _)| k.as_str())
    }

    /// Render as `KEY=VALUE` strings, in order.
    pub fn to_pairs(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    /// Add variables from dotenv-style plaintext.
    ///
    /// Empty lines and lines starting with `#` are skipped. Errors name the
    /// line number only, never the line itself, since it may hold a secret.
    pub fn extend_from_plaintext(&mut self, plaintext: &[u8]) -> Result<()> {
        for (idx, raw) in plaintext.split(|b| *b == b'\n').enumerate() {
            let line_no = idx + 1;
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.is_empty() || raw[0] == b'#' {
                continue;
            }
            let line = std::str::from_utf8(raw).map_err(|_| ExecError::InvalidEnvironment {
                line: line_no,
                reason: "not valid UTF-8".to_string(),
            })?;
            let (key, value) = split_pair(line, line_no)?;
            self.set(key, value);
        }
        Ok(())
    }

    /// Add caller-supplied `KEY=VALUE` entries. Numbering starts at 1.
    pub fn extend_pairs<I, S>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (idx, pair) in pairs.into_iter().enumerate() {
            let (key, value) = split_pair(pair.as_ref(), idx + 1)?;
            self.set(key, value);
        }
        Ok(())
    }
}

fn split_pair(line: &str, line_no: usize) -> Result<(&str, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    match line.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(ExecError::InvalidEnvironment {
            line: line_no,
            reason: "empty key".to_string(),
        }),
        Some((key, _)) if key.contains('\0') => Err(ExecError::InvalidEnvironment {
            line: line_no,
            reason: "key contains NUL".to_string(),
        }),
        Some((_, value)) if value.contains('\0') => Err(ExecError::InvalidEnvironment {
            line: line_no,
            reason: "value contains NUL".to_string(),
        }),
        Some(pair) => Ok(pair),
        None => Err(ExecError::InvalidEnvironment {
            line: line_no,
            reason: "expected KEY=VALUE".to_string(),
        }),
    }
}

/// Composes the child environment from its three sources.
///
/// Order: inherited variables (unless pristine), then secrets, then extras.
/// Later sources override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder<'a> {
    pristine: bool,
    secrets: Option<&'a [u8]>,
    extras: Vec<String>,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pristine(mut self, pristine: bool) -> Self {
        self.pristine = pristine;
        self
    }

    pub fn secrets(mut self, plaintext: &'a [u8]) -> Self {
        self.secrets = Some(plaintext);
        self
    }

    pub fn extras<I, S>(mut self, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extras.extend(extras.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<Environment> {
        let mut env = if self.pristine {
            Environment::new()
        } else {
            Environment::inherited()
        };
        let inherited = env.len();

        if let Some(plaintext) = self.secrets {
            env.extend_from_plaintext(plaintext)?;
        }
        env.extend_pairs(&self.extras)?;

        debug!(
            pristine = self.pristine,
            inherited,
            total = env.len(),
            "assembled child environment"
        );
        Ok(env)
    }
}
