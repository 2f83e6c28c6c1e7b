// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request descriptor for spawning a child process.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Source of the bytes a child reads from its standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// In-memory bytes, written to the child through a pipe.
    Bytes(Vec<u8>),
    /// A file opened when the process is spawned and attached directly.
    File(PathBuf),
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}

/// What to run: executable, arguments, environment, directory and input.
///
/// A request can be invoked any number of times; each invocation spawns its
/// own process and feeds it the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Executable to spawn. A bare name is looked up in `PATH`.
    pub path: PathBuf,
    /// Arguments, in order, excluding the program name.
    pub args: Vec<String>,
    /// Environment assignments applied to the child.
    pub env: BTreeMap<String, String>,
    /// When `false`, the child sees only `env`; otherwise `env` extends the
    /// parent's environment.
    pub inherit_env: bool,
    /// Initial working directory. Defaults to the parent's.
    pub dir: Option<PathBuf>,
    /// Standard input. `None` attaches the null device.
    pub stdin: Option<Input>,
}

impl Request {
    /// Create a request for `path` with no arguments, the inherited
    /// environment, and no input.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            inherit_env: true,
            dir: None,
            stdin: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables.
    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Choose whether the parent's environment is inherited.
    #[must_use]
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Set the standard input source.
    #[must_use]
    pub fn stdin(mut self, input: impl Into<Input>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Read standard input from the file at `path`.
    #[must_use]
    pub fn stdin_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(Input::File(path.as_ref().to_path_buf()));
        self
    }

    /// The bytes that must be pumped into the child, if input is in memory.
    pub(crate) fn input_bytes(&self) -> Option<&[u8]> {
        match &self.stdin {
            Some(Input::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Build the command with piped output and the configured stdin.
    ///
    /// Fails when the path is empty or a stdin file cannot be opened.
    pub(crate) fn command(&self) -> io::Result<Command> {
        if self.path.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "executable path is empty",
            ));
        }

        let mut cmd = Command::new(&self.path);
        cmd.args(&self.args);

        if !self.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(&self.env);

        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        let stdin = match &self.stdin {
            None => Stdio::null(),
            Some(Input::Bytes(_)) => Stdio::piped(),
            Some(Input::File(path)) => {
                let file = File::open(path).map_err(|err| {
                    io::Error::new(err.kind(), format!("open stdin {}: {err}", path.display()))
                })?;
                Stdio::from(file)
            }
        };

        cmd.stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_platform_defaults() {
        let req = Request::new("/bin/true");
        assert_eq!(req.path, PathBuf::from("/bin/true"));
        assert!(req.args.is_empty());
        assert!(req.env.is_empty());
        assert!(req.inherit_env);
        assert!(req.dir.is_none());
        assert!(req.stdin.is_none());
    }

    #[test]
    fn builder_accumulates() {
        let req = Request::new("/bin/echo")
            .arg("one")
            .args(["two", "three"])
            .env("A", "1")
            .envs([("B", "2")])
            .inherit_env(false)
            .dir("/tmp")
            .stdin("hello");

        assert_eq!(req.args, vec!["one", "two", "three"]);
        assert_eq!(req.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(req.env.get("B").map(String::as_str), Some("2"));
        assert!(!req.inherit_env);
        assert_eq!(req.dir, Some(PathBuf::from("/tmp")));
        assert_eq!(req.stdin, Some(Input::Bytes(b"hello".to_vec())));
        assert_eq!(req.input_bytes(), Some(b"hello".as_slice()));
    }

    #[test]
    fn file_input_is_not_pumped() {
        let req = Request::new("/bin/cat").stdin_file("/etc/hostname");
        assert!(req.input_bytes().is_none());
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = Request::new("").command().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn missing_stdin_file_is_rejected() {
        let err = Request::new("/bin/cat")
            .stdin_file("/does-not-exist/input")
            .command()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("/does-not-exist/input"));
    }
}
