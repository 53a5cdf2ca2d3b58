// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! External package index tools.

Lookups are answered by scraping the output of `apt-cache` and `apt-file`
pointed at a per-distro state directory. The boundary to those tools is the
[IndexInvoker] trait so the parsing and selection layers stay pure: the
production implementation shells out, tests substitute canned text.
*/

use {
    crate::error::{LookupError, Result},
    log::debug,
    std::{
        io::Read,
        path::PathBuf,
        process::{Command, Stdio},
        thread,
        time::{Duration, Instant},
    },
};

/// `apt-cache` query modes used by lookups.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexMode {
    /// `search -n`: match package names only.
    Search,
    /// `show`: binary package records.
    Show,
    /// `showsrc`: source package records.
    ShowSrc,
}

impl IndexMode {
    fn arguments(&self) -> &'static [&'static str] {
        match self {
            Self::Search => &["search", "-n"],
            Self::Show => &["show"],
            Self::ShowSrc => &["showsrc"],
        }
    }
}

/// Boundary to the external index tools.
pub trait IndexInvoker {
    /// Run a package index query and return the raw tool output.
    fn query_index(&self, distro: &str, mode: IndexMode, term: &str) -> Result<String>;

    /// Run a file-contents search and return the raw tool output.
    fn search_files(&self, distro: &str, term: &str) -> Result<String>;
}

/// Production invoker shelling out to `apt-cache` and `apt-file`.
pub struct AptInvoker {
    aptdir: PathBuf,
    architecture: String,
    timeout: Duration,
}

impl AptInvoker {
    pub fn new(aptdir: impl Into<PathBuf>, architecture: impl Into<String>, timeout: Duration) -> Self {
        Self {
            aptdir: aptdir.into(),
            architecture: architecture.into(),
            timeout,
        }
    }

    fn apt_cache_command(&self, distro: &str, mode: IndexMode, term: &str) -> Command {
        let aptdir = self.aptdir.display();

        let mut command = Command::new("apt-cache");
        command
            .arg(format!("-oDir::State::Lists={}/{}", aptdir, distro))
            .arg(format!("-oDir::etc::sourcelist={}/{}.list", aptdir, distro))
            .arg(format!("-oDir::State::status={}/{}.status", aptdir, distro))
            .arg(format!("-oDir::Cache={}/cache", aptdir))
            .arg(format!("-oAPT::Architecture={}", self.architecture))
            .args(mode.arguments())
            .arg(term)
            .env("LANG", "C");

        command
    }

    fn apt_file_command(&self, distro: &str, term: &str) -> Command {
        let aptdir = self.aptdir.display();

        let mut command = Command::new("apt-file");
        command
            .arg("-s")
            .arg(format!("{}/{}.list", aptdir, distro))
            .arg("-c")
            .arg(format!("{}/apt-file/{}", aptdir, distro))
            .arg("-l")
            .arg("search")
            .arg(term)
            .env("LANG", "C");

        command
    }
}

impl IndexInvoker for AptInvoker {
    fn query_index(&self, distro: &str, mode: IndexMode, term: &str) -> Result<String> {
        run_with_timeout(self.apt_cache_command(distro, mode, term), self.timeout)
    }

    fn search_files(&self, distro: &str, term: &str) -> Result<String> {
        run_with_timeout(self.apt_file_command(distro, term), self.timeout)
    }
}

/// Run a command to completion, capturing stdout followed by stderr.
///
/// The tools report conditions like a missing cache on stderr, and callers
/// sniff the combined output for them, so both streams are kept. A child
/// that outlives `timeout` is killed and reported as
/// [LookupError::IndexToolTimeout]; the exit status is otherwise ignored
/// since the tools communicate failure through their output.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<String> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("running {:?}", command);

    let mut child = command.spawn()?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait()? {
            Some(_) => break,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LookupError::IndexToolTimeout(timeout));
            }
            None => thread::sleep(Duration::from_millis(10)),
        }
    }

    let mut output = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr);
    }

    Ok(output)
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();

        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut bytes);
        }

        String::from_utf8_lossy(&bytes).into_owned()
    })
}
