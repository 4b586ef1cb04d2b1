// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! A command-line front end for `reduce-core`: reads an input file, treats an external
//! shell command as the interestingness predicate, and shrinks the file in place,
//! leaving the smallest interesting version alongside a `.orig` backup of the input.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use reduce_core::{ReduceError, Reducer};
use wait_timeout::ChildExt;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Shrinks `input_file` to a minimal example that `test_command` still considers
/// interesting, by repeatedly running `test_command` against candidate shrinks.
struct CliOptions {
    /// The file to reduce. Overwritten in place with each accepted shrink.
    input_file: PathBuf,

    /// The shell command line to run against a candidate. The candidate is piped to its
    /// stdin; the exit code (by default, zero) decides whether it is "interesting".
    test_command: String,

    /// Maximum time to let a single invocation of `test_command` run before treating it
    /// as uninteresting.
    #[arg(long, default_value = "5")]
    timeout: f64,

    /// Exit code from `test_command` that marks a candidate as interesting.
    #[arg(long, default_value_t = 0)]
    interesting_exit_code: i32,

    /// Log every accepted shrink at debug level.
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = CliOptions::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "info" }),
    )
    .init();

    let initial =
        std::fs::read(&args.input_file).with_context(|| format!("reading {:?}", args.input_file))?;
    let backup_path = backup_path_for(&args.input_file);
    std::fs::write(&backup_path, &initial)
        .with_context(|| format!("writing backup {backup_path:?}"))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("installing SIGINT handler")?;
    }

    let command_words =
        shell_words::split(&args.test_command).context("parsing test_command as a shell command")?;
    if command_words.is_empty() {
        bail!("test_command must not be empty");
    }
    let timeout = Duration::from_secs_f64(args.timeout);
    let interesting_exit_code = args.interesting_exit_code;

    let predicate = move |candidate: &[u8]| -> bool {
        run_predicate(&command_words, candidate, timeout, interesting_exit_code)
            .unwrap_or(false)
    };

    let mut reducer = match Reducer::new(initial, predicate, args.debug, interrupted) {
        Ok(reducer) => reducer,
        Err(ReduceError::InvalidInitial) => {
            bail!("the initial contents of {:?} are not interesting", args.input_file)
        }
        Err(e) => return Err(e.into()),
    };

    let result = reducer.reduce();
    std::fs::write(&args.input_file, reducer.current())
        .with_context(|| format!("writing {:?}", args.input_file))?;
    log::info!(
        "reduced {:?} from {} to {} bytes",
        args.input_file,
        std::fs::metadata(&backup_path)?.len(),
        reducer.current().len()
    );

    match result {
        Ok(()) => Ok(()),
        Err(ReduceError::Interrupted) => {
            log::info!("interrupted; kept the best shrink found so far");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn backup_path_for(input: &std::path::Path) -> PathBuf {
    let mut backup = input.as_os_str().to_os_string();
    backup.push(".orig");
    PathBuf::from(backup)
}

/// Runs `command` with `candidate` piped to its stdin, and reports whether its exit
/// code matched `interesting_exit_code` within `timeout`. Stdin is written from a
/// helper thread so that a child which doesn't drain its input before producing output
/// can't deadlock us against a full pipe buffer.
fn run_predicate(
    command: &[String],
    candidate: &[u8],
    timeout: Duration,
    interesting_exit_code: i32,
) -> anyhow::Result<bool> {
    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawning {:?}", command[0]))?;

    let mut stdin = child.stdin.take().expect("stdin was piped");
    let candidate = candidate.to_vec();
    let writer = std::thread::spawn(move || {
        let _ = stdin.write_all(&candidate);
    });

    let status = match child
        .wait_timeout(timeout)
        .context("waiting for test_command")?
    {
        Some(status) => status,
        None => {
            child.kill().ok();
            child.wait().ok();
            let _ = writer.join();
            return Ok(false);
        }
    };
    let _ = writer.join();

    Ok(status.code() == Some(interesting_exit_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_defaults_match_spec() {
        let args = CliOptions::parse_from(["reduce", "crash.c", "gcc -c crash.c"]);
        assert_eq!(args.input_file, PathBuf::from("crash.c"));
        assert_eq!(args.test_command, "gcc -c crash.c");
        assert_eq!(args.timeout, 5.0);
        assert_eq!(args.interesting_exit_code, 0);
        assert!(!args.debug);
    }

    #[test]
    fn timeout_and_exit_code_and_debug_are_overridable() {
        let args = CliOptions::parse_from([
            "reduce",
            "--timeout",
            "30",
            "--interesting-exit-code",
            "1",
            "--debug",
            "crash.c",
            "gcc -c crash.c",
        ]);
        assert_eq!(args.timeout, 30.0);
        assert_eq!(args.interesting_exit_code, 1);
        assert!(args.debug);
    }

    #[test]
    fn backup_path_appends_orig_suffix() {
        assert_eq!(
            backup_path_for(std::path::Path::new("crash.c")),
            PathBuf::from("crash.c.orig")
        );
    }

    #[test]
    fn run_predicate_accepts_matching_exit_code() {
        let command = vec!["true".to_string()];
        let result = run_predicate(&command, b"anything", Duration::from_secs(2), 0).unwrap();
        assert!(result);
    }

    #[test]
    fn run_predicate_rejects_mismatched_exit_code() {
        let command = vec!["false".to_string()];
        let result = run_predicate(&command, b"anything", Duration::from_secs(2), 0).unwrap();
        assert!(!result);
    }

    #[test]
    fn run_predicate_rejects_on_timeout() {
        let command = vec!["sleep".to_string(), "5".to_string()];
        let result =
            run_predicate(&command, b"anything", Duration::from_millis(100), 0).unwrap();
        assert!(!result);
    }
}
