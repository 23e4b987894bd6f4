#![cfg(unix)]

//! End-to-end checks against the built `sealexec` binary. These cover what a
//! test process cannot do to itself: replacing its own image and dropping
//! privileges for good.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn sealexec() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sealexec"));
    cmd.env_remove("SEALEXEC_LOG");
    cmd
}

fn secrets_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn same_process_sees_exactly_the_given_environment() -> TestResult {
    let secrets = secrets_file("API_KEY=abc123\n# ignored\nDB_URL=postgres://x\n");

    let child = sealexec()
        .args(["exec-env", "--pristine", "--same-process", "--plaintext"])
        .arg(secrets.path())
        .args(["--env", "PATH=/usr/bin:/bin", "--", "echo pid=$$; env"])
        .stdout(Stdio::piped())
        .spawn()?;
    let pid = child.id();
    let out = child.wait_with_output()?;
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout)?;
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some(format!("pid={pid}").as_str()), "process image was replaced in place");

    let mut env: Vec<&str> = lines
        .filter(|l| !l.starts_with("PWD=") && !l.starts_with("SHLVL=") && !l.starts_with("_="))
        .collect();
    env.sort();
    assert_eq!(env, ["API_KEY=abc123", "DB_URL=postgres://x", "PATH=/usr/bin:/bin"]);
    Ok(())
}

#[test]
fn spawned_child_exit_code_is_propagated() -> TestResult {
    let secrets = secrets_file("CODE=5\n");
    let status = sealexec()
        .args(["exec-env", "--plaintext"])
        .arg(secrets.path())
        .args(["--", "exit $CODE"])
        .status()?;
    assert_eq!(status.code(), Some(5));
    Ok(())
}

#[test]
fn file_delivery_reads_plaintext_from_stdin() -> TestResult {
    let mut child = sealexec()
        .args(["exec-file", "--pipe-timeout", "10s", "--", "cat {}"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;
    child.stdin.take().unwrap().write_all(b"{\"token\":\"abc\"}")?;

    let out = child.wait_with_output()?;
    assert!(out.status.success());
    assert_eq!(out.stdout, b"{\"token\":\"abc\"}");
    Ok(())
}

#[test]
fn unknown_user_is_fatal() -> TestResult {
    let secrets = secrets_file("A=1\n");
    let out = sealexec()
        .args(["exec-env", "--user", "sealexec-no-such-user-7f3a", "--plaintext"])
        .arg(secrets.path())
        .args(["--", "echo should-not-run"])
        .output()?;

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("could not resolve user"), "{stderr}");
    Ok(())
}

#[test]
fn dropped_privileges_cannot_be_regained() -> TestResult {
    if !nix::unistd::geteuid().is_root() {
        return Ok(());
    }
    let Ok(nobody) = sealexec::identity::resolve("nobody") else {
        return Ok(());
    };

    let secrets = secrets_file("A=1\n");
    let out = sealexec()
        .args(["exec-env", "--user", "nobody", "--same-process", "--pristine", "--plaintext"])
        .arg(secrets.path())
        .args(["--env", "PATH=/usr/bin:/bin", "--", "id -u; id -g"])
        .output()?;

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout)?;
    let ids: Vec<&str> = stdout.lines().collect();
    assert_eq!(ids, [nobody.uid.to_string(), nobody.gid.to_string()]);
    Ok(())
}
