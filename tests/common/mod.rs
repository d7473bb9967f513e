#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn temp_dir(prefix: &str) -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let mut dir = std::env::temp_dir();
    dir.push(format!("flashmerge_{prefix}_{}_{}", std::process::id(), id));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(path: &Path, data: &[u8]) {
    std::fs::write(path, data).unwrap();
}

pub fn run_flashmerge(args: &[String]) -> Output {
    run_flashmerge_in(args, &std::env::temp_dir())
}

pub fn run_flashmerge_in(args: &[String], cwd: &Path) -> Output {
    run_flashmerge_with_env(args, cwd, &[])
}

pub fn run_flashmerge_with_env(args: &[String], cwd: &Path, vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flashmerge"));
    cmd.args(args)
        .current_dir(cwd)
        .env_remove("FLASHMERGE_LAYOUT")
        .env_remove("FLASHMERGE_FLASH_SIZE")
        .env_remove("RUST_LOG");
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn assert_success(output: &Output) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("flashmerge failed: {stderr}");
    }
}

pub fn assert_failure(output: &Output) {
    if output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("flashmerge unexpectedly succeeded: {stderr}");
    }
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
