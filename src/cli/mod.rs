use anyhow::{bail, Result};
use clap::Parser;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

pub mod attempt;
pub mod ps;
pub mod scripts;
pub mod select;

use attempt::InjectionAttempt;

fn get_build_info() -> String {
    let mut info = env!("CARGO_PKG_VERSION").to_string();

    if let Some(timestamp) = option_env!("VERGEN_BUILD_TIMESTAMP") {
        info.push_str(&format!("\nBuild Timestamp: {timestamp}"));
    }

    if let Some(rustc_version) = option_env!("VERGEN_RUSTC_SEMVER") {
        info.push_str(&format!("\nrustc version: {rustc_version}"));
    }

    info
}

static BUILD_INFO: Lazy<String> = Lazy::new(get_build_info);

/// Try every Frida script in the working directory against an application on
/// a USB-connected device, one after another, until one of them sticks
#[derive(Parser, Debug)]
#[command(version = BUILD_INFO.as_str())]
pub struct Cli {}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        println!("=== Frida Script Executor ===");

        let processes = ps::list_processes().await?;
        if processes.is_empty() {
            bail!("no running applications reported by frida-ps");
        }

        let target = select::choose_process(&processes)?;
        println!(
            "\n[+] Selected process: {} (PID: {})",
            target.name, target.pid
        );

        let scripts = scripts::discover_scripts()?;
        if scripts.is_empty() {
            bail!("no Frida scripts (.js files) found in the current directory");
        }
        println!("\n[+] Found {} Frida script(s) to test.", scripts.len());

        let attempt = InjectionAttempt::default();
        match run_attempts(&attempt, &scripts, &target.identifier).await {
            Some(script) => println!("\n[+] Bypass succeeded with {}.", script.display()),
            None => println!(
                "\n[-] Custom root detection or SSL pinning still in place. No script succeeded."
            ),
        }
        Ok(())
    }
}

/// Run the candidates in order and stop at the first attempt that reports
/// success. Failures of a single script are contained here; only a missing
/// `frida` binary aborts the whole run.
pub async fn run_attempts<'a>(
    attempt: &InjectionAttempt,
    scripts: &'a [PathBuf],
    identifier: &str,
) -> Option<&'a Path> {
    for script in scripts {
        match attempt.run(script, identifier).await {
            Ok(true) => return Some(script),
            Ok(false) => {}
            Err(err) => eprintln!(
                "[-] Unexpected error running {}: {err:#}",
                script.display()
            ),
        }
    }
    None
}
