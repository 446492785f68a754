use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Signals shared between the two stream readers and the polling loop.
/// Relaxed atomics are enough: the timers are a liveness heuristic, and a
/// store landing one polling round late cannot change an attempt's outcome
/// in any way that matters.
#[derive(Default)]
struct Activity {
    success: AtomicBool,
    last_output_ms: AtomicU64,
}

/// One spawn-and-inject attempt: launches the instrumentation command against
/// a package and watches the combined child output for signs of life.
///
/// The timer fields exist so tests can compress the clock; `default()` is
/// what the driver uses.
#[derive(Debug, Clone)]
pub struct InjectionAttempt {
    /// Instrumentation command to invoke. Resolved via PATH by default.
    pub program: PathBuf,
    /// Silence longer than this abandons the attempt and kills the child.
    pub idle_timeout: Duration,
    /// Output still flowing past this mark is itself treated as success.
    pub sustain_success: Duration,
    /// How often the monitoring loop re-checks the two timers.
    pub poll_interval: Duration,
}

impl Default for InjectionAttempt {
    fn default() -> Self {
        Self {
            program: "frida".into(),
            idle_timeout: Duration::from_secs(10),
            sustain_success: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    KeepWaiting,
    AbandonIdle,
    SuccessByActivity,
}

impl InjectionAttempt {
    /// Spawn the package suspended on the USB device, load the script into it
    /// and monitor the output. `Ok(true)` means the script looks like it got
    /// through; `Err` is an attempt-level failure the caller may move on from.
    pub async fn run(&self, script: &Path, identifier: &str) -> Result<bool> {
        println!(
            "\n[+] Attempting to spawn {identifier} and run {}...",
            script.display()
        );
        log::debug!(
            "launching {} -U -f {identifier} -l {}",
            self.program.display(),
            script.display()
        );

        let mut child = match Command::new(&self.program)
            .arg("-U")
            .args(["-f", identifier])
            .arg("-l")
            .arg(script)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "[-] '{}' was not found; install frida and make sure it is on PATH.",
                    self.program.display()
                );
                std::process::exit(1);
            }
            Err(err) => return Err(err).context("failed to spawn the instrumentation command"),
        };

        let started = Instant::now();
        let activity = Arc::new(Activity::default());

        let stdout = child.stdout.take().context("child stdout was not captured")?;
        let stderr = child.stderr.take().context("child stderr was not captured")?;
        let readers = [
            spawn_reader(stdout, activity.clone(), started),
            spawn_reader(stderr, activity.clone(), started),
        ];

        loop {
            tokio::time::sleep(self.poll_interval).await;

            let elapsed = started.elapsed();
            let last_output =
                Duration::from_millis(activity.last_output_ms.load(Ordering::Relaxed));
            let idle = elapsed.saturating_sub(last_output);

            match self.assess(elapsed, idle) {
                Verdict::AbandonIdle => {
                    println!(
                        "[-] No activity detected from {} for {} seconds, moving to the next script.",
                        script.display(),
                        self.idle_timeout.as_secs()
                    );
                    child
                        .start_kill()
                        .context("failed to terminate the unresponsive child")?;
                    child
                        .wait()
                        .await
                        .context("failed to reap the terminated child")?;
                    return Ok(false);
                }
                Verdict::SuccessByActivity => {
                    println!(
                        "[+] Script {} is running for more than {} seconds with activity, letting it continue.",
                        script.display(),
                        self.sustain_success.as_secs()
                    );
                    // The bypass is live inside the target; killing the child
                    // would undo it. Dropping the handle detaches on purpose.
                    drop(child);
                    return Ok(true);
                }
                Verdict::KeepWaiting => {}
            }

            if readers.iter().all(|reader| reader.is_finished()) {
                break;
            }
        }

        let succeeded = activity.success.load(Ordering::Relaxed);
        if succeeded {
            println!("[+] Script {} succeeded.", script.display());
        } else {
            println!("[-] Script {} did not succeed.", script.display());
        }
        Ok(succeeded)
    }

    /// The idle check wins over the sustained-activity check, and both
    /// thresholds are strict.
    fn assess(&self, elapsed: Duration, idle: Duration) -> Verdict {
        if idle > self.idle_timeout {
            Verdict::AbandonIdle
        } else if elapsed > self.sustain_success {
            Verdict::SuccessByActivity
        } else {
            Verdict::KeepWaiting
        }
    }
}

/// Drain one child stream line by line: echo each line to the operator as it
/// arrives, stamp the shared last-output clock, and raise the success flag on
/// any line containing "success" in any casing.
fn spawn_reader<R>(stream: R, activity: Arc<Activity>, started: Instant) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("{line}");
            activity
                .last_output_ms
                .store(started.elapsed().as_millis() as u64, Ordering::Relaxed);
            if line.to_lowercase().contains("success") {
                activity.success.store(true, Ordering::Relaxed);
            }
        }
    })
}
