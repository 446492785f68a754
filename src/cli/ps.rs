use anyhow::{bail, Context, Result};
use tokio::process::Command;

/// One row of the `frida-ps` application listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: String,
    pub name: String,
    pub identifier: String,
}

/// Enumerate applications on the USB-attached device via `frida-ps -aU`.
pub async fn list_processes() -> Result<Vec<ProcessEntry>> {
    let output = match Command::new("frida-ps").arg("-aU").output().await {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("[-] 'frida-ps' was not found; install frida-tools and make sure it is on PATH.");
            std::process::exit(1);
        }
        Err(err) => return Err(err).context("failed to run frida-ps"),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || stdout.trim().is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "failed to retrieve running processes ({}); make sure a device is connected{}",
            output.status,
            if stderr.trim().is_empty() {
                String::new()
            } else {
                format!(": {}", stderr.trim())
            }
        );
    }

    parse_listing(&stdout)
}

/// Parse the tabular listing. The first line is a header; each following row
/// is whitespace-delimited with the PID first and the application identifier
/// last. Everything in between, joined by single spaces, is the display name.
/// Rows whose name is dashes only are column separators and are skipped.
pub fn parse_listing(raw: &str) -> Result<Vec<ProcessEntry>> {
    if raw.trim().is_empty() {
        bail!("empty process listing");
    }

    let mut entries = Vec::new();
    for line in raw.lines().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let name = if tokens.len() > 2 {
            tokens[1..tokens.len() - 1].join(" ")
        } else {
            String::new()
        };
        if name.replace('-', "").is_empty() {
            continue;
        }

        entries.push(ProcessEntry {
            pid: tokens[0].to_string(),
            name,
            identifier: tokens[tokens.len() - 1].to_string(),
        });
    }

    log::debug!("parsed {} process rows", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
 PID  Name          Identifier
----  ------------  --------------------
1234  Gadget Test   com.example.gadget
 567  Settings      com.android.settings
";

    #[test]
    fn test_rows_parsed_in_order() {
        let entries = parse_listing(LISTING).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            ProcessEntry {
                pid: "1234".to_string(),
                name: "Gadget Test".to_string(),
                identifier: "com.example.gadget".to_string(),
            }
        );
        assert_eq!(entries[1].pid, "567");
        assert_eq!(entries[1].name, "Settings");
        assert_eq!(entries[1].identifier, "com.android.settings");
    }

    #[test]
    fn test_name_joins_middle_tokens_with_single_spaces() {
        let raw = "PID Name Identifier\n42 My   Cool    App com.example.cool\n";
        let entries = parse_listing(raw).unwrap();
        assert_eq!(entries[0].name, "My Cool App");
        assert_eq!(entries[0].identifier, "com.example.cool");
    }

    #[test]
    fn test_separator_rows_are_skipped() {
        let entries = parse_listing(LISTING).unwrap();
        assert!(entries.iter().all(|e| !e.name.starts_with('-')));
    }

    #[test]
    fn test_rows_without_a_name_are_skipped() {
        let raw = "PID Name Identifier\n99 com.example.nameless\n";
        let entries = parse_listing(raw).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_empty_listing_is_an_error() {
        assert!(parse_listing("").is_err());
        assert!(parse_listing("   \n \t ").is_err());
    }

    #[test]
    fn test_header_line_is_discarded() {
        let raw = "1 header com.looks.like.a.row\n2 Real App com.example.real\n";
        let entries = parse_listing(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, "com.example.real");
    }
}
