use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

use super::ps::ProcessEntry;
use crate::table;

/// Outcome of parsing one line of menu input.
#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Selected(usize),
    OutOfRange,
    NotANumber,
}

fn parse_choice(line: &str, count: usize) -> Choice {
    match line.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Choice::Selected(n - 1),
        Ok(_) => Choice::OutOfRange,
        Err(_) => Choice::NotANumber,
    }
}

/// Show the numbered process menu and prompt until the operator picks a row.
/// Bad input is reported and re-prompted, never fatal.
pub fn choose_process(processes: &[ProcessEntry]) -> Result<ProcessEntry> {
    println!("\n=== Running Processes ===");
    println!("{}", table::render_process_menu(processes));

    let mut stdin = io::stdin().lock();
    loop {
        print!("\nEnter the number of the process you want to target: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            bail!("stdin closed before a process was selected");
        }

        match parse_choice(&line, processes.len()) {
            Choice::Selected(index) => return Ok(processes[index].clone()),
            Choice::OutOfRange => {
                println!("[-] Invalid number, please choose a valid process number.")
            }
            Choice::NotANumber => println!("[-] Please enter a valid number."),
        }
    }
}
