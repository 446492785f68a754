use std::os::fd::AsFd;
use std::os::fd::AsRawFd;

use nix::ioctl_read;
use nix::libc;

use tabled::builder::Builder;
use tabled::settings::{
    object::Segment,
    peaker::{PriorityMax, PriorityMin},
    Alignment, Settings, Style, Width,
};

use crate::cli::ps::ProcessEntry;

/// Render the numbered process menu, wrapped to the terminal width. Column
/// alignment pads every name to the widest one in the listing.
pub fn render_process_menu(processes: &[ProcessEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "Name", "Identifier", "PID"]);
    for (index, process) in processes.iter().enumerate() {
        builder.push_record([
            (index + 1).to_string(),
            process.name.clone(),
            process.identifier.clone(),
            process.pid.clone(),
        ]);
    }

    let termwidth = terminal_width().unwrap_or(80) as usize;
    let mut table = builder.build();
    table.with(Style::sharp());
    table.modify(
        Segment::all(),
        Settings::new(Alignment::left(), Alignment::top()),
    );
    table.with((
        Width::wrap(termwidth).priority(PriorityMax::default()),
        Width::increase(termwidth).priority(PriorityMin::default()),
    ));
    table.to_string()
}

fn terminal_width() -> Option<u32> {
    terminal_size_of(std::io::stdout())
}

ioctl_read!(get_winsize, libc::TIOCGWINSZ, 0, libc::winsize);

fn terminal_size_of<Fd: AsFd>(fd: Fd) -> Option<u32> {
    use nix::unistd::isatty;
    if !isatty(fd.as_fd().as_raw_fd()).unwrap_or(false) {
        return None;
    }

    let winsize = unsafe {
        let mut winsize = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        get_winsize(fd.as_fd().as_raw_fd(), &mut winsize).ok()?;
        winsize
    };
    let cols = winsize.ws_col;

    if cols > 0 {
        Some(cols as u32)
    } else {
        None
    }
}
