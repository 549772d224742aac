//! Progress reporting for a planning run
//!
//! Progress is cosmetic. It goes to its own stream (stderr in the binary) and
//! write failures on that stream are ignored.

use std::io::Write;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Observer of traversal progress
pub trait ProgressReporter {
    /// `completed` directory pairs out of an estimated `total`
    fn update(&mut self, completed: usize, total: usize);

    /// End the progress display, optionally with a closing message
    fn finish(&mut self, message: Option<&str>);
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&mut self, _completed: usize, _total: usize) {}

    fn finish(&mut self, _message: Option<&str>) {}
}

/// Single status line rewritten in place with a carriage return
pub struct ConsoleProgress<W: Write> {
    out: W,
    spinner_idx: usize,
    last_len: usize,
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            spinner_idx: 0,
            last_len: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, completed: usize, total: usize) -> std::io::Result<()> {
        let percent = if total == 0 {
            0
        } else {
            completed.saturating_mul(100) / total
        };

        let status = format!(
            "{} ({}/{} {}%)",
            SPINNER[self.spinner_idx], completed, total, percent
        );
        // Pad over whatever is left of a longer previous status
        let padding = self.last_len.saturating_sub(status.len());
        write!(self.out, "{}{:padding$}\r", status, "", padding = padding)?;
        self.out.flush()?;

        self.last_len = status.len();
        self.spinner_idx = (self.spinner_idx + 1) % SPINNER.len();
        Ok(())
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn update(&mut self, completed: usize, total: usize) {
        self.render(completed, total).ok();
    }

    fn finish(&mut self, message: Option<&str>) {
        let _ = write!(self.out, "\r\n");
        if let Some(message) = message {
            let _ = writeln!(self.out, "{}", message);
        }
        self.out.flush().ok();
        self.last_len = 0;
    }
}
