//! Progress bars for index construction, with log lines printed above them.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Bar counting embedded chunks while an index is built
pub fn embedding_progress(total_chunks: u64) -> ProgressBar {
    let bar = multi_progress().add(ProgressBar::new(total_chunks));
    let style = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len} chunks")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message("Reading knowledge base");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Where a printed line ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineTarget {
    Progress,
    Stderr,
}

/// Print above the bars, or straight to stderr when the bars are hidden
/// (stderr is not a terminal), since a hidden target swallows `println`.
fn print_line(mp: &MultiProgress, line: &str) -> LineTarget {
    if mp.is_hidden() {
        eprintln!("{}", line);
        LineTarget::Stderr
    } else {
        let _ = mp.println(line);
        LineTarget::Progress
    }
}

/// Finish a bar and leave a summary line behind
pub fn finish_progress(bar: ProgressBar, message: &str) {
    bar.finish_and_clear();
    print_line(multi_progress(), message);
}

/// `MakeWriter` that prints complete log lines through the shared progress area
#[derive(Default, Clone)]
pub struct LogWriterFactory;

pub struct LogWriter {
    pending: Vec<u8>,
}

impl LogWriter {
    fn emit(line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        print_line(multi_progress(), text.trim_end_matches('\r'));
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        while let Some(idx) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=idx).collect();
            Self::emit(&line[..line.len() - 1]);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            Self::emit(&rest);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            pending: Vec::new(),
        }
    }
}
