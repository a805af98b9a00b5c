// src/exec/output.rs

//! Line reader over a runner's combined stdout/stderr pipe.

use std::io::{BufRead, BufReader, Read};

use tokio::sync::mpsc;
use tracing::debug;

const LINE_CHANNEL_CAPACITY: usize = 256;

/// Read `reader` line by line on a dedicated thread and return the receiver.
///
/// The receiver yields `None` at end-of-file, which only happens once every
/// process holding the write end has closed it. Dropping the receiver stops
/// the thread at its next line. The thread is detached, so a descendant that
/// keeps the pipe open never blocks runtime shutdown.
pub fn read_lines<R>(reader: R) -> std::io::Result<mpsc::Receiver<String>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    std::thread::Builder::new()
        .name("zps-output".to_string())
        .spawn(move || pump(reader, tx))?;
    Ok(rx)
}

fn pump<R: Read>(reader: R, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf: Vec<u8> = Vec::with_capacity(8 * 1024);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                trim_newline(&mut buf);
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "output read failed");
                break;
            }
        }
    }
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
