use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

static BUFFER: Mutex<Option<Vec<String>>> = Mutex::new(None);

/// Activate buffering. While active, log lines are stored instead of being
/// printed to stderr.
pub fn activate() {
    *BUFFER.lock().unwrap_or_else(PoisonError::into_inner) = Some(Vec::new());
}

/// Deactivate buffering and return all collected messages.
pub fn drain() -> Vec<String> {
    BUFFER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or_default()
}

/// Write a message. If buffering is active the message is stored;
/// otherwise it is printed to stderr immediately.
pub fn warn(msg: String) {
    let mut guard = BUFFER.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(buf) = guard.as_mut() {
        buf.push(msg);
    } else {
        drop(guard);
        eprintln!("{}", msg);
    }
}

/// `io::Write` sink for the log subscriber that routes through the buffer.
#[derive(Debug, Default)]
pub struct BufferedStderr;

impl Write for BufferedStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let text = text.trim_end_matches('\n');
        if !text.is_empty() {
            warn(text.to_string());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so parallel runs don't race on the global buffer
    #[test]
    fn test_buffer_lifecycle() {
        activate();
        warn("first".to_string());
        let mut sink = BufferedStderr;
        sink.write_all(b"second\n").unwrap();
        sink.write_all(b"\n").unwrap();

        let drained = drain();
        assert_eq!(drained, vec!["first".to_string(), "second".to_string()]);

        // Inactive buffer drains empty
        assert!(drain().is_empty());
    }
}
