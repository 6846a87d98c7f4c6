use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Directory polybar creates its IPC queues in.
pub const DEFAULT_IPC_DIRECTORY: &str = "/tmp";

const QUEUE_PREFIX: &str = "polybar_mqueue.";

// polybar sometimes drops messages that arrive back to back.
const MESSAGE_DELAY: Duration = Duration::from_millis(10);

/// Sends hook messages to every running polybar instance through its message queue
/// (`polybar_mqueue.<pid>`).
#[derive(Debug, Clone)]
pub struct PolybarIpc {
    directory: PathBuf,
    delay: Duration,
}

impl Default for PolybarIpc {
    fn default() -> Self {
        PolybarIpc::new(DEFAULT_IPC_DIRECTORY)
    }
}

impl PolybarIpc {
    /// Use the message queues found in `directory`.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        PolybarIpc {
            directory: directory.into(),
            delay: MESSAGE_DELAY,
        }
    }

    /// The directory searched for message queues.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Message queues of all running polybar instances.
    pub fn queues(&self) -> io::Result<Vec<PathBuf>> {
        let mut queues = Vec::new();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let is_queue = entry
                .file_name()
                .to_str()
                .map_or(false, |name| name.starts_with(QUEUE_PREFIX));

            if is_queue {
                queues.push(entry.path());
            }
        }

        queues.sort();
        Ok(queues)
    }

    /// Writes each message to each queue, in order.
    ///
    /// A queue that cannot be written is skipped so the other bars still get their messages. The
    /// number of queues that received all messages is returned.
    pub fn send(&self, messages: &[&str]) -> io::Result<usize> {
        let mut delivered = 0;

        for queue in self.queues()? {
            match self.send_to(&queue, messages) {
                Ok(()) => delivered += 1,
                Err(error) => log::warn!("Could not write to '{}': {}", queue.display(), error),
            }
        }

        Ok(delivered)
    }

    fn send_to(&self, queue: &Path, messages: &[&str]) -> io::Result<()> {
        for message in messages {
            let mut file = OpenOptions::new().append(true).open(queue)?;
            file.write_all(message.as_bytes())?;
            log::info!("Sending the message '{}' to '{}'", message, queue.display());

            thread::sleep(self.delay);
        }

        Ok(())
    }
}
