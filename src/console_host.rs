//! Host collaborators backed by the terminal.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use quest_packet_core::{ContentHost, Error, QuestHost, Result, TaskKey, TaskStatus};

/// Keeps the host-side registries in memory and prints notifications.
///
/// The registries own de-duplication: registering an id twice is an error.
pub struct ConsoleHost {
    items: Mutex<HashMap<String, String>>,
    tasks: Mutex<HashMap<TaskKey, TaskStatus>>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleHost {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Write one line of output.
    pub fn print(&self, line: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| Error::host("console output lock poisoned"))?;
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| Error::host(format!("console write failed: {}", e)))
    }
}

impl ContentHost for ConsoleHost {
    fn register_item(&self, item_id: &str, locator: &str, label: &str, kind: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::host("item registry lock poisoned"))?;
        if items.contains_key(item_id) {
            return Err(Error::DuplicateItem(item_id.to_string()));
        }
        items.insert(item_id.to_string(), locator.to_string());
        tracing::debug!(item_id, locator, label, kind, "Host registered item");
        Ok(())
    }
}

impl QuestHost for ConsoleHost {
    fn register_task(&self, quest_id: &str, task_id: &str, description: &str) -> Result<()> {
        let key = TaskKey::new(quest_id, task_id);
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| Error::host("quest registry lock poisoned"))?;
        if tasks.contains_key(&key) {
            return Err(Error::DuplicateTask(key.to_string()));
        }
        tasks.insert(key, TaskStatus::Pending);
        tracing::debug!(quest_id, task_id, description, "Host registered task");
        Ok(())
    }

    fn update_task(&self, quest_id: &str, task_id: &str, status: TaskStatus) -> Result<()> {
        let key = TaskKey::new(quest_id, task_id);
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| Error::host("quest registry lock poisoned"))?;
        match tasks.get_mut(&key) {
            Some(current) => {
                *current = status;
                Ok(())
            }
            None => Err(Error::UnknownTask(key.to_string())),
        }
    }

    fn notify_player(&self, message: &str) -> Result<()> {
        self.print(&format!(">> {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Writer sharing its buffer with the test.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_registries_reject_duplicates() {
        let host = ConsoleHost::new(Box::new(std::io::sink()));
        host.register_item("a", "https://a.test", "A", "webpage").unwrap();
        assert!(matches!(
            host.register_item("a", "https://a.test", "A", "webpage"),
            Err(Error::DuplicateItem(_))
        ));
        host.register_task("q", "t", "task").unwrap();
        assert!(host.register_task("q", "t", "task").is_err());
    }

    #[test]
    fn test_update_mirrors_status() {
        let host = ConsoleHost::new(Box::new(std::io::sink()));
        host.register_task("q", "t", "task").unwrap();
        host.update_task("q", "t", TaskStatus::Completed).unwrap();
        assert_eq!(
            host.tasks.lock().unwrap().get(&TaskKey::new("q", "t")),
            Some(&TaskStatus::Completed)
        );
        assert!(matches!(
            host.update_task("q", "missing", TaskStatus::Completed),
            Err(Error::UnknownTask(_))
        ));
    }

    #[test]
    fn test_notifications_are_printed() {
        let buffer = SharedBuffer::default();
        let host = ConsoleHost::new(Box::new(buffer.clone()));
        host.notify_player("Quest started").unwrap();
        assert_eq!(buffer.text(), ">> Quest started\n");
    }
}
