use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use campus_match::Notifier;
use campus_types::events::Notification;
use campus_types::models::StudentId;

/// Routes notifications to the connected client of each student.
///
/// Plain `std` locks: the engine notifies from blocking DB threads and every
/// critical section is a map lookup.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// Per-student targeted send channels: student_id -> (conn_id, sender)
    student_channels: RwLock<HashMap<StudentId, (u64, mpsc::UnboundedSender<Notification>)>>,

    next_conn_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a per-student channel. A newer registration replaces the
    /// previous one. Returns (conn_id, receiver).
    pub fn register(&self, student_id: StudentId) -> (u64, mpsc::UnboundedReceiver<Notification>) {
        let conn_id = self.inner.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        match self.inner.student_channels.write() {
            Ok(mut channels) => {
                channels.insert(student_id, (conn_id, tx));
            }
            Err(e) => warn!("Dispatcher lock poisoned on register: {}", e),
        }
        (conn_id, rx)
    }

    /// Unregister, but only if `conn_id` still owns the student's channel.
    pub fn unregister(&self, student_id: StudentId, conn_id: u64) {
        let Ok(mut channels) = self.inner.student_channels.write() else {
            return;
        };
        if channels.get(&student_id).is_some_and(|(owner, _)| *owner == conn_id) {
            channels.remove(&student_id);
        }
    }

    pub fn is_connected(&self, student_id: StudentId) -> bool {
        self.inner
            .student_channels
            .read()
            .map(|channels| channels.contains_key(&student_id))
            .unwrap_or(false)
    }

    /// Send a targeted event to one student. Dropped when they are offline.
    pub fn send_to_student(&self, student_id: StudentId, event: Notification) {
        let Ok(channels) = self.inner.student_channels.read() else {
            warn!("Dispatcher lock poisoned; dropping event for {}", student_id);
            return;
        };
        match channels.get(&student_id) {
            Some((_, tx)) => {
                let _ = tx.send(event);
            }
            None => debug!("Student {} offline; event dropped", student_id),
        }
    }
}

impl Notifier for Dispatcher {
    fn notify(&self, student_id: StudentId, notification: Notification) {
        self.send_to_student(student_id, notification);
    }
}
