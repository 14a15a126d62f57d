use campus_types::events::Notification;
use campus_types::models::{Match, StudentId};

/// Fire-and-forget delivery to a connected student. Implementations must
/// not block; delivery guarantees belong to the transport.
pub trait Notifier: Send + Sync {
    fn notify(&self, student_id: StudentId, notification: Notification);
}

/// Tell both parties about a freshly created match.
pub(crate) fn announce_match(notifier: &dyn Notifier, record: &Match) {
    for (me, other) in [
        (record.student1_id, record.student2_id),
        (record.student2_id, record.student1_id),
    ] {
        notifier.notify(
            me,
            Notification::MatchCreated {
                match_id: record.id,
                student_id: other,
                created_at: record.created_at,
            },
        );
    }
}
