use super::repository::Notification;

/// Result of re-deriving an aggregate: the new snapshot, whether it differs from what was
/// stored, and the notifications the change implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub record: T,
    pub changed: bool,
    pub notifications: Vec<Notification>,
}

impl<T> Reconciled<T> {
    pub fn unchanged(record: T) -> Self {
        Self {
            record,
            changed: false,
            notifications: Vec::new(),
        }
    }

    pub fn changed(record: T, notifications: Vec<Notification>) -> Self {
        Self {
            record,
            changed: true,
            notifications,
        }
    }
}
