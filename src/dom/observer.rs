use super::NodeId;
use std::sync::mpsc::{self, Receiver, Sender};

/// A committed child-list change: `removed` left `target`, `added` joined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug)]
pub(super) struct Registration {
    root: NodeId,
    sender: Sender<MutationRecord>,
}

impl Registration {
    pub(super) fn root(&self) -> NodeId {
        self.root
    }

    /// `false` once the observing side has gone away.
    pub(super) fn deliver(&self, record: MutationRecord) -> bool {
        self.sender.send(record).is_ok()
    }
}

/// Receiving side of a subtree observation.
///
/// Records queue up until [`MutationObserver::take_records`] drains them.
/// Dropping the observer (or calling `disconnect`) stops delivery; the
/// document prunes the registration on its next mutation.
#[derive(Debug)]
pub struct MutationObserver {
    root: NodeId,
    receiver: Option<Receiver<MutationRecord>>,
}

pub(super) fn channel(root: NodeId) -> (Registration, MutationObserver) {
    let (sender, receiver) = mpsc::channel();
    (
        Registration { root, sender },
        MutationObserver {
            root,
            receiver: Some(receiver),
        },
    )
}

impl MutationObserver {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_connected(&self) -> bool {
        self.receiver.is_some()
    }

    /// Drain every record delivered so far, in commit order.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.receiver
            .as_ref()
            .map(|receiver| receiver.try_iter().collect())
            .unwrap_or_default()
    }

    pub fn disconnect(&mut self) {
        self.receiver = None;
    }
}
