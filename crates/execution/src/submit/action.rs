use crate::error::SubmitActionError;
use chrono::{DateTime, Utc};
use nodeview_domain::error::SubmitError;
use nodeview_domain::value_objects::MessageForm;
use nodeview_protocols::NodeApi;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Acknowledgement of a send the node accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Correlation id used in the logs.
    pub id: Uuid,
    /// Recipient node the message went to.
    pub to_node: String,
    /// When the node answered.
    pub submitted_at: DateTime<Utc>,
}

/// Validates a message form and hands it to the node.
///
/// Clones share the same node client; submits do not wait on each other.
#[derive(Clone)]
pub struct SubmitAction {
    api: Arc<dyn NodeApi>,
}

impl SubmitAction {
    pub fn new(api: Arc<dyn NodeApi>) -> Self {
        Self { api }
    }

    /// Sends the form's message.
    ///
    /// Nothing is sent if a field is missing. On success only the message
    /// text is cleared; on failure the form is left as it was.
    ///
    /// # Errors
    /// Returns [`SubmitActionError::Validation`] for a missing field and
    /// [`SubmitActionError::Submit`] if the node did not accept the request.
    pub async fn submit(&self, form: &mut MessageForm) -> Result<SubmitReceipt, SubmitActionError> {
        let request = form.to_request()?;
        let id = Uuid::new_v4();

        let result = self
            .api
            .send(&request)
            .instrument(info_span!("submit", id = %id, to_node = %request.to_node))
            .await;

        match result {
            Ok(()) => {
                info!(id = %id, to_node = %request.to_node, "Message accepted by node");
                form.clear_message();
                Ok(SubmitReceipt {
                    id,
                    to_node: request.to_node,
                    submitted_at: Utc::now(),
                })
            }
            Err(e) => {
                let err = SubmitError::from(e);
                warn!(id = %id, error = %err, "Message rejected");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nodeview_domain::entities::Identity;
    use nodeview_domain::error::ValidationError;
    use nodeview_domain::value_objects::SendRequest;
    use nodeview_protocols::NodeError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records send requests and answers with a fixed status.
    struct RecordingNode {
        status: u16,
        calls: AtomicUsize,
        requests: Mutex<Vec<SendRequest>>,
    }

    impl RecordingNode {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NodeApi for RecordingNode {
        async fn identity(&self) -> Result<Identity, NodeError> {
            Ok(Identity::new("pk"))
        }

        async fn send(&self, request: &SendRequest) -> Result<(), NodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if (200..300).contains(&self.status) {
                Ok(())
            } else {
                Err(NodeError::Status {
                    status: self.status,
                    body: "missing values".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_missing_address_sends_nothing() {
        let node = RecordingNode::new(200);
        let action = SubmitAction::new(node.clone());
        let mut form = MessageForm::new("", "K", "hi");

        let err = action.submit(&mut form).await.unwrap_err();

        assert_eq!(
            err,
            SubmitActionError::Validation(ValidationError::MissingRecipientAddress)
        );
        assert_eq!(node.calls.load(Ordering::SeqCst), 0);
        assert_eq!(form.message, "hi");
    }

    #[tokio::test]
    async fn test_rejected_send_keeps_form() {
        let node = RecordingNode::new(400);
        let action = SubmitAction::new(node.clone());
        let mut form = MessageForm::new("http://127.0.0.1:5001", "K", "hi");

        let err = action.submit(&mut form).await.unwrap_err();

        assert!(matches!(
            err,
            SubmitActionError::Submit(SubmitError::Rejected { status: 400, .. })
        ));
        assert_eq!(node.calls.load(Ordering::SeqCst), 1);
        assert_eq!(form, MessageForm::new("http://127.0.0.1:5001", "K", "hi"));
    }

    #[tokio::test]
    async fn test_accepted_send_clears_only_message() {
        let node = RecordingNode::new(201);
        let action = SubmitAction::new(node.clone());
        let mut form = MessageForm::new("http://127.0.0.1:5001", "K", "hello there");

        let receipt = action.submit(&mut form).await.unwrap();

        assert_eq!(receipt.to_node, "http://127.0.0.1:5001");
        assert_eq!(form.recipient_address, "http://127.0.0.1:5001");
        assert_eq!(form.recipient_key, "K");
        assert!(form.message.is_empty());

        let requests = node.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "hello there");
        assert_eq!(requests[0].to_pub, "K");
    }

    #[tokio::test]
    async fn test_concurrent_submits_are_independent() {
        let node = RecordingNode::new(200);
        let action = SubmitAction::new(node.clone());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let action = action.clone();
                tokio::spawn(async move {
                    let mut form = MessageForm::new("http://127.0.0.1:5001", "K", format!("m{i}"));
                    action.submit(&mut form).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 4);
        assert_eq!(node.calls.load(Ordering::SeqCst), 4);
    }
}
