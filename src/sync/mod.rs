//! Background synchronization of element mutations to a session service.
//!
//! The UI thread never performs network I/O. Committed mutations are pushed
//! onto an outbound command queue; a dedicated thread running a
//! single-threaded tokio runtime drains the queue and issues one service
//! call per command. Policy is fire-once, log-and-drop: a failed update or
//! delete is logged at warn and forgotten - the local element store stays
//! authoritative and the editor never blocks or rolls back on sync failure.
//!
//! Call ordering is not preserved end to end: a later upsert for the same
//! element may race an earlier in-flight one, so the service is treated as
//! eventually consistent.

pub mod service;

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;

use crate::element::{Element, ElementId};
use service::{SessionId, SessionOptions, SessionService};

/// Sync operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No syncing, standalone editing
    Disabled,
    /// Create a session at startup and push every committed mutation
    Active,
}

/// Commands from the UI thread to the sync worker
#[derive(Debug)]
pub enum SyncCommand {
    /// Create or update an element in the session
    Upsert { element: Element },
    /// Remove an element from the session
    Delete { id: ElementId },
    /// Request the final document bytes
    Save,
    /// Stop the worker
    Shutdown,
}

/// Events from the sync worker to the UI thread
#[derive(Debug)]
pub enum SyncEvent {
    /// Session established
    Ready { session_id: SessionId },
    /// Export completed
    Saved { bytes: Vec<u8> },
    /// A user-initiated operation (session creation, save) failed
    Error(String),
}

/// Handle for communicating with the sync worker from the UI thread
pub struct SyncHandle {
    pub command_tx: std_mpsc::Sender<SyncCommand>,
    pub event_rx: std_mpsc::Receiver<SyncEvent>,
    _thread: JoinHandle<()>,
}

impl SyncHandle {
    /// Non-blocking check for worker events
    pub fn poll_event(&self) -> Option<SyncEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn send_command(&self, cmd: SyncCommand) -> Result<()> {
        self.command_tx.send(cmd)?;
        Ok(())
    }
}

/// Spawn the sync worker. The session is created from the document bytes;
/// until `Ready` arrives, queued commands simply wait in the channel.
pub fn start_sync_thread(
    service: Arc<dyn SessionService>,
    document: Vec<u8>,
) -> SyncHandle {
    let (event_tx, event_rx) = std_mpsc::channel();
    let (command_tx, command_rx) = std_mpsc::channel();

    let thread = thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let _ = event_tx.send(SyncEvent::Error(format!("sync runtime: {e}")));
                return;
            }
        };

        rt.block_on(run_sync(service, document, event_tx, command_rx));
    });

    SyncHandle {
        command_tx,
        event_rx,
        _thread: thread,
    }
}

/// Poll interval for the command queue
const COMMAND_POLL: Duration = Duration::from_millis(20);

async fn run_sync(
    service: Arc<dyn SessionService>,
    document: Vec<u8>,
    event_tx: std_mpsc::Sender<SyncEvent>,
    command_rx: std_mpsc::Receiver<SyncCommand>,
) {
    let options = SessionOptions {
        collaborative: true,
    };
    let session = match service.create_session(&document, &options).await {
        Ok(session) => {
            tracing::info!(%session, "sync session established");
            let _ = event_tx.send(SyncEvent::Ready {
                session_id: session.clone(),
            });
            session
        }
        Err(e) => {
            tracing::warn!(error = %e, "session creation failed, editing stays local");
            let _ = event_tx.send(SyncEvent::Error(format!("session unavailable: {e}")));
            return;
        }
    };

    loop {
        match command_rx.try_recv() {
            Ok(cmd) => {
                if !execute(service.as_ref(), &session, cmd, &event_tx).await {
                    break;
                }
            }
            Err(std_mpsc::TryRecvError::Empty) => {
                tokio::time::sleep(COMMAND_POLL).await;
            }
            Err(std_mpsc::TryRecvError::Disconnected) => break,
        }
    }
}

/// Execute one command, fire-once. Returns false on shutdown.
async fn execute(
    service: &dyn SessionService,
    session: &SessionId,
    cmd: SyncCommand,
    event_tx: &std_mpsc::Sender<SyncEvent>,
) -> bool {
    match cmd {
        SyncCommand::Upsert { element } => {
            if let Err(e) = service.update_element(session, element.id, &element).await {
                tracing::warn!(element = %element.id, error = %e, "element sync dropped");
            }
        }
        SyncCommand::Delete { id } => {
            if let Err(e) = service.delete_element(session, id).await {
                tracing::warn!(element = %id, error = %e, "element delete sync dropped");
            }
        }
        SyncCommand::Save => match service.save_document(session).await {
            Ok(bytes) => {
                let _ = event_tx.send(SyncEvent::Saved { bytes });
            }
            Err(e) => {
                tracing::warn!(error = %e, "document save failed");
                let _ = event_tx.send(SyncEvent::Error(format!("save failed: {e}")));
            }
        },
        SyncCommand::Shutdown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind, Rgb, ShapeType, StrokeStyle};
    use crate::geometry::Rect;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Update(ElementId),
        Delete(ElementId),
        Save,
    }

    /// In-memory service double that records calls and can fail updates.
    struct RecordingService {
        calls: Mutex<Vec<Call>>,
        fail_updates: bool,
    }

    impl RecordingService {
        fn new(fail_updates: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_updates,
            }
        }
    }

    #[async_trait]
    impl SessionService for RecordingService {
        async fn create_session(
            &self,
            _document: &[u8],
            _options: &SessionOptions,
        ) -> Result<SessionId> {
            Ok(SessionId("sess-0123456789".into()))
        }

        async fn update_element(
            &self,
            _session: &SessionId,
            id: ElementId,
            _element: &Element,
        ) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Update(id));
            if self.fail_updates {
                anyhow::bail!("boom");
            }
            Ok(())
        }

        async fn delete_element(&self, _session: &SessionId, id: ElementId) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Delete(id));
            Ok(())
        }

        async fn save_document(&self, _session: &SessionId) -> Result<Vec<u8>> {
            self.calls.lock().unwrap().push(Call::Save);
            Ok(b"%PDF-final".to_vec())
        }
    }

    fn sample_element() -> Element {
        Element::new(
            0,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            ElementKind::Shape {
                shape: ShapeType::Rectangle,
                stroke_color: Rgb::BLACK,
                fill_color: None,
                stroke_width: 1.0,
                stroke_style: StrokeStyle::Solid,
            },
        )
    }

    #[tokio::test]
    async fn commands_map_to_service_calls_in_order() {
        let service = RecordingService::new(false);
        let session = SessionId("s".into());
        let (event_tx, event_rx) = std_mpsc::channel();

        let el = sample_element();
        let id = el.id;
        assert!(execute(&service, &session, SyncCommand::Upsert { element: el }, &event_tx).await);
        assert!(execute(&service, &session, SyncCommand::Delete { id }, &event_tx).await);
        assert!(execute(&service, &session, SyncCommand::Save, &event_tx).await);
        assert!(!execute(&service, &session, SyncCommand::Shutdown, &event_tx).await);

        let calls = service.calls.lock().unwrap();
        assert_eq!(*calls, vec![Call::Update(id), Call::Delete(id), Call::Save]);

        match event_rx.try_recv() {
            Ok(SyncEvent::Saved { bytes }) => assert_eq!(bytes, b"%PDF-final"),
            other => panic!("expected Saved event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_update_is_dropped_without_event() {
        let service = RecordingService::new(true);
        let session = SessionId("s".into());
        let (event_tx, event_rx) = std_mpsc::channel();

        let el = sample_element();
        // Fire-once: the failure is swallowed and the worker keeps going.
        assert!(execute(&service, &session, SyncCommand::Upsert { element: el }, &event_tx).await);
        assert!(event_rx.try_recv().is_err());
    }

    #[test]
    fn worker_round_trip_through_channels() {
        let service = Arc::new(RecordingService::new(false));
        let handle = start_sync_thread(service.clone(), b"%PDF-doc".to_vec());

        // Session creation runs on the worker; wait for Ready.
        let event = handle
            .event_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("ready event");
        match event {
            SyncEvent::Ready { session_id } => assert_eq!(session_id.short(), "23456789"),
            other => panic!("expected Ready, got {other:?}"),
        }

        let el = sample_element();
        let id = el.id;
        handle.send_command(SyncCommand::Upsert { element: el }).unwrap();
        handle.send_command(SyncCommand::Shutdown).unwrap();

        // Worker drains the queue before shutting down.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            if service.calls.lock().unwrap().contains(&Call::Update(id)) {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "update never reached service"
            );
            thread::sleep(Duration::from_millis(10));
        }
    }
}
