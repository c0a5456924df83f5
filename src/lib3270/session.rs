//! Virtual terminal session
//!
//! A `Terminal` owns one screen and a pair of channels standing in for the
//! host transport. Host records arrive on the inbound channel, are parsed
//! and applied to the screen; answers (read responses, query replies) and
//! attention records go out on the outbound channel.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::addressing::BufferAddress;
use super::codes::*;
use super::command::{Command, StructuredField};
use super::display::TerminalState;
use super::protocol;
use super::response::{self, ReadScope};
use crate::config::SessionConfig;
use crate::error::{ConfigResult, SessionError, SessionResult};

/// A virtual 3270 terminal bound to a host transport
#[derive(Debug)]
pub struct Terminal {
    id: String,
    state: TerminalState,
    inbound: mpsc::Receiver<Vec<u8>>,
    outbound: mpsc::Sender<Vec<u8>>,
    default_timeout: Duration,
}

impl Terminal {
    /// Create a terminal with the geometry and identity from `config`
    pub fn new(
        config: &SessionConfig,
        inbound: mpsc::Receiver<Vec<u8>>,
        outbound: mpsc::Sender<Vec<u8>>,
    ) -> ConfigResult<Self> {
        let geometry = config.geometry()?;
        let id = config.session_id();
        debug!(
            "session {} created with {}x{} screen ({:?} addressing)",
            id,
            geometry.rows(),
            geometry.cols(),
            geometry.mode()
        );
        Ok(Self {
            id,
            state: TerminalState::new(geometry),
            inbound,
            outbound,
            default_timeout: config.wait_timeout(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    /// Wait bound configured for this session
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn screen_text(&self) -> String {
        self.state.screen_text()
    }

    /// Parse one host record and apply it to the screen
    ///
    /// Returns the record the terminal answers with, if the command asks
    /// for one.
    pub fn handle_record(&mut self, record: &[u8]) -> SessionResult<Option<Vec<u8>>> {
        let geometry = *self.state.geometry();
        let command = protocol::parse(record, &geometry)?;
        match &command {
            Command::WriteStructuredField(fields) => {
                let mut reply = None;
                for field in fields {
                    if let Some(answer) = self.handle_structured_field(field)? {
                        reply = Some(answer);
                    }
                }
                Ok(reply)
            }
            _ => Ok(self.answer_command(&command)),
        }
    }

    /// Answer a read command from the screen, or apply any other command
    fn answer_command(&mut self, command: &Command) -> Option<Vec<u8>> {
        let aid = self.state.pending_aid();
        match command {
            Command::ReadBuffer(_) => Some(response::build_read_buffer_response(&self.state, aid)),
            Command::ReadModified(_) => {
                Some(response::build_inbound_record(&self.state, aid, ReadScope::Modified))
            }
            Command::ReadModifiedAll(_) => {
                Some(response::build_inbound_record(&self.state, aid, ReadScope::All))
            }
            _ => {
                self.state.apply_command(command);
                None
            }
        }
    }

    fn handle_structured_field(&mut self, field: &StructuredField) -> SessionResult<Option<Vec<u8>>> {
        match field.id {
            SF_READ_PARTITION => match field.data.get(1) {
                Some(&RP_QUERY) | Some(&RP_QUERY_LIST) => {
                    Ok(Some(response::build_query_reply(self.state.geometry())?))
                }
                other => {
                    warn!("ignoring read partition type {:?}", other);
                    Ok(None)
                }
            },
            SF_ERASE_RESET => {
                self.state.erase();
                Ok(None)
            }
            SF_OUTBOUND_3270DS => {
                // partition id, then an ordinary write or read command
                let Some(body) = field.data.get(1..).filter(|body| !body.is_empty()) else {
                    return Ok(None);
                };
                let geometry = *self.state.geometry();
                match protocol::parse(body, &geometry)? {
                    Command::WriteStructuredField(_) => {
                        warn!("ignoring structured fields nested in outbound 3270DS");
                        Ok(None)
                    }
                    command => Ok(self.answer_command(&command)),
                }
            }
            id => {
                warn!("ignoring structured field 0x{:02X} ({} bytes)", id, field.data.len());
                Ok(None)
            }
        }
    }

    async fn send(&self, record: Vec<u8>) -> SessionResult<()> {
        self.outbound.send(record).await.map_err(|_| SessionError::Disconnected)
    }

    /// Await one host record, apply it and send any answer
    pub async fn receive(&mut self) -> SessionResult<()> {
        let record = self.inbound.recv().await.ok_or(SessionError::Disconnected)?;
        if let Some(reply) = self.handle_record(&record)? {
            self.send(reply).await?;
        }
        Ok(())
    }

    async fn wait_until<F>(&mut self, operation: &str, timeout: Duration, mut ready: F) -> SessionResult<()>
    where
        F: FnMut(&TerminalState) -> bool,
    {
        let deadline = Instant::now() + timeout;
        while !ready(&self.state) {
            match tokio::time::timeout_at(deadline, self.inbound.recv()).await {
                Ok(Some(record)) => {
                    if let Some(reply) = self.handle_record(&record)? {
                        self.send(reply).await?;
                    }
                }
                Ok(None) => return Err(SessionError::Disconnected),
                Err(_) => {
                    info!("session {}: timed out waiting for {}", self.id, operation);
                    return Err(SessionError::Timeout {
                        operation: operation.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
            }
        }
        Ok(())
    }

    /// Process host records until `text` appears on the screen
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> SessionResult<()> {
        let operation = format!("text {:?}", text);
        self.wait_until(&operation, timeout, |state| state.contains_text(text)).await
    }

    /// Process host records until the host unlocks the keyboard
    pub async fn wait_for_keyboard(&mut self, timeout: Duration) -> SessionResult<()> {
        self.wait_until("keyboard unlock", timeout, |state| !state.is_keyboard_locked())
            .await
    }

    pub fn type_text(&mut self, text: &str) -> SessionResult<()> {
        self.state.type_text(text)
    }

    /// Move the hardware cursor to the next unprotected field
    pub fn tab(&mut self) -> bool {
        self.state.tab_to_next_field()
    }

    pub fn position_cursor(&mut self, row: u16, col: u16) {
        let address = BufferAddress::from_row_col(row, col, self.state.geometry());
        self.state.set_hardware_cursor(address);
    }

    /// Press an attention key
    ///
    /// Sends the inbound record for `aid`, then locks the keyboard until the
    /// host restores it. Clear also erases the screen.
    pub async fn press(&mut self, aid: AidKey) -> SessionResult<()> {
        if self.state.is_keyboard_locked() {
            return Err(SessionError::KeyboardLocked);
        }
        let record = response::build_inbound_record(&self.state, aid, ReadScope::Modified);
        self.state.lock_keyboard(aid);
        if aid == AidKey::Clear {
            self.state.clear();
        }
        debug!("session {}: {:?} ({} bytes)", self.id, aid, record.len());
        self.send(record).await
    }
}
