//! Device CLI session boundary.
//!
//! The [`CliSession`] trait is the seam between the device adapters and the
//! transport: adapters speak in commands and config sets, the transport
//! handles SSH, prompts and timeouts. The concrete [`SshCliSession`] drives
//! an IOS-dialect interactive shell (`>`/`#` prompts, `enable` escalation,
//! `configure terminal` config mode) over russh.

use crate::config::DeviceConfig;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace};

const SSH_PORT: u16 = 22;
const TERMINAL: &str = "vt100";

/// Upper bound on waiting for a prompt after one command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level inactivity timeout for the SSH connection.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(120);

/// An authenticated interactive command-response session with a device.
#[async_trait]
pub trait CliSession: Send {
    /// Sends one command and returns its output, echo and prompt stripped.
    async fn send_command(&mut self, command: &str) -> SyncResult<String>;

    /// Enters configuration mode, issues the commands in order, and leaves
    /// configuration mode. Returns the combined output.
    async fn send_config_set(&mut self, commands: &[String]) -> SyncResult<String>;

    /// Escalates to privileged mode.
    async fn enable(&mut self) -> SyncResult<()>;

    /// Releases the session.
    async fn close(&mut self) -> SyncResult<()>;
}

/// Builds sessions for one device; the seam where tests substitute a
/// scripted session.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(&self) -> SyncResult<Box<dyn CliSession>>;
}

/// Opens [`SshCliSession`]s from device credentials.
pub struct SshSessionFactory {
    device: DeviceConfig,
}

impl SshSessionFactory {
    pub fn new(device: DeviceConfig) -> Self {
        Self { device }
    }
}

#[async_trait]
impl SessionFactory for SshSessionFactory {
    async fn connect(&self) -> SyncResult<Box<dyn CliSession>> {
        Ok(Box::new(SshCliSession::open(&self.device).await?))
    }
}

struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    // Devices come from the operator-vetted config file; host keys are not
    // pinned.
    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// IOS-dialect interactive shell session over SSH.
pub struct SshCliSession {
    device: String,
    handle: client::Handle<ClientHandler>,
    channel: russh::Channel<client::Msg>,
    enable_secret: String,
    buffer: String,
}

impl SshCliSession {
    /// Connects, authenticates, and consumes the login banner up to the
    /// first prompt.
    pub async fn open(device: &DeviceConfig) -> SyncResult<Self> {
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(INACTIVITY_TIMEOUT),
            ..Default::default()
        });
        let mut handle = client::connect(
            config,
            (device.address.as_str(), SSH_PORT),
            ClientHandler,
        )
        .await
        .map_err(|e| SyncError::session(&device.address, e.to_string()))?;

        let authenticated = handle
            .authenticate_password(&device.username, &device.password)
            .await
            .map_err(|e| SyncError::session(&device.address, e.to_string()))?;
        if !authenticated {
            return Err(SyncError::session(&device.address, "authentication rejected"));
        }

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SyncError::session(&device.address, e.to_string()))?;
        channel
            .request_pty(false, TERMINAL, 80, 24, 0, 0, &[])
            .await
            .map_err(|e| SyncError::session(&device.address, e.to_string()))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| SyncError::session(&device.address, e.to_string()))?;

        let mut session = Self {
            device: device.address.clone(),
            handle,
            channel,
            enable_secret: device.enable_secret.clone(),
            buffer: String::new(),
        };

        session.read_until(ends_with_prompt).await?;
        debug!(device = %session.device, "session established");
        Ok(session)
    }

    async fn send_line(&mut self, line: &str) -> SyncResult<()> {
        let payload = format!("{}\n", line);
        self.channel
            .data(payload.as_bytes())
            .await
            .map_err(|e| SyncError::session(&self.device, e.to_string()))?;
        Ok(())
    }

    /// Accumulates channel output until `done` matches, then drains the
    /// buffer.
    async fn read_until(&mut self, done: fn(&str) -> bool) -> SyncResult<String> {
        loop {
            if done(&self.buffer) {
                return Ok(std::mem::take(&mut self.buffer));
            }
            let msg = timeout(COMMAND_TIMEOUT, self.channel.wait())
                .await
                .map_err(|_| {
                    SyncError::session(&self.device, "timed out waiting for device prompt")
                })?;
            match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    self.buffer.push_str(&String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    self.buffer.push_str(&String::from_utf8_lossy(data));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(SyncError::session(&self.device, "channel closed by device"));
                }
                Some(_) => {}
            }
        }
    }
}

#[async_trait]
impl CliSession for SshCliSession {
    async fn send_command(&mut self, command: &str) -> SyncResult<String> {
        trace!(device = %self.device, %command, "sending command");
        self.send_line(command).await?;
        let raw = self.read_until(ends_with_prompt).await?;
        Ok(strip_echo_and_prompt(&raw, command))
    }

    async fn send_config_set(&mut self, commands: &[String]) -> SyncResult<String> {
        let mut output = String::new();
        output.push_str(&self.send_command("configure terminal").await?);
        for command in commands {
            output.push_str(&self.send_command(command).await?);
        }
        output.push_str(&self.send_command("end").await?);
        Ok(output)
    }

    async fn enable(&mut self) -> SyncResult<()> {
        self.send_line("enable").await?;
        let mut response = self.read_until(prompt_or_password).await?;
        if ends_with_password_prompt(&response) {
            let secret = self.enable_secret.clone();
            self.send_line(&secret).await?;
            response = self.read_until(ends_with_prompt).await?;
        }
        if !response.trim_end().ends_with('#') {
            return Err(SyncError::session(
                &self.device,
                "privilege escalation rejected",
            ));
        }
        debug!(device = %self.device, "privileged mode entered");
        Ok(())
    }

    async fn close(&mut self) -> SyncResult<()> {
        let _ = self.channel.eof().await;
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| SyncError::session(&self.device, e.to_string()))
    }
}

/// The exec prompt ends in `>` (user) or `#` (privileged/config).
fn ends_with_prompt(text: &str) -> bool {
    matches!(text.trim_end().chars().last(), Some('#') | Some('>'))
}

/// The enable-secret prompt ends in `:`.
fn ends_with_password_prompt(text: &str) -> bool {
    text.trim_end().ends_with(':')
}

fn prompt_or_password(text: &str) -> bool {
    ends_with_prompt(text) || ends_with_password_prompt(text)
}

/// Drops the echoed command line and the trailing prompt line from raw
/// channel output.
fn strip_echo_and_prompt(raw: &str, command: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    if lines.last().is_some_and(|line| ends_with_prompt(line)) {
        lines.pop();
    }
    if lines
        .first()
        .is_some_and(|line| line.trim_end().ends_with(command))
    {
        lines.remove(0);
    }
    lines.join("\n")
}
