use crate::media::LocalStream;
use tokio::sync::mpsc;
use tracing::debug;

/// Commands from the application into the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    ShareScreen(LocalStream),
    StopScreenShare,
    MuteAudio,
    UnmuteAudio,
    Close,
}

/// Clonable application-facing handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { command_tx }
    }

    /// Attach a second local stream to every connection. Connections
    /// created later pick it up automatically.
    pub async fn share_screen(&self, stream: LocalStream) {
        self.send(SessionCommand::ShareScreen(stream)).await;
    }

    /// Detach the screen stream everywhere and forget it. Also the hook
    /// the capture adapter calls when the user revokes the source.
    /// Idempotent.
    pub async fn stop_screen_share(&self) {
        self.send(SessionCommand::StopScreenShare).await;
    }

    /// Tell every connected peer the local audio is muted. Travels over
    /// the control sub-channels only, never the relay.
    pub async fn mute_audio(&self) {
        self.send(SessionCommand::MuteAudio).await;
    }

    pub async fn unmute_audio(&self) {
        self.send(SessionCommand::UnmuteAudio).await;
    }

    /// Leave the room: closes every connection and the signaling channel.
    pub async fn close(&self) {
        self.send(SessionCommand::Close).await;
    }

    async fn send(&self, command: SessionCommand) {
        if self.command_tx.send(command).await.is_err() {
            debug!("Session is gone, command dropped");
        }
    }
}
