//! The responder's serve loop: one request, one handler, one reply.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use linehaul_protocol::encode_reply;
use linehaul_transfer::SessionStore;

use crate::ResponderError;
use crate::dispatch::Responder;

/// Serves pull-mode requests until the initiator closes the link.
///
/// Strictly request/response: read one full request (short reads are retried
/// until the declared payload length is satisfied), execute exactly one
/// handler, write exactly one reply, block on the next request. A clean close
/// between requests ends the loop normally; a frame truncated mid-request or
/// a hard link error propagates to the caller, which owns the decision to
/// terminate. Nothing below this loop ever ends the process.
pub async fn serve<S, L>(mut link: L, responder: &Responder<S>) -> Result<(), ResponderError>
where
    S: SessionStore + Clone,
    L: AsyncRead + AsyncWrite + Unpin,
{
    info!("responder serving");
    loop {
        // EOF at a frame boundary is a normal shutdown.
        let mut command = [0u8; 1];
        if link.read(&mut command).await? == 0 {
            info!("link closed by initiator");
            return Ok(());
        }

        let mut len = [0u8; 2];
        link.read_exact(&mut len).await?;
        let mut payload = vec![0u8; u16::from_le_bytes(len) as usize];
        link.read_exact(&mut payload).await?;

        let reply = responder.dispatch(command[0], &payload);
        debug!(status = ?reply.status, payload_len = reply.payload.len(), "sending reply");
        link.write_all(&encode_reply(&reply)?).await?;
        link.flush().await?;
    }
}
