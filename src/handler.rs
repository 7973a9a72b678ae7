//! Connection lifecycle handling
//!
//! One task per accepted connection: perform the name handshake, claim a
//! registry slot, then shuttle lines between the socket and the engine
//! until either side ends the session. A connection that fails its
//! handshake is closed without ever touching the registry.

use tokio::io::{AsyncBufRead, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{HandshakeError, ServerError};
use crate::protocol::{parse_name, read_line_bounded};
use crate::server::ServerCommand;
use crate::types::{ClientId, MAX_LINE_LEN};

/// Buffer size of the per-connection outbound channel
const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Drive one client connection from accept to teardown
///
/// The returned error describes why this one session ended; the caller
/// logs it and moves on. Nothing here can take down other clients or
/// the accept loop.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), ServerError> {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // First line is the display name. Any failure drops the raw socket
    // here, before registration.
    let name = read_handshake(&mut reader).await?;

    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
    let (reply_tx, reply_rx) = oneshot::channel();

    cmd_tx
        .send(ServerCommand::Join {
            name,
            addr: peer,
            sender: out_tx,
            reply: reply_tx,
        })
        .await
        .map_err(|_| ServerError::EngineClosed)?;

    // Capacity rejection surfaces here; returning closes the socket.
    let id = reply_rx.await.map_err(|_| ServerError::EngineClosed)??;

    // The writer task drains engine output to the socket. It ends when
    // the engine drops this client's sender or a socket write fails.
    let mut writer_task = tokio::spawn(write_outbound(write_half, out_rx));

    let result = tokio::select! {
        res = read_inbound(&mut reader, id, &cmd_tx) => res,
        _ = &mut writer_task => Ok(()),
    };

    // Tell the engine this connection is gone. Removal may already have
    // happened through send-failure cleanup; Leave is idempotent.
    let _ = cmd_tx.send(ServerCommand::Leave { id }).await;

    // Once the engine drops our sender the writer drains and exits.
    if !writer_task.is_finished() {
        let _ = writer_task.await;
    }

    result
}

/// Read and validate the handshake line
async fn read_handshake<R>(reader: &mut R) -> Result<String, HandshakeError>
where
    R: AsyncBufRead + Unpin,
{
    match read_line_bounded(reader, MAX_LINE_LEN).await {
        Ok(Some(line)) => parse_name(&line),
        Ok(None) => Err(HandshakeError::Disconnected),
        Err(e) => Err(HandshakeError::Io(e)),
    }
}

/// Forward inbound lines to the engine until end-of-stream
async fn read_inbound<R>(
    reader: &mut R,
    id: ClientId,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_line_bounded(reader, MAX_LINE_LEN).await? {
            Some(line) => {
                cmd_tx
                    .send(ServerCommand::Message { id, line })
                    .await
                    .map_err(|_| ServerError::EngineClosed)?;
            }
            None => {
                // Clean disconnect; not an error.
                debug!("client {} closed the stream", id);
                return Ok(());
            }
        }
    }
}

/// Drain the outbound channel onto the socket
async fn write_outbound(mut writer: OwnedWriteHalf, mut rx: mpsc::Receiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!("outbound write failed: {}", e);
            break;
        }
    }
}
