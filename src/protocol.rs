//! Wire protocol: line framing and routing decisions
//!
//! The protocol is plain text over a byte stream, one message per
//! newline-terminated line. Reads are reassembled into whole lines
//! through the connection's buffered reader, so a message split across
//! TCP segments (or several messages coalesced into one) is framed
//! correctly before it reaches the router.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::HandshakeError;
use crate::types::MAX_NAME_LEN;

/// Routing decision for one registered client's line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Deliver to every registered client, including the sender
    Broadcast,
    /// Deliver to the first client named `to` only
    Whisper { to: &'a str, body: &'a str },
}

/// Classify one line as a broadcast or a whisper
///
/// A whisper is `@name body`: the destination is the run of characters
/// from position 1 up to the first space, the body everything after it.
/// A leading `@` with no space, or with an empty name run, is a
/// malformed whisper and falls back to broadcasting the whole line.
pub fn route_line(line: &str) -> Route<'_> {
    let Some(rest) = line.strip_prefix('@') else {
        return Route::Broadcast;
    };

    match rest.find(' ') {
        Some(0) | None => Route::Broadcast,
        Some(idx) => Route::Whisper {
            to: &rest[..idx],
            body: &rest[idx + 1..],
        },
    }
}

/// Validate a handshake line as a display name
///
/// Carriage returns are stripped wherever they appear; they are never
/// line terminators. An empty result or one over [`MAX_NAME_LEN`]
/// visible characters rejects the connection.
pub fn parse_name(line: &str) -> Result<String, HandshakeError> {
    let name: String = line.chars().filter(|&c| c != '\r').collect();

    if name.is_empty() {
        return Err(HandshakeError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(HandshakeError::NameTooLong(MAX_NAME_LEN));
    }

    Ok(name)
}

/// Read the next line, bounded at `max_len` bytes of content
///
/// Returns the line without its terminator (a trailing `\r` is also
/// dropped), `Ok(None)` on clean end-of-stream, and `InvalidData` when
/// the line exceeds the bound or is not valid UTF-8. A final
/// unterminated line before end-of-stream is still delivered.
pub async fn read_line_bounded<R>(reader: &mut R, max_len: usize) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    // One extra byte of budget for the terminator itself; anything past
    // that means the line does not fit.
    let mut limited = (&mut *reader).take(max_len as u64 + 1);
    let n = limited.read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n > max_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {max_len} bytes"),
        ));
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "line is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};

    #[test]
    fn test_plain_line_broadcasts() {
        assert_eq!(route_line("hello everyone"), Route::Broadcast);
    }

    #[test]
    fn test_whisper_splits_name_and_body() {
        assert_eq!(
            route_line("@bob secret"),
            Route::Whisper {
                to: "bob",
                body: "secret"
            }
        );
    }

    #[test]
    fn test_whisper_body_keeps_later_spaces() {
        assert_eq!(
            route_line("@bob meet me at noon"),
            Route::Whisper {
                to: "bob",
                body: "meet me at noon"
            }
        );
    }

    #[test]
    fn test_whisper_body_may_be_empty() {
        assert_eq!(route_line("@bob "), Route::Whisper { to: "bob", body: "" });
    }

    #[test]
    fn test_whisper_without_space_falls_back_to_broadcast() {
        assert_eq!(route_line("@nospacehere"), Route::Broadcast);
    }

    #[test]
    fn test_whisper_with_empty_name_falls_back_to_broadcast() {
        assert_eq!(route_line("@ hello"), Route::Broadcast);
        assert_eq!(route_line("@"), Route::Broadcast);
    }

    #[test]
    fn test_parse_name_strips_carriage_returns() {
        assert_eq!(parse_name("ali\rce").unwrap(), "alice");
    }

    #[test]
    fn test_parse_name_rejects_empty() {
        assert!(matches!(parse_name(""), Err(HandshakeError::EmptyName)));
        assert!(matches!(parse_name("\r"), Err(HandshakeError::EmptyName)));
    }

    #[test]
    fn test_parse_name_rejects_overlong() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            parse_name(&long),
            Err(HandshakeError::NameTooLong(_))
        ));

        let max = "x".repeat(MAX_NAME_LEN);
        assert_eq!(parse_name(&max).unwrap(), max);
    }

    #[tokio::test]
    async fn test_read_line_bounded_frames_coalesced_lines() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = BufReader::new(rx);

        tx.write_all(b"one\ntwo\r\n").await.unwrap();
        drop(tx);

        assert_eq!(read_line_bounded(&mut reader, 16).await.unwrap().unwrap(), "one");
        assert_eq!(read_line_bounded(&mut reader, 16).await.unwrap().unwrap(), "two");
        assert!(read_line_bounded(&mut reader, 16).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_line_bounded_reassembles_split_line() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = BufReader::new(rx);

        let read = tokio::spawn(async move {
            read_line_bounded(&mut reader, 16).await.unwrap().unwrap()
        });

        tx.write_all(b"hel").await.unwrap();
        tx.flush().await.unwrap();
        tokio::task::yield_now().await;
        tx.write_all(b"lo\n").await.unwrap();

        assert_eq!(read.await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_read_line_bounded_delivers_final_unterminated_line() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = BufReader::new(rx);

        tx.write_all(b"tail").await.unwrap();
        drop(tx);

        assert_eq!(read_line_bounded(&mut reader, 16).await.unwrap().unwrap(), "tail");
        assert!(read_line_bounded(&mut reader, 16).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_line_bounded_rejects_overlong_line() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = BufReader::new(rx);

        tx.write_all(b"0123456789\n").await.unwrap();
        drop(tx);

        let err = read_line_bounded(&mut reader, 8).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_line_bounded_accepts_line_at_exact_limit() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = BufReader::new(rx);

        tx.write_all(b"12345678\n").await.unwrap();
        drop(tx);

        assert_eq!(
            read_line_bounded(&mut reader, 8).await.unwrap().unwrap(),
            "12345678"
        );
    }
}
