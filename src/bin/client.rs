//! Interactive chat client
//!
//! Thin terminal front-end: sends the display name, then relays
//! keyboard lines to the server and prints whatever the server sends
//! back. Typing `!exit` (or closing stdin) leaves the chat; the server
//! dropping the connection ends the session as well.

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use chatline::MAX_NAME_LEN;

/// Terminal client for the chatline server
#[derive(Parser, Debug)]
#[command(name = "chatline-client", version, about)]
struct Cli {
    /// Server address (dotted quad or resolvable hostname)
    addr: String,

    /// Server TCP port
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Display name sent as the handshake line
    #[arg(value_parser = parse_display_name)]
    name: String,
}

fn parse_display_name(s: &str) -> Result<String, String> {
    let chars = s.chars().count();
    if chars == 0 {
        return Err("name must not be empty".to_string());
    }
    if chars > MAX_NAME_LEN {
        return Err(format!("name exceeds {MAX_NAME_LEN} characters"));
    }
    if s.contains('\n') {
        return Err("name must not contain newlines".to_string());
    }
    Ok(s.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatline=warn")),
        )
        .init();

    let cli = Cli::parse();

    let stream = TcpStream::connect((cli.addr.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to connect to {}:{}", cli.addr, cli.port))?;
    let (read_half, write_half) = stream.into_split();
    let mut writer = write_half;

    // Handshake: first line is the display name. The server replies
    // with nothing on success.
    writer
        .write_all(format!("{}\n", cli.name).as_bytes())
        .await
        .context("failed to send name")?;

    // Persistent line streams: next_line is cancel-safe, so a line
    // arriving in pieces while the other select branch wins stays
    // buffered instead of being discarded.
    let mut server = BufReader::new(read_half).lines();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = tokio::io::stdout();

    chat_loop(&mut server, &mut stdin, &mut writer, &mut screen).await
}

/// Relay lines between keyboard and server until either side ends the chat
async fn chat_loop<R, S, W, O>(
    server: &mut Lines<BufReader<R>>,
    stdin: &mut Lines<BufReader<S>>,
    writer: &mut W,
    screen: &mut O,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    S: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            line = server.next_line() => {
                match line.context("read from server failed")? {
                    Some(text) => print_line(screen, &text).await?,
                    // Server dropped the connection.
                    None => break,
                }
            }
            line = stdin.next_line() => {
                let Some(typed) = line.context("read from stdin failed")? else {
                    // End-of-input behaves exactly like typing !exit.
                    writer.write_all(b"!exit\n").await.context("send failed")?;
                    print_line(screen, "client exiting").await?;
                    break;
                };
                writer
                    .write_all(format!("{typed}\n").as_bytes())
                    .await
                    .context("send failed")?;
                if typed == "!exit" {
                    print_line(screen, "client exiting").await?;
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Print one line of server output
async fn print_line<O>(screen: &mut O, text: &str) -> anyhow::Result<()>
where
    O: AsyncWrite + Unpin,
{
    screen.write_all(text.as_bytes()).await?;
    screen.write_all(b"\n").await?;
    screen.flush().await?;
    Ok(())
}
