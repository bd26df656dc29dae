//! A minimal smtp server which accepts every message and keeps it in memory.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMail {
    pub from: String,
    pub recipients: Vec<String>,
    /// Raw message (headers and body) with lines joined by `\n`.
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct SmtpSink {
    addr: SocketAddr,
    state: Arc<SinkState>,
}

#[derive(Debug, Default)]
struct SinkState {
    mails: Mutex<Vec<ReceivedMail>>,
    fail_next: AtomicUsize,
    stall_next: AtomicUsize,
    connections: AtomicUsize,
}

impl SmtpSink {
    /// Bind to the given address and accept connections in the background.
    /// Use port 0 to pick a random free port.
    pub async fn spawn(host: IpAddr, port: u16) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind to {host}:{port}"))?;
        let addr = listener.local_addr()?;
        let state = Arc::new(SinkState::default());

        tokio::spawn(accept_loop(listener, Arc::clone(&state)));

        Ok(Self { addr, state })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// All messages received so far.
    pub fn mails(&self) -> Vec<ReceivedMail> {
        self.state.mails.lock().unwrap().clone()
    }

    /// Number of connections accepted so far.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Reject the next `count` messages with a transient `451` reply.
    pub fn fail_next(&self, count: usize) {
        self.state.fail_next.store(count, Ordering::SeqCst);
    }

    /// Never answer the end of data of the next `count` messages, leaving
    /// the client stuck in the middle of a transaction.
    pub fn stall_next(&self, count: usize) {
        self.state.stall_next.store(count, Ordering::SeqCst);
    }
}

pub async fn start_server(host: IpAddr, port: u16) -> anyhow::Result<()> {
    let sink = SmtpSink::spawn(host, port).await?;
    info!("Started smtp sink on {}", sink.addr());
    info!("Received messages are logged and then discarded");

    let mut seen = 0;
    loop {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let mails = sink.mails();
        for mail in &mails[seen..] {
            info!(from = %mail.from, to = ?mail.recipients, "received mail\n{}", mail.data);
        }
        seen = mails.len();
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<SinkState>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!("failed to accept smtp connection: {err}");
                continue;
            }
        };

        state.connections.fetch_add(1, Ordering::SeqCst);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            debug!(%peer, "smtp connection opened");
            if let Err(err) = handle_connection(stream, &state).await {
                debug!(%peer, "smtp connection closed with error: {err}");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, state: &SinkState) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    reply(&mut writer, "220 folio-testing ESMTP ready").await?;

    let mut from = None;
    let mut recipients = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let command = line.to_ascii_uppercase();

        if command.starts_with("EHLO") || command.starts_with("HELO") {
            reply(&mut writer, "250 folio-testing").await?;
        } else if command.starts_with("MAIL FROM:") {
            from = Some(path_argument(&line["MAIL FROM:".len()..]));
            reply(&mut writer, "250 OK").await?;
        } else if command.starts_with("RCPT TO:") {
            recipients.push(path_argument(&line["RCPT TO:".len()..]));
            reply(&mut writer, "250 OK").await?;
        } else if command == "DATA" {
            reply(&mut writer, "354 End data with <CR><LF>.<CR><LF>").await?;

            let mut data = Vec::new();
            while let Some(line) = lines.next_line().await? {
                if line == "." {
                    break;
                }
                if line.starts_with('.') {
                    data.push(line[1..].to_owned());
                } else {
                    data.push(line);
                }
            }

            let mail = ReceivedMail {
                from: from.take().unwrap_or_default(),
                recipients: std::mem::take(&mut recipients),
                data: data.join("\n"),
            };

            if take_one(&state.stall_next) {
                debug!("stalling mail on purpose");
                std::future::pending::<()>().await;
            }

            if take_one(&state.fail_next) {
                debug!("rejecting mail on purpose");
                reply(&mut writer, "451 Requested action aborted: try again later").await?;
            } else {
                state.mails.lock().unwrap().push(mail);
                reply(&mut writer, "250 OK: queued").await?;
            }
        } else if command == "RSET" {
            from = None;
            recipients.clear();
            reply(&mut writer, "250 OK").await?;
        } else if command == "QUIT" {
            reply(&mut writer, "221 Bye").await?;
            return Ok(());
        } else {
            reply(&mut writer, "250 OK").await?;
        }
    }

    Ok(())
}

/// Decrement `counter` unless it is already zero.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn reply(writer: &mut (impl AsyncWrite + Unpin), line: &str) -> std::io::Result<()> {
    writer.write_all(format!("{line}\r\n").as_bytes()).await?;
    writer.flush().await
}

/// `<user@example.com> SIZE=123` -> `user@example.com`
fn path_argument(argument: &str) -> String {
    let argument = argument.trim();
    let path = argument.split_whitespace().next().unwrap_or_default();
    path.trim_start_matches('<').trim_end_matches('>').to_owned()
}
