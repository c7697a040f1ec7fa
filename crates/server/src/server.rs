//! TCP line server
//!
//! Accepts connections and runs one cooperative task per client on the
//! current thread. Requests are whitespace-tokenized lines; responses
//! are written back with a trailing newline. The engine is only ever
//! touched from inside `Session::execute`, which is synchronous, so no
//! task holds the keyspace lock across a suspension point.

use crate::session::Session;
use shoal_engine::Store;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

/// Accept clients forever, spawning a local task per connection.
///
/// Must run inside a `tokio::task::LocalSet`.
pub async fn serve(listener: TcpListener, store: Arc<Store>) -> io::Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        info!(%addr, "client connected");
        let store = Arc::clone(&store);
        tokio::task::spawn_local(async move {
            if let Err(err) = handle_client(socket, store).await {
                warn!(%addr, %err, "client error");
            }
            info!(%addr, "client disconnected");
        });
    }
}

/// Read framed commands until EOF, answering each on the same socket.
///
/// A dropped connection discards the session and any transaction state
/// it was queueing.
async fn handle_client(socket: TcpStream, store: Arc<Store>) -> io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut session = Session::new(store);

    while let Some(line) = lines.next_line().await? {
        let argv: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            continue;
        }
        let response = session.execute(argv);
        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}
