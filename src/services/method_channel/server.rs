use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::events::{ErrorCode, MethodCall, Outbound, ShieldEvent};
use crate::services::dispatcher::EventDispatcher;

use super::handler::ShieldMethodHandler;

/// Канал методов на Unix-сокете: по строке JSON на вызов, ответ и событие
pub struct MethodChannelServer {
    listener: UnixListener,
    socket_path: PathBuf,
    handler: Arc<ShieldMethodHandler>,
    dispatcher: Arc<EventDispatcher>,
}

impl MethodChannelServer {
    pub fn bind(
        socket_path: &Path,
        handler: Arc<ShieldMethodHandler>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Result<Self> {
        // Сокет от прошлого запуска мешает bind
        match std::fs::remove_file(socket_path) {
            Ok(()) => debug!("Удалён старый сокет {:?}", socket_path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(socket_path)?;
        info!("Канал методов слушает {:?}", socket_path);

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            handler,
            dispatcher,
        })
    }

    #[cfg(test)]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn run(&self) -> Result<()> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            let handler = self.handler.clone();
            let events = self.dispatcher.subscribe();

            info!(
                "Подключен клиент канала методов (слушателей событий: {})",
                self.dispatcher.listener_count()
            );
            tokio::spawn(async move {
                match serve_client(stream, handler, events).await {
                    Ok(()) => info!("Клиент канала методов отключился"),
                    Err(e) => error!("Ошибка соединения канала методов: {}", e),
                }
            });
        }
    }
}

impl Drop for MethodChannelServer {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Не удалось удалить сокет {:?}: {}", self.socket_path, e);
            }
        }
    }
}

async fn serve_client(
    stream: UnixStream,
    handler: Arc<ShieldMethodHandler>,
    mut events: broadcast::Receiver<ShieldEvent>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    // Недочитанная строка переживает отмену ветки в select!
    let mut line = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut line) => {
                if read? == 0 {
                    return Ok(());
                }
                let reply = reply_to_line(&line, &handler).await;
                line.clear();

                if let Some(reply) = reply {
                    write_message(&mut writer, &reply).await?;
                }
            }

            event = events.recv() => match event {
                Ok(event) => write_message(&mut writer, &Outbound::event(event)).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Клиент не успевает за событиями, пропущено {}", skipped);
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

/// Ответ на одну строку; байты, не являющиеся JSON-вызовом (в том числе
/// не UTF-8), получают `INVALID_ARGS`, соединение остаётся открытым
async fn reply_to_line(line: &[u8], handler: &ShieldMethodHandler) -> Option<Outbound> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let reply = match serde_json::from_slice::<MethodCall>(line) {
        Ok(call) => Outbound::reply(call.id, handler.handle(&call).await),
        Err(e) => {
            warn!("Некорректный вызов: {}", e);
            Outbound::Error {
                id: 0,
                code: ErrorCode::InvalidArgs,
                message: format!("Malformed call: {}", e),
            }
        }
    };

    Some(reply)
}

async fn write_message(writer: &mut OwnedWriteHalf, message: &Outbound) -> Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::{PressEvent, PressSource};
    use crate::services::screen_monitor::DryRunScreenMonitor;
    use crate::services::sms::DryRunSmsSender;
    use crate::services::volume_sos::VolumeSos;
    use crate::utils::clock::ManualClock;
    use serde_json::{json, Value};
    use tokio::io::Lines;
    use tokio::net::unix::OwnedReadHalf;

    struct Client {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl Client {
        async fn connect(path: &Path) -> Self {
            let (reader, writer) = UnixStream::connect(path).await.unwrap().into_split();
            Self {
                lines: BufReader::new(reader).lines(),
                writer,
            }
        }

        async fn request(&mut self, line: &str) -> Value {
            self.writer.write_all(format!("{}\n", line).as_bytes()).await.unwrap();
            self.next().await
        }

        async fn next(&mut self) -> Value {
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }
    }

    fn setup(socket: &Path) -> (MethodChannelServer, Arc<VolumeSos>, Arc<ManualClock>) {
        let mut config = Config::default();
        config.input.enabled = false;
        config.media_keys.enabled = false;

        let dispatcher = Arc::new(EventDispatcher::new(8));
        let clock = Arc::new(ManualClock::default());
        let volume_sos = Arc::new(VolumeSos::new(
            Arc::new(config),
            dispatcher.clone(),
            clock.clone(),
            false,
        ));
        let handler = Arc::new(ShieldMethodHandler::new(
            volume_sos.clone(),
            Arc::new(DryRunScreenMonitor::new(1000)),
            Arc::new(DryRunSmsSender::new(10)),
        ));

        let server = MethodChannelServer::bind(socket, handler, dispatcher).unwrap();
        (server, volume_sos, clock)
    }

    #[tokio::test]
    async fn test_calls_and_trigger_event() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("sos.sock");
        let (server, volume_sos, clock) = setup(&socket);
        let server = Arc::new(server);
        let task = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };

        let mut client = Client::connect(&socket).await;

        assert_eq!(
            client.request(r#"{"id":1,"method":"enableVolumeSos"}"#).await,
            json!({"type": "result", "id": 1, "value": true})
        );
        assert!(volume_sos.is_enabled());

        assert_eq!(
            client.request(r#"{"id":2,"method":"isScreenOn"}"#).await,
            json!({"type": "result", "id": 2, "value": true})
        );

        for now in [0, 500, 1000] {
            clock.set(now);
            volume_sos.gate().handle_press(&PressEvent::new(PressSource::Foreground));
        }
        assert_eq!(
            client.next().await,
            json!({"type": "event", "name": "onVolumeSosTriggered", "value": null})
        );

        assert_eq!(
            client.request(r#"{"id":3,"method":"vibrate"}"#).await,
            json!({"type": "notImplemented", "id": 3})
        );

        let malformed = client.request("{not json").await;
        assert_eq!(malformed["type"], "error");
        assert_eq!(malformed["id"], 0);
        assert_eq!(malformed["code"], "INVALID_ARGS");

        let missing = client
            .request(r#"{"id":4,"method":"sendSms","arguments":{"phone":"+100"}}"#)
            .await;
        assert_eq!(
            missing,
            json!({"type": "error", "id": 4, "code": "INVALID_ARGS", "message": "Phone or message missing"})
        );

        task.abort();
    }

    #[tokio::test]
    async fn test_invalid_utf8_keeps_connection_open() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("sos.sock");
        let (server, _, _) = setup(&socket);
        let server = Arc::new(server);
        let task = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };

        let mut client = Client::connect(&socket).await;

        client.writer.write_all(b"\xff\xfe\n").await.unwrap();
        let garbage = client.next().await;
        assert_eq!(garbage["type"], "error");
        assert_eq!(garbage["id"], 0);
        assert_eq!(garbage["code"], "INVALID_ARGS");

        // Пустые строки пропускаются без ответа
        client.writer.write_all(b"\n  \n").await.unwrap();

        assert_eq!(
            client.request(r#"{"id":5,"method":"isScreenOn"}"#).await,
            json!({"type": "result", "id": 5, "value": true})
        );

        task.abort();
    }

    #[tokio::test]
    async fn test_stale_socket_is_replaced_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("sos.sock");
        std::fs::write(&socket, b"stale").unwrap();

        let (server, _, _) = setup(&socket);
        assert_eq!(server.socket_path(), socket.as_path());
        assert!(socket.exists());

        drop(server);
        assert!(!socket.exists());
    }
}
