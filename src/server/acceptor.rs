//! TCP acceptor: owns the listening socket and spawns a session per client.

use super::sessions::{SessionId, SessionRegistry};
use crate::commands::CommandRegistry;
use crate::privilege::AccessLevel;
use crate::session::{Session, SessionState};
use crate::storage::Store;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Level every new session starts with
    pub default_privilege: AccessLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_privilege: AccessLevel::ReadWrite,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The mapDB server.
///
/// Holds the listener plus everything sessions share: the store and the
/// command registry.
pub struct Server {
    listener: TcpListener,
    store: Arc<Store>,
    registry: Arc<CommandRegistry>,
    default_privilege: AccessLevel,
    /// Number of live sessions, kept by the accept loop
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Binds the listening socket described by `config`.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self::from_listener(listener, config.default_privilege))
    }

    /// Wraps an already bound listener, with an empty store and the built-in
    /// commands.
    pub fn from_listener(listener: TcpListener, default_privilege: AccessLevel) -> Self {
        Self {
            listener,
            store: Arc::new(Store::new()),
            registry: Arc::new(CommandRegistry::builtin()),
            default_privilege,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replaces the command registry handed to new sessions.
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the store shared by all sessions.
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Live session count. Updated by the accept loop as sessions start and
    /// as their end is reported back.
    pub fn active_sessions(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active)
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Accept errors are logged and skipped. Sessions still running at
    /// shutdown are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            store,
            registry,
            default_privilege,
            active,
        } = self;

        let mut sessions = SessionRegistry::with_counter(active);
        let (closed_tx, mut closed_rx) = mpsc::unbounded_channel::<SessionId>();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(active = sessions.len(), "Shutdown signal received, stopping server...");
                    break;
                }
                Some(id) = closed_rx.recv() => {
                    if let Some(addr) = sessions.remove(id) {
                        debug!(session = id, client = %addr, active = sessions.len(), "Session removed");
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let id = sessions.add(addr.to_string());
                        debug!(session = id, client = %addr, active = sessions.len(), "Session added");

                        let session = Session::new(
                            stream,
                            SessionState::new(addr.to_string(), default_privilege),
                            Arc::clone(&store),
                            Arc::clone(&registry),
                        );
                        let closed_tx = closed_tx.clone();

                        tokio::spawn(async move {
                            // The session logs its own failure
                            let _ = session.run().await;
                            if closed_tx.send(id).is_err() {
                                warn!(session = id, "Acceptor gone before session ended");
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
            }
        }
    }

    /// Accepts connections until Ctrl+C.
    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::ExitCommand;
    use crate::commands::{Command, Context, FAREWELL, INVALID_COMMAND, OK};
    use crate::privilege::ACCESS_DENIED;
    use crate::session::WELCOME;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const READ_TIMEOUT: Duration = Duration::from_secs(2);

    struct Client {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
        local_addr: SocketAddr,
    }

    impl Client {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let local_addr = stream.local_addr().unwrap();
            let (reader, writer) = stream.into_split();

            let mut client = Self {
                lines: BufReader::new(reader).lines(),
                writer,
                local_addr,
            };
            assert_eq!(client.read_line().await.as_deref(), Some(WELCOME.trim_end()));
            client
        }

        async fn send(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }

        async fn read_line(&mut self) -> Option<String> {
            timeout(READ_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for server")
                .unwrap()
        }

        async fn request(&mut self, line: &str) -> String {
            self.send(line).await;
            self.read_line().await.expect("connection closed")
        }
    }

    async fn create_test_server(privilege: AccessLevel) -> (SocketAddr, Arc<Store>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::from_listener(listener, privilege);
        let addr = server.local_addr().unwrap();
        let store = server.store();

        tokio::spawn(server.run_until(std::future::pending()));

        (addr, store)
    }

    struct Echo;

    impl Command for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echoes its arguments."
        }

        fn privilege(&self) -> AccessLevel {
            AccessLevel::None
        }

        fn execute(&self, _ctx: &mut Context<'_>, args: &[&str]) -> String {
            format!("{}\n", args.join(" "))
        }
    }

    async fn wait_for_active(active: &AtomicUsize, expected: usize) {
        let deadline = tokio::time::Instant::now() + READ_TIMEOUT;
        while active.load(Ordering::Relaxed) != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} active sessions, have {}",
                expected,
                active.load(Ordering::Relaxed)
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.default_privilege, AccessLevel::ReadWrite);
    }

    #[tokio::test]
    async fn test_protocol_scenario() {
        let (addr, store) = create_test_server(AccessLevel::ReadWrite).await;
        let mut client = Client::connect(addr).await;

        assert_eq!(client.request("set foo bar").await, OK.trim_end());
        assert_eq!(store.get("foo").unwrap(), "bar");
        assert_eq!(client.request("get foo").await, "bar");
        assert_eq!(client.request("del foo").await, OK.trim_end());
        assert_eq!(client.request("get foo").await, "key not found");
        assert_eq!(client.request("exit").await, FAREWELL.trim_end());

        // Server closes the connection after saying goodbye
        assert_eq!(client.read_line().await, None);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let (addr, _) = create_test_server(AccessLevel::ReadWrite).await;
        let mut client = Client::connect(addr).await;

        assert_eq!(client.request("frobnicate").await, INVALID_COMMAND.trim_end());
        assert_eq!(client.request("set still here").await, OK.trim_end());
    }

    #[tokio::test]
    async fn test_privilege_gating() {
        let (addr, store) = create_test_server(AccessLevel::Read).await;
        store.set("foo", "bar");

        let mut client = Client::connect(addr).await;

        assert_eq!(client.request("set foo baz").await, ACCESS_DENIED.trim_end());
        assert_eq!(client.request("del foo").await, ACCESS_DENIED.trim_end());
        assert_eq!(store.get("foo").unwrap(), "bar");

        assert_eq!(client.request("get foo").await, "bar");
        assert_eq!(client.request("keys").await, "foo");
    }

    #[tokio::test]
    async fn test_help_over_the_wire() {
        let (addr, _) = create_test_server(AccessLevel::None).await;
        let mut client = Client::connect(addr).await;

        let expected = CommandRegistry::builtin().usage();
        client.send("help").await;

        let mut received = Vec::new();
        for _ in 0..expected.lines().count() {
            received.push(client.read_line().await.unwrap());
        }
        assert_eq!(received, expected.lines().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_whoami_reports_peer_address() {
        let (addr, _) = create_test_server(AccessLevel::None).await;
        let mut client = Client::connect(addr).await;

        let expected = format!("You are connected from {}", client.local_addr);
        assert_eq!(client.request("whoami").await, expected);
    }

    #[tokio::test]
    async fn test_sessions_share_the_store() {
        let (addr, _) = create_test_server(AccessLevel::ReadWrite).await;

        let mut writer = Client::connect(addr).await;
        let mut reader = Client::connect(addr).await;

        assert_eq!(writer.request("set shared 1").await, OK.trim_end());
        assert_eq!(reader.request("get shared").await, "1");

        // One client leaving does not affect the other
        assert_eq!(writer.request("exit").await, FAREWELL.trim_end());
        assert_eq!(reader.request("get shared").await, "1");
    }

    #[tokio::test]
    async fn test_concurrent_writers_same_key() {
        let (addr, store) = create_test_server(AccessLevel::ReadWrite).await;
        let clients = 8;

        let mut handles = Vec::new();
        for i in 0..clients {
            handles.push(tokio::spawn(async move {
                let mut client = Client::connect(addr).await;
                for _ in 0..20 {
                    assert_eq!(
                        client.request(&format!("set race v{}", i)).await,
                        OK.trim_end()
                    );
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let written: Vec<String> = (0..clients).map(|i| format!("v{}", i)).collect();
        assert!(written.contains(&store.get("race").unwrap()));
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::from_listener(listener, AccessLevel::None);
        let addr = server.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        let mut client = Client::connect(addr).await;
        assert_eq!(client.request("frobnicate").await, INVALID_COMMAND.trim_end());

        tx.send(()).unwrap();
        timeout(READ_TIMEOUT, handle).await.unwrap().unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_custom_registry() {
        let mut registry = CommandRegistry::new();
        registry.register(Echo);
        registry.register(ExitCommand);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::from_listener(listener, AccessLevel::ReadWrite).with_registry(registry);
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run_until(std::future::pending()));

        let mut client = Client::connect(addr).await;
        assert_eq!(client.request("echo hi there").await, "hi there");
        // Built-ins are not there unless registered
        assert_eq!(client.request("set foo bar").await, INVALID_COMMAND.trim_end());
        assert_eq!(client.request("exit").await, FAREWELL.trim_end());
        assert_eq!(client.read_line().await, None);
    }

    #[tokio::test]
    async fn test_ended_sessions_are_removed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Server::from_listener(listener, AccessLevel::None);
        let addr = server.local_addr().unwrap();
        let active = server.active_sessions();
        tokio::spawn(server.run_until(std::future::pending()));

        assert_eq!(active.load(Ordering::Relaxed), 0);

        let mut leaving = Client::connect(addr).await;
        let staying = Client::connect(addr).await;
        wait_for_active(&active, 2).await;

        // Ended by `exit`
        assert_eq!(leaving.request("exit").await, FAREWELL.trim_end());
        wait_for_active(&active, 1).await;

        // Ended by the peer closing the connection
        drop(staying);
        wait_for_active(&active, 0).await;
    }

    #[tokio::test]
    async fn test_bind_fails_on_taken_port() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..ServerConfig::default()
        };

        assert!(Server::bind(&config).await.is_err());
    }
}
