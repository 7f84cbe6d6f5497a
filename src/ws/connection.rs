#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt::Debug;
use std::future::pending;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until, timeout};

use super::config::Config;
use super::error::WsError;
use super::machine::{CloseDecision, ConnectDecision, StateMachine};
use super::traits::MessageParser;
use super::transport::{Link, OpenError, Transport, TransportEvent};
use crate::Result;

pub use super::machine::{ConnectionState, StatusEvent};

/// Broadcast channel capacity for incoming messages.
const BROADCAST_CAPACITY: usize = 1024;
/// Broadcast channel capacity for status notifications.
const STATUS_CAPACITY: usize = 64;

/// Literal liveness frame understood by the server.
pub const PING_FRAME: &str = "ping";

#[derive(Debug)]
enum Command {
    Connect,
    Close,
    Send(String),
}

/// Manages the lifecycle of a single real-time connection: connecting, reconnecting
/// with a bounded budget, liveness pings, and fan-out of parsed messages.
///
/// All transport callbacks run as turns of one background task, so they never
/// overlap. Handles are cheap to clone; the task stops (closing any open link)
/// when the last handle is dropped.
///
/// # Example
///
/// ```ignore
/// let connection = ConnectionManager::new(
///     "ws://localhost:8000/ws".to_owned(),
///     Config::default(),
///     EventParser,
///     TungsteniteTransport,
/// );
/// connection.connect()?;
///
/// let mut rx = connection.subscribe();
/// while let Ok(msg) = rx.recv().await {
///     println!("Received: {msg:?}");
/// }
/// ```
#[derive(Clone)]
pub struct ConnectionManager<M>
where
    M: DeserializeOwned + Debug + Clone + Send + 'static,
{
    /// Watch channel receiver for state changes (for use in checking the current state)
    state_rx: watch::Receiver<ConnectionState>,
    /// Commands for the connection task
    command_tx: mpsc::UnboundedSender<Command>,
    /// Broadcast sender for incoming messages
    broadcast_tx: broadcast::Sender<M>,
    /// Broadcast sender for observer notifications
    status_tx: broadcast::Sender<StatusEvent>,
}

impl<M> ConnectionManager<M>
where
    M: DeserializeOwned + Debug + Clone + Send + 'static,
{
    /// Create a new connection manager in the [`ConnectionState::Idle`] state.
    ///
    /// Nothing is opened until [`connect`](Self::connect) is called. The liveness
    /// timer starts now and runs for the lifetime of the manager.
    pub fn new<P, T>(endpoint: String, config: Config, parser: P, transport: T) -> Self
    where
        P: MessageParser<M>,
        T: Transport,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (status_tx, _) = broadcast::channel(STATUS_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let task = ConnectionTask {
            endpoint,
            machine: StateMachine::new(config.reconnect.clone()),
            config,
            parser,
            transport,
            link: None,
            reconnect_at: None,
            state_tx,
            broadcast_tx: broadcast_tx.clone(),
            status_tx: status_tx.clone(),
        };

        tokio::spawn(task.run(command_rx));

        Self {
            state_rx,
            command_tx,
            broadcast_tx,
            status_tx,
        }
    }

    /// Open the connection. A no-op while a connection is open or opening.
    pub fn connect(&self) -> Result<()> {
        self.command(Command::Connect)
    }

    /// Close the connection without scheduling a reconnect.
    pub fn close(&self) -> Result<()> {
        self.command(Command::Close)
    }

    /// Serialize `request` as JSON and send it as a text frame.
    pub fn send<R: Serialize>(&self, request: &R) -> Result<()> {
        let json = serde_json::to_string(request)?;
        self.send_text(json)
    }

    /// Send a raw text frame. Frames sent while not open are dropped.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.command(Command::Send(text))
    }

    fn command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_e| WsError::ManagerStopped)?;
        Ok(())
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to incoming messages.
    ///
    /// Each call returns a new independent receiver. Multiple subscribers can
    /// receive messages concurrently without blocking each other.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<M> {
        self.broadcast_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Subscribe to observer notifications (connected, disconnected, errors, give-up).
    #[must_use]
    pub fn status_events(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }
}

struct ConnectionTask<M, P, T: Transport> {
    endpoint: String,
    config: Config,
    parser: P,
    transport: T,
    machine: StateMachine,
    /// At most one live link per manager
    link: Option<T::Link>,
    /// Deadline of the scheduled reconnect, if any
    reconnect_at: Option<Instant>,
    state_tx: watch::Sender<ConnectionState>,
    broadcast_tx: broadcast::Sender<M>,
    status_tx: broadcast::Sender<StatusEvent>,
}

impl<M, P, T> ConnectionTask<M, P, T>
where
    M: DeserializeOwned + Debug + Clone + Send + 'static,
    P: MessageParser<M>,
    T: Transport,
{
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        let period = self.config.ping_interval;
        let mut ping_interval = interval_at(Instant::now() + period, period);
        ping_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    let Some(command) = command else {
                        // Every handle is gone
                        break;
                    };
                    match command {
                        Command::Connect => self.connect(&mut command_rx).await,
                        Command::Close => self.close().await,
                        Command::Send(text) => self.send(text).await,
                    }
                }

                event = next_event(&mut self.link) => {
                    self.on_event(event);
                }

                () = reconnect_timer(self.reconnect_at) => {
                    self.reconnect_at = None;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = self.machine.attempt(), "Reconnect timer fired");
                    self.connect(&mut command_rx).await;
                }

                _ = ping_interval.tick() => {
                    self.on_ping_tick().await;
                }
            }
        }

        if let Some(mut link) = self.link.take() {
            drop(link.close().await);
        }
    }

    /// Open a link, still serving commands while the attempt is in flight.
    ///
    /// A `Close` (or every handle going away) abandons the attempt.
    async fn connect(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) {
        if self.machine.begin_connect() == ConnectDecision::Skip {
            #[cfg(feature = "tracing")]
            tracing::trace!(state = ?self.machine.state(), "Connect ignored");
            return;
        }
        self.publish();

        let limit = self.config.connect_timeout;
        let attempt = {
            let open = timeout(limit, self.transport.open(&self.endpoint));
            tokio::pin!(open);

            loop {
                tokio::select! {
                    result = &mut open => break Some(result),
                    command = commands.recv() => match command {
                        Some(Command::Connect) => {}
                        Some(Command::Send(text)) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(%text, "Dropping frame, connection is not open");
                            #[cfg(not(feature = "tracing"))]
                            let _ = text;
                        }
                        Some(Command::Close) | None => break None,
                    },
                }
            }
        };

        let Some(result) = attempt else {
            #[cfg(feature = "tracing")]
            tracing::info!(endpoint = %self.endpoint, "Connection attempt abandoned");
            self.close().await;
            return;
        };
        let result = result.unwrap_or_else(|_elapsed| {
            Err(OpenError::Connect(format!(
                "no connection after {}ms",
                limit.as_millis()
            )))
        });

        match result {
            Ok(link) => {
                self.link = Some(link);
                self.reconnect_at = None;
                self.machine.opened();
            }
            Err(OpenError::Construct(reason)) => {
                #[cfg(feature = "tracing")]
                tracing::error!(endpoint = %self.endpoint, %reason, "Unable to construct transport");
                self.machine.construct_failed(reason);
            }
            Err(OpenError::Connect(reason)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %self.endpoint, %reason, "Unable to connect");
                self.machine.errored(reason);
                let decision = self.machine.closed();
                self.schedule(decision);
            }
        }

        self.publish();
    }

    async fn close(&mut self) {
        self.reconnect_at = None;

        if self.machine.begin_close() {
            self.publish();
            if let Some(mut link) = self.link.take()
                && let Err(e) = link.close().await
            {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "Error while closing link");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
            let decision = self.machine.closed();
            self.schedule(decision);
        }

        self.publish();
    }

    async fn send(&mut self, text: String) {
        match self.link.as_mut() {
            Some(link) if self.machine.state().is_open() => {
                if let Err(e) = link.send(text).await {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "Failed to send frame");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &e;
                }
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%text, "Dropping frame, connection is not open");
            }
        }
    }

    async fn on_ping_tick(&mut self) {
        if !self.machine.should_ping() {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            #[cfg(feature = "tracing")]
            tracing::trace!("Sending liveness ping");
            if let Err(e) = link.send(PING_FRAME.to_owned()).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Failed to send ping");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
        }
    }

    fn on_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Text(text)) => self.on_text(&text),
            Some(TransportEvent::Error(message)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%message, "WebSocket error");
                self.machine.errored(message);
            }
            Some(TransportEvent::Closed { code, reason }) => {
                #[cfg(feature = "tracing")]
                tracing::info!(?code, %reason, "WebSocket closed");
                #[cfg(not(feature = "tracing"))]
                let _ = (&code, &reason);
                self.on_closed();
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::info!("WebSocket stream ended");
                self.on_closed();
            }
        }
        self.publish();
    }

    fn on_text(&self, text: &str) {
        #[cfg(feature = "tracing")]
        tracing::trace!(%text, "Received WebSocket text message");

        match self.parser.parse(text.as_bytes()) {
            Ok(messages) => {
                for message in messages {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(?message, "Parsed WebSocket message");
                    _ = self.broadcast_tx.send(message);
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, error = %e, "Failed to parse WebSocket message");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
        }
    }

    fn on_closed(&mut self) {
        self.link = None;
        let decision = self.machine.closed();
        self.schedule(decision);
    }

    fn schedule(&mut self, decision: CloseDecision) {
        match decision {
            CloseDecision::Reconnect { attempt, delay } => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    attempt,
                    max_attempts = self.config.reconnect.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Scheduling reconnect"
                );
                #[cfg(not(feature = "tracing"))]
                let _ = attempt;
                self.reconnect_at = Some(Instant::now() + delay);
            }
            CloseDecision::GiveUp => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    attempts = self.machine.attempt(),
                    "Reconnect budget exhausted, giving up"
                );
                self.reconnect_at = None;
            }
            CloseDecision::Stay | CloseDecision::Ignored => {}
        }
    }

    /// Push the current state and any pending notifications to observers.
    fn publish(&mut self) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        for event in self.machine.drain_events() {
            #[cfg(feature = "tracing")]
            tracing::debug!(?event, "Connection status");
            _ = self.status_tx.send(event);
        }
    }
}

async fn next_event<L: Link>(link: &mut Option<L>) -> Option<TransportEvent> {
    match link {
        Some(link) => link.next_event().await,
        None => pending().await,
    }
}

async fn reconnect_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
    use tokio::time::sleep;

    use super::*;

    struct JsonParser;

    impl MessageParser<Value> for JsonParser {
        fn parse(&self, bytes: &[u8]) -> Result<Vec<Value>> {
            Ok(vec![serde_json::from_slice(bytes)?])
        }
    }

    /// Server side of a mock link.
    struct Remote {
        events: UnboundedSender<TransportEvent>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[derive(Clone, Default)]
    struct MockTransport {
        refuse: Arc<AtomicBool>,
        hang: Arc<AtomicBool>,
        opens: Arc<AtomicUsize>,
        remotes: Arc<Mutex<Vec<Remote>>>,
    }

    impl MockTransport {
        fn refusing() -> Self {
            let transport = Self::default();
            transport.refuse.store(true, Ordering::SeqCst);
            transport
        }

        fn hanging() -> Self {
            let transport = Self::default();
            transport.hang.store(true, Ordering::SeqCst);
            transport
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }

        fn push(&self, event: TransportEvent) {
            let remotes = self.remotes.lock().unwrap();
            remotes.last().unwrap().events.send(event).unwrap();
        }

        fn sent(&self) -> Vec<String> {
            let remotes = self.remotes.lock().unwrap();
            remotes.last().unwrap().sent.lock().unwrap().clone()
        }
    }

    struct MockLink {
        events: UnboundedReceiver<TransportEvent>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Link for MockLink {
        async fn send(&mut self, text: String) -> Result<()> {
            self.sent.lock().unwrap().push(text);
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        async fn next_event(&mut self) -> Option<TransportEvent> {
            self.events.recv().await
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        type Link = MockLink;

        async fn open(&self, endpoint: &str) -> std::result::Result<MockLink, OpenError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if endpoint.is_empty() {
                return Err(OpenError::Construct("empty endpoint".to_owned()));
            }
            if self.refuse.load(Ordering::SeqCst) {
                return Err(OpenError::Connect("connection refused".to_owned()));
            }
            if self.hang.load(Ordering::SeqCst) {
                return pending().await;
            }

            let (events_tx, events_rx) = unbounded_channel();
            let sent = Arc::new(Mutex::new(Vec::new()));
            self.remotes.lock().unwrap().push(Remote {
                events: events_tx,
                sent: Arc::clone(&sent),
            });
            Ok(MockLink {
                events: events_rx,
                sent,
            })
        }
    }

    fn manager(transport: &MockTransport) -> ConnectionManager<Value> {
        ConnectionManager::new(
            "ws://mock/ws".to_owned(),
            Config::default(),
            JsonParser,
            transport.clone(),
        )
    }

    async fn wait_open(manager: &ConnectionManager<Value>) {
        let mut state_rx = manager.state_receiver();
        state_rx.wait_for(|state| state.is_open()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn connect_while_open_opens_nothing_new() {
        let transport = MockTransport::default();
        let manager = manager(&transport);

        assert_eq!(manager.state(), ConnectionState::Idle);
        manager.connect().unwrap();
        wait_open(&manager).await;

        manager.connect().unwrap();
        manager.connect().unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(transport.opens(), 1);
        assert!(manager.state().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn pings_only_while_open() {
        let transport = MockTransport::default();
        let manager = manager(&transport);

        // Not connected yet: ticks are no-ops
        sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.opens(), 0);

        manager.connect().unwrap();
        wait_open(&manager).await;

        sleep(Duration::from_secs(51)).await;
        assert_eq!(transport.sent(), vec!["ping".to_owned(), "ping".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frames_are_dropped() {
        let transport = MockTransport::default();
        let manager = manager(&transport);
        let mut rx = manager.subscribe();

        manager.connect().unwrap();
        wait_open(&manager).await;

        transport.push(TransportEvent::Text("{not json".to_owned()));
        transport.push(TransportEvent::Text(r#"{"type":"heartbeat"}"#.to_owned()));

        let message = rx.recv().await.unwrap();
        assert_eq!(message["type"], "heartbeat");
        assert!(manager.state().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connections_retry_until_budget_exhausted() {
        let transport = MockTransport::refusing();
        let manager = manager(&transport);
        let mut status = manager.status_events();

        manager.connect().unwrap();

        // 3 + 6 + 9 + 12 + 15 seconds of linear backoff
        sleep(Duration::from_secs(44)).await;
        assert_eq!(transport.opens(), 5);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.opens(), 6);

        sleep(Duration::from_secs(300)).await;
        assert_eq!(transport.opens(), 6);
        assert_eq!(manager.state(), ConnectionState::Closed);

        let mut gave_up = false;
        while let Ok(event) = status.try_recv() {
            gave_up |= matches!(event, StatusEvent::GaveUp { attempts: 5 });
        }
        assert!(gave_up, "expected a GaveUp notification");
    }

    #[tokio::test(start_paused = true)]
    async fn close_from_peer_schedules_reconnect() {
        let transport = MockTransport::default();
        let manager = manager(&transport);

        manager.connect().unwrap();
        wait_open(&manager).await;

        transport.push(TransportEvent::Error("reset by peer".to_owned()));
        sleep(Duration::from_millis(10)).await;
        assert!(manager.state().is_open(), "errors alone do not close");

        transport.push(TransportEvent::Closed {
            code: Some(1006),
            reason: String::new(),
        });
        sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state(), ConnectionState::Closed);

        sleep(Duration::from_secs(3)).await;
        wait_open(&manager).await;
        assert_eq!(transport.opens(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_close_does_not_reconnect() {
        let transport = MockTransport::default();
        let manager = manager(&transport);

        manager.connect().unwrap();
        wait_open(&manager).await;
        manager.close().unwrap();

        sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert_eq!(transport.opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn construct_failure_is_reported_not_retried() {
        let transport = MockTransport::default();
        let manager = ConnectionManager::<Value>::new(
            String::new(),
            Config::default(),
            JsonParser,
            transport.clone(),
        );
        let mut status = manager.status_events();

        manager.connect().unwrap();
        sleep(Duration::from_secs(120)).await;

        assert_eq!(transport.opens(), 1);
        assert_eq!(manager.state(), ConnectionState::Closed);

        let mut failed = false;
        while let Ok(event) = status.try_recv() {
            failed |= matches!(event, StatusEvent::Failed { .. });
        }
        assert!(failed, "expected a Failed notification");
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_open_times_out_and_counts_as_attempt() {
        let transport = MockTransport::hanging();
        let manager = manager(&transport);
        let mut status = manager.status_events();

        manager.connect().unwrap();

        sleep(Duration::from_secs(11)).await;
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert_eq!(transport.opens(), 1);

        let mut timed_out = false;
        let mut retry_in = None;
        while let Ok(event) = status.try_recv() {
            match event {
                StatusEvent::Error { message } => timed_out |= message.contains("10000ms"),
                StatusEvent::Disconnected { retry_in: delay } => retry_in = delay,
                _ => {}
            }
        }
        assert!(timed_out, "expected a timeout error");
        assert_eq!(retry_in, Some(Duration::from_secs(3)));

        // Five retries of 10s each after 3 + 6 + 9 + 12 + 15 seconds of backoff
        sleep(Duration::from_secs(300)).await;
        assert_eq!(transport.opens(), 6);
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn close_while_connecting_abandons_attempt() {
        let transport = MockTransport::hanging();
        let manager = manager(&transport);
        let mut status = manager.status_events();

        manager.connect().unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.send_text("hello".to_owned()).unwrap();
        manager.close().unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state(), ConnectionState::Closed);

        let mut events = Vec::new();
        while let Ok(event) = status.try_recv() {
            events.push(event);
        }
        assert!(
            events.contains(&StatusEvent::Disconnected { retry_in: None }),
            "{events:?}"
        );

        sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.opens(), 1);
        assert_eq!(manager.state(), ConnectionState::Closed);
    }
}
