use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_stream::try_stream;
use futures::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::dispatcher::{Level, Notification, View, dispatch};
use super::types::{EventParser, InboundEvent};
use crate::Result;
use crate::config::Config;
use crate::refresh::{
    DataLoader, DataSource, Outcome, RefreshCoordinator, RefreshEvent, ReloadTarget, Session,
};
use crate::ws::config::Config as WsConfig;
use crate::ws::connection::{ConnectionState, StatusEvent};
use crate::ws::{ConnectionManager, Transport, TungsteniteTransport, WsError};

const NOTIFICATION_CAPACITY: usize = 64;

/// Live dashboard client: keeps a [`Session`] in sync with server pushes.
///
/// Inbound events are routed through [`dispatch`]; reloads go to the
/// [`RefreshCoordinator`], and user-facing messages are published on
/// [`notifications`](Self::notifications). Connection problems never reach the
/// caller as errors; they show up as [`StatusEvent`]s and notifications.
///
/// With [`Config::use_api`] disabled the dashboard reads the static export
/// only, and the real-time channel is never opened.
///
/// # Example
///
/// ```rust, no_run
/// use apibet_client::Config;
/// use apibet_client::api::loader::DashboardLoader;
/// use apibet_client::realtime::Client;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::from_env()?;
///     let client = Client::new(&config, DashboardLoader::new(&config)?);
///
///     client.refresh().await?;
///     client.connect()?;
///
///     let mut notifications = client.notifications();
///     while let Ok(notification) = notifications.recv().await {
///         println!("[{}] {}", notification.level, notification.message);
///     }
///
///     Ok(())
/// }
/// ```
pub struct Client<L> {
    inner: Arc<ClientInner<L>>,
}

impl<L> Clone for Client<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<L> {
    connection: ConnectionManager<InboundEvent>,
    live: bool,
    coordinator: RefreshCoordinator<L>,
    notifications: broadcast::Sender<Notification>,
    analytics_visible: Arc<AtomicBool>,
}

impl<L: DataLoader> Client<L> {
    /// Create a client for `config.realtime_url` over a tungstenite transport.
    ///
    /// The connection stays [`ConnectionState::Idle`] until [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: &Config, loader: L) -> Self {
        Self::with_transport(config, WsConfig::default(), loader, TungsteniteTransport)
    }

    /// Create a client with an explicit connection config and transport.
    ///
    /// `config` supplies the endpoint and the data mode.
    #[must_use]
    pub fn with_transport<T: Transport>(
        config: &Config,
        ws_config: WsConfig,
        loader: L,
        transport: T,
    ) -> Self {
        let connection = ConnectionManager::new(
            config.realtime_url.to_string(),
            ws_config,
            EventParser,
            transport,
        );
        let coordinator = RefreshCoordinator::new(loader);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        let analytics_visible = Arc::new(AtomicBool::new(false));

        let task = DispatchTask {
            coordinator: coordinator.clone(),
            notifications: notifications.clone(),
            analytics_visible: Arc::clone(&analytics_visible),
        };
        tokio::spawn(task.run(
            connection.subscribe(),
            connection.status_events(),
            coordinator.events(),
        ));

        Self {
            inner: Arc::new(ClientInner {
                connection,
                live: config.use_api,
                coordinator,
                notifications,
                analytics_visible,
            }),
        }
    }

    /// Open the real-time channel. A no-op while already open or opening, and
    /// in static mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection task has stopped.
    pub fn connect(&self) -> Result<()> {
        if !self.inner.live {
            #[cfg(feature = "tracing")]
            tracing::info!("Static data mode, real-time channel stays closed");
            return Ok(());
        }
        self.inner.connection.connect()
    }

    /// `true` when the client talks to the live backend.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.live
    }

    /// Close the real-time channel without reconnecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection task has stopped.
    pub fn close(&self) -> Result<()> {
        self.inner.connection.close()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Subscribe to user-facing notifications.
    #[must_use]
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// Subscribe to connection status changes.
    #[must_use]
    pub fn status_events(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.connection.status_events()
    }

    /// Stream of decoded server pushes, for callers that want to observe them directly.
    ///
    /// Ends when the connection task stops. Yields an error if the stream fell
    /// behind and missed events.
    pub fn events(&self) -> impl Stream<Item = Result<InboundEvent>> + use<L> {
        let mut rx = self.inner.connection.subscribe();

        try_stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(RecvError::Lagged(count)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Event stream lagged, missed {count} events");
                        Err(WsError::Lagged { count })?;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    /// The current session snapshot.
    #[must_use]
    pub fn session(&self) -> Arc<Session> {
        self.inner.coordinator.session()
    }

    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator<L> {
        &self.inner.coordinator
    }

    /// Tell the client whether the analytics view is on screen.
    ///
    /// Result pushes refresh prediction stats only while it is.
    pub fn set_analytics_visible(&self, visible: bool) {
        self.inner.analytics_visible.store(visible, Ordering::Relaxed);
    }

    /// Reload the match list now.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; the session is left untouched.
    pub async fn refresh(&self) -> Result<Outcome> {
        self.inner.coordinator.reload().await
    }
}

struct DispatchTask<L> {
    coordinator: RefreshCoordinator<L>,
    notifications: broadcast::Sender<Notification>,
    analytics_visible: Arc<AtomicBool>,
}

impl<L: DataLoader> DispatchTask<L> {
    async fn run(
        self,
        mut messages: broadcast::Receiver<InboundEvent>,
        mut status: broadcast::Receiver<StatusEvent>,
        mut refresh: broadcast::Receiver<RefreshEvent>,
    ) {
        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Ok(event) => self.on_event(&event),
                    Err(RecvError::Lagged(count)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(count, "Missed real-time events, reloading");
                        #[cfg(not(feature = "tracing"))]
                        let _ = count;
                        self.coordinator.trigger_reload();
                    }
                    Err(RecvError::Closed) => break,
                },
                event = status.recv() => match event {
                    Ok(event) => self.on_status(&event),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
                event = refresh.recv() => match event {
                    Ok(event) => self.on_refresh(&event),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Dispatch task stopped");
    }

    fn on_event(&self, event: &InboundEvent) {
        let view = View::new(self.analytics_visible.load(Ordering::Relaxed));
        let reaction = dispatch(event, view);

        #[cfg(feature = "tracing")]
        tracing::debug!(kind = ?event.kind(), ?reaction, "Dispatching event");

        if reaction.reload_matches {
            self.coordinator.trigger_reload();
        }
        if reaction.reload_prediction_stats {
            self.coordinator.trigger_stats_reload();
        }
        if let Some(notification) = reaction.notification {
            self.notify(notification);
        }
    }

    fn on_status(&self, event: &StatusEvent) {
        match event {
            StatusEvent::Connected => {
                self.notify(Notification::new(
                    Level::Success,
                    "Connected to real-time server",
                ));
            }
            StatusEvent::GaveUp { .. } => {
                self.notify(Notification::new(Level::Error, "Real-time updates stopped"));
            }
            _ => {}
        }
    }

    fn on_refresh(&self, event: &RefreshEvent) {
        match event {
            RefreshEvent::Applied {
                source: DataSource::Cache,
                ..
            } => self.notify(Notification::new(
                Level::Warning,
                "Using cached data (API offline)",
            )),
            RefreshEvent::LoadFailed {
                target: ReloadTarget::Matches,
                message,
            } => self.notify(Notification::new(
                Level::Error,
                format!("Failed to load data: {message}"),
            )),
            RefreshEvent::LoadFailed {
                target: ReloadTarget::PredictionStats,
                ..
            } => self.notify(Notification::new(Level::Error, "Failed to load analytics")),
            _ => {}
        }
    }

    fn notify(&self, notification: Notification) {
        // No receivers is fine
        _ = self.notifications.send(notification);
    }
}
