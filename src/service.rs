//! Weather service task
//!
//! One tokio task owns the `FetchCoordinator` and the `RefreshScheduler`.
//! Intents from presentation code, fetch results and timer ticks are handled
//! one at a time in a `tokio::select!` loop, so the fetch session needs no
//! locks. After every step the task publishes a `Snapshot` on a watch channel.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::coordinator::{Completion, FetchCoordinator, FetchCycle, ViewState};
use crate::data::{GeocodeError, GeocodingClient, Location, WeatherClient};
use crate::refresh::RefreshScheduler;

/// State of the place-name search box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStatus {
    /// A search request is running
    pub searching: bool,
    /// User-facing message from the last failed search
    pub error: Option<String>,
    /// Location resolved by the last successful search
    pub result: Option<Location>,
}

/// Everything presentation code needs to render the current state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Active location, including any back-filled name
    pub location: Option<Location>,
    pub view: ViewState,
    pub search: SearchStatus,
    /// When the next automatic refresh fires, if one is scheduled
    pub next_refresh_at: Option<Instant>,
}

/// Requests sent from the handle to the service task
#[derive(Debug)]
enum Intent {
    Select(Location),
    Search(String),
    Refresh,
}

/// Results reported back to the service task by spawned work
#[derive(Debug)]
enum Event {
    Fetched {
        generation: u64,
        completion: Completion,
    },
    SearchDone {
        id: u64,
        result: Result<Location, GeocodeError>,
    },
}

/// Handle for controlling the weather service task
pub struct ServiceHandle {
    intents: mpsc::Sender<Intent>,
    snapshots: watch::Receiver<Snapshot>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// Spawns the service task with clients built from `config`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: Config) -> Self {
        let weather = WeatherClient::new(&config);
        let geocoder = GeocodingClient::new(&config);
        Self::with_clients(weather, geocoder, RefreshScheduler::new(config.refresh_interval))
    }

    /// Spawns the service task with the given clients and scheduler
    pub fn with_clients(
        weather: WeatherClient,
        geocoder: GeocodingClient,
        scheduler: RefreshScheduler,
    ) -> Self {
        let (intent_tx, intent_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        let worker = Worker {
            coordinator: FetchCoordinator::new(),
            scheduler,
            search: SearchStatus::default(),
            latest_search: 0,
            armed_from: None,
            weather,
            geocoder,
            events: event_tx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(worker.run(intent_rx, event_rx, shutdown_rx));

        Self {
            intents: intent_tx,
            snapshots: snapshot_rx,
            shutdown_tx,
            task,
        }
    }

    /// Selects a point on the map
    pub async fn select_location(&self, lat: f64, lng: f64) {
        self.send(Intent::Select(Location::new(lat, lng))).await;
    }

    /// Searches for a place by name and selects the first match
    ///
    /// Blank input is rejected here and nothing is sent. Other search failures
    /// are reported through `Snapshot::search`.
    pub async fn search_location(&self, text: &str) -> Result<(), GeocodeError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        self.send(Intent::Search(query.to_string())).await;
        Ok(())
    }

    /// Re-fetches the active location now
    pub async fn refresh_now(&self) {
        self.send(Intent::Refresh).await;
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Stops the service task and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::warn!("Weather service task ended abnormally: {}", e);
        }
    }

    async fn send(&self, intent: Intent) {
        if self.intents.send(intent).await.is_err() {
            tracing::warn!("Weather service task is not running");
        }
    }
}

/// State owned by the service task
struct Worker {
    coordinator: FetchCoordinator,
    scheduler: RefreshScheduler,
    search: SearchStatus,
    /// Id of the most recently issued search; older results are dropped
    latest_search: u64,
    /// `last_updated_at` the scheduler was last armed for
    armed_from: Option<DateTime<Utc>>,
    weather: WeatherClient,
    geocoder: GeocodingClient,
    events: mpsc::Sender<Event>,
    snapshots: watch::Sender<Snapshot>,
}

impl Worker {
    async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        mut events: mpsc::Receiver<Event>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Weather service started");

        loop {
            let deadline = self.scheduler.deadline();

            tokio::select! {
                Some(intent) = intents.recv() => self.handle_intent(intent),
                Some(event) = events.recv() => self.handle_event(event),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.handle_tick();
                }
                _ = shutdown_rx.recv() => break,
                else => break,
            }

            self.sync_scheduler();
            self.publish();
        }

        tracing::debug!("Weather service stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Select(location) => self.select(location),
            Intent::Search(query) => {
                self.latest_search += 1;
                self.search.searching = true;
                self.search.error = None;

                let id = self.latest_search;
                let geocoder = self.geocoder.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = geocoder.search(&query).await;
                    let _ = events.send(Event::SearchDone { id, result }).await;
                });
            }
            Intent::Refresh => {
                // The countdown restarts even when the in-flight cycle absorbs the refresh
                self.scheduler.refresh_now(Instant::now());
                if let Some(cycle) = self.coordinator.refresh() {
                    tracing::info!(key = %cycle.key, "Manual refresh");
                    self.execute(cycle);
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Fetched {
                generation,
                completion,
            } => {
                if let Some(next) = self.coordinator.on_completion(generation, completion, Utc::now())
                {
                    self.execute(next);
                }
            }
            Event::SearchDone { id, .. } if id != self.latest_search => {
                tracing::debug!(id, latest = self.latest_search, "Dropping superseded search result");
            }
            Event::SearchDone {
                result: Ok(location),
                ..
            } => {
                self.search = SearchStatus {
                    searching: false,
                    error: None,
                    result: Some(location.clone()),
                };
                self.select(location);
            }
            Event::SearchDone { result: Err(e), .. } => {
                tracing::warn!("Location search failed: {}", e);
                self.search.searching = false;
                self.search.error = Some(e.user_message().to_string());
            }
        }
    }

    fn handle_tick(&mut self) {
        if !self.scheduler.poll(Instant::now()) {
            return;
        }
        if let Some(cycle) = self.coordinator.refresh() {
            tracing::info!(key = %cycle.key, "Automatic refresh");
            self.execute(cycle);
        }
    }

    fn select(&mut self, location: Location) {
        if let Some(cycle) = self.coordinator.select_location(location) {
            self.execute(cycle);
        }
    }

    /// Runs the three fetches of a cycle concurrently, reporting each as it lands
    fn execute(&self, cycle: FetchCycle) {
        let FetchCycle {
            generation,
            location,
            ..
        } = cycle;
        let weather = self.weather.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let report = |completion| {
                let events = events.clone();
                async move {
                    let _ = events
                        .send(Event::Fetched {
                            generation,
                            completion,
                        })
                        .await;
                }
            };

            futures::future::join3(
                async {
                    let result = weather.get_current(&location).await;
                    report(Completion::Current(result)).await;
                },
                async {
                    let result = weather.get_forecast(&location).await;
                    report(Completion::Forecast(result)).await;
                },
                async {
                    let alerts = weather.get_alerts(&location).await;
                    report(Completion::Alerts(alerts)).await;
                },
            )
            .await;
        });
    }

    /// Keeps the countdown tied to the last successful update
    fn sync_scheduler(&mut self) {
        if self.coordinator.location().is_none() {
            self.scheduler.disarm();
            self.armed_from = None;
            return;
        }

        let last_updated = self.coordinator.view().last_updated_at;
        if last_updated.is_some() && last_updated != self.armed_from {
            self.scheduler.arm(Instant::now());
            self.armed_from = last_updated;
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(Snapshot {
            location: self.coordinator.location().cloned(),
            view: self.coordinator.view().clone(),
            search: self.search.clone(),
            next_refresh_at: self.scheduler.deadline(),
        });
    }
}
