//! Fetch orchestration for the selected location
//!
//! `FetchCoordinator` is a synchronous state machine. It decides when a
//! selection needs remote data, hands the caller a `FetchCycle` to execute and
//! reconciles the generation-stamped results into a single `ViewState`. It
//! performs no I/O itself; see `service` for the task that drives it.
//!
//! At most one cycle is in flight. Selections that arrive meanwhile become the
//! pending target and the newest one wins. Results from a cycle whose location
//! is no longer active, or from a superseded generation, never reach the view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{
    AlertSet, ForecastSeries, Location, LocationKey, WeatherError, WeatherSnapshot,
};

/// Message shown when either primary fetch of a cycle fails
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch weather data. Please try again later.";

/// Externally observable weather state for the active location
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    /// Current conditions, present only after a fully successful cycle
    pub weather: Option<WeatherSnapshot>,
    /// Forecast series, present only after a fully successful cycle
    pub forecast: Option<ForecastSeries>,
    /// Active alerts; `None` while loading or when alerts are unavailable
    pub alerts: Option<AlertSet>,
    /// A cycle for the active location is running
    pub loading: bool,
    /// User-facing error from the last cycle
    pub error: Option<String>,
    /// When the view last received fresh primary data
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl ViewState {
    /// Whether alerts were fetched and at least one is active
    pub fn has_alerts(&self) -> bool {
        self.alerts.as_ref().is_some_and(|alerts| !alerts.is_empty())
    }
}

/// Instruction to fetch all three payloads for one location
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCycle {
    /// Stamp carried back by every completion of this cycle
    pub generation: u64,
    /// Key the cycle fetches for
    pub key: LocationKey,
    /// Coordinates to fetch
    pub location: Location,
}

/// Outcome of one of the three fetches of a cycle
#[derive(Debug)]
pub enum Completion {
    Current(Result<WeatherSnapshot, WeatherError>),
    Forecast(Result<ForecastSeries, WeatherError>),
    /// Alerts are best-effort; `None` means unavailable
    Alerts(Option<AlertSet>),
}

impl Completion {
    fn label(&self) -> &'static str {
        match self {
            Self::Current(_) => "current",
            Self::Forecast(_) => "forecast",
            Self::Alerts(_) => "alerts",
        }
    }
}

/// The cycle currently in flight, buffering primary results until both settle
#[derive(Debug)]
struct InFlight {
    generation: u64,
    key: LocationKey,
    current: Option<Result<WeatherSnapshot, WeatherError>>,
    forecast: Option<Result<ForecastSeries, WeatherError>>,
}

/// Bookkeeping for which location has been fetched and what is running
#[derive(Debug, Default)]
pub struct FetchSession {
    active_key: Option<LocationKey>,
    fetched_key: Option<LocationKey>,
    in_flight: Option<InFlight>,
    pending: Option<Location>,
    /// Generation of the most recently started cycle
    generation: u64,
    /// Key of the most recently started cycle
    latest_key: Option<LocationKey>,
}

impl FetchSession {
    /// Key of the location the view should reflect
    pub fn active_key(&self) -> Option<&LocationKey> {
        self.active_key.as_ref()
    }

    /// Whether data for the active key has been fetched (successfully or not)
    pub fn fetched_for_key(&self) -> bool {
        self.active_key.is_some() && self.fetched_key == self.active_key
    }

    /// Whether a cycle is running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Location queued to start when the in-flight cycle settles
    pub fn pending(&self) -> Option<&Location> {
        self.pending.as_ref()
    }

    /// Generation of the most recently started cycle (0 before the first)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A completion may write the view only if it belongs to the latest cycle
    /// and that cycle's key is still the active one
    fn may_write(&self, generation: u64) -> bool {
        generation == self.generation
            && self.latest_key.is_some()
            && self.latest_key == self.active_key
    }
}

/// Orchestrates fetch cycles for the selected location
#[derive(Debug, Default)]
pub struct FetchCoordinator {
    location: Option<Location>,
    session: FetchSession,
    view: ViewState,
}

impl FetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active location, including any back-filled name
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn session(&self) -> &FetchSession {
        &self.session
    }

    /// Handles a location selection from a map click or a search
    ///
    /// # Returns
    /// * `Some(FetchCycle)` - The caller must run the three fetches for it
    /// * `None` - Already fetched, or queued behind the in-flight cycle
    pub fn select_location(&mut self, location: Location) -> Option<FetchCycle> {
        let key = location.key();

        if self.session.active_key.as_ref() == Some(&key) && self.session.fetched_for_key() {
            tracing::debug!(%key, "Location already fetched, skipping");
            return None;
        }

        if self.session.in_flight.is_some() {
            tracing::debug!(%key, "Cycle in flight, queueing selection");
            self.session.active_key = Some(key);
            self.session.pending = Some(location.clone());
            self.location = Some(location);
            return None;
        }

        Some(self.start_cycle(location))
    }

    /// Re-fetches the active location, bypassing the fetched check
    ///
    /// A refresh while a cycle is running is dropped; that cycle is already
    /// fetching fresh data.
    pub fn refresh(&mut self) -> Option<FetchCycle> {
        if self.session.in_flight.is_some() {
            tracing::debug!("Refresh requested while cycle in flight, ignoring");
            return None;
        }

        let location = self.location.clone()?;
        self.session.fetched_key = None;
        self.select_location(location)
    }

    /// Applies the result of one fetch
    ///
    /// # Arguments
    /// * `generation` - Stamp of the cycle the fetch belonged to
    /// * `completion` - The fetch outcome
    /// * `now` - Timestamp recorded as `last_updated_at` on success
    ///
    /// # Returns
    /// The next cycle to run when settling this one promotes a pending selection
    pub fn on_completion(
        &mut self,
        generation: u64,
        completion: Completion,
        now: DateTime<Utc>,
    ) -> Option<FetchCycle> {
        let writable = self.session.may_write(generation);

        let in_flight = match self.session.in_flight.as_mut() {
            Some(in_flight) if in_flight.generation == generation => in_flight,
            _ => {
                if let Completion::Alerts(alerts) = completion {
                    // Alerts may trail the primary pair of a settled cycle,
                    // but never join a failed one
                    if writable && self.view.error.is_none() {
                        self.view.alerts = alerts;
                    }
                } else {
                    tracing::debug!(
                        generation,
                        kind = completion.label(),
                        "Discarding completion from settled cycle"
                    );
                }
                return None;
            }
        };

        match completion {
            Completion::Current(result) => {
                if let Ok(snapshot) = &result {
                    if self.session.active_key.as_ref() == Some(&in_flight.key) {
                        if let Some(location) = self.location.as_mut() {
                            if !snapshot.place_name.is_empty() {
                                location.name = Some(snapshot.place_name.clone());
                            }
                        }
                    }
                }
                in_flight.current = Some(result);
            }
            Completion::Forecast(result) => in_flight.forecast = Some(result),
            Completion::Alerts(alerts) => {
                if writable {
                    self.view.alerts = alerts;
                } else {
                    tracing::debug!(generation, "Discarding alerts for inactive location");
                }
                return None;
            }
        }

        if in_flight.current.is_none() || in_flight.forecast.is_none() {
            return None;
        }

        self.settle(writable, now)
    }

    /// Finalizes the in-flight cycle once both primary fetches are in
    fn settle(&mut self, writable: bool, now: DateTime<Utc>) -> Option<FetchCycle> {
        let in_flight = self.session.in_flight.take()?;
        let key = in_flight.key;

        match (in_flight.current, in_flight.forecast) {
            (Some(Ok(weather)), Some(Ok(forecast))) => {
                if writable {
                    tracing::info!(%key, points = forecast.len(), "Weather data updated");
                    self.view.weather = Some(weather);
                    self.view.forecast = Some(forecast);
                    self.view.error = None;
                    self.view.loading = false;
                    self.view.last_updated_at = Some(now);
                } else {
                    tracing::debug!(%key, "Discarding results for inactive location");
                }
            }
            (current, forecast) => {
                if let Some(Err(e)) = &current {
                    tracing::warn!(%key, "Current conditions fetch failed: {}", e);
                }
                if let Some(Err(e)) = &forecast {
                    tracing::warn!(%key, "Forecast fetch failed: {}", e);
                }
                if writable {
                    self.view.weather = None;
                    self.view.forecast = None;
                    self.view.alerts = None;
                    self.view.error = Some(FETCH_ERROR_MESSAGE.to_string());
                    self.view.loading = false;
                }
            }
        }

        self.session.fetched_key = Some(key.clone());

        let pending = self.session.pending.take()?;
        if pending.key() == key {
            return None;
        }
        Some(self.start_cycle(pending))
    }

    fn start_cycle(&mut self, location: Location) -> FetchCycle {
        let key = location.key();
        self.session.generation += 1;
        let generation = self.session.generation;

        tracing::info!(%key, generation, "Starting fetch cycle");

        self.session.active_key = Some(key.clone());
        self.session.latest_key = Some(key.clone());
        self.session.fetched_key = None;
        self.session.pending = None;
        self.session.in_flight = Some(InFlight {
            generation,
            key: key.clone(),
            current: None,
            forecast: None,
        });
        self.location = Some(location.clone());

        self.view = ViewState {
            loading: true,
            last_updated_at: self.view.last_updated_at,
            ..ViewState::default()
        };

        FetchCycle {
            generation,
            key,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Units;
    use crate::data::{Conditions, ForecastPoint, WeatherAlert};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn conditions(temperature: f64) -> Conditions {
        Conditions {
            temperature,
            feels_like: temperature,
            humidity: 50,
            pressure: 1013.0,
            wind_speed: 3.0,
            wind_direction: 90,
            condition: None,
        }
    }

    fn snapshot(place_name: &str, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            conditions: conditions(temperature),
            place_name: place_name.to_string(),
            country: None,
            fetched_at: now(),
        }
    }

    fn forecast(points: usize) -> ForecastSeries {
        ForecastSeries {
            points: (0..points)
                .map(|i| ForecastPoint {
                    timestamp: now() + chrono::Duration::hours(3 * i as i64),
                    conditions: conditions(10.0),
                })
                .collect(),
            city_name: "Test".to_string(),
            country: None,
            utc_offset_seconds: 0,
            units: Units::Metric,
        }
    }

    fn alert() -> WeatherAlert {
        WeatherAlert {
            sender: "NWS".to_string(),
            event: "Heat Advisory".to_string(),
            valid_from: now(),
            valid_until: now(),
            description: String::new(),
            tags: vec![],
        }
    }

    fn new_york() -> Location {
        Location::new(40.7128, -74.006)
    }

    fn london() -> Location {
        Location::new(51.5074, -0.1278)
    }

    fn paris() -> Location {
        Location::new(48.8566, 2.3522)
    }

    /// Completes both primary fetches successfully
    fn complete_ok(
        coordinator: &mut FetchCoordinator,
        cycle: &FetchCycle,
        name: &str,
    ) -> Option<FetchCycle> {
        let first = coordinator.on_completion(
            cycle.generation,
            Completion::Current(Ok(snapshot(name, 15.0))),
            now(),
        );
        assert!(first.is_none());
        coordinator.on_completion(cycle.generation, Completion::Forecast(Ok(forecast(40))), now())
    }

    #[test]
    fn test_first_selection_starts_cycle() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).expect("cycle");

        assert_eq!(cycle.generation, 1);
        assert_eq!(cycle.key, new_york().key());
        assert!(coordinator.view().loading);
        assert!(coordinator.view().error.is_none());
        assert!(coordinator.session().is_in_flight());
        assert!(!coordinator.session().fetched_for_key());
    }

    #[test]
    fn test_successful_cycle_populates_view() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![])), now());
        assert!(complete_ok(&mut coordinator, &cycle, "New York").is_none());

        let view = coordinator.view();
        assert!(!view.loading);
        assert!(view.error.is_none());
        assert_eq!(view.weather.as_ref().map(|w| w.conditions.temperature), Some(15.0));
        assert_eq!(view.forecast.as_ref().map(|f| f.len()), Some(40));
        assert_eq!(view.alerts.as_ref().map(|a| a.len()), Some(0));
        assert!(!view.has_alerts());
        assert_eq!(view.last_updated_at, Some(now()));
        assert!(coordinator.session().fetched_for_key());
        assert!(!coordinator.session().is_in_flight());
    }

    #[test]
    fn test_same_key_selection_is_deduplicated() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        complete_ok(&mut coordinator, &cycle, "New York");

        // Click jitter within the rounding tolerance
        let jittered = Location::new(40.712_81, -74.006_02);
        assert!(coordinator.select_location(jittered).is_none());
        assert!(coordinator.select_location(new_york()).is_none());
        assert_eq!(coordinator.session().generation(), 1);
    }

    #[test]
    fn test_dedupe_keeps_back_filled_name() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        complete_ok(&mut coordinator, &cycle, "New York");

        assert!(coordinator.select_location(new_york()).is_none());
        assert_eq!(
            coordinator.location().and_then(|l| l.name.as_deref()),
            Some("New York")
        );
    }

    #[test]
    fn test_name_back_filled_from_current_conditions() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        assert!(coordinator.location().unwrap().name.is_none());

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Ok(snapshot("New York", 15.0))),
            now(),
        );
        assert_eq!(
            coordinator.location().and_then(|l| l.name.as_deref()),
            Some("New York")
        );
    }

    #[test]
    fn test_name_not_back_filled_after_location_changed() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        coordinator.select_location(london());

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Ok(snapshot("New York", 15.0))),
            now(),
        );

        let location = coordinator.location().unwrap();
        assert_eq!(location.key(), london().key());
        assert!(location.name.is_none());
    }

    #[test]
    fn test_primary_failure_sets_error() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(Location::new(0.0, 0.0)).unwrap();

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Err(WeatherError::Status(404))),
            now(),
        );
        assert!(coordinator.view().loading);

        coordinator.on_completion(cycle.generation, Completion::Forecast(Ok(forecast(40))), now());

        let view = coordinator.view();
        assert!(!view.loading);
        assert_eq!(view.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert!(view.weather.is_none());
        assert!(view.forecast.is_none());
        assert!(view.last_updated_at.is_none());
        assert!(coordinator.session().fetched_for_key());
    }

    #[test]
    fn test_forecast_failure_discards_current() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.on_completion(
            cycle.generation,
            Completion::Forecast(Err(WeatherError::Status(500))),
            now(),
        );
        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Ok(snapshot("New York", 15.0))),
            now(),
        );

        let view = coordinator.view();
        assert!(view.weather.is_none());
        assert!(view.forecast.is_none());
        assert_eq!(view.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    }

    #[test]
    fn test_failed_cycle_drops_alerts_received_earlier() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(Location::new(0.0, 0.0)).unwrap();

        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![alert()])), now());
        assert!(coordinator.view().has_alerts());

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Err(WeatherError::Status(404))),
            now(),
        );
        coordinator.on_completion(
            cycle.generation,
            Completion::Forecast(Err(WeatherError::Status(404))),
            now(),
        );

        let view = coordinator.view();
        assert_eq!(view.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert!(view.alerts.is_none());
        assert!(!view.has_alerts());
    }

    #[test]
    fn test_failed_cycle_ignores_alerts_received_later() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(Location::new(0.0, 0.0)).unwrap();

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Err(WeatherError::Status(404))),
            now(),
        );
        coordinator.on_completion(
            cycle.generation,
            Completion::Forecast(Err(WeatherError::Status(404))),
            now(),
        );
        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![alert()])), now());

        let view = coordinator.view();
        assert_eq!(view.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert!(view.alerts.is_none());
    }

    #[test]
    fn test_primary_data_is_buffered_until_both_settle() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Ok(snapshot("New York", 15.0))),
            now(),
        );

        assert!(coordinator.view().weather.is_none());
        assert!(coordinator.view().loading);
    }

    #[test]
    fn test_unavailable_alerts_do_not_block_success() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.on_completion(cycle.generation, Completion::Alerts(None), now());
        complete_ok(&mut coordinator, &cycle, "New York");

        let view = coordinator.view();
        assert!(view.alerts.is_none());
        assert!(view.error.is_none());
        assert!(view.weather.is_some());
    }

    #[test]
    fn test_alerts_arriving_after_settle_are_applied() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        complete_ok(&mut coordinator, &cycle, "New York");

        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![alert()])), now());
        assert!(coordinator.view().has_alerts());
    }

    #[test]
    fn test_selection_during_flight_becomes_pending() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        assert!(coordinator.select_location(london()).is_none());
        assert_eq!(coordinator.session().pending().map(Location::key), Some(london().key()));
        assert_eq!(coordinator.session().active_key(), Some(&london().key()));

        let next = complete_ok(&mut coordinator, &cycle, "New York").expect("pending cycle");
        assert_eq!(next.key, london().key());
        assert_eq!(next.generation, 2);
        assert!(coordinator.view().loading);
        assert!(coordinator.view().weather.is_none());
    }

    #[test]
    fn test_latest_pending_selection_wins() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.select_location(london());
        coordinator.select_location(paris());

        let next = complete_ok(&mut coordinator, &cycle, "New York").unwrap();
        assert_eq!(next.key, paris().key());

        // London is never fetched
        let last = complete_ok(&mut coordinator, &next, "Paris");
        assert!(last.is_none());
        assert_eq!(coordinator.session().generation(), 2);
    }

    #[test]
    fn test_stale_results_never_reach_view() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        coordinator.select_location(london());

        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![alert()])), now());
        let next = complete_ok(&mut coordinator, &cycle, "New York").unwrap();

        assert!(coordinator.view().weather.is_none());
        assert!(coordinator.view().alerts.is_none());

        // A straggler from the first cycle after the second has started
        coordinator.on_completion(cycle.generation, Completion::Alerts(Some(vec![alert()])), now());
        assert!(coordinator.view().alerts.is_none());

        complete_ok(&mut coordinator, &next, "London");
        assert_eq!(
            coordinator.view().weather.as_ref().map(|w| w.place_name.as_str()),
            Some("London")
        );
    }

    #[test]
    fn test_same_key_selected_during_flight_starts_no_new_cycle() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        assert!(coordinator.select_location(new_york()).is_none());
        assert!(complete_ok(&mut coordinator, &cycle, "New York").is_none());

        assert!(coordinator.session().pending().is_none());
        assert!(coordinator.view().weather.is_some());
        assert_eq!(coordinator.session().generation(), 1);
    }

    #[test]
    fn test_returning_to_in_flight_key_cancels_pending() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        coordinator.select_location(london());
        coordinator.select_location(new_york());

        assert!(complete_ok(&mut coordinator, &cycle, "New York").is_none());
        assert!(coordinator.view().weather.is_some());
    }

    #[test]
    fn test_refresh_bypasses_dedupe() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        complete_ok(&mut coordinator, &cycle, "New York");

        let refreshed = coordinator.refresh().expect("refresh cycle");
        assert_eq!(refreshed.key, new_york().key());
        assert_eq!(refreshed.generation, 2);
        assert!(coordinator.view().loading);
        // The previous timestamp survives until new data arrives
        assert_eq!(coordinator.view().last_updated_at, Some(now()));
        // Name back-filled by the first cycle is kept
        assert_eq!(refreshed.location.name.as_deref(), Some("New York"));
    }

    #[test]
    fn test_refresh_during_flight_is_noop() {
        let mut coordinator = FetchCoordinator::new();
        coordinator.select_location(new_york()).unwrap();

        assert!(coordinator.refresh().is_none());
        assert_eq!(coordinator.session().generation(), 1);
        assert!(coordinator.session().pending().is_none());
    }

    #[test]
    fn test_refresh_without_location_is_noop() {
        let mut coordinator = FetchCoordinator::new();
        assert!(coordinator.refresh().is_none());
        assert_eq!(coordinator.session().generation(), 0);
    }

    #[test]
    fn test_retry_after_failure_via_refresh() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();
        coordinator.on_completion(
            cycle.generation,
            Completion::Current(Err(WeatherError::Status(503))),
            now(),
        );
        coordinator.on_completion(cycle.generation, Completion::Forecast(Ok(forecast(1))), now());

        // A failed cycle still counts as fetched
        assert!(coordinator.select_location(new_york()).is_none());

        let retry = coordinator.refresh().unwrap();
        complete_ok(&mut coordinator, &retry, "New York");
        assert!(coordinator.view().error.is_none());
        assert!(coordinator.view().weather.is_some());
    }

    #[test]
    fn test_completion_with_unknown_generation_is_ignored() {
        let mut coordinator = FetchCoordinator::new();
        let cycle = coordinator.select_location(new_york()).unwrap();

        let result = coordinator.on_completion(
            cycle.generation + 7,
            Completion::Current(Ok(snapshot("Elsewhere", 99.0))),
            now(),
        );

        assert!(result.is_none());
        assert!(coordinator.location().unwrap().name.is_none());
        assert!(coordinator.session().is_in_flight());
    }
}
