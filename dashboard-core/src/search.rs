//! Place search controller.
//!
//! Text input is debounced, turned into autocomplete queries and the
//! resulting predictions are published as a [`SearchView`]. Selecting a
//! prediction resolves its details and moves the dashboard there.
//!
//! The controller runs as one task. User commands, debounce deadlines and
//! the results of spawned lookups all pass through [`SearchController::commit`],
//! so the view only ever changes in one place. Every query and detail lookup
//! is tagged with a generation; a result whose generation is no longer the
//! latest is dropped, so a slow response can never overwrite a newer one.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant},
};

use crate::{
    dashboard::Dashboard,
    model::{PlaceDetails, Prediction},
    notify::Notifier,
    places::{DETAIL_FIELDS, PlacesApi, PlacesError},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Inputs this short (after trimming) never trigger a query.
pub const MIN_QUERY_CHARS: usize = 2;

pub const DETAILS_ERROR_MESSAGE: &str = "There was an error getting the location details";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Querying,
    DisplayingPredictions,
    Selected,
}

/// Everything a front end needs to render the search box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchView {
    pub state: SearchState,
    pub input: String,
    pub predictions: Vec<Prediction>,
    /// Query the displayed predictions answer.
    pub results_for: Option<String>,
    pub is_loading: bool,
}

/// Text shown for a prediction in the input box.
pub fn display(prediction: Option<&Prediction>) -> &str {
    prediction.map(|p| p.description.as_str()).unwrap_or("")
}

enum Event {
    Input(String),
    Select(Prediction),
    PredictionsLoaded { generation: u64, result: Result<Vec<Prediction>, PlacesError> },
    DetailsLoaded { generation: u64, result: Result<PlaceDetails, PlacesError> },
}

/// Cheap handle to a running [`SearchController`]. The controller stops once
/// every handle is dropped.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<Event>,
    view: watch::Receiver<SearchView>,
}

impl SearchHandle {
    /// The input box now reads `text`.
    pub fn input(&self, text: impl Into<String>) {
        let _ = self.commands.send(Event::Input(text.into()));
    }

    pub fn select(&self, prediction: Prediction) {
        let _ = self.commands.send(Event::Select(prediction));
    }

    pub fn view(&self) -> watch::Receiver<SearchView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> SearchView {
        self.view.borrow().clone()
    }
}

struct Pending {
    value: String,
    deadline: Instant,
}

pub struct SearchController {
    places: Arc<dyn PlacesApi>,
    dashboard: Arc<Dashboard>,
    notifier: Arc<dyn Notifier>,
    debounce: Duration,
    view: watch::Sender<SearchView>,
    results: mpsc::UnboundedSender<Event>,
    pending: Option<Pending>,
    last_query: Option<String>,
    query_generation: u64,
    details_generation: u64,
}

impl SearchController {
    /// Start the controller on the current runtime.
    pub fn spawn(
        places: Arc<dyn PlacesApi>,
        dashboard: Arc<Dashboard>,
        notifier: Arc<dyn Notifier>,
        debounce: Duration,
    ) -> SearchHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SearchView::default());

        let controller = Self {
            places,
            dashboard,
            notifier,
            debounce,
            view: view_tx,
            results: results_tx,
            pending: None,
            last_query: None,
            query_generation: 0,
            details_generation: 0,
        };
        tokio::spawn(controller.run(commands_rx, results_rx));

        SearchHandle { commands: commands_tx, view: view_rx }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Event>,
        mut results: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);

            tokio::select! {
                event = commands.recv() => match event {
                    Some(event) => self.commit(event),
                    None => break,
                },
                Some(event) = results.recv() => self.commit(event),
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_debounced();
                }
            }
        }

        tracing::debug!("Search controller stopped");
    }

    fn commit(&mut self, event: Event) {
        match event {
            Event::Input(text) => self.on_input(text),
            Event::Select(prediction) => self.on_select(prediction),
            Event::PredictionsLoaded { generation, result } => {
                self.on_predictions(generation, result)
            }
            Event::DetailsLoaded { generation, result } => self.on_details(generation, result),
        }
    }

    fn on_input(&mut self, text: String) {
        self.pending = Some(Pending { value: text.clone(), deadline: Instant::now() + self.debounce });
        self.view.send_modify(|v| v.input = text);
    }

    fn fire_debounced(&mut self) {
        let Some(Pending { value, .. }) = self.pending.take() else {
            return;
        };
        let query = value.trim();

        if query.chars().count() <= MIN_QUERY_CHARS {
            // Also invalidates a query still in flight.
            self.query_generation += 1;
            self.last_query = None;
            self.view.send_modify(|v| {
                v.predictions.clear();
                v.results_for = None;
                v.is_loading = false;
                v.state = SearchState::Idle;
            });
            return;
        }

        if self.last_query.as_deref() == Some(query) {
            tracing::trace!(query, "Skipping repeated query");
            return;
        }

        self.last_query = Some(query.to_string());
        self.query_generation += 1;
        let generation = self.query_generation;

        self.view.send_modify(|v| {
            v.is_loading = true;
            v.state = SearchState::Querying;
        });

        tracing::debug!(query, generation, "Requesting place predictions");

        let places = Arc::clone(&self.places);
        let results = self.results.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            let result = places.predictions(&query).await;
            let _ = results.send(Event::PredictionsLoaded { generation, result });
        });
    }

    fn on_predictions(&mut self, generation: u64, result: Result<Vec<Prediction>, PlacesError>) {
        if generation != self.query_generation {
            tracing::debug!(generation, latest = self.query_generation, "Dropping stale predictions");
            return;
        }

        let predictions = match result {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => vec![Prediction::no_records()],
            Err(e) => {
                tracing::warn!(error = %e, "Place predictions failed");
                vec![Prediction::no_records()]
            }
        };

        let results_for = self.last_query.clone();
        self.view.send_modify(|v| {
            v.predictions = predictions;
            v.results_for = results_for;
            v.is_loading = false;
            v.state = SearchState::DisplayingPredictions;
        });
    }

    fn on_select(&mut self, prediction: Prediction) {
        if let Some(place_id) = prediction.place_id {
            self.details_generation += 1;
            let generation = self.details_generation;

            tracing::debug!(%place_id, generation, "Requesting place details");

            let places = Arc::clone(&self.places);
            let results = self.results.clone();
            tokio::spawn(async move {
                let result = places.details(&place_id, DETAIL_FIELDS).await;
                let _ = results.send(Event::DetailsLoaded { generation, result });
            });
        }

        // The box is cleared whatever was picked; nothing typed before the
        // selection may come back afterwards.
        self.pending = None;
        self.last_query = None;
        self.query_generation += 1;
        self.view.send_modify(|v| {
            v.input.clear();
            v.predictions.clear();
            v.results_for = None;
            v.is_loading = false;
            v.state = SearchState::Selected;
        });
    }

    fn on_details(&mut self, generation: u64, result: Result<PlaceDetails, PlacesError>) {
        if generation != self.details_generation {
            tracing::debug!(generation, latest = self.details_generation, "Dropping stale place details");
            return;
        }

        match result {
            Ok(details) => {
                tracing::info!(address = %details.formatted_address, "Place selected");
                self.dashboard.set_location_name(details.formatted_address);
                self.dashboard
                    .update_geolocation_position(details.location.lat, details.location.lng);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Place details failed");
                self.notifier.error(DETAILS_ERROR_MESSAGE);
            }
        }
    }
}
