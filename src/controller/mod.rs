use std::fmt;

use tracing::{debug, warn};

use crate::client::{ApiRequest, ApiResponse, ClientError};
use crate::form::{Field, FormState};
use crate::query::SearchFilters;

pub const SUCCESS_MESSAGE: &str = "Success";
pub const DELETED_MESSAGE: &str = "Product has been Deleted!";
pub const DELETE_FAILED_MESSAGE: &str = "Server error!";
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server";

/// Result of the single HTTP call an action makes.
pub type Outcome = Result<ApiResponse, ClientError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Restock,
    Retrieve,
    Delete,
    Search,
    Clear,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Create,
        Action::Update,
        Action::Restock,
        Action::Retrieve,
        Action::Delete,
        Action::Search,
        Action::Clear,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Restock => "restock",
            Action::Retrieve => "retrieve",
            Action::Delete => "delete",
            Action::Search => "search",
            Action::Clear => "clear",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Action::ALL.into_iter().find(|a| a.name() == normalized)
    }

    /// Builds the request this action sends for the current form. Clear is
    /// the only action without one.
    pub fn request(self, form: &FormState, filters: &SearchFilters) -> Option<ApiRequest> {
        let fields = &form.fields;
        let id = fields.id.trim();
        match self {
            Action::Create => Some(ApiRequest::create(fields)),
            Action::Update => Some(ApiRequest::update(fields)),
            Action::Restock => Some(ApiRequest::restock(id)),
            Action::Retrieve => Some(ApiRequest::retrieve(id)),
            Action::Delete => Some(ApiRequest::delete(id)),
            Action::Search => Some(ApiRequest::search(filters.build_query(fields))),
            Action::Clear => None,
        }
    }

    fn writes_results(self) -> bool {
        matches!(self, Action::Search)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Folds one completed action into the form. Pure: no I/O happens here.
pub fn reduce(mut state: FormState, action: Action, outcome: &Outcome) -> FormState {
    match (action, outcome) {
        (Action::Clear, _) => state.clear_all(),
        (Action::Delete, Ok(_)) => {
            state.fields.clear_except_id();
            state.flash = Some(DELETED_MESSAGE.to_string());
        }
        (Action::Delete, Err(_)) => {
            state.flash = Some(DELETE_FAILED_MESSAGE.to_string());
        }
        (Action::Search, Ok(ApiResponse::Records(records))) => {
            if let Some(first) = records.first() {
                state.fields.populate(first);
            }
            state.results = Some(records.clone());
            state.flash = Some(SUCCESS_MESSAGE.to_string());
        }
        (Action::Retrieve, Err(err)) => {
            state.fields.clear_except_id();
            state.flash = Some(err.user_message());
        }
        (_, Ok(ApiResponse::Record(record))) => {
            state.fields.populate(record);
            state.flash = Some(SUCCESS_MESSAGE.to_string());
        }
        (_, Err(err)) => {
            state.flash = Some(err.user_message());
        }
        (_, Ok(_)) => {
            state.flash = Some(UNEXPECTED_RESPONSE_MESSAGE.to_string());
        }
    }
    state
}

/// Handle for one dispatched action, returned to the caller so the response
/// can be matched back to it.
#[derive(Clone, Debug)]
pub struct Ticket {
    pub action: Action,
    pub generation: u64,
    pub request: Option<ApiRequest>,
}

/// Which parts of the state a completion actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub fields: bool,
    pub results: bool,
}

impl Applied {
    pub fn is_stale(&self) -> bool {
        !self.fields && !self.results
    }
}

/// Owns the form and orders completions.
///
/// Every dispatch gets a new generation. Form fields and the flash slot
/// accept only the completion of the latest dispatch; the results table
/// accepts only the latest search. Anything older is dropped.
#[derive(Clone, Debug, Default)]
pub struct Controller {
    state: FormState,
    filters: SearchFilters,
    next_generation: u64,
    latest_fields: u64,
    latest_results: u64,
}

impl Controller {
    pub fn new(state: FormState, filters: SearchFilters) -> Self {
        Self {
            state,
            filters,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn into_state(self) -> FormState {
        self.state
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.state.fields.set(field, value);
    }

    pub fn reset_field(&mut self, field: Field) {
        self.state.fields.reset(field);
    }

    /// Reads the form and prepares the action. Clear takes effect here and
    /// carries no request; every other action empties the flash slot and
    /// must be finished with [`Controller::complete`].
    pub fn dispatch(&mut self, action: Action) -> Ticket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.latest_fields = generation;
        if action.writes_results() {
            self.latest_results = generation;
        }

        let request = action.request(&self.state, &self.filters);
        match request.as_ref() {
            Some(req) => {
                debug!(%action, generation, target = %req.target(), "dispatching");
                self.state.flash = None;
            }
            None => self.state.clear_all(),
        }
        Ticket {
            action,
            generation,
            request,
        }
    }

    pub fn complete(&mut self, ticket: &Ticket, outcome: &Outcome) -> Applied {
        let applied = Applied {
            fields: ticket.generation == self.latest_fields,
            results: ticket.action.writes_results() && ticket.generation == self.latest_results,
        };
        if applied.is_stale() {
            debug!(
                action = %ticket.action,
                generation = ticket.generation,
                "dropping stale response"
            );
            return applied;
        }
        if let Err(err) = outcome {
            warn!(action = %ticket.action, error = %err, "request failed");
        }

        let next = reduce(self.state.clone(), ticket.action, outcome);
        if applied.fields {
            self.state.fields = next.fields;
            self.state.flash = next.flash;
        }
        if applied.results {
            self.state.results = next.results;
        }
        applied
    }
}
