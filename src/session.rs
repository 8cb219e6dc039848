use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::filter::{FilterCriteria, FilterField};

/// Session-scoped key-value store for the user's last selections.
///
/// One instance per user session; pages read it at the start of a render
/// and write it back when a widget changes.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    values: HashMap<String, String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            values: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        debug!(session = %self.id, key = %key, value = %value, "session value stored");
        self.values.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Session key holding the value of a filter widget.
pub fn session_key(field: FilterField) -> &'static str {
    match field {
        FilterField::Search => "filtro_busca",
        FilterField::Municipality => "filtro_municipio",
        FilterField::Product => "filtro_produto",
        FilterField::Certification => "filtro_certificacao",
        FilterField::Gender => "filtro_genero",
        FilterField::Community => "filtro_comunidade",
    }
}

impl FilterCriteria {
    /// Criteria remembered by `session`; unset keys are unconstrained.
    pub fn from_session(session: &SessionState) -> Self {
        let mut criteria = FilterCriteria::default();
        for field in FilterField::ALL {
            if let Some(value) = session.get(session_key(field)) {
                criteria.set(field, value);
            }
        }
        criteria
    }

    pub fn store_in(&self, session: &mut SessionState) {
        for field in FilterField::ALL {
            session.set(session_key(field), self.get(field));
        }
    }
}

/// Reset every filter key: empty search, "Todos" on every selector.
pub fn clear_filters(session: &mut SessionState) {
    FilterCriteria::default().store_in(session);
    debug!(session = %session.id(), "filters cleared");
}

/// Mutual exclusion across the six filter widgets: once one is set, the
/// others are disabled until it returns to its sentinel or a reset happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterLock {
    #[default]
    Open,
    Locked(FilterField),
}

impl FilterLock {
    /// Lock state implied by already-stored criteria.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        match criteria.active_fields().first() {
            Some(field) => FilterLock::Locked(*field),
            None => FilterLock::Open,
        }
    }

    pub fn is_enabled(&self, field: FilterField) -> bool {
        match self {
            FilterLock::Open => true,
            FilterLock::Locked(owner) => *owner == field,
        }
    }

    /// Transition on a widget selection. Returns `false` when the widget is
    /// disabled and the selection must be ignored.
    pub fn on_select(&mut self, field: FilterField, value: &str) -> bool {
        if !self.is_enabled(field) {
            return false;
        }
        *self = if field.is_unconstrained(value) {
            FilterLock::Open
        } else {
            FilterLock::Locked(field)
        };
        true
    }

    pub fn on_reset(&mut self) {
        *self = FilterLock::Open;
    }

    /// Apply a selection to `criteria` if the lock allows it.
    pub fn select(
        &mut self,
        criteria: &mut FilterCriteria,
        field: FilterField,
        value: &str,
    ) -> bool {
        let accepted = self.on_select(field, value);
        if accepted {
            criteria.set(field, value);
        }
        accepted
    }

    /// Reset both the lock and the stored filters.
    pub fn reset(&mut self, session: &mut SessionState) {
        self.on_reset();
        clear_filters(session);
    }
}
