use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::codec::{decode, encode_defaults, encode_state, needs_defaults};
use crate::error::{QueryResult, QueryStateError};
use crate::schema::{FieldValue, Schema};
use crate::signal::{Effect, Memo, Signal};
use crate::state::TypedState;
use crate::store::{QueryParams, QueryStringStore, WriteMode};

/// Typed application state stored in a query string.
///
/// The query string is the single source of truth. The typed state is a
/// memo over the store and the schema, so it re-derives whenever either one
/// changes; [`update`](Self::update) and
/// [`reset_to_defaults`](Self::reset_to_defaults) are the only ways to
/// change it, and both go through the store.
///
/// Creating a `TypedQueryState` on an empty query string evaluates the state
/// from the declared defaults and writes them back in replace mode, once, so
/// the location is shareable from the first load. Every later evaluation
/// decodes the query string as it stands.
///
/// # Examples
///
/// ```
/// use query_state::{FieldSchema, MemoryStore, Schema, TypedQueryState};
///
/// let schema = Schema::builder()
///     .field("count", FieldSchema::number().required().default_value(1))
///     .build()
///     .unwrap();
/// let store = MemoryStore::new();
/// let query = TypedQueryState::new(schema, store.clone());
///
/// assert_eq!(store.query_string(), "count=1");
/// assert_eq!(query.get("count").and_then(|v| v.as_number()), Some(1.0));
///
/// query.update("count", 2).unwrap();
/// assert_eq!(store.query_string(), "count=2");
/// assert_eq!(query.get("count").and_then(|v| v.as_number()), Some(2.0));
/// ```
pub struct TypedQueryState<S> {
    schema: Signal<Rc<Schema>>,
    store: S,
    state: Memo<TypedState>,
    bootstrapped: Rc<Cell<bool>>,
}

impl<S> TypedQueryState<S>
where
    S: QueryStringStore + Clone + 'static,
{
    /// Binds `schema` to `store` and applies the bootstrap rule.
    pub fn new(schema: impl Into<Rc<Schema>>, store: S) -> Self {
        let schema = Signal::new(schema.into());
        let bootstrapped = Rc::new(Cell::new(false));
        let state = Memo::new({
            let schema = schema.clone();
            let store = store.clone();
            let bootstrapped = Rc::clone(&bootstrapped);
            move || {
                let schema = schema.get();
                let load_defaults =
                    !bootstrapped.get() && store.is_empty() && needs_defaults(&schema, &store);
                decode(&schema, &store, load_defaults)
            }
        });

        let query_state = Self {
            schema,
            store,
            state,
            bootstrapped,
        };
        query_state.bootstrap();
        query_state
    }

    fn bootstrap(&self) {
        if self.bootstrapped.get() {
            return;
        }
        // The first evaluation is the only one that may load defaults
        self.state.with(|_| ());
        self.bootstrapped.set(true);

        let schema = self.schema.get();
        if self.store.is_empty() && needs_defaults(&schema, &self.store) {
            debug!(fields = schema.len(), "empty query string, persisting defaults");
            self.reset_to_defaults();
        }
    }

    /// The current typed state.
    pub fn state(&self) -> TypedState {
        self.state.get()
    }

    /// Read the current typed state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&TypedState) -> R) -> R {
        self.state.with(f)
    }

    /// Current value of one field, or `None` if the schema lacks it.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.state.with(|state| state.get(name).cloned())
    }

    pub fn schema(&self) -> Rc<Schema> {
        self.schema.get()
    }

    /// Swaps in a new schema; the typed state re-derives against it.
    pub fn set_schema(&self, schema: impl Into<Rc<Schema>>) {
        self.schema.set(schema.into());
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sets one field and writes the whole state as a new history entry.
    ///
    /// Every field is re-encoded from the current state, so the others keep
    /// their encoded form. Values that do not fit the field's declaration are
    /// rejected before anything is written.
    pub fn update(&self, name: &str, value: impl Into<FieldValue>) -> QueryResult<()> {
        let value = value.into();
        let schema = self.schema.get();
        let field = schema
            .field(name)
            .ok_or_else(|| QueryStateError::UnknownField {
                name: name.to_owned(),
            })?;
        field.check(name, &value)?;

        let next = self.state().with_value(name, value);
        debug!(field = name, "updating query state");
        self.store.write(encode_state(&next), WriteMode::Push);
        Ok(())
    }

    /// Writes every field's default in replace mode.
    ///
    /// Nothing is written when all defaults are omitted from the query, or
    /// when the store already holds exactly the encoded defaults.
    pub fn reset_to_defaults(&self) {
        let pairs = encode_defaults(&self.schema.get());
        if pairs.is_empty() {
            debug!("every default is absent, skipping reset");
            return;
        }
        if QueryParams::from(&pairs) == self.store.params() {
            debug!("query string already at defaults");
            return;
        }
        self.store.write(pairs, WriteMode::Replace);
    }

    /// Calls `callback` with the current state now and with every distinct
    /// state after it. The callback stops when the returned [`Effect`] drops.
    pub fn watch<F>(&self, callback: F) -> Effect
    where
        F: Fn(&TypedState) + 'static,
    {
        let state = self.state.clone();
        let last = RefCell::new(None::<TypedState>);
        Effect::new(move || {
            let current = state.get();
            if last.borrow().as_ref() == Some(&current) {
                return;
            }
            *last.borrow_mut() = Some(current.clone());
            callback(&current);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, QueryPairs};
    use crate::FieldSchema;

    /// Records every write before forwarding it to a memory store.
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: MemoryStore,
        writes: Rc<RefCell<Vec<(String, WriteMode)>>>,
    }

    impl RecordingStore {
        fn with_query(raw: &str) -> Self {
            Self {
                inner: MemoryStore::from_query(raw),
                writes: Rc::default(),
            }
        }

        fn writes(&self) -> Vec<(String, WriteMode)> {
            self.writes.borrow().clone()
        }
    }

    impl QueryStringStore for RecordingStore {
        fn get_first(&self, name: &str) -> Option<String> {
            self.inner.get_first(name)
        }

        fn get_all(&self, name: &str) -> Vec<String> {
            self.inner.get_all(name)
        }

        fn write(&self, pairs: QueryPairs, mode: WriteMode) {
            self.writes
                .borrow_mut()
                .push((QueryParams::from(&pairs).to_string(), mode));
            self.inner.write(pairs, mode);
        }

        fn params(&self) -> QueryParams {
            self.inner.params()
        }
    }

    fn counter_schema() -> Schema {
        Schema::builder()
            .field("count", FieldSchema::number().required().default_value(1))
            .build()
            .unwrap()
    }

    #[test]
    fn bootstrap_writes_defaults_once_in_replace_mode() {
        let store = RecordingStore::default();
        let query = TypedQueryState::new(counter_schema(), store.clone());

        assert_eq!(query.get("count"), Some(FieldValue::from(1)));
        assert_eq!(store.writes(), vec![("count=1".to_owned(), WriteMode::Replace)]);

        // Re-evaluating never writes again
        let _ = query.state();
        query.bootstrap();
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn bootstrap_skips_non_empty_query() {
        let store = RecordingStore::with_query("count=4");
        let query = TypedQueryState::new(counter_schema(), store.clone());
        assert_eq!(query.get("count"), Some(FieldValue::from(4)));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn bootstrap_skips_when_all_defaults_are_absent() {
        let schema = Schema::builder()
            .field("q", FieldSchema::string())
            .field("tags", FieldSchema::string().array().default_value(Vec::<String>::new()))
            .build()
            .unwrap();
        let store = RecordingStore::default();
        let query = TypedQueryState::new(schema, store.clone());

        assert!(store.writes().is_empty());
        // The first evaluation takes the defaults verbatim
        assert_eq!(query.get("q"), Some(FieldValue::Null));
        assert_eq!(query.get("tags"), Some(FieldValue::Array(Vec::new())));

        // Later evaluations decode what is stored
        store.inner.navigate("q=x");
        store.inner.back();
        assert_eq!(query.get("tags"), Some(FieldValue::Null));
    }

    #[test]
    fn optional_field_absent_from_unrelated_query_is_null() {
        let schema = Schema::builder()
            .field("q", FieldSchema::string().default_value("x"))
            .build()
            .unwrap();
        let store = RecordingStore::with_query("utm=mail");
        let query = TypedQueryState::new(schema, store.clone());

        assert_eq!(query.get("q"), Some(FieldValue::Null));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn clearing_the_only_stored_field_reads_back_as_null() {
        let schema = Schema::builder()
            .field("q", FieldSchema::string().default_value("x"))
            .build()
            .unwrap();
        let store = RecordingStore::default();
        let query = TypedQueryState::new(schema, store.clone());
        assert_eq!(store.inner.query_string(), "q=x");
        assert_eq!(query.get("q"), Some(FieldValue::from("x")));

        query.update("q", None::<String>).unwrap();
        assert_eq!(store.inner.query_string(), "");
        assert_eq!(query.get("q"), Some(FieldValue::Null));
    }

    #[test]
    fn reading_state_while_updating_does_not_panic() {
        let query = TypedQueryState::new(counter_schema(), MemoryStore::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _watch = query.watch({
            let seen = Rc::clone(&seen);
            move |state| seen.borrow_mut().push(state.get("count").and_then(FieldValue::as_number))
        });

        query.with_state(|_| query.update("count", 5).unwrap());

        assert_eq!(query.get("count"), Some(FieldValue::from(5)));
        assert_eq!(*seen.borrow(), vec![Some(1.0), Some(5.0)]);
    }

    #[test]
    fn update_pushes_full_state() {
        let schema = Schema::builder()
            .field("count", FieldSchema::number().required().default_value(1))
            .field("q", FieldSchema::string().default_value("x"))
            .build()
            .unwrap();
        let store = RecordingStore::default();
        let query = TypedQueryState::new(schema, store.clone());

        query.update("count", 2).unwrap();
        assert_eq!(
            store.writes().last(),
            Some(&("count=2&q=x".to_owned(), WriteMode::Push))
        );

        query.update("q", None::<String>).unwrap();
        assert_eq!(
            store.writes().last(),
            Some(&("count=2".to_owned(), WriteMode::Push))
        );
        assert_eq!(query.get("q"), Some(FieldValue::Null));
    }

    #[test]
    fn update_rejects_schema_violations_without_writing() {
        let store = RecordingStore::with_query("count=3");
        let query = TypedQueryState::new(counter_schema(), store.clone());

        assert!(matches!(
            query.update("missing", 1),
            Err(QueryStateError::UnknownField { .. })
        ));
        assert!(matches!(
            query.update("count", FieldValue::Null),
            Err(QueryStateError::NullForRequired { .. })
        ));
        assert!(matches!(
            query.update("count", "3"),
            Err(QueryStateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            query.update("count", f64::NAN),
            Err(QueryStateError::NonFiniteNumber { .. })
        ));
        assert!(store.writes().is_empty());
        assert_eq!(query.get("count"), Some(FieldValue::from(3)));
    }

    #[test]
    fn reset_is_idempotent() {
        let store = RecordingStore::with_query("count=9");
        let query = TypedQueryState::new(counter_schema(), store.clone());

        query.reset_to_defaults();
        let first = store.inner.query_string();
        query.reset_to_defaults();

        assert_eq!(store.inner.query_string(), first);
        assert_eq!(store.writes(), vec![("count=1".to_owned(), WriteMode::Replace)]);
    }

    #[test]
    fn schema_swap_rederives_state() {
        let store = MemoryStore::from_query("count=5&page=2");
        let query = TypedQueryState::new(counter_schema(), store);
        assert_eq!(query.state().len(), 1);

        let paged = Schema::builder()
            .field("page", FieldSchema::number())
            .build()
            .unwrap();
        query.set_schema(paged);
        assert_eq!(query.state().len(), 1);
        assert_eq!(query.get("page"), Some(FieldValue::from(2)));
        assert_eq!(query.get("count"), None);
    }

    #[test]
    fn watch_sees_distinct_states() {
        let store = MemoryStore::new();
        let query = TypedQueryState::new(counter_schema(), store.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let _watch = query.watch({
            let seen = Rc::clone(&seen);
            move |state| seen.borrow_mut().push(state.get("count").and_then(FieldValue::as_number))
        });

        query.update("count", 2).unwrap();
        store.navigate("count=2&unrelated=1");
        store.back();
        store.back();

        assert_eq!(*seen.borrow(), vec![Some(1.0), Some(2.0), Some(1.0)]);
    }
}
