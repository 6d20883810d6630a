//! Free-text filter input.

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// When edits to the filter text are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Report every edit as it happens.
    #[default]
    Immediate,
    /// Report only the last edit once no further edit arrived for the delay.
    Debounce(#[serde(with = "millis")] Duration),
}

mod millis {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

type FilterCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Default)]
struct FilterInner {
    /// Current text value.
    text: String,
    /// Bumped on every edit; a pending debounce only fires if it is current.
    generation: u64,
}

/// Captures search text and reports it to its owner.
///
/// Knows nothing about fetching. With [`FilterPolicy::Immediate`] the
/// callback runs synchronously inside [`set_text`](Self::set_text).
///
/// # Example
///
/// ```
/// use datatable_lib::filter::{FilterInput, FilterPolicy};
///
/// let input = FilterInput::new(FilterPolicy::Immediate, |text| {
///     println!("search for {text:?}");
/// });
/// input.set_text("ada");
/// assert_eq!(input.text(), "ada");
/// ```
#[derive(Clone)]
pub struct FilterInput {
    inner: Arc<RwLock<FilterInner>>,
    policy: FilterPolicy,
    on_change: FilterCallback,
}

impl FilterInput {
    /// Creates an empty input reporting to `on_change`.
    pub fn new<F>(policy: FilterPolicy, on_change: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(RwLock::new(FilterInner::default())),
            policy,
            on_change: Arc::new(on_change),
        }
    }

    /// Returns the current text.
    pub fn text(&self) -> String {
        self.inner
            .read()
            .map(|g| g.text.clone())
            .unwrap_or_default()
    }

    /// Returns the reporting policy.
    pub fn policy(&self) -> FilterPolicy {
        self.policy
    }

    /// Replaces the text, as after a keystroke, and reports it.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let generation = match self.inner.write() {
            Ok(mut guard) => {
                guard.text = text.clone();
                guard.generation += 1;
                guard.generation
            }
            Err(_) => return,
        };

        match self.policy {
            FilterPolicy::Immediate => (self.on_change)(&text),
            FilterPolicy::Debounce(delay) => self.report_later(delay, generation, text),
        }
    }

    /// Empties the text and reports it.
    pub fn clear(&self) {
        self.set_text("");
    }

    fn report_later(&self, delay: Duration, generation: u64, text: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::warn!("No runtime for debounced filter, reporting immediately");
            (self.on_change)(&text);
            return;
        };

        let inner = self.inner.clone();
        let on_change = self.on_change.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let current = inner
                .read()
                .ok()
                .filter(|g| g.generation == generation)
                .map(|g| g.text.clone());
            if let Some(text) = current {
                on_change(&text);
            }
        });
    }
}

impl std::fmt::Debug for FilterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterInput")
            .field("text", &self.text())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
