//! Subscriber installation for the `tracing` output of every Waymark crate.
//!
//! [`TracingPlugin`] publishes its settings as the [`TracingConfig`] global
//! in `build()` and installs the subscriber in `ready()`, once every plugin
//! has been built. If the process already has a global subscriber (a test
//! harness, or a second app in the same process), installation is skipped.
//!
//! ```
//! use waymark_app::app::App;
//! use waymark_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let mut app = App::new();
//! app.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Json)
//!         .with_env_filter("waymark_endpoints=debug,waymark_app=warn"),
//! );
//! app.finish();
//!
//! assert_eq!(app.get_global::<TracingConfig>().unwrap().level, Level::DEBUG);
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use waymark_app::app::App;
use waymark_app::plugin::Plugin;
use waymark_app::resource::GlobalResource;

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// Newline-delimited JSON for log aggregation.
    Json,
}

/// The tracing settings the app was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum level when no env filter overrides it.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
}

impl GlobalResource for TracingConfig {}

/// Installs a `tracing-subscriber` registry with a formatting layer.
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::default(),
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates the plugin with `INFO` level and pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets per-target levels, `target=level,target=level`.
    ///
    /// An unparsable filter falls back to the plugin's level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Emits span enter and exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|err| {
                tracing::warn!(%err, directives = %directives, "ignoring invalid env filter");
                fallback()
            }),
            None => fallback(),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_global(TracingConfig {
            level: self.level,
            format: self.format,
        });
    }

    fn ready(&self, _app: &mut App) {
        let registry = tracing_subscriber::registry().with(self.filter());
        let layer = tracing_subscriber::fmt::layer().with_span_events(self.span_events());

        let installed = match self.format {
            TracingFormat::Pretty => registry.with(layer.pretty()).try_init(),
            TracingFormat::Compact => registry.with(layer.compact()).try_init(),
            TracingFormat::Json => registry.with(layer.json()).try_init(),
        };

        match installed {
            Ok(()) => tracing::info!(level = %self.level, format = ?self.format, "tracing initialized"),
            Err(err) => tracing::debug!(%err, "subscriber already installed"),
        }
    }

    fn cleanup(&self, _app: &mut App) {
        tracing::info!("tracing shutting down");
    }
}
