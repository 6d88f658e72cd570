//! Tracer setup and management

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// Register a span processor builder used when telemetry is initialized.
///
/// Must be called before [`init_telemetry`]; later registrations are
/// ignored with a warning.
///
/// ```ignore
/// use zdk_telemetry::{register_span_processor, init_telemetry};
/// use opentelemetry_sdk::trace::SimpleSpanProcessor;
///
/// register_span_processor(Box::new(|| {
///     SimpleSpanProcessor::new(Box::new(/* your exporter */))
/// }));
/// init_telemetry();
/// ```
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    match builders.as_mut() {
        Some(pending) => pending.push(builder),
        None => tracing::warn!("Attempted to register span processor after telemetry initialization"),
    }
}

/// Install the global subscriber: OpenTelemetry layer, formatted logs and an
/// `EnvFilter` read from `RUST_LOG` (falling back to [`DEFAULT_FILTER`]).
///
/// Fails if a global subscriber is already installed.
pub fn try_init_telemetry() -> Result<(), TryInitError> {
    let builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or_default();

    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let provider = provider_builder.build();
    let tracer = provider.tracer(crate::attributes::SYSTEM_NAME);
    let _ = TRACER_PROVIDER.set(Arc::new(provider));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init()
}

/// Like [`try_init_telemetry`], but keeps an already installed subscriber.
///
/// ```rust,no_run
/// zdk_telemetry::init_telemetry();
/// ```
pub fn init_telemetry() {
    if let Err(err) = try_init_telemetry() {
        tracing::debug!("Telemetry already initialized: {}", err);
    }
}

/// The global tracer provider, once initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
