//! Logging for the `scribe` binary
//!
//! `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--debug`.
//! Built with the `telemetry` feature, `--otel` also ships spans to the
//! collector at `OTEL_EXPORTER_OTLP_ENDPOINT` (default
//! `http://localhost:4317`) as `OTEL_SERVICE_NAME` (default `scribe`).

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Global logging flags
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub debug: bool,
    pub otel: bool,
}

impl LogOptions {
    fn level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level()))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(options: LogOptions) -> Result<()> {
    let registry = tracing_subscriber::registry()
        .with(options.filter())
        .with(fmt::layer().with_target(options.debug).compact());

    #[cfg(feature = "telemetry")]
    if options.otel {
        let (tracer, endpoint, service) = otlp::tracer()?;
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .context("Failed to install tracing subscriber")?;
        tracing::info!(%endpoint, %service, "exporting spans over OTLP");
        return Ok(());
    }

    registry
        .try_init()
        .context("Failed to install tracing subscriber")?;

    #[cfg(not(feature = "telemetry"))]
    if options.otel {
        tracing::warn!("--otel ignored: built without the `telemetry` feature");
    }

    Ok(())
}

/// Flush buffered spans before exit.
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(feature = "telemetry")]
mod otlp {
    use anyhow::{Context, Result};
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use opentelemetry_sdk::{runtime, Resource};

    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Batch-exporting tracer, registered as the global provider.
    pub fn tracer() -> Result<(Tracer, String, String)> {
        let endpoint = env_or("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317");
        let service = env_or("OTEL_SERVICE_NAME", "scribe");

        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()
            .context("Failed to build OTLP exporter")?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(Resource::new([KeyValue::new("service.name", service.clone())]))
            .build();
        let tracer = provider.tracer("scribe");

        // Spans stop flowing once the provider is dropped
        let _ = opentelemetry::global::set_tracer_provider(provider);

        Ok((tracer, endpoint, service))
    }
}
