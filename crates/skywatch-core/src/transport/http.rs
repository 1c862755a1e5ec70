// ── HTTP + push transport ──
//
// `Transport` backed by `skywatch_api::ApiClient` for polled resources and
// the push reader for subscriptions.

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use skywatch_api::models::TelemetryRecord;
use skywatch_api::{ApiClient, push};

use super::{SubscriptionHandle, Transport};
use crate::convert::video_frame_from_record;
use crate::model::{FireAlert, SensorReading, TelemetrySample};
use crate::resource::{ErrorDescriptor, ErrorKind, Outcome, Payload, ResourceSource, ResourceSpec};

/// Buffered push events per subscription before new ones are dropped.
const PUSH_BUFFER: usize = 64;

/// Transport talking to the ground-station backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ApiClient,
    push_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(client: ApiClient, push_url: Option<Url>) -> Self {
        Self { client, push_url }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn fetch(&self, source: ResourceSource) -> Result<Option<Payload>, skywatch_api::Error> {
        let payload = match source {
            ResourceSource::Telemetry => self
                .client
                .latest_telemetry()
                .await?
                .map(|r| Payload::Telemetry(TelemetrySample::from(r))),
            ResourceSource::Sensors => self
                .client
                .latest_sensors()
                .await?
                .map(|r| Payload::Sensors(SensorReading::from(r))),
            ResourceSource::FireAlerts => {
                let reports = self.client.list_reports().await?;
                Some(Payload::FireAlerts(reports.into_iter().map(FireAlert::from).collect()))
            }
            ResourceSource::VideoFrame(kind) => self
                .client
                .latest_frame(kind.folder())
                .await?
                .and_then(|r| video_frame_from_record(kind, r))
                .map(Payload::VideoFrame),
            ResourceSource::TelemetryPush => {
                return Err(skywatch_api::Error::InvalidRequest(
                    "push-only source cannot be fetched".into(),
                ));
            }
        };
        Ok(payload)
    }
}

impl Transport for HttpTransport {
    async fn fetch_once(&self, spec: &ResourceSpec) -> Outcome {
        match self.fetch(spec.source).await {
            Ok(Some(payload)) => Outcome::Success(payload),
            Ok(None) => {
                debug!(resource = %spec.name, "backend returned no data");
                Outcome::Empty
            }
            Err(e) if e.is_not_found() => {
                debug!(resource = %spec.name, "backend has nothing yet (404)");
                Outcome::Empty
            }
            Err(e) => {
                warn!(resource = %spec.name, error = %e, "fetch failed");
                Outcome::Failure(ErrorDescriptor::from(&e))
            }
        }
    }

    fn open_subscription(&self, spec: &ResourceSpec) -> SubscriptionHandle {
        let (sink, handle) = SubscriptionHandle::channel(PUSH_BUFFER);

        let Some(event_name) = spec.source.push_event() else {
            sink.error(ErrorDescriptor::application(format!(
                "{} has no push event",
                spec.name
            )));
            return handle;
        };
        let Some(url) = self.push_url.clone() else {
            sink.error(ErrorDescriptor::transport("no push endpoint configured"));
            return handle;
        };

        let client = self.client.clone();
        let resource = spec.name.clone();
        tokio::spawn(async move {
            let bearer = client.session().bearer();
            let cancel = sink.token().clone();

            let result = push::read_events(&url, bearer.as_deref(), &cancel, |event| {
                if event.name != event_name {
                    return;
                }
                match decode_push_telemetry(event.data) {
                    Ok(sample) => {
                        if !sink.event(Payload::Telemetry(sample)) {
                            debug!(resource = %resource, "push event dropped, consumer lagging");
                        }
                    }
                    Err(e) => debug!(resource = %resource, error = %e, "undecodable push payload"),
                }
            })
            .await;

            match result {
                Ok(()) if cancel.is_cancelled() => {}
                Ok(()) => {
                    info!(resource = %resource, "push channel closed by server");
                    sink.closed();
                }
                Err(e) => {
                    if e.is_unauthorized() {
                        client.session().invalidate();
                    }
                    warn!(resource = %resource, error = %e, "push channel failed");
                    sink.error(ErrorDescriptor::from(&e));
                }
            }
        });

        handle
    }
}

/// Decode a pushed telemetry payload. The backend sends either the record
/// itself or the same `{ data: record }` envelope as the REST endpoint.
fn decode_push_telemetry(data: Value) -> Result<TelemetrySample, ErrorDescriptor> {
    let record = match data {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    if !record.is_object() {
        return Err(ErrorDescriptor::new(ErrorKind::DataShape, "telemetry push is not an object"));
    }
    serde_json::from_value::<TelemetryRecord>(record)
        .map(TelemetrySample::from)
        .map_err(|e| ErrorDescriptor::new(ErrorKind::DataShape, e.to_string()))
}
