// Telemetry and environmental sensor endpoints

use tracing::debug;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{DataEnvelope, SensorRecord, TelemetryRecord};

impl ApiClient {
    /// Latest telemetry record.
    ///
    /// `GET /telemetry/latest`. The envelope's `source` (`pixhawk` or
    /// `firebase`) is folded into the record when the record lacks one.
    /// Returns `None` when the backend answers 200 without a record.
    pub async fn latest_telemetry(&self) -> Result<Option<TelemetryRecord>, Error> {
        let envelope: DataEnvelope<TelemetryRecord> = self.get("telemetry/latest").await?;
        debug!(source = ?envelope.source, "telemetry fetched");
        Ok(envelope.data.map(|mut record| {
            if record.source.is_none() {
                record.source = envelope.source;
            }
            record
        }))
    }

    /// Latest environmental sensor block.
    ///
    /// `GET /sensors/latest`
    pub async fn latest_sensors(&self) -> Result<Option<SensorRecord>, Error> {
        let envelope: DataEnvelope<SensorRecord> = self.get("sensors/latest").await?;
        Ok(envelope.data)
    }
}
