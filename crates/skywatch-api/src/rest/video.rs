// Camera image endpoints

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::VideoFrameRecord;

impl ApiClient {
    /// Latest stored image in a camera folder (`fire` or `thermal`).
    ///
    /// `GET /video/latest/{folder}`. Returns `None` when the backend
    /// answers without an image URL.
    pub async fn latest_frame(&self, folder: &str) -> Result<Option<VideoFrameRecord>, Error> {
        let record: VideoFrameRecord = self.get(&format!("video/latest/{folder}")).await?;
        Ok(record.url.is_some().then_some(record))
    }
}
