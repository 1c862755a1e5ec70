// User profile endpoints

use tracing::debug;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{DataEnvelope, ProfileRecord, ProfileUpdate};

impl ApiClient {
    /// Profile of the logged-in user.
    ///
    /// `GET /user/profile`
    pub async fn get_profile(&self) -> Result<ProfileRecord, Error> {
        let envelope: DataEnvelope<ProfileRecord> = self.get("user/profile").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Update the given profile fields; unset fields keep their stored value.
    ///
    /// `PUT /user/profile`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileRecord, Error> {
        if update.is_empty() {
            return Err(Error::InvalidRequest("no profile fields to update".into()));
        }
        debug!(?update, "updating profile");
        let envelope: DataEnvelope<ProfileRecord> = self.put("user/profile", update).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}
