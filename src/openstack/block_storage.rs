//! Block storage (Cinder) volume calls through the SDK.

use super::client::OpenStackClient;
use super::error::CloudError;
use super::types::{Volume, VolumeCreate};

impl OpenStackClient {
    pub(crate) async fn post_volume(&self, request: &VolumeCreate) -> Result<Volume, CloudError> {
        let volume = self
            .cloud
            .new_volume(u64::from(request.size))
            .with_name(request.name.clone())
            .with_volume_type(request.volume_type.as_str())
            .with_availability_zone(request.availability_zone.as_str())
            .with_image_id(request.image_id.as_str())
            .create()
            .await?;
        Ok(Volume {
            id: volume.id().to_owned(),
            status: volume.status().to_string(),
        })
    }

    pub(crate) async fn fetch_volume(&self, volume_id: &str) -> Result<Volume, CloudError> {
        let volume = self.cloud.get_volume(volume_id).await?;
        Ok(Volume {
            id: volume.id().to_owned(),
            status: volume.status().to_string(),
        })
    }

    pub(crate) async fn remove_volume(&self, volume_id: &str) -> Result<(), CloudError> {
        let volume = self.cloud.get_volume(volume_id).await?;
        Ok(volume.delete().await.map(drop)?)
    }
}
