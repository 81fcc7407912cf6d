//! Image (Glance v2) lookups through the SDK.

use super::client::OpenStackClient;
use super::error::CloudError;
use super::types::{Image, single_match};

impl OpenStackClient {
    pub(crate) async fn image_by_name(&self, name: &str) -> Result<Image, CloudError> {
        let listed = self.cloud.find_images().with_name(name).all().await?;
        let images = listed.iter().map(|image| Image {
            id: image.id().to_owned(),
            name: image.name().to_owned(),
        });
        single_match(images.filter(|image| image.name == name), "image", name)
    }
}
