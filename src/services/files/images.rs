use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::services::ollama::models::{base::ImageData, errors::ClientError};

/// Turns an image into the base64 form the server expects.
///
/// A path that points at an existing file is read and encoded; any other
/// path is assumed to already hold base64 data.
pub async fn encode_image(image: ImageData) -> Result<ImageData, ClientError> {
    match image {
        ImageData::Path(path) => {
            let is_file = tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
            if is_file {
                let bytes = tokio::fs::read(&path).await?;
                Ok(ImageData::Base64(STANDARD.encode(bytes)))
            } else {
                Ok(ImageData::Base64(path.to_string_lossy().into_owned()))
            }
        }
        ImageData::Bytes(bytes) => Ok(ImageData::Base64(STANDARD.encode(bytes))),
        base64 @ ImageData::Base64(_) => Ok(base64),
    }
}

pub async fn encode_images(
    images: Option<Vec<ImageData>>,
) -> Result<Option<Vec<ImageData>>, ClientError> {
    let Some(images) = images else {
        return Ok(None);
    };
    let mut encoded = Vec::with_capacity(images.len());
    for image in images {
        encoded.push(encode_image(image).await?);
    }
    Ok(Some(encoded))
}
