//! Object body transfer
//!
//! An object's binary payload lives alongside its document. Upload and
//! download are plain byte transfers; relocating a payload between two
//! objects sends the transfer descriptor derived from the target's
//! address.

use bytes::Bytes;

use sc_core::{ApiRequest, ObjectHandle, Result, Transport, TransferTarget, Uri};

use crate::client::RestClient;

/// Fallback media type when the server reports none
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A downloaded object body
#[derive(Debug, Clone)]
pub struct ObjectBody {
    /// Media type reported by the server
    pub content_type: String,
    /// Payload
    pub data: Bytes,
}

impl RestClient {
    /// Upload the binary body of an object
    pub async fn upload_body(
        &self,
        object: &ObjectHandle,
        content_type: &str,
        data: Bytes,
    ) -> Result<()> {
        let path = format!("{}/body", object.request_path(self.context())?);
        self.send(ApiRequest::put_bytes(path, content_type, data))
            .await?
            .check()?;
        Ok(())
    }

    /// Download the binary body of an object
    pub async fn download_body(&self, object: &ObjectHandle) -> Result<ObjectBody> {
        let path = format!("{}/body", object.request_path(self.context())?);
        let response = self.send(ApiRequest::get(path)).await?.check()?;
        Ok(ObjectBody {
            content_type: response
                .header("content-type")
                .unwrap_or(OCTET_STREAM)
                .to_string(),
            data: response.body,
        })
    }

    /// Move the binary body of `source` to the object addressed by `target`
    ///
    /// The target address must resolve to an object whose outermost owner
    /// is a user, a group, or the application itself; the descriptor
    /// derivation rejects anything else before a request is issued.
    pub async fn move_body(&self, source: &ObjectHandle, target: &Uri) -> Result<()> {
        let descriptor = TransferTarget::from_uri(target)?;
        let path = format!("{}/body/move", source.request_path(self.context())?);
        self.send(ApiRequest::post(path, serde_json::to_value(&descriptor)?))
            .await?
            .check()?;
        Ok(())
    }

    /// Delete the binary body of an object, keeping its document
    pub async fn delete_body(&self, object: &ObjectHandle) -> Result<()> {
        let path = format!("{}/body", object.request_path(self.context())?);
        self.send(ApiRequest::delete(path)).await?.check()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sc_core::{Error, TransferTarget, Uri};

    #[test]
    fn test_move_descriptor_rejects_thing_target_locally() {
        let uri = Uri::parse("stratus://things/T/buckets/B/objects/O").unwrap();
        assert!(matches!(
            TransferTarget::from_uri(&uri),
            Err(Error::UnsupportedTransferTarget(_))
        ));
    }
}
