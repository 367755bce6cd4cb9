//! Push installation endpoints
//!
//! Registers device installations and resolves the MQTT endpoint for an
//! installation. A freshly created installation's endpoint may not be
//! provisioned yet; the lookup retries that one transient condition a
//! bounded number of times. This is the only retry loop in the repository.

use serde::Deserialize;
use serde_json::{Value, json};

use sc_core::retry::{RetryConfig, is_endpoint_not_ready, retry_with_backoff};
use sc_core::{ApiRequest, Error, Result, Transport};

use crate::client::RestClient;

/// Kind of device being registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Android device (FCM registration id)
    Android,
    /// iOS device (APNs device token)
    Ios,
    /// MQTT-only client
    Mqtt,
}

impl DeviceType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Android => "ANDROID",
            DeviceType::Ios => "IOS",
            DeviceType::Mqtt => "MQTT",
        }
    }
}

/// A registered installation
#[derive(Debug, Clone)]
pub struct Installation {
    /// Server-issued installation id
    pub id: String,
}

/// Connection details for the MQTT endpoint of an installation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttEndpoint {
    /// Broker username
    pub username: String,
    /// Broker password
    pub password: String,
    /// Topic assigned to the installation
    pub mqtt_topic: String,
    /// Broker host
    pub host: String,
    /// Plain TCP port
    #[serde(rename = "portTCP")]
    pub port_tcp: u16,
    /// TLS port
    #[serde(rename = "portSSL")]
    pub port_ssl: u16,
}

impl RestClient {
    /// Register a device installation
    pub async fn install_device(
        &self,
        registration_id: &str,
        device_type: DeviceType,
    ) -> Result<Installation> {
        let body = json!({
            "installationRegistrationID": registration_id,
            "deviceType": device_type.as_str(),
        });
        let path = self.context().api_path("/installations");
        let response = self.send(ApiRequest::post(path, body)).await?.check()?;

        let created = response.json()?;
        let id = created
            .get("installationID")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::UnexpectedResponse(
                    "installation response missing installationID".to_string(),
                )
            })?;
        Ok(Installation { id: id.to_string() })
    }

    /// Look up the MQTT endpoint of an installation
    ///
    /// Retries the transient "endpoint not ready" condition within the
    /// given bounds; every other failure is returned immediately.
    pub async fn mqtt_endpoint(
        &self,
        installation_id: &str,
        retry: &RetryConfig,
    ) -> Result<MqttEndpoint> {
        let path = self.context().api_path(&format!(
            "/installations/{}/mqtt-endpoint",
            urlencoding::encode(installation_id)
        ));
        retry_with_backoff(
            retry,
            || {
                let request = ApiRequest::get(path.clone());
                async move {
                    let response = self.send(request).await?.check()?;
                    serde_json::from_slice::<MqttEndpoint>(&response.body).map_err(Error::from)
                }
            },
            is_endpoint_not_ready,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_wire_names() {
        assert_eq!(DeviceType::Android.as_str(), "ANDROID");
        assert_eq!(DeviceType::Ios.as_str(), "IOS");
        assert_eq!(DeviceType::Mqtt.as_str(), "MQTT");
    }

    #[test]
    fn test_mqtt_endpoint_deserialization() {
        let endpoint: MqttEndpoint = serde_json::from_str(
            r#"{
                "username": "inst-user",
                "password": "inst-pass",
                "mqttTopic": "t/inst",
                "host": "mqtt.stratus.example",
                "portTCP": 1883,
                "portSSL": 8883
            }"#,
        )
        .unwrap();
        assert_eq!(endpoint.mqtt_topic, "t/inst");
        assert_eq!(endpoint.port_ssl, 8883);
    }
}
