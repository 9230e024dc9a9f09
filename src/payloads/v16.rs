//! OCPP 1.6 records for the actions exchanged by the bundled charge point
//! and central system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OcppRequest;

/// Outcome of a BootNotification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    Rejected,
}

/// Connector state reported by StatusNotification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointStatus {
    Available,
    Preparing,
    Charging,
    SuspendedEVSE,
    SuspendedEV,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

/// Error reported by StatusNotification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePointErrorCode {
    ConnectorLockFailure,
    EVCommunicationError,
    GroundFailure,
    HighTemperature,
    InternalError,
    LocalListConflict,
    NoError,
    OtherError,
    OverCurrentFailure,
    PowerMeterFailure,
    PowerSwitchFailure,
    ReaderFailure,
    ResetFailure,
    UnderVoltage,
    OverVoltage,
    WeakSignal,
}

/// Firmware update progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirmwareStatus {
    Downloaded,
    DownloadFailed,
    Downloading,
    Idle,
    InstallationFailed,
    Installing,
    Installed,
}

/// Outcome of a CancelReservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReservationStatus {
    Accepted,
    Rejected,
}

/// Outcome of a DataTransfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataTransferStatus {
    Accepted,
    Rejected,
    UnknownMessageId,
    UnknownVendorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charge_point_model: String,
    pub charge_point_vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_point_serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
}

impl BootNotificationRequest {
    pub fn new(model: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            charge_point_model: model.into(),
            charge_point_vendor: vendor.into(),
            charge_point_serial_number: None,
            firmware_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: String,
    /// Heartbeat interval in seconds.
    pub interval: i64,
    pub status: RegistrationStatus,
}

impl OcppRequest for BootNotificationRequest {
    const ACTION: &'static str = "BootNotification";
    type Response = BootNotificationResponse;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: String,
}

impl OcppRequest for HeartbeatRequest {
    const ACTION: &'static str = "Heartbeat";
    type Response = HeartbeatResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub connector_id: i64,
    pub error_code: ChargePointErrorCode,
    pub status: ChargePointStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusNotificationResponse {}

impl OcppRequest for StatusNotificationRequest {
    const ACTION: &'static str = "StatusNotification";
    type Response = StatusNotificationResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareStatusNotificationRequest {
    pub status: FirmwareStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmwareStatusNotificationResponse {}

impl OcppRequest for FirmwareStatusNotificationRequest {
    const ACTION: &'static str = "FirmwareStatusNotification";
    type Response = FirmwareStatusNotificationResponse;
}

/// One measured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Values sampled at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub sampled_value: Vec<SampledValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValuesRequest {
    pub connector_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    pub meter_value: Vec<MeterValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterValuesResponse {}

impl OcppRequest for MeterValuesRequest {
    const ACTION: &'static str = "MeterValues";
    type Response = MeterValuesResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferRequest {
    pub vendor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransferResponse {
    pub status: DataTransferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OcppRequest for DataTransferRequest {
    const ACTION: &'static str = "DataTransfer";
    type Response = DataTransferResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    pub reservation_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelReservationResponse {
    pub status: CancelReservationStatus,
}

impl OcppRequest for CancelReservationRequest {
    const ACTION: &'static str = "CancelReservation";
    type Response = CancelReservationResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Direction, PayloadCatalog, UnknownFieldPolicy};
    use crate::protocol::ProtocolVersion;
    use serde_json::json;

    fn assert_valid<T: Serialize>(action: &str, direction: Direction, record: &T) {
        let payload = serde_json::to_value(record).unwrap();
        PayloadCatalog::for_version(ProtocolVersion::V16)
            .validate(action, direction, &payload, UnknownFieldPolicy::Strict)
            .unwrap();
    }

    #[test]
    fn test_requests_match_catalog() {
        assert_valid(
            BootNotificationRequest::ACTION,
            Direction::Request,
            &BootNotificationRequest::new("Optimus", "Tesla"),
        );
        assert_valid(HeartbeatRequest::ACTION, Direction::Request, &HeartbeatRequest {});
        assert_valid(
            StatusNotificationRequest::ACTION,
            Direction::Request,
            &StatusNotificationRequest {
                connector_id: 2,
                error_code: ChargePointErrorCode::NoError,
                status: ChargePointStatus::Available,
                info: None,
                timestamp: None,
            },
        );
        assert_valid(
            MeterValuesRequest::ACTION,
            Direction::Request,
            &MeterValuesRequest {
                connector_id: 1,
                transaction_id: Some(12345678),
                meter_value: vec![MeterValue {
                    timestamp: None,
                    sampled_value: vec![SampledValue {
                        value: "50.0".to_string(),
                        measurand: Some("Frequency".to_string()),
                        unit: Some("Hertz".to_string()),
                    }],
                }],
            },
        );
        assert_valid(
            CancelReservationRequest::ACTION,
            Direction::Request,
            &CancelReservationRequest { reservation_id: 1 },
        );
    }

    #[test]
    fn test_responses_match_catalog() {
        assert_valid(
            BootNotificationRequest::ACTION,
            Direction::Response,
            &BootNotificationResponse {
                current_time: "2024-01-01T00:00:00Z".to_string(),
                interval: 10,
                status: RegistrationStatus::Accepted,
            },
        );
        assert_valid(
            DataTransferRequest::ACTION,
            Direction::Response,
            &DataTransferResponse {
                status: DataTransferStatus::UnknownVendorId,
                data: None,
            },
        );
        assert_valid(
            StatusNotificationRequest::ACTION,
            Direction::Response,
            &StatusNotificationResponse {},
        );
    }

    #[test]
    fn test_wire_shape() {
        let request = StatusNotificationRequest {
            connector_id: 2,
            error_code: ChargePointErrorCode::NoError,
            status: ChargePointStatus::SuspendedEVSE,
            info: None,
            timestamp: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"connectorId": 2, "errorCode": "NoError", "status": "SuspendedEVSE"})
        );

        let response: BootNotificationResponse = serde_json::from_value(json!({
            "currentTime": "2024-01-01T00:00:00Z",
            "interval": 10,
            "status": "Accepted"
        }))
        .unwrap();
        assert_eq!(response.status, RegistrationStatus::Accepted);
    }
}
