//! OCPP 2.0 request schemas.

use super::FieldType as T;
use super::{optional as opt, required as req, FieldSpec};

/// Request payloads, by action.
pub(super) const REQUESTS: &[(&str, &[FieldSpec])] = &[
    (
        "Authorize",
        &[
            req("id_token", T::Object),
            opt("iso15118_certificate_hash_data", T::Array),
            opt("evse_id", T::Array),
        ],
    ),
    ("BootNotification", &[req("charging_station", T::Object), req("reason", T::String)]),
    ("CancelReservation", &[req("reservation_id", T::Integer)]),
    ("CertificateSigned", &[req("cert", T::Array), opt("type_of_certificate", T::String)]),
    ("ChangeAvailability", &[req("evse_id", T::Integer), req("operational_status", T::String)]),
    ("ClearCache", &[]),
    ("ClearChargingProfile", &[opt("evse_id", T::Integer), opt("charging_profile", T::Object)]),
    ("ClearDisplayMessage", &[req("id", T::Integer)]),
    ("ClearVariableMonitoring", &[req("id", T::Array)]),
    (
        "ClearedChargingLimit",
        &[
            req("charging_limit_source", T::String),
            opt("evse_id", T::Integer),
        ],
    ),
    ("CostUpdated", &[req("total_cost", T::Integer), req("transaction_id", T::String)]),
    (
        "CustomerInformation",
        &[
            req("request_id", T::Integer),
            req("report", T::Boolean),
            req("clear", T::Boolean),
            opt("customer_certificate", T::Object),
            opt("id_token", T::Object),
            opt("customer_identifier", T::String),
        ],
    ),
    (
        "DataTransfer",
        &[
            req("vendor_id", T::String),
            opt("message_id", T::String),
            opt("data", T::Any),
        ],
    ),
    ("DeleteCertificate", &[req("certificate_hash_data", T::Object)]),
    ("FirmwareStatusNotification", &[req("status", T::String), req("request_id", T::Integer)]),
    (
        "Get15118EVCertificate",
        &[
            req("iso15118_schema_version", T::String),
            req("exi_request", T::String),
        ],
    ),
    ("GetBaseReport", &[req("request_id", T::Integer), req("report_base", T::String)]),
    ("GetCertificateStatus", &[req("ocsp_request_data", T::Object)]),
    (
        "GetChargingProfiles",
        &[
            req("charging_profile", T::Object),
            opt("request_id", T::Integer),
            opt("evse_id", T::Integer),
        ],
    ),
    (
        "GetCompositeSchedule",
        &[
            req("duration", T::Integer),
            req("evse_id", T::Integer),
            opt("charging_rate_unit", T::String),
        ],
    ),
    (
        "GetDisplayMessages",
        &[
            req("request_id", T::Integer),
            opt("priority", T::String),
            opt("state", T::String),
            opt("id", T::Array),
        ],
    ),
    ("GetInstalledCertificateIds", &[req("type_of_certificate", T::String)]),
    ("GetLocalListVersion", &[]),
    (
        "GetLog",
        &[
            req("log", T::Object),
            req("log_type", T::String),
            req("request_id", T::Integer),
            opt("retries", T::Integer),
            opt("retry_interval", T::Integer),
        ],
    ),
    (
        "GetMonitoringReport",
        &[
            opt("component_variable", T::Array),
            opt("request_id", T::Integer),
            opt("monitoring_criteria", T::Array),
        ],
    ),
    (
        "GetReport",
        &[
            opt("component_variable", T::Array),
            opt("request_id", T::Integer),
            opt("component_criteria", T::Array),
        ],
    ),
    ("GetTransactionStatus", &[opt("transaction_id", T::String)]),
    ("GetVariables", &[req("get_variable_data", T::Array)]),
    ("Heartbeat", &[]),
    ("InstallCertificate", &[req("certificate_type", T::String), req("certificate", T::String)]),
    ("LogStatusNotification", &[req("status", T::String), req("request_id", T::Integer)]),
    ("MeterValues", &[req("evse_id", T::Integer), req("meter_value", T::Array)]),
    ("NotifyCentralChargingNeeds", &[req("evse_id", T::Integer), req("sa_schedule", T::Array)]),
    (
        "NotifyChargingLimit",
        &[
            req("charging_limit", T::Object),
            opt("charging_schedule", T::Array),
            opt("evse_id", T::Integer),
        ],
    ),
    (
        "NotifyCustomerInformation",
        &[
            req("data", T::String),
            req("tbc", T::Boolean),
            req("seq_no", T::Integer),
            req("generated_at", T::String),
            opt("request_id", T::Integer),
        ],
    ),
    (
        "NotifyDisplayMessages",
        &[
            req("message_info", T::Array),
            req("request_id", T::Integer),
            req("tbc", T::Boolean),
        ],
    ),
    (
        "NotifyEVChargingNeeds",
        &[
            req("charging_needs", T::Object),
            req("evse_id", T::Integer),
            opt("max_schedule_tuples", T::Integer),
        ],
    ),
    (
        "NotifyEVChargingSchedule",
        &[
            req("time_base", T::String),
            req("charging_schedule", T::Object),
            req("evse_id", T::Integer),
        ],
    ),
    (
        "NotifyEvent",
        &[
            req("generated_at", T::String),
            req("tbc", T::Boolean),
            req("seq_no", T::Integer),
            req("event_data", T::Array),
        ],
    ),
    (
        "NotifyMonitoringReport",
        &[
            req("monitor", T::Array),
            req("tbc", T::Boolean),
            req("seq_no", T::Integer),
            req("generated_at", T::String),
            opt("request_id", T::Integer),
        ],
    ),
    (
        "NotifyReport",
        &[
            req("generated_at", T::String),
            req("report_data", T::Array),
            req("tbc", T::Boolean),
            req("seq_no", T::Integer),
            opt("request_id", T::Integer),
        ],
    ),
    (
        "PublishFirmware",
        &[
            req("location", T::String),
            req("checksum", T::String),
            opt("retries", T::Integer),
        ],
    ),
    ("PublishFirmwareStatusNotification", &[req("status", T::String), opt("location", T::String)]),
    ("Renegotiate15118Schedule", &[req("evse", T::Object)]),
    (
        "ReportChargingProfiles",
        &[
            req("charging_limit_source", T::String),
            req("charging_profile", T::Array),
            req("evse_id", T::Integer),
            opt("request_id", T::Integer),
            opt("tbc", T::Boolean),
        ],
    ),
    (
        "RequestStartTransaction",
        &[
            req("id_token", T::Object),
            req("remote_start_id", T::Integer),
            opt("evse_id", T::Integer),
            opt("charging_profile", T::Object),
        ],
    ),
    ("RequestStopTransaction", &[req("transaction_id", T::String)]),
    (
        "ReservationStatusUpdate",
        &[
            req("reservation_id", T::Integer),
            req("reservation_update_status", T::String),
        ],
    ),
    (
        "ReserveNow",
        &[
            req("id_token", T::Object),
            req("reservation", T::Object),
            opt("group_id_token", T::Object),
        ],
    ),
    ("Reset", &[req("type", T::String)]),
    ("SecurityEventNotification", &[req("type", T::String), req("timestamp", T::String)]),
    (
        "SendLocalList",
        &[
            req("version_number", T::Integer),
            req("update_type", T::String),
            opt("local_authorization_list", T::Array),
        ],
    ),
    ("SetChargingProfile", &[req("evse_id", T::Integer), req("charging_profile", T::Object)]),
    ("SetDisplayMessage", &[req("message", T::Object)]),
    ("SetMonitoringBase", &[req("monitoring_base", T::String)]),
    ("SetMonitoringLevel", &[req("severity", T::Integer)]),
    (
        "SetNetworkProfile",
        &[
            req("configuration_slot", T::Integer),
            req("connection_data", T::Object),
        ],
    ),
    ("SetVariableMonitoring", &[req("set_monitoring_data", T::Array)]),
    ("SetVariables", &[req("set_variable_data", T::Array)]),
    ("SignCertificate", &[req("csr", T::String), opt("type_of_certificate", T::String)]),
    (
        "StatusNotification",
        &[
            req("timestamp", T::String),
            req("connector_status", T::String),
            req("evse_id", T::Integer),
            req("connector_id", T::Integer),
        ],
    ),
    (
        "TransactionEvent",
        &[
            req("event_type", T::String),
            req("timestamp", T::String),
            req("trigger_reason", T::String),
            req("seq_no", T::Integer),
            req("transaction_data", T::Object),
            opt("meter_value", T::Array),
            opt("offline", T::Boolean),
            opt("number_of_phases_used", T::Integer),
            opt("cable_max_current", T::Integer),
            opt("reservation_id", T::Integer),
            opt("evse", T::Object),
            opt("id_token", T::Object),
        ],
    ),
    ("TriggerMessage", &[req("requested_message", T::String), opt("evse", T::Object)]),
    ("UnlockConnector", &[req("evse_id", T::Integer), req("connector_id", T::Integer)]),
    ("UnpublishFirmware", &[req("checksum", T::String)]),
    (
        "Update15118EVCertificate",
        &[
            req("iso15118_schema_version", T::String),
            req("exi_request", T::String),
        ],
    ),
    (
        "UpdateFirmware",
        &[
            req("request_id", T::Integer),
            req("firmware", T::Object),
            opt("retries", T::Integer),
            opt("retry_interval", T::Integer),
        ],
    ),
];
