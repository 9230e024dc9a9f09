//! OCPP 1.6 request and response schemas.

use super::FieldType as T;
use super::{optional as opt, required as req, FieldSpec};

/// Request payloads, by action.
pub(super) const REQUESTS: &[(&str, &[FieldSpec])] = &[
    // Initiated by the charge point.
    ("Authorize", &[req("id_tag", T::String)]),
    (
        "BootNotification",
        &[
            req("charge_point_vendor", T::String),
            req("charge_point_model", T::String),
            opt("charge_point_serial_number", T::String),
            opt("charge_box_serial_number", T::String),
            opt("firmware_version", T::String),
            opt("iccid", T::String),
            opt("imsi", T::String),
            opt("meter_type", T::String),
            opt("meter_serial_number", T::String),
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
    ("DiagnosticsStatusNotification", &[req("status", T::String)]),
    ("FirmwareStatusNotification", &[req("status", T::String)]),
    ("Heartbeat", &[]),
    (
        "MeterValues",
        &[
            req("connector_id", T::Integer),
            opt("transaction_id", T::Integer),
            req("meter_value", T::Array),
        ],
    ),
    (
        "StartTransaction",
        &[
            req("connector_id", T::Integer),
            req("id_tag", T::String),
            req("meter_start", T::Integer),
            opt("reservation_id", T::Integer),
            req("timestamp", T::String),
        ],
    ),
    (
        "StatusNotification",
        &[
            req("connector_id", T::Integer),
            req("error_code", T::String),
            opt("info", T::String),
            req("status", T::String),
            opt("timestamp", T::String),
            opt("vendor_id", T::String),
            opt("vendor_error_code", T::String),
        ],
    ),
    (
        "StopTransaction",
        &[
            opt("id_tag", T::String),
            req("meter_stop", T::Integer),
            req("timestamp", T::String),
            req("transaction_id", T::Integer),
            opt("reason", T::String),
            opt("transaction_data", T::Array),
        ],
    ),
    // Initiated by the central system.
    ("CancelReservation", &[req("reservation_id", T::Integer)]),
    ("ChangeAvailability", &[req("connector_id", T::Integer), req("type", T::String)]),
    ("ChangeConfiguration", &[req("key", T::String), req("value", T::String)]),
    ("ClearCache", &[]),
    (
        "ClearChargingProfile",
        &[
            opt("id", T::Integer),
            opt("connector_id", T::Integer),
            opt("charging_profile_purpose", T::String),
            opt("stack_level", T::Integer),
        ],
    ),
    (
        "GetCompositeSchedule",
        &[
            req("connector_id", T::Integer),
            req("duration", T::Integer),
            opt("charging_rate_unit", T::String),
        ],
    ),
    ("GetConfiguration", &[opt("key", T::Array)]),
    (
        "GetDiagnostics",
        &[
            req("location", T::String),
            opt("retries", T::Integer),
            opt("retry_interval", T::Integer),
            opt("start_time", T::String),
            opt("stop_time", T::String),
        ],
    ),
    ("GetLocalListVersion", &[]),
    (
        "RemoteStartTransaction",
        &[
            opt("connector_id", T::Integer),
            req("id_tag", T::String),
            opt("charging_profile", T::Object),
        ],
    ),
    ("RemoteStopTransaction", &[req("transaction_id", T::Integer)]),
    (
        "ReserveNow",
        &[
            req("connector_id", T::Integer),
            req("expiry_date", T::String),
            req("id_tag", T::String),
            opt("parent_id_tag", T::String),
            req("reservation_id", T::Integer),
        ],
    ),
    ("Reset", &[req("type", T::String)]),
    (
        "SendLocalList",
        &[
            req("list_version", T::Integer),
            opt("local_authorization_list", T::Array),
            req("update_type", T::String),
        ],
    ),
    (
        "SetChargingProfile",
        &[
            req("connector_id", T::Integer),
            req("cs_charging_profiles", T::Object),
        ],
    ),
    (
        "TriggerMessage",
        &[req("requested_message", T::String), opt("connector_id", T::Integer)],
    ),
    ("UnlockConnector", &[req("connector_id", T::Integer)]),
    (
        "UpdateFirmware",
        &[
            req("location", T::String),
            opt("retries", T::Integer),
            req("retrieve_date", T::String),
            opt("retry_interval", T::Integer),
        ],
    ),
];

/// Response payloads, by action.
pub(super) const RESPONSES: &[(&str, &[FieldSpec])] = &[
    ("Authorize", &[req("id_tag_info", T::Object)]),
    (
        "BootNotification",
        &[
            req("current_time", T::String),
            req("interval", T::Integer),
            req("status", T::String),
        ],
    ),
    ("DataTransfer", &[req("status", T::String), opt("data", T::Any)]),
    ("DiagnosticsStatusNotification", &[]),
    ("FirmwareStatusNotification", &[]),
    ("Heartbeat", &[req("current_time", T::String)]),
    ("MeterValues", &[]),
    (
        "StartTransaction",
        &[req("id_tag_info", T::Object), req("transaction_id", T::Integer)],
    ),
    ("StatusNotification", &[]),
    ("StopTransaction", &[opt("id_tag_info", T::Object)]),
    ("CancelReservation", &[req("status", T::String)]),
    ("ChangeAvailability", &[req("status", T::String)]),
    ("ChangeConfiguration", &[req("status", T::String)]),
    ("ClearCache", &[req("status", T::String)]),
    ("ClearChargingProfile", &[req("status", T::String)]),
    (
        "GetCompositeSchedule",
        &[
            req("status", T::String),
            opt("connector_id", T::Integer),
            opt("schedule_start", T::String),
            opt("charging_schedule", T::Object),
        ],
    ),
    (
        "GetConfiguration",
        &[opt("configuration_key", T::Array), opt("unknown_key", T::Array)],
    ),
    ("GetDiagnostics", &[opt("file_name", T::String)]),
    ("GetLocalListVersion", &[req("list_version", T::Integer)]),
    ("RemoteStartTransaction", &[req("status", T::String)]),
    ("RemoteStopTransaction", &[req("status", T::String)]),
    ("ReserveNow", &[req("status", T::String)]),
    ("Reset", &[req("status", T::String)]),
    ("SendLocalList", &[req("status", T::String)]),
    ("SetChargingProfile", &[req("status", T::String)]),
    ("TriggerMessage", &[req("status", T::String)]),
    ("UnlockConnector", &[req("status", T::String)]),
    ("UpdateFirmware", &[]),
];
