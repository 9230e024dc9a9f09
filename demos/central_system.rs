//! OCPP 1.6 central system.
//!
//! Accepts charge points on `127.0.0.1:9000` (or the address given as the
//! first argument), answers their notifications and, once a charge point has
//! booted, asks it to cancel reservation 1.
//!
//! ```text
//! RUST_LOG=debug cargo run --example central_system
//! ```

use std::net::SocketAddr;

use ocpp_rpc::payloads::v16::{
    BootNotificationRequest, BootNotificationResponse, CancelReservationRequest,
    FirmwareStatusNotificationRequest, FirmwareStatusNotificationResponse, HeartbeatRequest,
    HeartbeatResponse, MeterValuesRequest, MeterValuesResponse, RegistrationStatus,
    StatusNotificationRequest, StatusNotificationResponse,
};
use ocpp_rpc::transport::stream::LineTransport;
use ocpp_rpc::{Endpoint, HandlerError, ProtocolVersion};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

const V16: ProtocolVersion = ProtocolVersion::V16;

fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_owned())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:9000".to_owned())
        .parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "central system listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(e) = serve(stream).await {
                tracing::warn!(%peer, error = %e, "charge point session ended with error");
            }
        });
    }
}

async fn serve(stream: TcpStream) -> ocpp_rpc::error::Result<()> {
    let connection = LineTransport::accept(stream, &[V16]).await?;

    let endpoint = Endpoint::builder()
        .nested_calls(true)
        .on(V16, "BootNotification", |req: BootNotificationRequest, ctx| async move {
            tracing::info!(
                vendor = %req.charge_point_vendor,
                model = %req.charge_point_model,
                "charge point booted"
            );

            // Cancel reservation 1 without holding up the boot reply.
            if let Some(endpoint) = ctx.caller().cloned() {
                tokio::spawn(async move {
                    let request = CancelReservationRequest { reservation_id: 1 };
                    match endpoint.send(&request).await {
                        Ok(reply) => tracing::info!(status = ?reply.status, "reservation cancelled"),
                        Err(e) => tracing::warn!(error = %e, "CancelReservation failed"),
                    }
                });
            }

            Ok::<_, HandlerError>(BootNotificationResponse {
                current_time: now(),
                interval: 10,
                status: RegistrationStatus::Accepted,
            })
        })
        .on(V16, "Heartbeat", |_: HeartbeatRequest, _ctx| async {
            Ok(HeartbeatResponse { current_time: now() })
        })
        .on(V16, "StatusNotification", |req: StatusNotificationRequest, _ctx| async move {
            tracing::info!(
                connector = req.connector_id,
                status = ?req.status,
                error_code = ?req.error_code,
                "status notification"
            );
            Ok(StatusNotificationResponse {})
        })
        .on(
            V16,
            "FirmwareStatusNotification",
            |req: FirmwareStatusNotificationRequest, _ctx| async move {
                tracing::info!(status = ?req.status, "firmware status");
                Ok(FirmwareStatusNotificationResponse {})
            },
        )
        .on(V16, "MeterValues", |req: MeterValuesRequest, _ctx| async move {
            for value in req.meter_value.iter().flat_map(|m| &m.sampled_value) {
                tracing::info!(
                    connector = req.connector_id,
                    value = %value.value,
                    measurand = ?value.measurand,
                    "meter value"
                );
            }
            Ok(MeterValuesResponse {})
        })
        .connect(connection)?;

    endpoint.run().await
}
