//! OCPP 1.6 charge point.
//!
//! Connects to a central system on `127.0.0.1:9000` (or the address given
//! as the first argument), boots, reports its state and then sends a
//! heartbeat at the interval the central system asked for.
//!
//! ```text
//! RUST_LOG=debug cargo run --example charge_point
//! ```

use std::time::Duration;

use ocpp_rpc::payloads::v16::{
    BootNotificationRequest, CancelReservationRequest, CancelReservationResponse,
    CancelReservationStatus, ChargePointErrorCode, ChargePointStatus, DataTransferRequest,
    FirmwareStatus, FirmwareStatusNotificationRequest, HeartbeatRequest, MeterValue,
    MeterValuesRequest, RegistrationStatus, SampledValue, StatusNotificationRequest,
};
use ocpp_rpc::transport::stream::LineTransport;
use ocpp_rpc::{Endpoint, ProtocolVersion};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

const V16: ProtocolVersion = ProtocolVersion::V16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:9000".to_owned());
    let stream = TcpStream::connect(&addr).await?;
    let connection = LineTransport::offer(stream, &[V16]).await?;

    let endpoint = Endpoint::builder()
        .validate_outbound(true)
        .on(V16, "CancelReservation", |req: CancelReservationRequest, _ctx| async move {
            tracing::info!(reservation = req.reservation_id, "cancelling reservation");
            Ok(CancelReservationResponse {
                status: CancelReservationStatus::Accepted,
            })
        })
        .connect(connection)?;

    let runner = endpoint.clone();
    let run = tokio::spawn(async move { runner.run().await });

    let boot = endpoint
        .send(&BootNotificationRequest::new("Optimus", "Tesla"))
        .await?;
    if boot.status != RegistrationStatus::Accepted {
        tracing::warn!(status = ?boot.status, "not accepted by central system");
        endpoint.shutdown();
        run.await??;
        return Ok(());
    }
    tracing::info!("connected to central system");

    endpoint
        .send(&StatusNotificationRequest {
            connector_id: 2,
            error_code: ChargePointErrorCode::NoError,
            status: ChargePointStatus::Available,
            info: None,
            timestamp: None,
        })
        .await?;
    endpoint
        .send(&FirmwareStatusNotificationRequest {
            status: FirmwareStatus::Installed,
        })
        .await?;
    endpoint
        .send(&MeterValuesRequest {
            connector_id: 1,
            transaction_id: Some(12345678),
            meter_value: vec![MeterValue {
                timestamp: None,
                sampled_value: vec![SampledValue {
                    value: "50.0".to_owned(),
                    measurand: Some("Frequency".to_owned()),
                    unit: Some("Hertz".to_owned()),
                }],
            }],
        })
        .await?;

    // The bundled central system does not handle DataTransfer.
    if let Err(e) = endpoint
        .send(&DataTransferRequest {
            vendor_id: "Tesla".to_owned(),
            message_id: None,
            data: None,
        })
        .await
    {
        tracing::info!(error = %e, "data transfer refused");
    }

    let interval = Duration::from_secs(boot.interval.max(1) as u64);
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reply = endpoint.send(&HeartbeatRequest {}).await?;
                tracing::info!(current_time = %reply.current_time, "heartbeat");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                endpoint.shutdown();
                break;
            }
        }
    }

    run.await??;
    Ok(())
}
