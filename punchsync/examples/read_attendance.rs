//! Read the attendance log of a terminal and print it

use std::time::Duration;

use punchsync::{AttendanceReader, DeviceSession, DEFAULT_PORT};

#[tokio::main]
async fn main() -> punchsync::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Change to your device IP
    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    println!("Connecting to {} via UDP...", ip);

    let mut device = DeviceSession::udp(ip, DEFAULT_PORT, Duration::from_secs(5));

    device.connect().await?;
    println!("✓ Connected!");

    let result = AttendanceReader::new(&mut device).get_attendance().await;

    device.disconnect().await;
    println!("✓ Disconnected");

    let records = result?;
    println!("✓ {} records", records.len());
    for record in &records {
        println!("  {}", record);
    }

    Ok(())
}
