//! Demonstrates copying change notifications to an extra serial port.
//!
//! Usage: `cargo run --example mixer_extra_uart -- /dev/ttyUSB0`

use mixer_tools::io::{IoTransport, Serial};
use mixer_tools::{Mixer, Notification};

fn main() {
    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Serial::default().get_port());

    let mut uart = Serial::new(port);
    if let Err(error) = uart.open() {
        eprintln!("Cannot open {}: {}", uart, error);
        return;
    }

    let mixer = Mixer::default();
    mixer.set_extra_transport(uart);

    mixer.process_pot(0, 1000, 4095, false);
    mixer.process_pot(1, 4095, 4095, true);
    mixer.process_switch(0, true);

    // Resend everything, as the device does when the host connects.
    mixer.report_all();

    // What the host would read back.
    let line = r#"{"id":"sensor-pot0","value":24}"#;
    println!("{} => {:?}", line, Notification::from_line(line));
}
