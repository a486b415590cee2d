//! Demonstrates the filtering of a potentiometer: a noisy sweep on a 12-bit ADC only reports
//! meaningful moves.

use mixer_tools::{Mixer, MixerEvent};

fn main() {
    let mixer = Mixer::default();

    // Triggered function when the potentiometer value changes.
    mixer.on(MixerEvent::OnPotChange, |(id, value): (usize, u16)| {
        println!("Pot {} value changed: {}%", id, value);
        Ok(())
    });

    // Sweep up then down, with +/-2 counts of noise on every sample and a sagging supply.
    let up = (0..=4095u16).step_by(16);
    let down = (0..=4095u16).rev().step_by(16);
    for step in up.chain(down) {
        let noise = [0u16, 2, 1, 0][(step / 16 % 4) as usize];
        let vref = 4095 - noise;
        let value = mixer.process_pot(0, step.saturating_add(noise), vref, false);
        if step % 1024 == 0 {
            println!("raw={} vref={} => {}%", step, vref, value);
        }
    }

    // An unpowered reference reads as 0 and never reports.
    assert_eq!(mixer.process_pot(0, 2048, 3, false), 0);
}
