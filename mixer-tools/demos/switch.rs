//! Demonstrates switch change detection: only transitions are reported.

use mixer_tools::{Mixer, MixerEvent};

fn main() {
    let mixer = Mixer::default();

    // Triggered function when a switch toggles.
    mixer.on(MixerEvent::OnSwitchChange, |(id, value): (usize, bool)| {
        println!("Switch {} toggled: {}", id, value);
        Ok(())
    });

    let samples = [false, true, true, true, false, false, true];
    for (tick, value) in samples.into_iter().enumerate() {
        mixer.process_switch(1, value);
        println!("tick {}: {}", tick, mixer);
    }
}
