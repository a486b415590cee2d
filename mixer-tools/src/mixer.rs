use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::{error, warn};
use parking_lot::RwLock;

use crate::config::MixerConfig;
use crate::errors::Error;
use crate::filters::{PotBank, Precision, SwitchBank};
use crate::io::IoTransport;
use crate::notification::Notification;
use crate::utils::{EventHandler, EventManager};

/// Lists all events a [`Mixer`] can emit/listen.
pub enum MixerEvent {
    /// Triggered when a potentiometer value changes.
    OnPotChange,
    /// Triggered when a switch toggles.
    OnSwitchChange,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<MixerEvent> for String {
    fn from(value: MixerEvent) -> Self {
        let event = match value {
            MixerEvent::OnPotChange => "pot_change",
            MixerEvent::OnSwitchChange => "switch_change",
        };
        event.into()
    }
}

/// The state of a hardware mixer: every potentiometer and switch channel plus the outputs their
/// changes are reported to.
///
/// The mixer is meant to be fed from the firmware polling loop. Clones share the same channel
/// state, transport and handlers. Each processed sample that changes a channel:
/// - emits the matching [`MixerEvent`],
/// - logs the JSON [`Notification`] at `warn` level with the `json` target,
/// - writes the same notification, newline terminated, to the extra transport (if any).
///
/// # Example
/// ```
/// use mixer_tools::{Mixer, MixerEvent};
///
/// let mixer = Mixer::default();
/// mixer.on(MixerEvent::OnPotChange, |(id, value): (usize, u16)| {
///     println!("Pot {} moved to {}%", id, value);
///     Ok(())
/// });
///
/// // 12-bit ADC, pot at half travel.
/// assert_eq!(mixer.process_pot(0, 2048, 4095, false), 50);
/// assert!(mixer.process_switch(0, true));
/// ```
#[derive(Clone, Debug)]
pub struct Mixer {
    config: MixerConfig,
    /// The potentiometer channels state.
    pots: Arc<RwLock<PotBank>>,
    /// The switch channels state.
    switches: Arc<RwLock<SwitchBank>>,
    /// The optional secondary output (extra UART).
    extra: Arc<RwLock<Option<Box<dyn IoTransport>>>>,
    /// The event manager for the mixer.
    events: EventManager,
}

impl Mixer {
    /// Creates a mixer with every channel at rest.
    pub fn new(config: MixerConfig) -> Self {
        Self {
            config,
            pots: Arc::new(RwLock::new(PotBank::new())),
            switches: Arc::new(RwLock::new(SwitchBank::new())),
            extra: Arc::new(RwLock::new(None)),
            events: Default::default(),
        }
    }

    // ########################################
    // Getters and Setters

    /// Retrieves the mixer configuration.
    pub fn get_config(&self) -> &MixerConfig {
        &self.config
    }

    /// Retrieves a snapshot of the potentiometer bank.
    pub fn get_pots(&self) -> PotBank {
        self.pots.read().clone()
    }

    /// Retrieves a snapshot of the switch bank.
    pub fn get_switches(&self) -> SwitchBank {
        self.switches.read().clone()
    }

    /// Retrieves the stored value of a potentiometer in the configured precision.
    pub fn get_pot(&self, id: usize) -> Option<u16> {
        let value = self.pots.read().get(id)?;
        Some(self.config.precision.from_permille(value))
    }

    /// Retrieves the stored state of a switch.
    pub fn get_switch(&self, id: usize) -> Option<bool> {
        self.switches.read().get(id)
    }

    /// Attaches the extra transport notifications are copied to. It replaces any previous one.
    /// The transport is expected to be opened already.
    pub fn set_extra_transport<T: IoTransport + 'static>(&self, transport: T) {
        *self.extra.write() = Some(Box::new(transport));
    }

    /// Detaches the extra transport, returning it.
    pub fn clear_extra_transport(&self) -> Option<Box<dyn IoTransport>> {
        self.extra.write().take()
    }

    // ########################################
    // Processing

    /// Feeds a potentiometer sample.
    ///
    /// # Parameters
    /// * `id`: the potentiometer channel
    /// * `raw`: the raw ADC sample
    /// * `vref`: the raw reference (supply) sample
    /// * `invert`: reverses the direction of travel
    ///
    /// # Returns
    /// The stored channel value in the configured precision: 0 when the channel id or the reference
    /// reading is invalid.
    pub fn process_pot(&self, id: usize, raw: u16, vref: u16, invert: bool) -> u16 {
        let reading = {
            let mut pots = self.pots.write();
            pots.process(id, raw, vref, invert, &self.config)
        };
        if reading.changed {
            self.events.emit(MixerEvent::OnPotChange, (id, reading.value));
            self.send_pot(id);
        }
        reading.value
    }

    /// Feeds a switch sample.
    ///
    /// # Returns
    /// The given `value`, unchanged.
    pub fn process_switch(&self, id: usize, value: bool) -> bool {
        let reading = self.switches.write().process(id, value);
        if reading.changed {
            self.events.emit(MixerEvent::OnSwitchChange, (id, value));
            self.send_switch(id);
        }
        reading.value
    }

    /// Sends the current state of every channel seen so far, potentiometers first.
    pub fn report_all(&self) {
        let highest = self.pots.read().get_highest_id();
        if let Some(highest) = highest {
            (0..=highest).for_each(|id| self.send_pot(id));
        }
        let highest = self.switches.read().get_highest_id();
        if let Some(highest) = highest {
            (0..=highest).for_each(|id| self.send_switch(id));
        }
    }

    fn send_pot(&self, id: usize) {
        let value = self.pots.read().get(id);
        if let Some(value) = value {
            self.send(Notification::Pot {
                id,
                value: Precision::Percent.from_permille(value),
            });
        }
    }

    fn send_switch(&self, id: usize) {
        let value = self.switches.read().get(id);
        if let Some(value) = value {
            self.send(Notification::Switch { id, value });
        }
    }

    /// Logs the notification and copies it to the extra transport. Transport failures are logged
    /// and otherwise ignored.
    fn send(&self, notification: Notification) {
        let line = notification.to_string();
        warn!(target: "json", "{}", line);

        if let Some(transport) = self.extra.write().as_mut() {
            let result = transport.write(format!("{}\n", line).as_bytes());
            if let Err(err) = result {
                error!("Cannot send notification to {}: {}", transport, err);
            }
        }
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event.
    ///
    /// Available events for a mixer are:
    /// - **`MixerEvent::OnPotChange` | `pot_change`**: Triggered when a potentiometer value changes.
    ///   _The callback must receive the following parameter: `|(id, value): (usize, u16)| { ... }`_
    /// - **`MixerEvent::OnSwitchChange` | `switch_change`**: Triggered when a switch toggles.
    ///   _The callback must receive the following parameter: `|(id, value): (usize, bool)| { ... }`_
    pub fn on<S, F, T>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Result<(), Error> + Send + 'static,
    {
        self.events.on(event, callback)
    }

    /// Unregisters a callback previously registered with [`Self::on()`].
    pub fn unregister(&self, handler: EventHandler) {
        self.events.unregister(handler)
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(MixerConfig::default())
    }
}

impl Display for Mixer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let pots = self.pots.read().get_highest_id();
        let switches = self.switches.read().get_highest_id();
        write!(
            f,
            "Mixer ({}) [pots={}, switches={}]",
            self.config.precision,
            pots.map_or(0, |id| id + 1),
            switches.map_or(0, |id| id + 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
    use std::sync::Once;
    use std::thread::{self, ThreadId};

    use log::{Level, LevelFilter, Log, Metadata, Record};
    use parking_lot::{const_mutex, Mutex};

    use super::*;
    use crate::config::{POT_COUNT_MAX, SWITCH_COUNT_MAX};
    use crate::mocks::transport::MockTransport;

    const VREF: u16 = 4095;

    type LogEntry = (Level, String, String);

    static LOGS: Mutex<Vec<(ThreadId, LogEntry)>> = const_mutex(Vec::new());
    static LOGGER: CaptureLogger = CaptureLogger;
    static LOGGER_INIT: Once = Once::new();

    /// Records every log line (up to `debug`) along with the thread that emitted it.
    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            let target = record.target().to_string();
            let entry = (record.level(), target, record.args().to_string());
            LOGS.lock().push((thread::current().id(), entry));
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        LOGGER_INIT.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Debug);
        });
    }

    /// Drains the lines logged by the current test thread.
    fn take_logs() -> Vec<LogEntry> {
        let current = thread::current().id();
        let mut logs = LOGS.lock();
        let (mine, others): (Vec<_>, Vec<_>) =
            logs.drain(..).partition(|(thread, _)| *thread == current);
        *logs = others;
        mine.into_iter().map(|(_, entry)| entry).collect()
    }

    fn json_log(line: &str) -> LogEntry {
        (Level::Warn, String::from("json"), String::from(line))
    }

    #[test]
    fn test_new_mixer() {
        let mixer = Mixer::default();
        assert_eq!(mixer.get_config(), &MixerConfig::default());
        assert_eq!(mixer.get_pot(0), Some(0));
        assert_eq!(mixer.get_pot(POT_COUNT_MAX), None);
        assert_eq!(mixer.get_switch(0), Some(false));
        assert_eq!(mixer.get_switch(SWITCH_COUNT_MAX), None);
        assert!(mixer.clear_extra_transport().is_none());
    }

    #[test]
    fn test_process_pot() {
        let mixer = Mixer::default();
        assert_eq!(mixer.process_pot(0, 2048, VREF, false), 50);
        assert_eq!(mixer.process_pot(0, 2050, VREF, false), 50);
        assert_eq!(mixer.process_pot(0, 0, VREF, false), 0);
        assert_eq!(mixer.process_pot(0, VREF, VREF, true), 0);
        assert_eq!(mixer.process_pot(0, 0, VREF, true), 100);
        assert_eq!(mixer.get_pot(0), Some(100));

        // Invalid inputs read as 0 and keep the state.
        assert_eq!(mixer.process_pot(0, 2048, 12, false), 0);
        assert_eq!(mixer.process_pot(POT_COUNT_MAX, 2048, VREF, false), 0);
        assert_eq!(mixer.get_pot(0), Some(100));
    }

    #[test]
    fn test_process_pot_permille() {
        let config = MixerConfig::default().with_precision(Precision::Permille);
        let mixer = Mixer::new(config);
        assert_eq!(mixer.process_pot(1, 2048, VREF, false), 500);
        assert_eq!(mixer.get_pot(1), Some(500));
    }

    #[test]
    fn test_process_switch() {
        let mixer = Mixer::default();
        assert!(mixer.process_switch(3, true));
        assert_eq!(mixer.get_switch(3), Some(true));
        assert!(!mixer.process_switch(3, false));
        assert_eq!(mixer.get_switch(3), Some(false));
        assert!(mixer.process_switch(SWITCH_COUNT_MAX, true));
    }

    #[test]
    fn test_pot_events() {
        let mixer = Mixer::default();
        let count = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicU16::new(0));

        let moved_count = count.clone();
        let moved_last = last.clone();
        let handler = mixer.on(MixerEvent::OnPotChange, move |(id, value): (usize, u16)| {
            assert_eq!(id, 2);
            moved_count.fetch_add(1, Ordering::SeqCst);
            moved_last.store(value, Ordering::SeqCst);
            Ok(())
        });

        mixer.process_pot(2, 1024, VREF, false);
        mixer.process_pot(2, 1025, VREF, false);
        mixer.process_pot(2, 1026, VREF, false);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 25);

        mixer.process_pot(2, VREF, VREF, false);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(last.load(Ordering::SeqCst), 100);

        mixer.unregister(handler);
        mixer.process_pot(2, 0, VREF, false);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_switch_events() {
        let mixer = Mixer::default();
        let flag = Arc::new(AtomicBool::new(false));
        let count = Arc::new(AtomicUsize::new(0));

        let moved_flag = flag.clone();
        let moved_count = count.clone();
        mixer.on("switch_change", move |(_, value): (usize, bool)| {
            moved_flag.store(value, Ordering::SeqCst);
            moved_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        mixer.process_switch(0, false);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        mixer.process_switch(0, true);
        mixer.process_switch(0, true);
        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        mixer.process_switch(0, false);
        assert!(!flag.load(Ordering::SeqCst));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_extra_transport() {
        let mixer = Mixer::default();
        let transport = MockTransport::opened();
        mixer.set_extra_transport(transport.clone());

        mixer.process_pot(1, 2048, VREF, false);
        mixer.process_pot(1, 2049, VREF, false);
        mixer.process_switch(0, true);
        mixer.process_switch(0, true);

        assert_eq!(
            transport.lines(),
            vec![
                r#"{"id":"sensor-pot1","value":50}"#,
                r#"{"id":"binary_sensor-sw0","value":true}"#,
            ]
        );

        assert!(mixer.clear_extra_transport().is_some());
        mixer.process_switch(0, false);
        assert_eq!(transport.lines().len(), 2);
    }

    #[test]
    fn test_extra_transport_percent_in_permille_mode() {
        let config = MixerConfig::default().with_precision(Precision::Permille);
        let mixer = Mixer::new(config);
        let transport = MockTransport::opened();
        mixer.set_extra_transport(transport.clone());

        assert_eq!(mixer.process_pot(0, 2048, VREF, false), 500);
        assert_eq!(transport.lines(), vec![r#"{"id":"sensor-pot0","value":50}"#]);
    }

    #[test]
    fn test_failing_transport_is_ignored() {
        let mixer = Mixer::default();
        mixer.set_extra_transport(MockTransport::failing());
        assert_eq!(mixer.process_pot(0, 2048, VREF, false), 50);
        assert!(mixer.process_switch(0, true));

        mixer.set_extra_transport(MockTransport::default());
        assert_eq!(mixer.process_pot(0, VREF, VREF, false), 100);
    }

    #[test]
    fn test_report_all() {
        let mixer = Mixer::default();
        let transport = MockTransport::opened();

        mixer.report_all();
        mixer.set_extra_transport(transport.clone());
        mixer.report_all();
        assert!(transport.lines().is_empty());

        mixer.process_pot(2, 2048, VREF, false);
        mixer.process_switch(1, true);
        transport.buffer.lock().clear();

        mixer.report_all();
        assert_eq!(
            transport.lines(),
            vec![
                r#"{"id":"sensor-pot0","value":0}"#,
                r#"{"id":"sensor-pot1","value":0}"#,
                r#"{"id":"sensor-pot2","value":50}"#,
                r#"{"id":"binary_sensor-sw0","value":false}"#,
                r#"{"id":"binary_sensor-sw1","value":true}"#,
            ]
        );
    }

    #[test]
    fn test_report_all_ignores_rejected_samples() {
        let mixer = Mixer::default();
        let transport = MockTransport::opened();
        mixer.set_extra_transport(transport.clone());

        mixer.process_pot(5, 2048, 0, false);
        mixer.process_pot(POT_COUNT_MAX, 2048, VREF, false);
        mixer.report_all();
        assert!(transport.lines().is_empty());
    }

    #[test]
    fn test_json_log_lines() {
        capture_logs();
        let mixer = Mixer::default();
        take_logs();

        mixer.process_pot(4, 2048, VREF, false);
        mixer.process_switch(2, true);
        assert_eq!(
            take_logs(),
            vec![
                json_log(r#"{"id":"sensor-pot4","value":50}"#),
                json_log(r#"{"id":"binary_sensor-sw2","value":true}"#),
            ]
        );

        // Jitter inside the hysteresis band and repeated switch states log nothing.
        mixer.process_pot(4, 2050, VREF, false);
        mixer.process_switch(2, true);
        assert!(take_logs().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let mixer = Mixer::default();
        let clone = mixer.clone();
        let transport = MockTransport::opened();
        clone.set_extra_transport(transport.clone());

        assert_eq!(mixer.process_pot(0, 2048, VREF, false), 50);
        assert_eq!(clone.get_pot(0), Some(50));
        assert_eq!(clone.process_pot(0, 2049, VREF, false), 50);
        mixer.process_switch(1, true);
        assert_eq!(clone.get_switch(1), Some(true));
        assert_eq!(clone.get_pots(), mixer.get_pots());
        assert_eq!(clone.get_switches(), mixer.get_switches());

        // Both clones report through the same transport, once per change.
        assert_eq!(
            transport.lines(),
            vec![
                r#"{"id":"sensor-pot0","value":50}"#,
                r#"{"id":"binary_sensor-sw1","value":true}"#,
            ]
        );
    }

    #[test]
    fn test_handler_can_read_mixer() {
        let mixer = Mixer::default();
        let seen = Arc::new(AtomicU16::new(0));

        let moved_mixer = mixer.clone();
        let moved_seen = seen.clone();
        mixer.on(MixerEvent::OnPotChange, move |(id, _): (usize, u16)| {
            let value = moved_mixer.get_pot(id).unwrap_or_default();
            moved_seen.store(value, Ordering::SeqCst);
            Ok(())
        });

        mixer.process_pot(0, 3072, VREF, false);
        assert_eq!(seen.load(Ordering::SeqCst), 75);
    }

    #[test]
    fn test_mixer_display() {
        let mixer = Mixer::default();
        assert_eq!(format!("{}", mixer), "Mixer (percent) [pots=0, switches=0]");
        mixer.process_pot(3, 100, VREF, false);
        mixer.process_switch(0, true);
        assert_eq!(format!("{}", mixer), "Mixer (percent) [pots=4, switches=1]");
    }
}
