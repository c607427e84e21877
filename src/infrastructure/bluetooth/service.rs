//! Remote Service Module
//!
//! Main service that couples the core state to the transport. It owns the
//! two execution contexts:
//!
//! - the **event context** ([`RemoteService::run_events`]) drains radio events
//!   one at a time and never sleeps,
//! - the **foreground context** ([`RemoteService::run_foreground`]) runs user
//!   actions in order, including the long pairing wait and wake sequence.
//!
//! Both go through the same `Mutex<RemoteState>`; the lock is never held
//! across an `.await`.

use crate::domain::error::{RemoteError, Result};
use crate::domain::models::{
    AdvertisingMode, CameraCommand, CameraSlot, Effect, RadioEvent, Recipients, RemoteNotice,
    SlotId, UserAction,
};
use crate::domain::pairing::PairingPhase;
use crate::domain::settings::{Settings, SlotStore};
use crate::domain::state::{RemoteSnapshot, RemoteState};
use crate::infrastructure::bluetooth::protocol::{self, Advertisement, GattLayout};
use crate::infrastructure::bluetooth::transport::Transport;
use crate::presentation::status;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Default time each wake beacon is broadcast
pub const DEFAULT_WAKE_DWELL: Duration = Duration::from_millis(3000);

/// Configuration for the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gatt: GattLayout,
    pub pairing_timeout: Duration,
    pub wake_dwell: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gatt: GattLayout::default(),
            pairing_timeout: crate::domain::pairing::DEFAULT_PAIRING_TIMEOUT,
            wake_dwell: DEFAULT_WAKE_DWELL,
        }
    }
}

impl ServiceConfig {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            gatt: GattLayout::parse(
                &settings.ble_service_uuid,
                &settings.ble_write_char_uuid,
                &settings.ble_notify_char_uuid,
            )?,
            pairing_timeout: Duration::from_secs(settings.pairing_timeout_secs),
            wake_dwell: Duration::from_millis(settings.wake_dwell_ms),
        })
    }
}

/// A user action with an optional reply channel
#[derive(Debug)]
pub struct ActionRequest {
    pub action: UserAction,
    pub reply: Option<oneshot::Sender<Result<String>>>,
}

impl ActionRequest {
    pub fn new(action: UserAction) -> (Self, oneshot::Receiver<Result<String>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                action,
                reply: Some(tx),
            },
            rx,
        )
    }

    fn respond(self, result: Result<String>) {
        if let Some(reply) = self.reply {
            let _ = reply.send(result);
        }
    }
}

/// Main service coordinating the core state and the transport
pub struct RemoteService<T: Transport> {
    state: Mutex<RemoteState>,
    transport: Arc<T>,
    store: Arc<Mutex<dyn SlotStore>>,
    notice_sender: mpsc::UnboundedSender<RemoteNotice>,
    pairing_phase: watch::Sender<PairingPhase>,
    config: ServiceConfig,
}

impl<T: Transport + 'static> RemoteService<T> {
    /// Create the service, loading stored cameras from `store`
    pub fn new(
        transport: Arc<T>,
        store: Arc<Mutex<dyn SlotStore>>,
        config: ServiceConfig,
        notice_sender: mpsc::UnboundedSender<RemoteNotice>,
    ) -> Self {
        let (cameras, vertical) = {
            let store = store.lock().unwrap_or_else(PoisonError::into_inner);
            (store.load_all(), store.load_layout())
        };
        let state = RemoteState::new(cameras)
            .with_pairing_timeout(config.pairing_timeout)
            .with_vertical_layout(vertical);
        let (pairing_phase, _) = watch::channel(PairingPhase::Idle);

        Self {
            state: Mutex::new(state),
            transport,
            store,
            notice_sender,
            pairing_phase,
            config,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RemoteState) {
        self.pairing_phase.send_if_modified(|phase| {
            if *phase != *state.pairing_phase() {
                *phase = state.pairing_phase().clone();
                true
            } else {
                false
            }
        });
    }

    fn notify(&self, notice: RemoteNotice) {
        let _ = self.notice_sender.send(notice);
    }

    pub fn snapshot(&self) -> RemoteSnapshot {
        self.lock_state().snapshot()
    }

    pub fn subscribe_pairing(&self) -> watch::Receiver<PairingPhase> {
        self.pairing_phase.subscribe()
    }

    /// Advance a state step and carry out its effects
    fn step<R>(&self, f: impl FnOnce(&mut RemoteState) -> (Vec<Effect>, R)) -> R {
        let (effects, result) = {
            let mut state = self.lock_state();
            let out = f(&mut state);
            self.publish(&state);
            out
        };
        self.apply(effects);
        result
    }

    /// Begin normal advertising so saved cameras can reconnect
    pub fn start(&self) {
        info!("Advertising as {}", protocol::DEVICE_NAME);
        self.step(|state| {
            state.set_advertising(AdvertisingMode::Normal);
            (vec![Effect::Advertise(AdvertisingMode::Normal)], ())
        });
    }

    /// Event context entry point
    pub fn handle_radio_event(&self, event: RadioEvent) {
        self.step(|state| (state.handle_event(event, Instant::now()), ()));
    }

    /// Drain radio events until the transport side hangs up
    pub async fn run_events(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<RadioEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_radio_event(event);
        }
        info!("Radio event channel closed");
    }

    fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            let result = match effect {
                Effect::Disconnect(connection) => self.transport.disconnect(connection),
                Effect::StartScan => self.transport.start_scan(),
                Effect::StopScan => self.transport.stop_scan(),
                Effect::Advertise(mode) => self.transport.advertise(&self.advertisement(mode)),
                Effect::RestartAdvertising => self.transport.restart_advertising(),
                Effect::PersistSlot(slot, camera) => {
                    self.persist(slot, camera);
                    Ok(())
                }
                Effect::Notify(notice) => {
                    self.notify(notice);
                    Ok(())
                }
            };
            if let Err(e) = result {
                error!("Transport operation failed: {:#}", e);
            }
        }
    }

    fn advertisement(&self, mode: AdvertisingMode) -> Advertisement {
        match mode {
            AdvertisingMode::Normal => Advertisement::normal(self.config.gatt.service),
            AdvertisingMode::Wake { payload, .. } => {
                Advertisement::wake(self.config.gatt.service, &payload)
            }
        }
    }

    /// Slot writes are file I/O and stay off the event context
    fn persist(&self, slot: SlotId, camera: CameraSlot) {
        let store = self.store.clone();
        let save = move || {
            let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = store.save_slot(slot, &camera) {
                error!("Failed to persist camera {}: {:#}", slot.number(), e);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(save);
            }
            Err(_) => save(),
        }
    }

    /// Send a camera command to the recipients the dispatcher picks
    pub fn send_command(&self, command: CameraCommand) -> Result<Recipients> {
        let payload = protocol::command_payload(command);
        let recipients = {
            let mut state = self.lock_state();
            let recipients = state.recipients_for(command)?;
            // Sent under the lock so the recipients still match the registry.
            let sent = match recipients {
                Recipients::Broadcast => {
                    info!("TX (Broadcast) {}: {:02X?}", command.name(), payload);
                    self.transport.notify_all(payload)
                }
                Recipients::Unicast { connection, .. } => {
                    info!("TX (Unicast {}) {}: {:02X?}", connection, command.name(), payload);
                    self.transport.notify_one(connection, payload)
                }
            };
            sent.map_err(RemoteError::transport)?;
            state.record_sent(command, recipients, Instant::now());
            recipients
        };

        self.notify(RemoteNotice::CommandSent {
            command,
            recipients,
        });
        Ok(recipients)
    }

    /// Pair `slot`, waiting until a camera binds, the deadline passes or the
    /// session is cancelled.
    pub async fn pair(&self, slot: SlotId) -> Result<CameraSlot> {
        let mut phase = self.subscribe_pairing();
        let deadline = self.step(|state| {
            let now = Instant::now();
            match state.begin_pairing(slot, now) {
                Ok(effects) => (effects, Ok(state.pairing_deadline().unwrap_or(now))),
                Err(e) => (Vec::new(), Err(e)),
            }
        })?;

        loop {
            let finished = phase.borrow_and_update().is_terminal();
            if finished {
                break;
            }
            tokio::select! {
                changed = phase.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    self.step(|state| (state.expire_pairing(Instant::now()), ()));
                }
            }
        }

        let (outcome, camera) = {
            let mut state = self.lock_state();
            let outcome = state.take_pairing_outcome();
            let camera = state.camera(slot).clone();
            self.publish(&state);
            (outcome, camera)
        };

        match outcome {
            Some(PairingPhase::Completed { .. }) => Ok(camera),
            Some(PairingPhase::Cancelled { reason, .. }) => Err(reason),
            Some(PairingPhase::TimedOut { slot }) => Err(RemoteError::PairingTimeout { slot }),
            _ => Err(RemoteError::PairingCancelled { slot }),
        }
    }

    /// Abort the active pairing session, if any
    pub fn cancel_pairing(&self) -> bool {
        self.step(|state| {
            let effects = state.cancel_pairing();
            let cancelled = !effects.is_empty();
            (effects, cancelled)
        })
    }

    /// Broadcast each saved camera's wake beacon in turn, then return to
    /// normal advertising. Returns how many cameras were signalled.
    pub async fn wake(&self) -> Result<usize> {
        let targets = self.lock_state().wake_targets()?;

        let mut result = Ok(targets.len());
        for target in &targets {
            let mode = AdvertisingMode::Wake {
                slot: target.slot,
                payload: target.payload,
            };
            self.lock_state().set_advertising(mode);
            info!("Waking {} with payload {:02X?}", target.slot, target.payload);
            self.notify(RemoteNotice::Waking {
                slot: target.slot,
                name: target.name.clone(),
            });

            if let Err(e) = self.transport.advertise(&self.advertisement(mode)) {
                result = Err(RemoteError::transport(e));
                break;
            }
            tokio::time::sleep(self.config.wake_dwell).await;
        }

        self.lock_state().set_advertising(AdvertisingMode::Normal);
        if let Err(e) = self
            .transport
            .advertise(&self.advertisement(AdvertisingMode::Normal))
        {
            error!("Failed to restore normal advertising: {:#}", e);
            result = result.and(Err(RemoteError::transport(e)));
        }
        self.notify(RemoteNotice::WakeFinished);
        result
    }

    /// Flip and persist the dashboard orientation. A failed save is logged;
    /// the new orientation stays in effect.
    pub async fn toggle_layout(&self) -> bool {
        let vertical = self.lock_state().toggle_layout();
        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || {
            store
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .save_layout(vertical)
        })
        .await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to save layout preference: {:#}", e),
            Err(e) => warn!("Layout save task failed: {}", e),
        }
        self.notify(RemoteNotice::LayoutChanged { vertical });
        vertical
    }

    /// Run one non-pairing action
    pub async fn perform(&self, action: UserAction) -> Result<String> {
        match action {
            UserAction::Pair(slot) => {
                let camera = self.pair(slot).await?;
                Ok(format!("Paired {} to {}", camera.name, slot))
            }
            UserAction::CancelPairing => Ok(if self.cancel_pairing() {
                "Pairing cancelled".to_string()
            } else {
                "No pairing in progress".to_string()
            }),
            UserAction::Shutter => self.command_reply(CameraCommand::Shutter),
            UserAction::ModeSwitch => self.command_reply(CameraCommand::ModeSwitch),
            UserAction::ScreenToggle => self.command_reply(CameraCommand::ScreenToggle),
            UserAction::PowerOff => self.command_reply(CameraCommand::PowerOff),
            UserAction::Wake => {
                let count = self.wake().await?;
                Ok(format!("Wake signal sent to {} camera(s)", count))
            }
            UserAction::ToggleLayout => {
                let vertical = self.toggle_layout().await;
                Ok(format!(
                    "Layout: {}",
                    if vertical { "vertical" } else { "horizontal" }
                ))
            }
            UserAction::Status => Ok(self.status_text()),
        }
    }

    fn status_text(&self) -> String {
        let (snapshot, deadline) = {
            let state = self.lock_state();
            (state.snapshot(), state.pairing_deadline())
        };
        status::render_with_deadline(&snapshot, deadline, Instant::now()).join("\n")
    }

    fn command_reply(&self, command: CameraCommand) -> Result<String> {
        let recipients = self.send_command(command)?;
        Ok(match recipients {
            Recipients::Broadcast => format!("{} SENT!", command.name()),
            Recipients::Unicast { slot, .. } => {
                format!("{} SYNC! (camera {})", command.name(), slot.number())
            }
        })
    }

    /// Foreground loop. While pairing, `CancelPairing` cancels the session,
    /// `Status` is still answered and anything else is refused with
    /// [`RemoteError::Busy`].
    pub async fn run_foreground(self: Arc<Self>, mut actions: mpsc::UnboundedReceiver<ActionRequest>) {
        while let Some(request) = actions.recv().await {
            let UserAction::Pair(slot) = request.action else {
                let result = self.perform(request.action).await;
                log_result(request.action, &result);
                request.respond(result);
                continue;
            };

            let pairing = self.perform(UserAction::Pair(slot));
            tokio::pin!(pairing);
            let result = loop {
                tokio::select! {
                    result = &mut pairing => break result,
                    Some(other) = actions.recv() => {
                        match other.action {
                            UserAction::CancelPairing => {
                                self.cancel_pairing();
                                other.respond(Ok("Pairing cancelled".to_string()));
                            }
                            UserAction::Status => {
                                let text = self.status_text();
                                other.respond(Ok(text));
                            }
                            _ => other.respond(Err(RemoteError::Busy)),
                        }
                    }
                }
            };
            log_result(request.action, &result);
            request.respond(result);
        }
        info!("Foreground action channel closed");
    }
}

fn log_result(action: UserAction, result: &Result<String>) {
    match result {
        Ok(message) => info!("{:?}: {}", action, message),
        Err(e) => warn!("{:?} failed: {}", action, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ConnectionId;
    use crate::domain::settings::MemorySlotStore;
    use crate::infrastructure::bluetooth::transport::testing::{Call, RecordingTransport};

    struct Harness {
        service: Arc<RemoteService<RecordingTransport>>,
        transport: Arc<RecordingTransport>,
        store: Arc<Mutex<MemorySlotStore>>,
        notices: mpsc::UnboundedReceiver<RemoteNotice>,
    }

    fn harness(cameras: &[(SlotId, &str, &str)]) -> Harness {
        let mut memory = MemorySlotStore::new();
        for (slot, name, address) in cameras {
            memory
                .save_slot(*slot, &CameraSlot::paired(name, address).unwrap())
                .unwrap();
        }
        let store = Arc::new(Mutex::new(memory));
        let transport = Arc::new(RecordingTransport::default());
        let (tx, notices) = mpsc::unbounded_channel();
        let service = Arc::new(RemoteService::new(
            transport.clone(),
            store.clone(),
            ServiceConfig::default(),
            tx,
        ));
        Harness {
            service,
            transport,
            store,
            notices,
        }
    }

    fn connect(address: &str, id: u16) -> RadioEvent {
        RadioEvent::LinkConnected {
            address: address.to_string(),
            connection: ConnectionId(id),
        }
    }

    fn status_frame(connection: u16) -> RadioEvent {
        RadioEvent::CharacteristicWritten {
            connection: ConnectionId(connection),
            value: b"\x01\x02REC 00:00:05\x00\x00\x00\x00".to_vec(),
        }
    }

    fn drain(notices: &mut mpsc::UnboundedReceiver<RemoteNotice>) -> Vec<RemoteNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = notices.try_recv() {
            out.push(notice);
        }
        out
    }

    #[tokio::test]
    async fn test_shutter_unicasts_to_recording_slot_only() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa"), (SlotId::Two, "X4 222222", "bb")]);
        h.service.handle_radio_event(connect("aa", 1));
        h.service.handle_radio_event(connect("bb", 2));
        h.service.handle_radio_event(status_frame(1));
        h.transport.take();

        let recipients = h.service.send_command(CameraCommand::Shutter).unwrap();
        assert_eq!(
            recipients,
            Recipients::Unicast {
                slot: SlotId::One,
                connection: ConnectionId(1)
            }
        );
        assert_eq!(
            h.transport.calls(),
            vec![Call::NotifyOne(
                ConnectionId(1),
                protocol::command_payload(CameraCommand::Shutter).to_vec()
            )]
        );
    }

    #[tokio::test]
    async fn test_shutter_broadcasts_when_in_sync() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa"), (SlotId::Two, "X4 222222", "bb")]);
        h.service.handle_radio_event(connect("aa", 1));
        h.service.handle_radio_event(connect("bb", 2));
        h.transport.take();

        h.service.send_command(CameraCommand::Shutter).unwrap();
        let calls = h.transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Call::NotifyAll(_)));
    }

    #[tokio::test]
    async fn test_failed_shutter_send_keeps_recording_state() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa"), (SlotId::Two, "X4 222222", "bb")]);
        h.service.handle_radio_event(connect("aa", 1));
        h.service.handle_radio_event(connect("bb", 2));
        h.service.handle_radio_event(status_frame(1));
        let before = h.service.snapshot();

        h.transport.fail_notifications(true);
        assert_eq!(
            h.service.send_command(CameraCommand::Shutter),
            Err(RemoteError::Transport("radio down".to_string()))
        );
        let after = h.service.snapshot();
        assert!(after.slots[0].connection.is_recording);
        assert_eq!(after.recording_since, before.recording_since);

        // the retry still targets only the camera that is ahead
        h.transport.fail_notifications(false);
        h.transport.take();
        assert_eq!(
            h.service.send_command(CameraCommand::Shutter),
            Ok(Recipients::Unicast {
                slot: SlotId::One,
                connection: ConnectionId(1)
            })
        );
        assert!(!h.service.snapshot().slots[0].connection.is_recording);
        assert!(h.service.snapshot().recording_since.is_some());
    }

    #[tokio::test]
    async fn test_command_without_links_is_not_connected() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa")]);
        assert_eq!(
            h.service.send_command(CameraCommand::PowerOff),
            Err(RemoteError::NotConnected)
        );
        assert!(h.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_link_is_dropped_and_advertising_rearmed() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa")]);
        h.service.handle_radio_event(connect("cc", 3));
        assert_eq!(
            h.transport.calls(),
            vec![Call::Disconnect(ConnectionId(3)), Call::RestartAdvertising]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_completes_and_persists() {
        let mut h = harness(&[]);
        let mut phase = h.service.subscribe_pairing();
        let service = h.service.clone();
        let pairing = tokio::spawn(async move { service.pair(SlotId::One).await });
        phase.wait_for(PairingPhase::is_active).await.unwrap();

        h.service.handle_radio_event(RadioEvent::PeripheralDiscovered {
            name: "X4 998877".to_string(),
            address: "AA:BB:CC:DD:EE:FF".to_string(),
        });
        h.service.handle_radio_event(connect("AA:BB:CC:DD:EE:FF", 7));

        let camera = pairing.await.unwrap().unwrap();
        assert_eq!(camera.name, "X4 998877");
        assert_eq!(h.service.snapshot().pairing, PairingPhase::Idle);
        assert!(h.service.snapshot().slots[0].connection.connected);

        // persistence runs on the blocking pool
        for _ in 0..100 {
            if h.store.lock().unwrap().load_slot(SlotId::One).is_valid {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.store.lock().unwrap().load_slot(SlotId::One), camera);

        let calls = h.transport.calls();
        assert_eq!(calls[0], Call::StartScan);
        assert!(calls.contains(&Call::StopScan));
        assert!(drain(&mut h.notices).contains(&RemoteNotice::Paired {
            slot: SlotId::One,
            name: "X4 998877".to_string()
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_times_out() {
        let h = harness(&[]);
        let started = Instant::now();
        let result = h.service.pair(SlotId::Two).await;

        assert_eq!(result, Err(RemoteError::PairingTimeout { slot: SlotId::Two }));
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(h.transport.calls().last(), Some(&Call::StopScan));
        assert!(!h.service.snapshot().slots[1].camera.is_valid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_cancels_pairing_and_refuses_other_actions() {
        let h = harness(&[]);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(h.service.clone().run_foreground(rx));

        let (pair, pair_reply) = ActionRequest::new(UserAction::Pair(SlotId::One));
        tx.send(pair).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let (shutter, shutter_reply) = ActionRequest::new(UserAction::Shutter);
        tx.send(shutter).unwrap();
        assert_eq!(shutter_reply.await.unwrap(), Err(RemoteError::Busy));

        let (status, status_reply) = ActionRequest::new(UserAction::Status);
        tx.send(status).unwrap();
        let text = status_reply.await.unwrap().unwrap();
        assert!(text.contains("Pairing CAM 1: scanning..."), "{text}");

        let (cancel, cancel_reply) = ActionRequest::new(UserAction::CancelPairing);
        tx.send(cancel).unwrap();
        assert!(cancel_reply.await.unwrap().is_ok());
        assert_eq!(
            pair_reply.await.unwrap(),
            Err(RemoteError::PairingCancelled { slot: SlotId::One })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_cycles_saved_cameras_then_restores() {
        let h = harness(&[(SlotId::One, "X4 111111", "aa"), (SlotId::Two, "X5 222222", "bb")]);
        let started = Instant::now();

        assert_eq!(h.service.wake().await, Ok(2));
        assert!(started.elapsed() >= Duration::from_secs(6));

        let layout = GattLayout::default();
        assert_eq!(
            h.transport.calls(),
            vec![
                Call::Advertise(Advertisement::wake(layout.service, b"111111")),
                Call::Advertise(Advertisement::wake(layout.service, b"222222")),
                Call::Advertise(Advertisement::normal(layout.service)),
            ]
        );
        assert_eq!(h.service.snapshot().advertising, AdvertisingMode::Normal);
    }

    #[tokio::test]
    async fn test_wake_without_saved_camera() {
        let h = harness(&[]);
        assert_eq!(h.service.wake().await, Err(RemoteError::NoSavedCamera));
        assert!(h.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_layout_persists() {
        let h = harness(&[]);
        assert!(h.service.toggle_layout().await);
        assert!(h.store.lock().unwrap().load_layout());
        assert!(!h.service.toggle_layout().await);
        assert!(!h.store.lock().unwrap().load_layout());
    }

    struct ReadOnlyStore;

    impl SlotStore for ReadOnlyStore {
        fn load_slot(&self, _slot: SlotId) -> CameraSlot {
            CameraSlot::default()
        }

        fn save_slot(&mut self, _slot: SlotId, _camera: &CameraSlot) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }

        fn load_layout(&self) -> bool {
            false
        }

        fn save_layout(&mut self, _vertical: bool) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }
    }

    #[tokio::test]
    async fn test_layout_toggles_even_when_save_fails() {
        let (tx, mut notices) = mpsc::unbounded_channel();
        let service = RemoteService::new(
            Arc::new(RecordingTransport::default()),
            Arc::new(Mutex::new(ReadOnlyStore)),
            ServiceConfig::default(),
            tx,
        );

        assert!(service.toggle_layout().await);
        assert!(service.snapshot().vertical_layout);
        assert_eq!(
            drain(&mut notices),
            vec![RemoteNotice::LayoutChanged { vertical: true }]
        );
    }
}
