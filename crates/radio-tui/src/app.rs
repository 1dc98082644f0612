//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks
//!   (backend fetches, auth, presence, weather, mpv).
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Playback transitions come back from `RadioState` as `AudioCommand`s and
//!   flow out to mpv through `AudioOutput`.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Terminal,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use radio_core::config::Config;
use radio_core::playback::AudioCommand;
use radio_core::presence::{presence_key, PresenceCounter, PresenceTransport};
use radio_core::protocol::{Station, StationDraft, StationId};
use radio_core::realtime::RealtimePresence;
use radio_core::session::{AuthService, Session, SessionGate};
use radio_core::settings::SettingsStore;
use radio_core::state::RadioState;
use radio_core::supabase::SupabaseClient;
use radio_core::sync::{Mutation, RemoteSync, StationTable, SyncError};
use radio_core::ticker::{WeatherClient, WeatherReport};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, WeatherLine},
    component::Component,
    components::{
        confirm_dialog::ConfirmDelete, help_overlay::HelpOverlay, login_form::LoginForm,
        now_playing::NowPlaying, settings_sheet::SettingsSheet, station_form::StationForm,
        station_list::StationList, ticker::Ticker,
    },
    focus::FocusRing,
    mpv::{AudioOutput, MpvDriver, MpvEvent, OBS_CORE_IDLE, OBS_PAUSE},
    theme::backdrop,
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, SpinnerId, ToastManager},
    },
};

const VOLUME_STEP: f32 = 0.05;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    StationsLoaded(Result<Vec<Station>, String>),
    MutationDone {
        mutation: Mutation,
        spinner: SpinnerId,
        result: Result<Vec<Station>, SyncError>,
    },
    LoginResult(Result<(), String>),
    LogoutResult(Result<(), String>),
    SessionChanged(Option<Session>),
    OnlineCount(usize),
    VisitCount(i64),
    Weather(Result<WeatherReport, String>),
    Mpv(MpvEvent),
    AudioFailed(String),
}

/// At most one modal on top of the panes.
enum Overlay {
    None,
    Help(HelpOverlay),
    StationForm(StationForm),
    Login(LoginForm),
    Settings(SettingsSheet),
    Confirm(ConfirmDelete),
}

impl Overlay {
    fn component(&mut self) -> Option<&mut dyn Component> {
        match self {
            Overlay::None => None,
            Overlay::Help(c) => Some(c as &mut dyn Component),
            Overlay::StationForm(c) => Some(c as &mut dyn Component),
            Overlay::Login(c) => Some(c as &mut dyn Component),
            Overlay::Settings(c) => Some(c as &mut dyn Component),
            Overlay::Confirm(c) => Some(c as &mut dyn Component),
        }
    }

    fn is_open(&self) -> bool {
        !matches!(self, Overlay::None)
    }

    /// Overlays that only make sense with an admin session.
    fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Overlay::StationForm(_) | Overlay::Settings(_) | Overlay::Confirm(_)
        )
    }
}

/// Screen areas from the last frame, for mouse hit-testing.
#[derive(Default)]
struct PaneAreas {
    stations: Rect,
    now_playing: Rect,
}

/// Backend handles; absent when no project is configured.
struct Backend {
    client: Arc<SupabaseClient>,
    sync: RemoteSync,
    gate: Arc<SessionGate>,
}

pub struct App {
    state: AppState,
    config: Config,
    focus: FocusRing,
    station_list: StationList,
    now_playing: NowPlaying,
    ticker: Ticker,
    overlay: Overlay,
    toast: ToastManager,
    pane_areas: PaneAreas,
    should_quit: bool,

    backend: Option<Backend>,
    settings_store: SettingsStore,
    mpv: MpvDriver,
    audio: Option<AudioOutput>,
    listening_tx: watch::Sender<bool>,
    presence_cancel: Option<CancellationToken>,

    msg_tx: mpsc::Sender<AppMessage>,
    msg_rx: Option<mpsc::Receiver<AppMessage>>,
}

impl App {
    pub fn new(
        config: Config,
        client: Result<SupabaseClient, SyncError>,
        settings_store: SettingsStore,
    ) -> Self {
        let volume = config.audio.default_volume.clamp(0.0, 1.0);
        let mut state = AppState::new(RadioState::new(volume), settings_store.current().clone());

        let backend = match client {
            Ok(client) => {
                let client = Arc::new(client);
                let table: Arc<dyn StationTable> = client.clone();
                let auth: Arc<dyn AuthService> = client.clone();
                Some(Backend {
                    client,
                    sync: RemoteSync::new(table),
                    gate: Arc::new(SessionGate::new(auth)),
                })
            }
            Err(e) => {
                warn!("backend unavailable: {}", e);
                state.load_error = Some(e.to_string());
                state.radio.loaded = true;
                None
            }
        };

        let (msg_tx, msg_rx) = mpsc::channel::<AppMessage>(1024);
        let (listening_tx, _) = watch::channel(false);

        Self {
            state,
            focus: FocusRing::new(vec![ComponentId::StationList, ComponentId::NowPlaying]),
            station_list: StationList::new(),
            now_playing: NowPlaying,
            ticker: Ticker::new(),
            overlay: Overlay::None,
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            should_quit: false,
            backend,
            settings_store,
            mpv: MpvDriver::new(volume),
            audio: None,
            listening_tx,
            presence_cancel: None,
            msg_tx,
            msg_rx: Some(msg_rx),
            config,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut msg_rx = self
            .msg_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app already running"))?;

        // ── Terminal setup ────────────────────────────────────────────────────
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.draw(|f| self.draw(f))?;

        // ── Audio output ──────────────────────────────────────────────────────
        let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(256);
        let (fail_tx, mut fail_rx) = mpsc::unbounded_channel::<String>();
        match self.mpv.spawn_and_connect(mpv_tx).await {
            Ok(handle) => {
                handle.observe_all_properties().await;
                self.audio = Some(AudioOutput::spawn(handle, fail_tx));
                self.state.audio_ready = true;
            }
            Err(e) => {
                error!("mpv start failed: {}", e);
                self.toast.error(format!("audio unavailable: {}", e));
            }
        }

        // ── Background tasks ──────────────────────────────────────────────────
        self.spawn_event_reader();
        self.spawn_session_watch();
        self.spawn_load();
        self.spawn_visit_count();
        self.spawn_weather();
        self.restart_presence();

        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;

        // ── Event loop ────────────────────────────────────────────────────────
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
                needs_redraw = false;
            }

            tokio::select! {
                Some(msg) = msg_rx.recv() => {
                    needs_redraw |= self.handle_message(msg);
                    // Drain whatever else is queued so bursts cost one frame.
                    for _ in 0..256 {
                        match msg_rx.try_recv() {
                            Ok(msg) => needs_redraw |= self.handle_message(msg),
                            Err(_) => break,
                        }
                    }
                }
                Some(ev) = mpv_rx.recv() => {
                    needs_redraw |= self.handle_message(AppMessage::Mpv(ev));
                }
                Some(err) = fail_rx.recv() => {
                    needs_redraw |= self.handle_message(AppMessage::AudioFailed(err));
                }
                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
                _ = ui_tick.tick() => {
                    let actions = self.ticker.tick(&self.state);
                    self.dispatch(actions);
                    if self.state.settings.running_text.show {
                        needs_redraw = true;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        if let Some(cancel) = self.presence_cancel.take() {
            cancel.cancel();
        }
        self.mpv.kill().await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Background task spawners ──────────────────────────────────────────────

    fn spawn_event_reader(&self) {
        let tx = self.msg_tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("terminal event read failed: {}", e);
                    break;
                }
            }
        });
    }

    fn spawn_session_watch(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        let mut rx = backend.gate.subscribe();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                if tx.send(AppMessage::SessionChanged(session)).await.is_err() {
                    break;
                }
            }
        });
    }

    fn spawn_load(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        let sync = backend.sync.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let result = sync.load().await.map_err(|e| e.to_string());
            let _ = tx.send(AppMessage::StationsLoaded(result)).await;
        });
    }

    fn spawn_visit_count(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        let client = backend.client.clone();
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            match client.visit_count().await {
                Ok(n) => {
                    let _ = tx.send(AppMessage::VisitCount(n)).await;
                }
                Err(e) => warn!("visit counter unavailable: {}", e),
            }
        });
    }

    /// Look the weather up now and again every `refresh_mins` while lookups
    /// keep succeeding.  The first failure ends the loop.
    fn spawn_weather(&mut self) {
        let tx = self.msg_tx.clone();
        let client = match WeatherClient::new(&self.config.ticker) {
            Ok(c) => c,
            Err(e) => {
                info!("weather disabled: {}", e);
                self.state.weather = WeatherLine::Unavailable(e.to_string());
                return;
            }
        };
        let every = Duration::from_secs(self.config.ticker.refresh_mins.max(1) * 60);
        tokio::spawn(async move {
            loop {
                match client.lookup().await {
                    Ok(report) => {
                        if tx.send(AppMessage::Weather(Ok(report))).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("weather lookup failed: {}", e);
                        let _ = tx.send(AppMessage::Weather(Err(e.to_string()))).await;
                        break;
                    }
                }
                tokio::time::sleep(every).await;
            }
        });
    }

    /// Leave the presence channel and join again under the key and token of
    /// the current session.
    fn restart_presence(&mut self) {
        if let Some(cancel) = self.presence_cancel.take() {
            cancel.cancel();
        }
        let Some(backend) = &self.backend else {
            return;
        };
        let session = self.state.session.as_ref();
        let transport: Arc<dyn PresenceTransport> = Arc::new(RealtimePresence::new(
            backend.client.base_url(),
            &self.config.supabase.anon_key,
            &self.config.supabase.realtime_channel,
            session.map(|s| s.access_token.clone()),
        ));
        let key = presence_key(session);
        debug!("presence: joining as {}", key);

        let cancel = CancellationToken::new();
        let mut counts = PresenceCounter::spawn(
            transport,
            key,
            self.listening_tx.subscribe(),
            cancel.clone(),
        );
        let tx = self.msg_tx.clone();
        let stop = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    changed = counts.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let n = *counts.borrow_and_update();
                        if tx.send(AppMessage::OnlineCount(n)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.presence_cancel = Some(cancel);
    }

    fn spawn_mutation(&mut self, mutation: Mutation, run: MutationRun) {
        let Some(backend) = &self.backend else {
            self.toast.error("backend not configured");
            return;
        };
        let sync = backend.sync.clone();
        let spinner = self.toast.spinner(format!("{}…", mutation.describe()));
        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let result = match run {
                MutationRun::Add(draft) => sync.add(draft).await,
                MutationRun::Update(station) => sync.update(station).await,
                MutationRun::Delete(id) => sync.delete(id).await,
            };
            let _ = tx
                .send(AppMessage::MutationDone {
                    mutation,
                    spinner,
                    result,
                })
                .await;
        });
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns true when the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(ev) => {
                self.handle_event(ev);
            }
            AppMessage::StationsLoaded(Ok(stations)) => {
                let cmds = self.state.radio.load_stations(stations);
                self.state.load_error = None;
                self.submit_audio(cmds);
            }
            AppMessage::StationsLoaded(Err(e)) => {
                self.state.radio.loaded = true;
                self.state.load_error = Some(e.clone());
                self.toast.error(format!("could not load stations: {}", e));
            }
            AppMessage::MutationDone {
                mutation,
                spinner,
                result,
            } => {
                let outcome = MutationOutcome::of(&mutation, &result);
                match result {
                    Ok(stations) => {
                        let cmds = self.state.radio.load_stations(stations);
                        self.state.load_error = None;
                        self.submit_audio(cmds);
                    }
                    // Stale list stays up; `r` retries the fetch.
                    Err(e) if e.write_landed() => self.state.load_error = Some(e.to_string()),
                    Err(_) => {}
                }
                self.toast
                    .resolve_spinner(spinner, outcome.severity, outcome.message);
                if let Overlay::StationForm(form) = &mut self.overlay {
                    match outcome.form_error {
                        Some(e) => form.set_error(e),
                        None => self.close_overlay(),
                    }
                }
            }
            AppMessage::LoginResult(Ok(())) => {
                if matches!(self.overlay, Overlay::Login(_)) {
                    self.close_overlay();
                }
                self.toast.success("signed in");
            }
            AppMessage::LoginResult(Err(e)) => match &mut self.overlay {
                Overlay::Login(form) => form.set_error(e),
                _ => self.toast.error(e),
            },
            AppMessage::LogoutResult(Ok(())) => self.toast.info("signed out"),
            AppMessage::LogoutResult(Err(e)) => {
                self.toast
                    .warning(format!("signed out here, server logout failed: {}", e));
            }
            AppMessage::SessionChanged(session) => {
                self.state.session = session;
                if !self.state.is_admin() && self.overlay.is_admin_only() {
                    self.close_overlay();
                }
                self.restart_presence();
            }
            AppMessage::OnlineCount(n) => self.state.online_count = n,
            AppMessage::VisitCount(n) => self.state.visit_count = Some(n),
            AppMessage::Weather(Ok(report)) => {
                self.state.weather = WeatherLine::Ready(report.summary());
            }
            AppMessage::Weather(Err(reason)) => {
                self.state.weather = WeatherLine::Unavailable(reason);
            }
            AppMessage::Mpv(ev) => return self.handle_mpv_event(ev),
            AppMessage::AudioFailed(e) => {
                self.state.radio.playback.playback_failed();
                self.sync_listening();
                self.toast.error(format!("audio error: {}", e));
            }
        }
        true
    }

    fn handle_mpv_event(&mut self, ev: MpvEvent) -> bool {
        if ev.is_playback_error() {
            let name = self
                .state
                .radio
                .current_station()
                .map(|s| s.name.clone())
                .unwrap_or_default();
            warn!("mpv: playback error for {:?}", name);
            self.state.radio.playback.playback_failed();
            self.state.buffering = false;
            self.sync_listening();
            self.toast.error(format!("could not play {}", name));
            return true;
        }
        match ev.as_property_change() {
            Some((OBS_CORE_IDLE, data)) => {
                let idle = data.as_bool().unwrap_or(false);
                let buffering = idle && self.state.radio.selection().is_playing;
                let changed = buffering != self.state.buffering;
                self.state.buffering = buffering;
                changed
            }
            Some((OBS_PAUSE, data)) => {
                debug!("mpv: pause -> {}", data);
                false
            }
            _ => false,
        }
    }

    fn handle_event(&mut self, ev: Event) {
        match ev {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.dispatch(vec![Action::Quit]);
            return;
        }

        if let Some(overlay) = self.overlay.component() {
            let actions = overlay.handle_key(key, &self.state);
            self.dispatch(actions);
            return;
        }

        if self.station_list.filter_input.is_active() {
            let actions = self.station_list.handle_key(key, &self.state);
            self.dispatch(actions);
            return;
        }

        if let Some(action) = global_action(key.code, self.state.is_admin()) {
            self.dispatch(vec![action]);
            return;
        }

        let actions = match self.focus.current() {
            Some(ComponentId::NowPlaying) => self.now_playing.handle_key(key, &self.state),
            _ => self.station_list.handle_key(key, &self.state),
        };
        self.dispatch(actions);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.overlay.is_open() {
            return;
        }
        let hit = |r: Rect| {
            mouse.column >= r.x
                && mouse.column < r.x + r.width
                && mouse.row >= r.y
                && mouse.row < r.y + r.height
        };
        let actions = if hit(self.pane_areas.stations) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.focus.set(ComponentId::StationList);
            }
            self.station_list
                .handle_mouse(mouse, self.pane_areas.stations, &self.state)
        } else if hit(self.pane_areas.now_playing) {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.focus.set(ComponentId::NowPlaying);
            }
            self.now_playing
                .handle_mouse(mouse, self.pane_areas.now_playing, &self.state)
        } else {
            vec![]
        };
        self.dispatch(actions);
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn dispatch(&mut self, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            if action.needs_admin() && !self.state.is_admin() {
                self.toast.warning("sign in as admin first (L)");
                continue;
            }
            self.apply(&action);
            queue.extend(self.station_list.on_action(&action, &self.state));
            queue.extend(self.now_playing.on_action(&action, &self.state));
            queue.extend(self.ticker.on_action(&action, &self.state));
        }
        self.sync_listening();
    }

    fn apply(&mut self, action: &Action) {
        match action {
            // ── Playback ─────────────────────────────────────────────────────
            Action::Select(id) => {
                let cmds = self.state.radio.select(*id);
                self.submit_audio(cmds);
            }
            Action::TogglePause => {
                let cmds = self.state.radio.toggle_pause();
                self.submit_audio(cmds);
            }
            Action::Stop => {
                let cmds = self.state.radio.stop();
                self.state.buffering = false;
                self.submit_audio(cmds);
            }
            Action::Next => {
                let cmds = self.state.radio.next();
                self.submit_audio(cmds);
            }
            Action::Prev => {
                let cmds = self.state.radio.previous();
                self.submit_audio(cmds);
            }
            Action::Volume(delta) => {
                let cmds = self.state.radio.playback.adjust_volume(*delta);
                self.submit_audio(cmds);
            }
            Action::Mute => {
                let cmds = self.state.radio.playback.toggle_mute();
                self.submit_audio(cmds);
            }

            // ── Navigation ───────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPane(id) => self.focus.set(*id),

            // ── Station list ─────────────────────────────────────────────────
            Action::OpenFilter => {
                self.focus.set(ComponentId::StationList);
                self.state.input_mode = InputMode::Filter;
            }
            Action::CloseFilter => {
                self.station_list.filter_input.deactivate();
                self.state.input_mode = InputMode::Normal;
            }
            Action::FilterChanged(q) => self.state.radio.set_query(q),
            Action::ToggleSort => self.state.radio.toggle_sort(),
            Action::MoveStation { active, over } => self.state.radio.reorder(*active, *over),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── Admin ────────────────────────────────────────────────────────
            Action::OpenAddForm => self.open_overlay(Overlay::StationForm(StationForm::add())),
            Action::OpenEditForm(id) => {
                if let Some(station) = self.state.radio.store.get(*id) {
                    let form = StationForm::edit(station);
                    self.open_overlay(Overlay::StationForm(form));
                }
            }
            Action::SubmitStation { editing, draft } => match editing {
                Some(station) => {
                    let updated = draft.apply_to(station);
                    self.spawn_mutation(
                        Mutation::Update(updated.name.clone()),
                        MutationRun::Update(updated),
                    );
                }
                None => self.spawn_mutation(
                    Mutation::Add(draft.name.clone()),
                    MutationRun::Add(draft.clone()),
                ),
            },
            Action::RequestDelete(id) => {
                if let Some(station) = self.state.radio.store.get(*id) {
                    let dialog = ConfirmDelete::new(station);
                    self.open_overlay(Overlay::Confirm(dialog));
                }
            }
            Action::ConfirmDelete(id) => {
                self.spawn_mutation(Mutation::Delete(*id), MutationRun::Delete(*id));
            }
            Action::OpenSettings => {
                let sheet = SettingsSheet::new(&self.state.settings);
                self.open_overlay(Overlay::Settings(sheet));
            }
            Action::SaveSettings(settings) => {
                let saved = self.settings_store.save(settings.clone());
                self.state.settings = self.settings_store.current().clone();
                match saved {
                    Ok(()) => self.toast.success("settings saved"),
                    Err(e) => {
                        error!("settings save failed: {}", e);
                        self.toast
                            .warning(format!("applied, but not written to disk: {}", e));
                    }
                }
            }

            // ── Session ──────────────────────────────────────────────────────
            Action::OpenLogin => {
                if self.backend.is_none() {
                    self.toast.error("backend not configured");
                } else if !self.state.is_admin() {
                    self.open_overlay(Overlay::Login(LoginForm::new()));
                }
            }
            Action::SubmitLogin { email, password } => {
                let Some(backend) = &self.backend else {
                    return;
                };
                let gate = backend.gate.clone();
                let tx = self.msg_tx.clone();
                let (email, password) = (email.clone(), password.clone());
                tokio::spawn(async move {
                    let result = gate
                        .sign_in(&email, &password)
                        .await
                        .map_err(|e| e.message());
                    let _ = tx.send(AppMessage::LoginResult(result)).await;
                });
            }
            Action::Logout => {
                let Some(backend) = &self.backend else {
                    return;
                };
                let gate = backend.gate.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = gate.sign_out().await.map_err(|e| e.message());
                    let _ = tx.send(AppMessage::LogoutResult(result)).await;
                });
            }

            // ── Application ──────────────────────────────────────────────────
            Action::ToggleHelp => {
                if matches!(self.overlay, Overlay::Help(_)) {
                    self.close_overlay();
                } else {
                    self.open_overlay(Overlay::Help(HelpOverlay));
                }
            }
            Action::CloseOverlay => self.close_overlay(),
            Action::Reload => {
                if self.backend.is_some() {
                    self.toast.info("reloading stations");
                    self.spawn_load();
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn open_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
        self.state.input_mode = match self.overlay {
            Overlay::Help(_) => InputMode::Normal,
            _ => InputMode::Form,
        };
    }

    fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
        self.state.input_mode = if self.station_list.filter_input.is_active() {
            InputMode::Filter
        } else {
            InputMode::Normal
        };
    }

    fn submit_audio(&mut self, cmds: Vec<AudioCommand>) {
        if cmds.iter().any(|c| matches!(c, AudioCommand::Load { .. })) {
            self.state.buffering = false;
        }
        match &self.audio {
            Some(audio) => audio.submit(cmds),
            None if cmds.iter().any(|c| matches!(c, AudioCommand::Load { .. })) => {
                self.state.radio.playback.playback_failed();
                self.toast.error("audio unavailable: mpv is not running");
            }
            None => {}
        }
    }

    /// Presence carries whether this client is currently playing.
    fn sync_listening(&self) {
        let playing = self.state.radio.selection().is_playing;
        self.listening_tx.send_if_modified(|v| {
            if *v != playing {
                *v = playing;
                true
            } else {
                false
            }
        });
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let (bg, _) = backdrop(&self.state.settings);
        frame.render_widget(Block::default().style(Style::default().bg(bg)), area);

        let ticker_h = if self.state.settings.running_text.show {
            1u16
        } else {
            0
        };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(ticker_h),
                Constraint::Length(1),
            ])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(outer[0]);
        self.pane_areas.stations = body[0];
        self.pane_areas.now_playing = body[1];

        let list_focused = !self.overlay.is_open() && self.focus.is_focused(ComponentId::StationList);
        let np_focused = !self.overlay.is_open() && self.focus.is_focused(ComponentId::NowPlaying);
        self.station_list.draw(frame, body[0], list_focused, &self.state);
        self.now_playing.draw(frame, body[1], np_focused, &self.state);

        if ticker_h > 0 {
            self.ticker.draw(frame, outer[1], false, &self.state);
        }

        status_bar::draw_keys_bar(
            frame,
            outer[2],
            self.state.input_mode,
            self.state.user_email(),
        );

        if let Some(overlay) = self.overlay.component() {
            overlay.draw(frame, area, true, &self.state);
        }

        self.toast.draw(frame, area);
    }
}

/// Keys that work in both panes.  Admin-only keys are left unmapped for
/// guests so they fall through to the focused pane.
fn global_action(code: KeyCode, admin: bool) -> Option<Action> {
    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Tab => Some(Action::FocusNext),
        KeyCode::Char('1') => Some(Action::FocusPane(ComponentId::StationList)),
        KeyCode::Char('2') => Some(Action::FocusPane(ComponentId::NowPlaying)),
        KeyCode::Char('n') => Some(Action::Next),
        KeyCode::Char('p') => Some(Action::Prev),
        KeyCode::Char('x') => Some(Action::Stop),
        KeyCode::Char('m') => Some(Action::Mute),
        KeyCode::Left | KeyCode::Char('-') => Some(Action::Volume(-VOLUME_STEP)),
        KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(Action::Volume(VOLUME_STEP))
        }
        KeyCode::Char('L') if admin => Some(Action::Logout),
        KeyCode::Char('L') => Some(Action::OpenLogin),
        KeyCode::Char('S') if admin => Some(Action::OpenSettings),
        KeyCode::Char('r') => Some(Action::Reload),
        _ => None,
    }
}

/// What a spawned mutation sends to the backend.
enum MutationRun {
    Add(StationDraft),
    Update(Station),
    Delete(StationId),
}

/// How a finished mutation is reported.  `form_error` keeps the station form
/// open; it is only set when the write itself was rejected.
#[derive(Debug)]
struct MutationOutcome {
    severity: Severity,
    message: String,
    form_error: Option<String>,
}

impl MutationOutcome {
    fn of(mutation: &Mutation, result: &Result<Vec<Station>, SyncError>) -> Self {
        match result {
            Ok(_) => Self {
                severity: Severity::Success,
                message: mutation.past_tense(),
                form_error: None,
            },
            Err(SyncError::Refetch(cause)) => Self {
                severity: Severity::Warning,
                message: format!(
                    "{}, but the list could not be refreshed: {} (r to reload)",
                    mutation.past_tense(),
                    cause
                ),
                form_error: None,
            },
            Err(e) => Self {
                severity: Severity::Error,
                message: format!("could not {}: {}", mutation.describe(), e),
                form_error: Some(e.to_string()),
            },
        }
    }
}
