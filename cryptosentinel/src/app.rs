//! Application state for the TUI.
//!
//! The [`Session`] decides what is allowed; this module maps keys onto session
//! operations and runs each service call on a worker thread, feeding the
//! outcome back through a channel that the main loop drains every tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cryptosentinel_core::{
    present, AnalysisPayload, Decision, DecisionReply, FollowupReply, Outcome, Phase,
    SentinelService, Session, SummaryView,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Messages cycled on the loading screen.
pub const LOADER_MESSAGES: [&str; 4] = [
    "Searching data...",
    "Our agents are at work...",
    "Analyzing market trends...",
    "Gathering intelligence...",
];

/// How long each loader message stays up.
const LOADER_MESSAGE_PERIOD: Duration = Duration::from_secs(3);

/// Completion of a call issued from a worker thread.
#[derive(Debug)]
pub enum ServiceEvent {
    Analysis(Outcome<AnalysisPayload>),
    Decision(Outcome<DecisionReply>),
    Followup(Outcome<FollowupReply>),
}

/// Main application state.
pub struct App {
    /// Workflow state
    pub session: Session,
    /// Remote service shared with worker threads
    service: Arc<dyn SentinelService>,
    events_tx: UnboundedSender<ServiceEvent>,
    events_rx: UnboundedReceiver<ServiceEvent>,
    /// Address being typed on the input screen
    pub input: String,
    /// Follow-up question being typed, when the prompt is open
    pub followup_input: Option<String>,
    /// View model of the current analysis
    pub summary: Option<SummaryView>,
    /// Last rejected action, shown in the footer until the next key press
    pub notice: Option<String>,
    /// When the current busy phase started
    pub busy_since: Option<Instant>,
    /// Animation frame counter (increments each tick)
    pub animation_frame: u64,
    /// Scroll offset for the summary view
    pub scroll_offset: u16,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    pub fn new(service: Arc<dyn SentinelService>) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            session: Session::new(),
            service,
            events_tx,
            events_rx,
            input: String::new(),
            followup_input: None,
            summary: None,
            notice: None,
            busy_since: None,
            animation_frame: 0,
            scroll_offset: 0,
            should_quit: false,
        }
    }

    /// Advance animations by one tick.
    pub fn tick(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Message for the loading screen, rotating every few seconds.
    pub fn loader_message(&self) -> &'static str {
        let elapsed = self.busy_since.map(|t| t.elapsed()).unwrap_or_default();
        loader_message_at(elapsed)
    }

    // ========== Service calls ==========

    fn submit(&mut self) {
        match self.session.begin_analysis(&self.input) {
            Ok(request) => {
                self.summary = None;
                self.scroll_offset = 0;
                self.busy_since = Some(Instant::now());
                self.spawn_call(move |service| {
                    ServiceEvent::Analysis(Outcome::from(service.analyze(&request)))
                });
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn decide(&mut self, decision: Decision) {
        match self.session.begin_decision(decision) {
            Ok(call) => {
                self.busy_since = Some(Instant::now());
                self.spawn_call(move |service| {
                    ServiceEvent::Decision(Outcome::from(call.dispatch(service)))
                });
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    fn send_followup(&mut self, question: String) {
        match self.session.begin_followup(&question) {
            Ok(request) => {
                self.spawn_call(move |service| {
                    ServiceEvent::Followup(Outcome::from(service.followup(&request)))
                });
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Run `call` on a worker thread and post its event back to the UI loop.
    fn spawn_call<F>(&self, call: F)
    where
        F: FnOnce(&dyn SentinelService) -> ServiceEvent + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let event = call(service.as_ref());
            if tx.send(event).is_err() {
                tracing::debug!("UI closed before service call completed");
            }
        });
    }

    /// Apply every completed call. Returns true if anything changed.
    pub fn poll_service_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            changed = true;
        }
        changed
    }

    fn apply_event(&mut self, event: ServiceEvent) {
        let result = match event {
            ServiceEvent::Analysis(outcome) => {
                let result = self.session.finish_analysis(outcome);
                self.summary = self.session.analysis().map(present);
                result
            }
            ServiceEvent::Decision(outcome) => self.session.finish_decision(outcome),
            ServiceEvent::Followup(outcome) => self.session.finish_followup(outcome),
        };
        if !self.session.phase().is_busy() {
            self.busy_since = None;
        }
        if let Err(e) = result {
            tracing::error!(error = %e, "Dropped service event");
        }
    }

    /// Discard the session and start over with a fresh token.
    fn reload(&mut self) {
        tracing::info!(old_session = %self.session.token(), "Reloading session");
        self.session = Session::new();
        self.input.clear();
        self.followup_input = None;
        self.summary = None;
        self.busy_since = None;
        self.scroll_offset = 0;
    }

    // ========== Key handling ==========

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        self.notice = None;

        match self.session.phase() {
            Phase::Input => self.handle_input_key(key),
            Phase::AnalysisFailed => self.handle_failed_key(key),
            Phase::Loading | Phase::ProcessingDecision => self.handle_busy_key(key),
            Phase::Summary => {
                if self.followup_input.is_some() {
                    self.handle_followup_key(key)
                } else {
                    self.handle_summary_key(key)
                }
            }
            Phase::Result => self.handle_result_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    /// After a failed analysis the address is kept, so Enter retries it.
    fn handle_failed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn handle_busy_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            self.should_quit = true;
        }
    }

    fn handle_summary_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('y') | KeyCode::Char('Y') => self.decide(Decision::Yes),
            KeyCode::Char('n') | KeyCode::Char('N') => self.decide(Decision::No),
            KeyCode::Char('f') => {
                if self.session.is_busy() {
                    self.notice = Some("A follow-up question is already in flight".to_string());
                } else {
                    self.followup_input = Some(String::new());
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = 0,
            _ => {}
        }
    }

    fn handle_followup_key(&mut self, key: KeyEvent) {
        let Some(buffer) = self.followup_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.followup_input = None,
            KeyCode::Enter => {
                if let Some(question) = self.followup_input.take() {
                    self.send_followup(question);
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Enter => self.reload(),
            _ => {}
        }
    }
}

/// Loader message for a given time spent loading.
pub fn loader_message_at(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_secs() / LOADER_MESSAGE_PERIOD.as_secs()) as usize % LOADER_MESSAGES.len();
    LOADER_MESSAGES[index]
}
