use std::sync::Arc;

use color_eyre::Result;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::command::CommandDispatcher;
use crate::config::ClientConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::log_info;
use crate::mode::ModeGate;
use crate::poll::PollSupervisor;
use crate::reconcile::{FieldUpdate, Reconciler};
use crate::transport::{DeviceTransport, HttpTransport};
use crate::ui::{self, TuiPresenter};

/// Application.
pub struct App {
    /// Is the application running?
    running: bool,
    transport: Arc<dyn DeviceTransport>,
    gate: ModeGate,
    dispatcher: CommandDispatcher,
    presenter: TuiPresenter,
    supervisor: PollSupervisor,
    updates: mpsc::UnboundedSender<FieldUpdate>,
    /// Event handler.
    events: EventHandler,
}

impl App {
    /// Constructs a new instance of [`App`]: wires the transport, mode gate,
    /// reconciler and poll loops, and performs the startup mode sync.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let transport: Arc<dyn DeviceTransport> = Arc::new(HttpTransport::new(
            &config.base_url,
            config.request_timeout(),
        )?);
        log_info!("mirroring bridge controller at {}", config.base_url);

        let gate = ModeGate::new();
        // Startup sync; an unreachable device leaves the gate in Automatic.
        let mode = gate.sync_from_device(transport.as_ref()).await;
        // Re-assert the resolved mode so client and device agree from the
        // first frame.
        gate.request_change(mode, transport.clone());

        let presenter = TuiPresenter::default();
        let (updates, updates_rx) = mpsc::unbounded_channel();
        Reconciler::new(Arc::new(presenter.clone())).run(updates_rx);
        let _ = updates.send(FieldUpdate::Mode(mode));

        let dispatcher =
            CommandDispatcher::new(gate.clone(), transport.clone(), updates.clone());
        let supervisor = PollSupervisor::spawn(transport.clone(), updates.clone(), &config);

        Ok(Self {
            running: true,
            transport,
            gate,
            dispatcher,
            presenter,
            supervisor,
            updates,
            events: EventHandler::new(),
        })
    }

    /// Run the application's main loop until quit, then cancel every poll
    /// loop so none outlives the terminal session.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while self.running {
            let fields = self.presenter.snapshot();
            terminal.draw(|frame| ui::render_mirror(&fields, frame.area(), frame.buffer_mut()))?;

            match self.events.next().await? {
                Event::Tick => {}
                Event::Crossterm(event) => {
                    if let ratatui::crossterm::event::Event::Key(key) = event {
                        self.handle_key(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(app_event),
            }
        }

        self.supervisor.shutdown();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => self.events.send(AppEvent::Quit),
            KeyCode::Char('m') => self.events.send(AppEvent::ToggleMode),
            KeyCode::Char('o') => self.events.send(AppEvent::OpenBridge),
            KeyCode::Char('c') => self.events.send(AppEvent::CloseBridge),
            KeyCode::Char('s') => self.events.send(AppEvent::StopBridge),
            _ => {}
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.running = false,
            AppEvent::ToggleMode => self.toggle_mode(),
            AppEvent::OpenBridge => self.dispatcher.open(),
            AppEvent::CloseBridge => self.dispatcher.close(),
            AppEvent::StopBridge => self.dispatcher.stop(),
        }
    }

    fn toggle_mode(&mut self) {
        let next = self.gate.get().toggled();
        // Cache first: the controls must react before the device confirms.
        self.gate.request_change(next, self.transport.clone());
        let _ = self.updates.send(FieldUpdate::Mode(next));
    }
}
