//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Strategy selection
//! - Background evaluation via worker thread

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{HeuristicScorer, HttpPredictor};
use crate::application::AssessmentService;
use crate::config::Settings;
use crate::domain::{ClinicalObservation, Coding, Strategy};

use super::ui::{
    form::{render_form, FormState},
    render_disclaimer,
    result::{render_result, ResultState},
};
use super::worker::{EvaluationProgress, EvaluationWorker, EvaluationWorkerHandle};

/// Progress the cosmetic gauge approaches but never reaches while waiting
const PROGRESS_TARGET: f64 = 0.95;
/// Time constant of the progress curve, in seconds
const PROGRESS_TAU: f64 = 1.5;

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Evaluating,
    Result,
}

/// Main application state
pub struct App {
    screen: Screen,

    should_quit: bool,

    /// Strategy used for the next submission
    strategy: Strategy,

    local_service: AssessmentService<HeuristicScorer>,

    remote_service: AssessmentService<HttpPredictor>,

    /// Shown in the form header when the remote strategy is selected
    remote_endpoint: String,

    form_state: FormState,

    result_state: ResultState,

    /// Pending evaluation worker (if running)
    pending_worker: Option<EvaluationWorkerHandle>,

    /// When the pending evaluation started (for UI animation)
    evaluation_started_at: Option<Instant>,
}

impl App {
    /// Create a new application from settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self> {
        let predictor = HttpPredictor::from_settings(settings)
            .map_err(|e| anyhow!("Failed to initialize prediction client: {}", e))?;
        let remote_endpoint = predictor.endpoint();

        Ok(Self::with_dependencies(
            AssessmentService::new(Arc::new(HeuristicScorer::new())),
            AssessmentService::new(Arc::new(predictor)),
            remote_endpoint,
            settings.strategy,
        ))
    }

    /// Create application with injected services.
    #[must_use]
    pub fn with_dependencies(
        local_service: AssessmentService<HeuristicScorer>,
        remote_service: AssessmentService<HttpPredictor>,
        remote_endpoint: String,
        strategy: Strategy,
    ) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            strategy,
            local_service,
            remote_service,
            remote_endpoint,
            form_state: FormState::default(),
            result_state: ResultState::default(),
            pending_worker: None,
            evaluation_started_at: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
                let _ = disable_raw_mode();
                return Err(e.into());
            }
        };

        let result = self.main_loop(&mut terminal);

        // Entered values do not outlive the session, whatever happens below.
        self.form_state.clear_sensitive();
        let restored = restore_terminal(&mut terminal);

        result?;
        restored?;
        Ok(())
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();
            self.tick_progress();

            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(area);

                match self.screen {
                    Screen::Form => render_form(
                        f,
                        chunks[0],
                        &self.form_state,
                        self.strategy,
                        &self.remote_endpoint,
                    ),
                    Screen::Evaluating | Screen::Result => {
                        render_result(f, chunks[0], &self.result_state)
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            // Short poll to stay responsive
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Poll the background worker for progress updates.
    fn poll_worker(&mut self) {
        while let Some(progress) = self
            .pending_worker
            .as_ref()
            .and_then(EvaluationWorkerHandle::try_recv)
        {
            match progress {
                EvaluationProgress::Started(strategy) => {
                    tracing::debug!("Worker started {} evaluation", strategy);
                }
                EvaluationProgress::Complete(report) => {
                    self.result_state = ResultState::Complete { report };
                    self.finish_evaluation();
                    break;
                }
                EvaluationProgress::Error(message) => {
                    self.result_state = ResultState::Failed { message };
                    self.finish_evaluation();
                    break;
                }
            }
        }
    }

    fn finish_evaluation(&mut self) {
        self.pending_worker = None;
        self.evaluation_started_at = None;
        self.screen = Screen::Result;
    }

    fn tick_progress(&mut self) {
        let Some(started_at) = self.evaluation_started_at else {
            return;
        };
        let ResultState::Evaluating { strategy, progress } = self.result_state else {
            return;
        };

        let elapsed = started_at.elapsed().as_secs_f64();
        let desired = PROGRESS_TARGET * (1.0 - (-elapsed / PROGRESS_TAU).exp());

        self.result_state = ResultState::Evaluating {
            strategy,
            progress: desired.max(progress).min(PROGRESS_TARGET),
        };
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Evaluating => {}
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.form_state.next_field();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.form_state.load_sample_data();
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.strategy = self.strategy.toggled();
                tracing::info!("Strategy switched to {}", self.strategy);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset();
            }
            KeyCode::Char(c) => {
                self.form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.form_state.delete_char();
            }
            KeyCode::Delete => {
                self.form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_form();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Complete { .. } => match key {
                KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.reset();
                }
                KeyCode::Esc | KeyCode::Enter => {
                    self.screen = Screen::Form;
                }
                _ => {}
            },
            ResultState::Failed { .. } | ResultState::Idle => {
                if matches!(key, KeyCode::Enter | KeyCode::Esc) {
                    self.result_state = ResultState::Idle;
                    self.screen = Screen::Form;
                }
            }
            ResultState::Evaluating { .. } => {}
        }
    }

    /// Clear every entered value and any result, back to an empty form.
    fn reset(&mut self) {
        self.form_state.clear_sensitive();
        self.result_state = ResultState::Idle;
        self.screen = Screen::Form;
    }

    fn submit_form(&mut self) {
        // One evaluation at a time.
        if self.pending_worker.is_some() {
            return;
        }

        let input = match self.form_state.to_input() {
            Ok(input) => input,
            Err(errors) => {
                self.form_state.apply_errors(&errors);
                return;
            }
        };

        // Form hints are Cleveland codes; the remote adapter re-encodes for the wire.
        let observation = match ClinicalObservation::from_input(&input, Coding::Cleveland) {
            Ok(observation) => observation,
            Err(errors) => {
                tracing::debug!("Form rejected: {} invalid field(s)", errors.len());
                self.form_state.apply_errors(&errors);
                return;
            }
        };

        let worker = match self.strategy {
            Strategy::Local => EvaluationWorker::spawn(self.local_service.clone(), observation),
            Strategy::Remote => EvaluationWorker::spawn(self.remote_service.clone(), observation),
        };

        self.pending_worker = Some(worker);
        self.evaluation_started_at = Some(Instant::now());
        self.result_state = ResultState::Evaluating {
            strategy: self.strategy,
            progress: 0.0,
        };
        self.screen = Screen::Evaluating;
    }
}

/// Attempt every restore step, then report the first failure.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    first_error([
        disable_raw_mode(),
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        ),
        terminal.show_cursor(),
    ])
}

fn first_error<const N: usize>(steps: [io::Result<()>; N]) -> io::Result<()> {
    steps.into_iter().collect()
}
