//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::game::{LevelStatus, Session, SessionConfig};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, FreshFade};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use gemtui::EngineConfig;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Playing,
    LevelComplete,
    GameOver,
    Victory,
}

pub struct App {
    args: Args,
    theme: Theme,
    session: Session,
    screen: Screen,
    paused: bool,
    last_frame: Instant,
    fade: FreshFade,
}

impl App {
    pub fn new(args: Args, theme: Theme) -> Result<Self> {
        let config = SessionConfig {
            engine: EngineConfig {
                width: args.width,
                height: args.height,
                gem_kinds: args.kinds,
                reward: args.reward,
            },
            seed: args.seed.unwrap_or_else(rand::random),
            start_level: args.level,
            time_limit: args.time_limit.map(Duration::from_secs),
        };
        info!(?config, "starting session");
        let session = Session::new(config)?;
        let screen = if args.no_title {
            Screen::Playing
        } else {
            Screen::Start
        };
        Ok(Self {
            args,
            theme,
            session,
            screen,
            paused: false,
            last_frame: Instant::now(),
            fade: FreshFade::default(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);

        // Restore
        terminal.show_cursor()?;
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            let dt = now.saturating_duration_since(self.last_frame);
            self.last_frame = now;

            if self.screen == Screen::Playing && !self.paused {
                self.session.tick(dt);
                self.session
                    .tick_popups(dt.as_millis().min(u128::from(u32::MAX)) as u32);
                self.check_level();
            }

            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.screen,
                    &self.session,
                    &self.theme,
                    self.paused,
                    self.args.no_animation,
                    &mut self.fade,
                    now,
                );
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    // Ignore repeats and releases.
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle(key_to_action(key))? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn check_level(&mut self) {
        match self.session.status() {
            LevelStatus::Running => {}
            LevelStatus::Complete => {
                info!(level = self.session.level, score = self.session.score(), "level complete");
                self.session.roll_bonus();
                self.screen = Screen::LevelComplete;
            }
            LevelStatus::Won => {
                info!(score = self.session.score(), "all levels cleared");
                self.screen = Screen::Victory;
            }
            LevelStatus::Failed => {
                info!(level = self.session.level, score = self.session.score(), "time up");
                self.screen = Screen::GameOver;
            }
        }
    }

    /// Apply one action. Returns true when the app should exit.
    fn handle(&mut self, action: Action) -> Result<bool> {
        if action == Action::Quit {
            return Ok(true);
        }
        match self.screen {
            Screen::Start => {
                if action == Action::Select {
                    self.screen = Screen::Playing;
                }
            }
            Screen::Playing if self.paused => {
                if action == Action::Pause {
                    self.paused = false;
                }
            }
            Screen::Playing => match action {
                Action::Pause => self.paused = true,
                Action::Up => self.session.move_cursor(0, -1),
                Action::Down => self.session.move_cursor(0, 1),
                Action::Left => self.session.move_cursor(-1, 0),
                Action::Right => self.session.move_cursor(1, 0),
                Action::Deselect => self.session.deselect(),
                Action::Select => {
                    if let Some(report) = self.session.select()? {
                        debug!(
                            reverted = report.reverted,
                            points = report.total_points(),
                            removed = report.cells_removed(),
                            "turn played"
                        );
                        self.check_level();
                    }
                }
                Action::Restart | Action::Quit | Action::None => {}
            },
            Screen::LevelComplete => {
                if action == Action::Select {
                    self.session.next_level()?;
                    self.screen = Screen::Playing;
                }
            }
            Screen::GameOver | Screen::Victory => {
                if action == Action::Restart {
                    self.session.restart()?;
                    self.screen = Screen::Playing;
                }
            }
        }
        Ok(false)
    }
}
