use crate::model::{Settings, UNNAMED_PLAYLIST};
use crate::navigation::SearchOutcome;
use crate::player::Player;
use crate::registry::Step;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{Stdout, stdout};
use std::time::Duration;
use tracing::{debug, info};

const MAX_INPUT_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Redraw,
    Save,
    MoveUp,
    MoveDown,
    SeekBack,
    SeekForward,
    TogglePause,
    CycleMode,
    Next,
    Prev,
    Search,
    SearchNext,
    SearchPrev,
    VolumeDown,
    VolumeUp,
    Mute,
    Enqueue,
    Locate,
    Delete,
    Play,
    SwitchTo(usize),
    CursorForward,
    CursorBack,
    PagePrev,
    PageNext,
}

pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Char('l') => Some(Command::Redraw),
            KeyCode::Char('s') => Some(Command::Save),
            _ => None,
        };
    }

    let command = match key.code {
        KeyCode::Char('q' | 'Q') => Command::Quit,
        KeyCode::Char('k') | KeyCode::Up => Command::MoveUp,
        KeyCode::Char('j') | KeyCode::Down => Command::MoveDown,
        KeyCode::Char('h') | KeyCode::Left => Command::SeekBack,
        KeyCode::Char('l') | KeyCode::Right => Command::SeekForward,
        KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Char('a') => Command::CycleMode,
        KeyCode::Char('L' | '.' | '>') => Command::Next,
        KeyCode::Char('H' | ',' | '<') => Command::Prev,
        KeyCode::Char('/') => Command::Search,
        KeyCode::Char('n') => Command::SearchNext,
        KeyCode::Char('N') => Command::SearchPrev,
        KeyCode::Char('-' | '_') => Command::VolumeDown,
        KeyCode::Char('=' | '+') => Command::VolumeUp,
        KeyCode::Char('m') => Command::Mute,
        KeyCode::Char('e') => Command::Enqueue,
        KeyCode::Char('c') => Command::Locate,
        KeyCode::Char('d' | 'D') => Command::Delete,
        KeyCode::Enter => Command::Play,
        KeyCode::Char(digit @ '1'..='9') => Command::SwitchTo(digit as usize - '1' as usize),
        KeyCode::Tab => Command::CursorForward,
        KeyCode::BackTab => Command::CursorBack,
        KeyCode::Char('[') => Command::PagePrev,
        KeyCode::Char(']') => Command::PageNext,
        _ => return None,
    };
    Some(command)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPurpose {
    SaveName,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPurpose {
    SaveUnnamed(String),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Input {
        purpose: InputPurpose,
        message: &'static str,
        buffer: String,
    },
    Confirm {
        purpose: ConfirmPurpose,
        message: String,
    },
}

impl Overlay {
    fn input(purpose: InputPurpose, autofill: &str) -> Self {
        let message = match purpose {
            InputPurpose::SaveName => "Enter Playlist Name:",
            InputPurpose::Search => "Enter Query (RegEx Supported):",
        };
        Self::Input {
            purpose,
            message,
            buffer: autofill.chars().take(MAX_INPUT_LEN).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    player: Player,
    overlay: Option<Overlay>,
    resize_pending: bool,
}

impl App {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            overlay: None,
            resize_pending: true,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn request_resize(&mut self) {
        self.resize_pending = true;
    }

    pub fn take_resize(&mut self) -> bool {
        std::mem::take(&mut self.resize_pending)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        if self.overlay.is_some() {
            self.handle_overlay_key(key)?;
            return Ok(Flow::Continue);
        }
        match command_for_key(key) {
            Some(command) => self.dispatch(command),
            None => Ok(Flow::Continue),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Flow> {
        let seek_step = i64::from(self.player.settings().seek_step_seconds);
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Redraw => self.request_resize(),
            Command::Save => {
                if let Some(session) = self.player.registry().active() {
                    self.overlay = Some(Overlay::input(InputPurpose::SaveName, session.name()));
                }
            }
            Command::MoveUp => self.player.move_selection(-1),
            Command::MoveDown => self.player.move_selection(1),
            Command::SeekBack => self.player.seek(-seek_step),
            Command::SeekForward => self.player.seek(seek_step),
            Command::TogglePause => self.player.toggle_pause(),
            Command::CycleMode => self.player.toggle_advance_mode()?,
            Command::Next => self.player.next_song(),
            Command::Prev => self.player.prev_song()?,
            Command::Search => self.open_search(),
            Command::SearchNext => {
                if self.player.search_next() == SearchOutcome::NoPattern {
                    self.open_search();
                }
            }
            Command::SearchPrev => {
                if self.player.search_prev() == SearchOutcome::NoPattern {
                    self.open_search();
                }
            }
            Command::VolumeDown => self.player.volume_down(),
            Command::VolumeUp => self.player.volume_up(),
            Command::Mute => self.player.toggle_mute(),
            Command::Enqueue => self.player.enqueue_selected(),
            Command::Locate => self.player.reset_view(),
            Command::Delete => {
                if let Some(session) = self.player.registry().active() {
                    self.overlay = Some(Overlay::Confirm {
                        purpose: ConfirmPurpose::Delete,
                        message: format!("Delete playlist `{}`?", session.name()),
                    });
                }
            }
            Command::Play => self.player.play_selected()?,
            Command::SwitchTo(slot) => {
                self.player.switch_to(slot);
            }
            Command::CursorForward => {
                self.player.move_cursor(Step::Forward);
            }
            Command::CursorBack => {
                self.player.move_cursor(Step::Back);
            }
            Command::PagePrev => {
                self.player.paginate(Step::Back);
            }
            Command::PageNext => {
                self.player.paginate(Step::Forward);
            }
        }
        Ok(Flow::Continue)
    }

    fn open_search(&mut self) {
        if self.player.registry().active().is_some() {
            self.overlay = Some(Overlay::input(InputPurpose::Search, ""));
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(overlay) = self.overlay.take() else {
            return Ok(());
        };
        let cancel = key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'));

        match overlay {
            Overlay::Input { .. } if cancel => debug!("prompt cancelled"),
            Overlay::Input {
                purpose,
                message,
                mut buffer,
            } => match key.code {
                KeyCode::Enter => self.submit_input(purpose, buffer),
                KeyCode::Backspace => {
                    buffer.pop();
                    self.overlay = Some(Overlay::Input {
                        purpose,
                        message,
                        buffer,
                    });
                }
                KeyCode::Char(ch) if !ch.is_control() => {
                    if buffer.chars().count() < MAX_INPUT_LEN {
                        buffer.push(ch);
                    }
                    self.overlay = Some(Overlay::Input {
                        purpose,
                        message,
                        buffer,
                    });
                }
                _ => {
                    self.overlay = Some(Overlay::Input {
                        purpose,
                        message,
                        buffer,
                    })
                }
            },
            Overlay::Confirm { purpose, message } => match key.code {
                KeyCode::Char('y' | 'Y') => self.confirm(purpose, true),
                KeyCode::Char('n' | 'N') => self.confirm(purpose, false),
                _ if cancel => self.confirm(purpose, false),
                _ => self.overlay = Some(Overlay::Confirm { purpose, message }),
            },
        }
        Ok(())
    }

    fn submit_input(&mut self, purpose: InputPurpose, buffer: String) {
        match purpose {
            InputPurpose::Search => {
                self.player.search(&buffer);
            }
            InputPurpose::SaveName => {
                let name = buffer.trim();
                if name.is_empty() {
                    self.player.save_active(name);
                    self.overlay = Some(Overlay::input(InputPurpose::SaveName, ""));
                } else if name == UNNAMED_PLAYLIST {
                    self.overlay = Some(Overlay::Confirm {
                        purpose: ConfirmPurpose::SaveUnnamed(name.to_string()),
                        message: format!("Name is set to `{UNNAMED_PLAYLIST}`, continue?"),
                    });
                } else {
                    self.player.save_active(name);
                }
            }
        }
    }

    fn confirm(&mut self, purpose: ConfirmPurpose, accepted: bool) {
        match (purpose, accepted) {
            (ConfirmPurpose::SaveUnnamed(name), true) => {
                self.player.save_active(&name);
            }
            (ConfirmPurpose::SaveUnnamed(name), false) => {
                self.overlay = Some(Overlay::input(InputPurpose::SaveName, &name));
            }
            (ConfirmPurpose::Delete, true) => {
                self.player.delete_active();
            }
            (ConfirmPurpose::Delete, false) => debug!("delete declined"),
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        self.player.service_audio()
    }

    pub fn shutdown(mut self) -> Settings {
        self.player.shutdown()
    }
}

type Term = Terminal<CrosstermBackend<Stdout>>;

pub fn run(mut app: App) -> Result<Settings> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut out = stdout();
    if let Err(err) = execute!(out, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err).context("failed to enter alternate screen");
    }
    let mut terminal = match Terminal::new(CrosstermBackend::new(out)) {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            let _ = execute!(stdout(), LeaveAlternateScreen);
            return Err(err).context("failed to initialise terminal");
        }
    };

    info!("terminal ui started");
    let result = event_loop(&mut app, &mut terminal);
    let restored = restore_terminal(&mut terminal);
    let settings = app.shutdown();
    result?;
    restored?;
    info!("terminal ui stopped");
    Ok(settings)
}

fn event_loop(app: &mut App, terminal: &mut Term) -> Result<()> {
    let timeout = Duration::from_millis(app.player().settings().input_timeout_ms.max(1));
    loop {
        if app.take_resize() {
            terminal.autoresize()?;
            terminal.clear()?;
            let rows = crate::ui::song_list_rows(terminal.get_frame().area());
            app.player_mut().resize(rows);
        }

        app.tick()?;

        terminal.draw(|frame| crate::ui::draw(frame, app.player(), app.overlay()))?;

        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            Event::Resize(..) => app.request_resize(),
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key)? == Flow::Quit {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
