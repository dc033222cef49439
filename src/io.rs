use std::io;
use std::io::Stdout;
use std::io::Write;
use std::ops::ControlFlow;
use std::time::Duration;
use std::time::Instant;

use crossterm::cursor;
use crossterm::event;
use crossterm::event::Event as CrossTermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::queue;
use crossterm::style;
use crossterm::terminal;
use tracing::debug;

use crate::camera::Camera;
use crate::events::CameraEvent;
use crate::events::Event;
use crate::grid::Grid;
use crate::simulation::GenerationSink;
use crate::simulation::SinkError;

/// Cells panned per key press
const PAN_STEP: isize = 4;

/// Converts a crossterm event into an application event
pub fn convert_event(event: CrossTermEvent) -> Option<Event> {
    match event {
        CrossTermEvent::Key(KeyEvent {
            kind: KeyEventKind::Release,
            ..
        }) => None,
        CrossTermEvent::Key(key_event) => match key_event {
            KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => Some(Event::Exit),
            KeyEvent {
                code: KeyCode::Char('h') | KeyCode::Left,
                ..
            } => Some(Event::CameraEvent(CameraEvent::MoveLeft)),
            KeyEvent {
                code: KeyCode::Char('j') | KeyCode::Down,
                ..
            } => Some(Event::CameraEvent(CameraEvent::MoveDown)),
            KeyEvent {
                code: KeyCode::Char('k') | KeyCode::Up,
                ..
            } => Some(Event::CameraEvent(CameraEvent::MoveUp)),
            KeyEvent {
                code: KeyCode::Char('l') | KeyCode::Right,
                ..
            } => Some(Event::CameraEvent(CameraEvent::MoveRight)),
            KeyEvent {
                code: KeyCode::Char('0'),
                ..
            } => Some(Event::CameraEvent(CameraEvent::ResetView)),
            _ => None,
        },
        CrossTermEvent::Resize(cols, rows) => Some(Event::Resize { cols, rows }),
        _ => None,
    }
}

/// Size of the camera for a terminal of `cols` x `rows`, keeping the last row for the status
/// line.
fn camera_size(cols: u16, rows: u16) -> (usize, usize) {
    (
        usize::from(cols) * 2,
        usize::from(rows.saturating_sub(1)) * 4,
    )
}

/// Draws every generation to the terminal in braille, then waits for `delay` while handling
/// key presses.
pub struct TerminalSink {
    stdout: Stdout,
    cam: Camera,
    delay: Duration,
    active: bool,
}

impl TerminalSink {
    /// Switch the terminal to raw mode on the alternate screen. The terminal is restored by
    /// [`GenerationSink::finish`], or on drop.
    pub fn stdout(delay: Duration) -> io::Result<Self> {
        let mut stdout = io::stdout();

        // Get the width and height of the terminal
        let (cols, rows) = terminal::size()?;
        let (w, h) = camera_size(cols, rows);

        terminal::enable_raw_mode()?;
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

        Ok(Self {
            stdout,
            cam: Camera::new(w, h),
            delay,
            active: true,
        })
    }

    fn draw(&mut self, grid: &Grid, generation: u64) -> io::Result<()> {
        self.cam.draw(grid);
        let s = self.cam.render();

        queue!(
            self.stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
        )?;

        for line in s.lines() {
            queue!(self.stdout, style::Print(line), cursor::MoveToNextLine(1))?;
        }

        let (x, y) = self.cam.offset();
        queue!(
            self.stdout,
            style::Print(format!(
                "generation {generation}  population {}  view {x},{y}  [q]uit [hjkl] move [0] reset",
                grid.population()
            ))
        )?;

        self.stdout.flush()
    }

    /// Handle events until the delay is over. Returns `Break` if the user asked to exit.
    fn wait(&mut self) -> io::Result<ControlFlow<()>> {
        let deadline = Instant::now() + self.delay;

        loop {
            let left = deadline.saturating_duration_since(Instant::now());

            // Poll event for as long as there is time left
            if !event::poll(left)? {
                return Ok(ControlFlow::Continue(()));
            }

            match convert_event(event::read()?) {
                None => {}
                Some(Event::Exit) => return Ok(ControlFlow::Break(())),
                Some(Event::Resize { cols, rows }) => {
                    let (w, h) = camera_size(cols, rows);
                    self.cam.resize(w, h);
                }
                Some(Event::CameraEvent(e)) => match e {
                    CameraEvent::MoveUp => self.cam.offset_y(-PAN_STEP),
                    CameraEvent::MoveDown => self.cam.offset_y(PAN_STEP),
                    CameraEvent::MoveLeft => self.cam.offset_x(-PAN_STEP),
                    CameraEvent::MoveRight => self.cam.offset_x(PAN_STEP),
                    CameraEvent::ResetView => self.cam.reset_view(),
                },
            }
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

impl GenerationSink for TerminalSink {
    fn accept(&mut self, grid: &Grid, generation: u64) -> Result<ControlFlow<()>, SinkError> {
        self.draw(grid, generation)?;

        let flow = self.wait()?;
        if flow.is_break() {
            debug!(generation, "Exit requested");
        }

        Ok(flow)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(self.restore()?)
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        // Nothing left to report the error to
        let _ = self.restore();
    }
}
