use anyhow::Result;
use clap::Parser;
use quest_core::{
    DEFAULT_SEED, Direction, GRID_HEIGHT, GRID_WIDTH, Position,
    game::{GameState, Phase},
    level::{Decal, Tile, floor_decals},
    map::Grid,
};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

/// How long after its last key event a direction still counts as held.
/// Terminal backends deliver no release events, so holds are inferred from
/// the auto-repeat stream.
const INPUT_HOLD: Duration = Duration::from_millis(160);

const FLOOR_LIGHT: Color = Color::Rgb(44, 44, 52);
const FLOOR_DARK: Color = Color::Rgb(30, 30, 36);

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Generation seed; walls and placements are fixed per seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Guard step interval in milliseconds
    #[arg(long, default_value_t = 500)]
    guard_ms: u64,
    /// Player move-repeat interval in milliseconds
    #[arg(long, default_value_t = 250)]
    player_ms: u64,
}

struct App {
    /// The core game round, owned exclusively by this loop.
    game: GameState,
    /// Cosmetic crack overlay, fixed per seed.
    decals: Grid<Decal>,
    should_quit: bool,
    guard_interval: Duration,
    player_interval: Duration,
    next_guard_step: Instant,
    next_player_move: Instant,
    /// Last key event per direction (up, down, left, right).
    held: [Option<Instant>; 4],
    last_pressed: Option<Direction>,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let now = Instant::now();
        Ok(App {
            game: GameState::new(args.seed)?,
            decals: floor_decals(args.seed),
            should_quit: false,
            guard_interval: Duration::from_millis(args.guard_ms),
            player_interval: Duration::from_millis(args.player_ms),
            next_guard_step: now + Duration::from_millis(args.guard_ms),
            next_player_move: now,
            held: [None; 4],
            last_pressed: None,
        })
    }

    fn on_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                if self.game.is_over() {
                    self.game.restart()?;
                    self.held = [None; 4];
                    self.last_pressed = None;
                    let now = Instant::now();
                    self.next_guard_step = now + self.guard_interval;
                    self.next_player_move = now;
                }
            }
            KeyCode::Up => self.press(Direction::Up),
            KeyCode::Down => self.press(Direction::Down),
            KeyCode::Left => self.press(Direction::Left),
            KeyCode::Right => self.press(Direction::Right),
            _ => {}
        }
        Ok(())
    }

    /// Records the key event and moves at once if the repeat cadence allows,
    /// so a fresh tap responds immediately while a held key is throttled to
    /// the player interval.
    fn press(&mut self, dir: Direction) {
        let now = Instant::now();
        self.held[dir_index(dir)] = Some(now);
        self.last_pressed = Some(dir);
        if now >= self.next_player_move {
            self.step_player(dir, now);
        }
    }

    fn step_player(&mut self, dir: Direction, now: Instant) {
        self.game.move_player(dir);
        self.next_player_move = now + self.player_interval;
    }

    /// Advances the two timers: the guard step and the held-direction
    /// move-repeat.
    fn tick(&mut self) {
        let now = Instant::now();
        if now >= self.next_guard_step {
            self.game.move_guards();
            self.next_guard_step = now + self.guard_interval;
        }
        if now >= self.next_player_move {
            if let Some(dir) = self.active_direction(now) {
                self.step_player(dir, now);
            }
        }
    }

    /// The direction currently considered held: the most recently pressed one
    /// if its events are still fresh, otherwise the freshest of the rest.
    fn active_direction(&self, now: Instant) -> Option<Direction> {
        let fresh =
            |seen: Instant| now.duration_since(seen) <= INPUT_HOLD;
        if let Some(dir) = self.last_pressed {
            if let Some(seen) = self.held[dir_index(dir)] {
                if fresh(seen) {
                    return Some(dir);
                }
            }
        }
        let mut best: Option<(Direction, Instant)> = None;
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ] {
            if let Some(seen) = self.held[dir_index(dir)] {
                if fresh(seen) && best.is_none_or(|(_, t)| seen > t) {
                    best = Some((dir, seen));
                }
            }
        }
        best.map(|(dir, _)| dir)
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut terminal = setup_terminal()?;
    let mut app = App::new(&args)?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop: draw, poll input briefly, advance the timers.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let poll_timeout = Duration::from_millis(25);

    loop {
        terminal.draw(|frame| ui(frame, app))?;

        if crossterm::event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    app.on_key(key.code)?;
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the map, the status line, and the game-over overlay.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(GRID_HEIGHT as u16 + 2),
            Constraint::Min(1),
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], app);

    let status = if app.game.is_over() {
        "Press SPACE to play again, q to quit.".to_string()
    } else {
        format!(
            "Keys left: {}   Arrows move, q quits.",
            app.game.keys().len()
        )
    };
    let status_widget = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, main_layout[1]);

    if let Phase::Over { won } = app.game.phase() {
        render_game_over(frame, main_layout[0], won);
    }
}

/// Renders the level grid with the entities on top.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let game = &app.game;
    let mut lines: Vec<Line> = Vec::with_capacity(GRID_HEIGHT);

    for y in 0..GRID_HEIGHT {
        let mut spans: Vec<Span> = Vec::with_capacity(GRID_WIDTH);
        for x in 0..GRID_WIDTH {
            let pos = Position::new(x, y);
            spans.push(cell_span(game, &app.decals, pos));
        }
        lines.push(Line::from(spans));
    }

    let map_widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().title("Quest").borders(Borders::ALL));
    frame.render_widget(map_widget, area);
}

/// One cell, highest-priority occupant first: player, guard, key, then the
/// tile itself. The door is only visible while it is still locked.
fn cell_span(game: &GameState, decals: &Grid<Decal>, pos: Position) -> Span<'static> {
    let floor_bg = if pos.x % 2 == pos.y % 2 {
        FLOOR_LIGHT
    } else {
        FLOOR_DARK
    };

    if game.player() == pos {
        return Span::styled("@", Style::default().fg(Color::Yellow).bg(floor_bg).bold());
    }
    if game.guards().contains(&pos) {
        return Span::styled("G", Style::default().fg(Color::Red).bg(floor_bg).bold());
    }
    if game.keys().contains(&pos) {
        return Span::styled("k", Style::default().fg(Color::Yellow).bg(floor_bg));
    }
    match game.grid()[pos] {
        Tile::Wall => Span::styled("#", Style::default().fg(Color::DarkGray).bg(Color::Black)),
        Tile::Door if !game.door_unlocked() => {
            Span::styled("+", Style::default().fg(Color::Magenta).bg(floor_bg))
        }
        _ => {
            let crack = match decals[pos] {
                Decal::Crack1 => ",",
                Decal::Crack2 => "'",
                Decal::None => " ",
            };
            Span::styled(crack, Style::default().fg(Color::DarkGray).bg(floor_bg))
        }
    }
}

/// Centered overlay announcing the round outcome, on top of the map.
fn render_game_over(frame: &mut Frame, map_area: Rect, won: bool) {
    let (verdict, verdict_color) = if won {
        ("You won!", Color::Green)
    } else {
        ("You lost!", Color::Red)
    };
    let lines = vec![
        Line::styled("GAME OVER", Style::default().fg(Color::Cyan).bold()),
        Line::styled(verdict, Style::default().fg(verdict_color)),
        Line::styled("Press SPACE to play again", Style::default().fg(Color::Cyan)),
    ];

    let overlay_w = 28u16.min(map_area.width);
    let overlay_h = (lines.len() as u16).min(map_area.height);
    let overlay = Rect {
        x: map_area.x + (map_area.width.saturating_sub(overlay_w)) / 2,
        y: map_area.y + (map_area.height.saturating_sub(overlay_h)) / 2,
        width: overlay_w,
        height: overlay_h,
    };

    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        overlay,
    );
}
