//! Terminal UI example using crossterm and ratatui.
//!
//! This example demonstrates how to host vim_modal in a terminal application.
//! Run with: cargo run --example tui_crossterm [config.yaml]

use crossterm::{
    event::{self, Event, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use ropey::Rope;
use std::io;
use unicode_segmentation::UnicodeSegmentation;
use vim_modal::{
    Action, Engine, EngineConfig, InputEvent, KeyCode, KeyEvent, Keymap, Modifiers, OperatorId,
    Range, Selection, TextView,
};

const WELCOME: &str = "\
Welcome to vim_modal!

fn indent_objects() {
    if nested {
        put the cursor here and try vii, dai or yaI
        then <C-g> to swap between Visual and Select
    }

    gh starts Select mode, typing replaces the selection
}

Press Ctrl-Q to quit.
";

/// Text buffer implementation using ropey
struct RopeBuffer {
    rope: Rope,
    register: Option<String>,
}

impl RopeBuffer {
    fn new() -> Self {
        Self {
            rope: Rope::from(WELCOME),
            register: None,
        }
    }

    fn apply(&mut self, action: &Action) {
        match action {
            Action::ApplyOperator {
                operator,
                range,
                register,
                ..
            } => {
                let taken = self.rope.slice(range.start..range.end).to_string();
                match operator {
                    OperatorId::Delete | OperatorId::Change => {
                        self.rope.remove(range.start..range.end);
                        if *register != Some('_') {
                            self.register = Some(taken);
                        }
                    }
                    OperatorId::Yank => self.register = Some(taken),
                    OperatorId::ShiftRight => self.shift_lines(*range, true),
                    OperatorId::ShiftLeft => self.shift_lines(*range, false),
                }
            }
            Action::InsertText { at, text } => self.rope.insert(*at, text),
            Action::ReplaceText { at, text } => {
                if self.rope.get_char(*at).is_some_and(|c| c != '\n') {
                    self.rope.remove(*at..*at + 1);
                }
                self.rope.insert(*at, text);
            }
            // Cursor, selection and bell are handled by app state
            _ => {}
        }
    }

    fn shift_lines(&mut self, range: Range, right: bool) {
        let first = self.rope.char_to_line(range.start);
        let last = self.rope.char_to_line(range.end.saturating_sub(1).max(range.start));
        for line in (first..=last).rev() {
            let start = self.rope.line_to_char(line);
            if right {
                self.rope.insert(start, "    ");
            } else {
                let blanks = self
                    .rope
                    .line(line)
                    .chars()
                    .take(4)
                    .take_while(|c| *c == ' ')
                    .count();
                self.rope.remove(start..start + blanks);
            }
        }
    }

    /// Line and display column of a char offset.
    fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let start = self.rope.line_to_char(line);
        let prefix = self.rope.slice(start..offset).to_string();
        (line, prefix.graphemes(true).count())
    }
}

impl TextView for RopeBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }
}

struct App {
    engine: Engine,
    keymap: Keymap,
    buffer: RopeBuffer,
    cursor: usize,
    selection: Option<Selection>,
    message: String,
    should_quit: bool,
}

impl App {
    fn new(config: &EngineConfig) -> vim_modal::Result<Self> {
        Ok(Self {
            engine: Engine::from_config(config),
            keymap: config.keymap()?,
            buffer: RopeBuffer::new(),
            cursor: 0,
            selection: None,
            message: "NORMAL".to_string(),
            should_quit: false,
        })
    }

    fn handle_crossterm_event(&mut self, event: CKeyEvent) {
        if event.code == CKeyCode::Char('q') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        let Some(vim_event) = convert_crossterm_event(event) else {
            return;
        };

        let (new_cursor, actions) =
            self.engine
                .handle_event(&self.keymap, &self.buffer, self.cursor, vim_event);

        let mut bell = false;
        for action in &actions {
            match action {
                Action::SetCursor(offset) => self.cursor = *offset,
                Action::SetSelection(selection) => self.selection = *selection,
                Action::Bell => bell = true,
                _ => self.buffer.apply(action),
            }
        }
        self.cursor = new_cursor.min(self.buffer.len_chars());

        let snapshot = self.engine.snapshot();
        let pending = format!("{}", snapshot.pending_keys);
        self.message = match (bell, pending.is_empty()) {
            (true, _) => format!("{} (bell)", snapshot.mode.as_str()),
            (false, true) => snapshot.mode.as_str().to_string(),
            (false, false) => format!("{}  {pending}", snapshot.mode.as_str()),
        };
        if let Some(register) = &self.buffer.register {
            self.message
                .push_str(&format!("  register: {:?}", register.chars().take(24).collect::<String>()));
        }
    }
}

fn convert_crossterm_event(event: CKeyEvent) -> Option<InputEvent> {
    let mut mods = Modifiers::empty();
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        mods |= Modifiers::CTRL;
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        mods |= Modifiers::ALT;
    }
    if event.modifiers.contains(KeyModifiers::SHIFT) {
        mods |= Modifiers::SHIFT;
    }
    let code = match event.code {
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        _ => return None,
    };
    Some(InputEvent::Key(KeyEvent::new(code, mods).normalized()))
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(f.size());

    let selected = app.selection.map(|s| s.range(&app.buffer));
    let highlight = Style::default().bg(Color::Blue);

    // Main text area
    let mut lines = vec![];
    for i in 0..app.buffer.rope.len_lines() {
        let start = app.buffer.rope.line_to_char(i);
        let line_text = app.buffer.rope.line(i).to_string();
        let trimmed = line_text.trim_end_matches('\n');

        let Some(range) = selected.filter(|r| r.start < start + trimmed.chars().count().max(1) && r.end > start)
        else {
            lines.push(Line::from(trimmed.to_string()));
            continue;
        };

        let mut spans = Vec::new();
        let mut run = String::new();
        let mut run_selected = false;
        for (col, ch) in trimmed.chars().enumerate() {
            let inside = range.contains(start + col);
            if inside != run_selected && !run.is_empty() {
                let style = if run_selected { highlight } else { Style::default() };
                spans.push(Span::styled(std::mem::take(&mut run), style));
            }
            run_selected = inside;
            run.push(ch);
        }
        if run.is_empty() {
            // Selected empty line
            spans.push(Span::styled(" ", highlight));
        } else {
            let style = if run_selected { highlight } else { Style::default() };
            spans.push(Span::styled(run, style));
        }
        lines.push(Line::from(spans));
    }

    let text = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("vim_modal demo"),
    );
    f.render_widget(text, chunks[0]);

    // Status line
    let status = Paragraph::new(app.message.as_str())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[1]);

    // Set cursor position
    let (line, col) = app.buffer.line_col(app.cursor);
    f.set_cursor(chunks[0].x + 1 + col as u16, chunks[0].y + 1 + line as u16);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(std::path::Path::new(&path))?,
        None => EngineConfig::from_yaml("extensions: [textobj-indent]")?,
    };
    let mut app = App::new(&config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            app.handle_crossterm_event(key);

            if app.should_quit {
                break;
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
