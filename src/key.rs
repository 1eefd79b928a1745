use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Key codes representing individual keys on the keyboard.
///
/// This enum provides a platform-agnostic representation of keys.
/// Hosts should map their platform-specific key events to these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key. The character already carries its case, so
    /// `V` is `Char('V')` whether or not SHIFT is reported.
    Char(char),
    /// The Escape key, used to exit modes and cancel pending commands.
    Esc,
    /// The Enter/Return key.
    Enter,
    /// The Backspace key.
    Backspace,
    /// The Tab key.
    Tab,
    /// The `<Plug>` pseudo key. Never produced by a keyboard; extensions use
    /// it as a prefix for handler mappings that users cannot type directly.
    Plug,
}

bitflags::bitflags! {
    /// Keyboard modifier flags.
    ///
    /// These can be combined to represent multiple modifiers held simultaneously.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// A key press event with optional modifiers.
///
/// This represents a single key press, including any modifier keys held down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,
    /// Modifier keys held during the key press.
    pub mods: Modifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: Modifiers) -> Self {
        Self { code, mods }
    }

    /// A bare character key.
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::empty())
    }

    /// A control chord such as `<C-v>`.
    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::CTRL)
    }

    pub const fn esc() -> Self {
        Self::new(KeyCode::Esc, Modifiers::empty())
    }

    /// Drop SHIFT from character keys; the character already encodes it.
    pub fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self {
                code: self.code,
                mods: self.mods - Modifiers::SHIFT,
            },
            _ => self,
        }
    }

    /// Printable character typed without a command modifier.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.mods.intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META) => {
                Some(c)
            }
            _ => None,
        }
    }
}

/// Input events that can be processed by the engine.
///
/// This enum distinguishes between key presses (used for commands)
/// and text input (used in insert/replace/select modes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press event, typically used for commands and navigation.
    Key(KeyEvent),
    /// A character received in text input mode.
    /// This allows hosts to handle composed characters and IME input.
    ReceivedChar(char),
}

/// An ordered list of keys, written in Vim key notation (`dai`, `<C-v>`,
/// `<Plug>textobj-indent-ai`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeySequence(Vec<KeyEvent>);

impl KeySequence {
    pub fn new(keys: Vec<KeyEvent>) -> Self {
        Self(keys)
    }

    /// Plain characters, no notation parsing.
    pub fn from_chars(s: &str) -> Self {
        Self(s.chars().map(KeyEvent::char).collect())
    }

    /// `<Plug>` followed by `name`.
    pub fn plug(name: &str) -> Self {
        let mut keys = Vec::with_capacity(name.len() + 1);
        keys.push(KeyEvent::new(KeyCode::Plug, Modifiers::empty()));
        keys.extend(name.chars().map(KeyEvent::char));
        Self(keys)
    }

    pub fn keys(&self) -> &[KeyEvent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &[KeyEvent]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl From<Vec<KeyEvent>> for KeySequence {
    fn from(keys: Vec<KeyEvent>) -> Self {
        Self(keys)
    }
}

impl From<KeyEvent> for KeySequence {
    fn from(key: KeyEvent) -> Self {
        Self(vec![key])
    }
}

/// Parse Vim key notation into a key sequence.
pub fn parse_keys(notation: &str) -> Result<KeySequence, EngineError> {
    notation.parse()
}

impl FromStr for KeySequence {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        let mut rest = s;
        while let Some(c) = rest.chars().next() {
            if c == '<'
                && let Some(close) = rest.find('>')
                && close > 1
            {
                keys.push(parse_special(&rest[1..close])?);
                rest = &rest[close + 1..];
                continue;
            }
            keys.push(KeyEvent::char(c));
            rest = &rest[c.len_utf8()..];
        }
        Ok(Self(keys))
    }
}

fn parse_special(name: &str) -> Result<KeyEvent, EngineError> {
    let lower = name.to_ascii_lowercase();
    let plain = |code: KeyCode| -> Result<KeyEvent, EngineError> {
        Ok(KeyEvent::new(code, Modifiers::empty()))
    };
    match lower.as_str() {
        "esc" => return plain(KeyCode::Esc),
        "cr" | "enter" | "return" => return plain(KeyCode::Enter),
        "bs" | "backspace" => return plain(KeyCode::Backspace),
        "tab" => return plain(KeyCode::Tab),
        "plug" => return plain(KeyCode::Plug),
        "space" => return Ok(KeyEvent::char(' ')),
        "lt" => return Ok(KeyEvent::char('<')),
        "bslash" => return Ok(KeyEvent::char('\\')),
        "bar" => return Ok(KeyEvent::char('|')),
        _ => {}
    }

    // Modifier chords: <C-v>, <A-x>, <M-x>, <C-S-x>, and <C--> for the `-` key
    let (chord, key) = match name.strip_suffix("--") {
        Some(chord) => (chord, "-"),
        None => name.rsplit_once('-').unwrap_or(("", name)),
    };
    let mut mods = Modifiers::empty();
    for part in chord.split('-').filter(|_| !chord.is_empty()) {
        match part.to_ascii_lowercase().as_str() {
            "c" => mods |= Modifiers::CTRL,
            "s" => mods |= Modifiers::SHIFT,
            "a" | "m" => mods |= Modifiers::ALT,
            "d" => mods |= Modifiers::META,
            _ => return Err(EngineError::InvalidKeyNotation(format!("<{name}>"))),
        }
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !mods.is_empty() => {
            // <C-V> and <C-v> are the same chord in Vim.
            let c = if mods.contains(Modifiers::CTRL) {
                c.to_ascii_lowercase()
            } else {
                c
            };
            Ok(KeyEvent::new(KeyCode::Char(c), mods).normalized())
        }
        _ => Err(EngineError::InvalidKeyNotation(format!("<{name}>"))),
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if self.mods.contains(Modifiers::CTRL) {
                f.write_str("C-")?;
            }
            if self.mods.contains(Modifiers::ALT) {
                f.write_str("A-")?;
            }
            if self.mods.contains(Modifiers::META) {
                f.write_str("D-")?;
            }
            if self.mods.contains(Modifiers::SHIFT) {
                f.write_str("S-")?;
            }
            Ok(())
        };
        let name = match self.code {
            KeyCode::Esc => "Esc",
            KeyCode::Enter => "CR",
            KeyCode::Backspace => "BS",
            KeyCode::Tab => "Tab",
            KeyCode::Plug => "Plug",
            KeyCode::Char(c) if self.mods.is_empty() => {
                return match c {
                    '<' => f.write_str("<lt>"),
                    ' ' => f.write_str("<Space>"),
                    _ => write!(f, "{c}"),
                };
            }
            KeyCode::Char(c) => {
                f.write_str("<")?;
                prefix(f)?;
                return write!(f, "{c}>");
            }
        };
        f.write_str("<")?;
        prefix(f)?;
        write!(f, "{name}>")
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}
