use ropey::Rope;
use vim_modal::key::parse_keys;
use vim_modal::{
    Action, Engine, InputEvent, Keymap, KeymapBuilder, OperatorId, Selection, TextView,
    textobj::IndentObjectExtension,
};

/// Rope-backed buffer that applies engine actions the way a host would.
pub struct MockBuffer {
    rope: Rope,
    /// Text taken by the last yank, delete or change.
    pub register: Option<String>,
    pub selection: Option<Selection>,
    pub bells: usize,
}

impl MockBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            register: None,
            selection: None,
            bells: 0,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.rope.slice(start..end).to_string()
    }

    pub fn apply(&mut self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::SetCursor(_) => {}
                Action::SetSelection(selection) => self.selection = *selection,
                Action::ApplyOperator {
                    operator, range, register, ..
                } => {
                    let taken = self.slice(range.start, range.end);
                    match operator {
                        OperatorId::Delete | OperatorId::Change => {
                            self.rope.remove(range.start..range.end);
                            if *register != Some('_') {
                                self.register = Some(taken);
                            }
                        }
                        OperatorId::Yank => self.register = Some(taken),
                        OperatorId::ShiftRight | OperatorId::ShiftLeft => {}
                    }
                }
                Action::InsertText { at, text } => self.rope.insert(*at, text),
                Action::ReplaceText { at, text } => {
                    let at = *at;
                    if self.rope.get_char(at).is_some_and(|c| c != '\n') {
                        self.rope.remove(at..at + 1);
                    }
                    self.rope.insert(at, text);
                }
                Action::Bell => self.bells += 1,
            }
        }
    }
}

impl TextView for MockBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }
}

/// Engine, keymap, buffer and cursor wired together like a small host.
pub struct Session {
    pub engine: Engine,
    pub keymap: Keymap,
    pub buffer: MockBuffer,
    pub cursor: usize,
    pub actions: Vec<Action>,
}

impl Session {
    pub fn new(text: &str) -> Self {
        Self::with_engine(text, Engine::new())
    }

    pub fn with_engine(text: &str, engine: Engine) -> Self {
        let mut builder = KeymapBuilder::with_builtins();
        builder
            .register_extension(&IndentObjectExtension)
            .expect("fresh builder");
        Self::with_keymap(text, engine, builder.build())
    }

    pub fn with_keymap(text: &str, engine: Engine, keymap: Keymap) -> Self {
        Self {
            engine,
            keymap,
            buffer: MockBuffer::new(text),
            cursor: 0,
            actions: Vec::new(),
        }
    }

    pub fn at(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    /// Type keys written in Vim notation. Returns every action produced.
    pub fn keys(&mut self, notation: &str) -> Vec<Action> {
        let keys = parse_keys(notation).expect("valid key notation");
        let mut all = Vec::new();
        for key in keys.keys() {
            all.extend(self.input(InputEvent::Key(*key)));
        }
        all
    }

    pub fn input(&mut self, input: InputEvent) -> Vec<Action> {
        let (cursor, actions) =
            self.engine
                .handle_event(&self.keymap, &self.buffer, self.cursor, input);
        self.buffer.apply(&actions);
        self.cursor = cursor;
        self.actions.extend(actions.iter().cloned());
        actions
    }

    pub fn flush(&mut self) -> Vec<Action> {
        let (cursor, actions) = self
            .engine
            .flush_pending(&self.keymap, &self.buffer, self.cursor);
        self.buffer.apply(&actions);
        self.cursor = cursor;
        actions
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn selected(&self) -> Option<String> {
        let selection = self.buffer.selection?;
        let range = selection.range(&self.buffer);
        Some(self.buffer.slice(range.start, range.end))
    }
}

pub fn operators(actions: &[Action]) -> Vec<&Action> {
    actions
        .iter()
        .filter(|a| matches!(a, Action::ApplyOperator { .. }))
        .collect()
}
