use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::command::{Argument, Command, CommandBuilder, OperatorId, OperatorStep, PendingCommand};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::key::{InputEvent, KeyCode, KeyEvent, KeySequence};
use crate::keymap::{
    BuiltinCommand, CommandContext, ExtensionCommand, ExternalHandler, Handler, Keymap, Lookup,
    MappingTarget, ModeMask,
};
use crate::mode::{Mode, ModeEvent, ModeMachine};
use crate::motion::{Motion, MotionContext};
use crate::scan;
use crate::traits::TextView;
use crate::types::{Action, Range, Selection, SelectionBehavior, SelectionKind};

/// Maximum number of key-to-key expansions for one input.
pub const MAX_MAPPING_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy)]
struct QueuedKey {
    key: KeyEvent,
    /// Cleared for keys produced by a `remap = false` mapping.
    remap: bool,
}

impl QueuedKey {
    fn typed(key: KeyEvent) -> Self {
        Self { key, remap: true }
    }
}

/// Cursor and actions produced while handling one input.
#[derive(Debug)]
struct Output {
    cursor: usize,
    actions: Vec<Action>,
}

impl Output {
    fn move_to(&mut self, cursor: usize) {
        self.cursor = cursor;
        self.actions.push(Action::SetCursor(cursor));
    }

    fn push(&mut self, action: Action) {
        self.actions.push(action);
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    modes: ModeMachine,
    builder: CommandBuilder,
    /// Keys typed (or produced by a mapping) that do not resolve yet.
    pending: Vec<QueuedKey>,
    preferred_col: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub mode: Mode,
    pub anchor: Option<usize>,
    pub command: PendingCommand,
    pub pending_keys: KeySequence,
    pub preferred_col: Option<usize>,
}

pub struct EngineBuilder {
    mode: Mode,
    selection: SelectionBehavior,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            selection: SelectionBehavior::Inclusive,
        }
    }
}

impl EngineBuilder {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn selection(mut self, selection: SelectionBehavior) -> Self {
        self.selection = selection;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            modes: ModeMachine::new(self.mode, self.selection),
            builder: CommandBuilder::new(),
            pending: Vec::new(),
            preferred_col: None,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        EngineBuilder::default().selection(config.selection).build()
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &ModeMachine {
        &self.modes
    }

    /// Direct access for hosts that drive mode changes themselves (mouse
    /// selection, for example).
    pub fn modes_mut(&mut self) -> &mut ModeMachine {
        &mut self.modes
    }

    pub fn selection(&self, cursor: usize) -> Option<Selection> {
        self.modes.selection(cursor)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            mode: self.modes.mode(),
            anchor: self.modes.anchor(),
            command: self.builder.pending(),
            pending_keys: KeySequence::new(self.pending.iter().map(|q| q.key).collect()),
            preferred_col: self.preferred_col,
        }
    }

    /// Whether keys are waiting for more input. Hosts start their mapping
    /// timeout when this turns true and call [`Engine::flush_pending`] when
    /// it expires.
    pub fn has_pending_keys(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Handle one input. Returns the new cursor and the actions the host
    /// should apply, in order.
    pub fn handle_event<T: TextView>(
        &mut self,
        keymap: &Keymap,
        text: &T,
        cursor: usize,
        input: InputEvent,
    ) -> (usize, Vec<Action>) {
        let key = match input {
            InputEvent::Key(key) => key.normalized(),
            InputEvent::ReceivedChar(ch) => KeyEvent::char(ch),
        };
        trace!(%key, mode = ?self.modes.mode(), cursor, "input");
        let mut out = self.output(text, cursor);
        let queue = VecDeque::from([QueuedKey::typed(key)]);
        self.run(keymap, text, &mut out, queue, false);
        (out.cursor, out.actions)
    }

    /// Resolve pending keys as if no more input will follow: an ambiguous
    /// mapping takes its shorter match, anything else is unmapped.
    pub fn flush_pending<T: TextView>(
        &mut self,
        keymap: &Keymap,
        text: &T,
        cursor: usize,
    ) -> (usize, Vec<Action>) {
        let mut out = self.output(text, cursor);
        if !self.pending.is_empty() {
            debug!(keys = self.pending.len(), "flushing pending keys");
            self.run(keymap, text, &mut out, VecDeque::new(), true);
        }
        (out.cursor, out.actions)
    }

    /// Drop pending keys and the partial command. Operator-pending falls
    /// back to its base mode; other modes are unchanged.
    pub fn abort(&mut self) {
        self.pending.clear();
        self.builder.abort();
        if matches!(self.modes.mode(), Mode::OperatorPending { .. }) {
            self.modes.transition(ModeEvent::Exit);
        }
    }

    fn output<T: TextView>(&self, text: &T, cursor: usize) -> Output {
        let len = text.len_chars();
        let cursor = if cursor > len {
            warn!(cursor, len, "cursor past end of buffer, clamping");
            len
        } else {
            cursor
        };
        Output {
            cursor,
            actions: Vec::new(),
        }
    }

    fn run<T: TextView>(
        &mut self,
        keymap: &Keymap,
        text: &T,
        out: &mut Output,
        mut queue: VecDeque<QueuedKey>,
        flush: bool,
    ) {
        let mut depth = 0;
        loop {
            if let Some(next) = queue.pop_front() {
                if self.intercept(next.key, out) {
                    continue;
                }
                self.pending.push(next);
            } else if !flush || self.pending.is_empty() {
                break;
            }

            let keys: Vec<KeyEvent> = self.pending.iter().map(|q| q.key).collect();
            let handlers_only = !self.pending[0].remap;
            let mask = ModeMask::from(self.modes.mode());
            let lookup = if flush && queue.is_empty() {
                keymap.longest_match(mask, &keys, handlers_only)
            } else {
                keymap.lookup(mask, &keys, handlers_only)
            };

            match lookup {
                Lookup::Pending | Lookup::Ambiguous => {
                    trace!(keys = %KeySequence::new(keys), "awaiting more keys");
                }
                Lookup::Matched { mapping, consumed } => {
                    let rest = self.pending.split_off(consumed);
                    self.pending.clear();
                    for key in rest.into_iter().rev() {
                        queue.push_front(key);
                    }
                    match &mapping.to {
                        MappingTarget::Keys(to) => {
                            depth += 1;
                            if depth > MAX_MAPPING_DEPTH {
                                let err = EngineError::RecursiveMapping(MAX_MAPPING_DEPTH);
                                warn!(from = %mapping.from, %err, "mapping aborted");
                                queue.clear();
                                self.fail(out);
                                break;
                            }
                            trace!(from = %mapping.from, %to, remap = mapping.remap, "expand mapping");
                            for key in to.keys().iter().rev() {
                                queue.push_front(QueuedKey {
                                    key: *key,
                                    remap: mapping.remap,
                                });
                            }
                        }
                        MappingTarget::Handler(handler) => self.execute(handler, text, out),
                    }
                }
                Lookup::NoMatch => self.unmapped(&mut queue, text, out),
            }
        }
    }

    /// Keys handled before mapping lookup in command modes: Escape, count
    /// digits and register selection.
    fn intercept(&mut self, key: KeyEvent, out: &mut Output) -> bool {
        let mode = self.modes.mode();
        if matches!(mode, Mode::Insert | Mode::Replace) {
            return false;
        }
        if key.code == KeyCode::Esc {
            self.escape(out);
            return true;
        }
        if !self.pending.is_empty() || mode.is_select() {
            return false;
        }
        if self.builder.is_awaiting_register() {
            let result = match key.printable() {
                Some(name) => self.builder.set_register(name),
                None => Err(EngineError::InvalidRegister('\0')),
            };
            if let Err(err) = result {
                debug!(%err, "register rejected");
                self.fail(out);
            }
            return true;
        }
        if let Some(c) = key.printable() {
            if let Some(digit) = c.to_digit(10)
                && self.builder.push_digit(digit)
            {
                return true;
            }
            if c == '"' && self.builder.start_register() {
                return true;
            }
        }
        false
    }

    /// Esc first drops a partial command and keeps the mode, so leaving
    /// Visual with a count typed (`v3<Esc>`) takes a second Esc.
    fn escape(&mut self, out: &mut Output) {
        let mode = self.modes.mode();
        let had_keys = !self.pending.is_empty();
        if had_keys || !self.builder.is_empty() || matches!(mode, Mode::OperatorPending { .. }) {
            self.abort();
            return;
        }
        if mode.has_selection() {
            self.modes.transition(ModeEvent::Exit);
            out.push(Action::SetSelection(None));
        }
    }

    /// Abort the partial command and ring the bell.
    fn fail(&mut self, out: &mut Output) {
        self.abort();
        out.push(Action::Bell);
    }

    /// No mapping starts with the pending keys. Insert and Select give the
    /// first key its default meaning and retry the rest; command modes
    /// discard everything.
    fn unmapped<T: TextView>(&mut self, queue: &mut VecDeque<QueuedKey>, text: &T, out: &mut Output) {
        let mode = self.modes.mode();
        if !matches!(mode, Mode::Insert | Mode::Replace | Mode::Select { .. }) {
            trace!(keys = self.pending.len(), "no mapping");
            self.fail(out);
            return;
        }
        let rest = self.pending.split_off(1);
        let Some(first) = self.pending.pop() else {
            return;
        };
        for key in rest.into_iter().rev() {
            queue.push_front(key);
        }
        if mode.is_select() {
            self.select_key(first.key, text, out);
        } else {
            self.insert_key(first.key, out);
        }
    }

    fn insert_key(&mut self, key: KeyEvent, out: &mut Output) {
        let replace = self.modes.mode() == Mode::Replace;
        let typed = match key.code {
            KeyCode::Esc => {
                self.modes.transition(ModeEvent::Exit);
                return;
            }
            KeyCode::Backspace => {
                if out.cursor > 0 {
                    let at = out.cursor - 1;
                    if !replace {
                        out.push(Action::ApplyOperator {
                            operator: OperatorId::Delete,
                            range: Range::char_wise(at, out.cursor),
                            kind: SelectionKind::Character,
                            count: 1,
                            register: Some('_'),
                        });
                    }
                    out.move_to(at);
                }
                return;
            }
            KeyCode::Enter => '\n',
            KeyCode::Tab => '\t',
            _ => match key.printable() {
                Some(c) => c,
                None => {
                    out.push(Action::Bell);
                    return;
                }
            },
        };
        let at = out.cursor;
        let text = typed.to_string();
        if replace && typed != '\n' {
            out.push(Action::ReplaceText { at, text });
        } else {
            out.push(Action::InsertText { at, text });
        }
        out.cursor = at + 1;
    }

    /// Typing over a Select mode selection.
    fn select_key<T: TextView>(&mut self, key: KeyEvent, text: &T, out: &mut Output) {
        let replacement = match key.code {
            KeyCode::Backspace => None,
            KeyCode::Enter => Some('\n'),
            KeyCode::Tab => Some('\t'),
            _ => match key.printable() {
                Some(c) => Some(c),
                None => {
                    out.push(Action::Bell);
                    return;
                }
            },
        };
        let Some(selection) = self.modes.selection(out.cursor) else {
            return;
        };
        let range = selection.range(text);
        out.push(Action::ApplyOperator {
            operator: OperatorId::Delete,
            range,
            kind: selection.kind,
            count: 1,
            register: None,
        });
        out.push(Action::SetSelection(None));
        self.modes.transition(ModeEvent::EnterInsert);
        out.move_to(range.start);
        if let Some(c) = replacement {
            out.push(Action::InsertText {
                at: range.start,
                text: c.to_string(),
            });
            out.cursor = range.start + 1;
        }
    }

    fn execute<T: TextView>(&mut self, handler: &Handler, text: &T, out: &mut Output) {
        match handler {
            Handler::Operator(operator) => self.operator(*operator, text, out),
            Handler::Command(command) => self.builtin(*command, text, out),
            Handler::External(ExternalHandler::Command(command)) => {
                self.extension_command(command, text, out)
            }
            Handler::Motion(_) | Handler::External(ExternalHandler::TextObject(_)) => {
                if let Some(argument) = handler.as_argument() {
                    self.argument(argument, text, out);
                }
            }
        }
    }

    fn operator<T: TextView>(&mut self, operator: OperatorId, text: &T, out: &mut Output) {
        match self.modes.mode() {
            Mode::Visual { .. } => self.visual_operator(operator, text, out),
            Mode::Normal | Mode::OperatorPending { .. } => match self.builder.set_operator(operator) {
                Ok(OperatorStep::Pending) => {
                    self.modes.transition(ModeEvent::EnterOperatorPending);
                }
                Ok(OperatorStep::Complete(command)) => self.apply(command, text, out),
                Err(err) => {
                    debug!(%err, "operator rejected");
                    self.fail(out);
                }
            },
            _ => self.fail(out),
        }
    }

    fn visual_operator<T: TextView>(&mut self, operator: OperatorId, text: &T, out: &mut Output) {
        let (count, register) = self.builder.take_prefix();
        let Some(selection) = self.modes.selection(out.cursor) else {
            self.fail(out);
            return;
        };
        let range = selection.range(text);
        debug!(%operator, ?range, kind = ?selection.kind, "visual operator");
        out.push(Action::ApplyOperator {
            operator,
            range,
            kind: selection.kind,
            count: count.unwrap_or(1).max(1),
            register,
        });
        out.push(Action::SetSelection(None));
        self.leave_after_operator(operator);
        self.preferred_col = None;
        out.move_to(range.start);
    }

    /// A motion or text object arrived.
    fn argument<T: TextView>(&mut self, argument: Argument, text: &T, out: &mut Output) {
        if matches!(self.modes.mode(), Mode::OperatorPending { .. }) {
            let command = self.builder.complete(argument);
            self.apply(command, text, out);
            return;
        }

        let (raw_count, _) = self.builder.take_prefix();
        let count = raw_count.unwrap_or(1).max(1);
        match argument {
            Argument::Motion(motion) => self.move_cursor(motion, count, raw_count, text, out),
            Argument::TextObject(object) => {
                let Some(range) = object.range(text, out.cursor, count) else {
                    out.push(Action::Bell);
                    return;
                };
                let range = range.clamped(text.len_chars());
                let mode = self.modes.mode();
                match mode.selection_kind() {
                    Some(current) if mode.is_visual() => {
                        let kind = match current {
                            SelectionKind::Character => object.visual_type(),
                            other => other,
                        };
                        let head = range.end.saturating_sub(1).max(range.start);
                        self.modes.set_selection(range.start, kind);
                        out.move_to(head);
                    }
                    _ => out.move_to(range.start),
                }
                self.preferred_col = None;
            }
            Argument::CurrentLine => {}
        }
        self.finish(text, out);
    }

    fn move_cursor<T: TextView>(
        &mut self,
        motion: Motion,
        count: u32,
        raw_count: Option<u32>,
        text: &T,
        out: &mut Output,
    ) {
        let ctx = MotionContext {
            count,
            raw_count,
            preferred_col: self.preferred_col.filter(|_| motion.is_vertical()),
        };
        let Some(target) = motion.target(text, out.cursor, ctx) else {
            out.push(Action::Bell);
            return;
        };
        self.preferred_col = match motion {
            Motion::Up | Motion::Down => Some(
                self.preferred_col
                    .unwrap_or_else(|| out.cursor - scan::scan_line_start(text, out.cursor).offset),
            ),
            Motion::LineEnd => Some(usize::MAX),
            _ => None,
        };
        out.move_to(target);
    }

    /// End of a cursor-moving command: a one-shot Visual command goes back
    /// to Select, and the host gets the selection for the current mode.
    fn finish<T: TextView>(&mut self, text: &T, out: &mut Output) {
        let cursor = self.modes.finish_command(text, out.cursor);
        if cursor != out.cursor {
            out.move_to(cursor);
        }
        if self.modes.mode().has_selection() {
            out.push(Action::SetSelection(self.modes.selection(out.cursor)));
        }
    }

    /// Run a complete operator command built in Operator-pending mode.
    fn apply<T: TextView>(&mut self, command: Command, text: &T, out: &mut Output) {
        let (Some(operator), Some(argument)) = (command.operator, &command.argument) else {
            self.fail(out);
            return;
        };
        let ctx = MotionContext {
            count: command.count,
            raw_count: command.raw_count,
            preferred_col: self.preferred_col,
        };
        // `cw` on a word changes to the end of that word, like `ce`.
        let word_end = Argument::Motion(Motion::WordEnd);
        let argument = match argument {
            Argument::Motion(Motion::WordForward)
                if operator == OperatorId::Change
                    && text.char_at(out.cursor).is_some_and(|c| !c.is_whitespace()) =>
            {
                &word_end
            }
            other => other,
        };
        let Some(range) = argument.range(text, out.cursor, ctx) else {
            debug!(%operator, ?argument, "operator argument resolved to nothing");
            self.fail(out);
            return;
        };
        let kind = if range.line_wise {
            SelectionKind::Line
        } else {
            SelectionKind::Character
        };
        out.push(Action::ApplyOperator {
            operator,
            range,
            kind,
            count: command.count,
            register: command.register,
        });
        self.leave_after_operator(operator);
        self.preferred_col = None;
        out.move_to(range.start);
    }

    fn leave_after_operator(&mut self, operator: OperatorId) {
        if operator == OperatorId::Change {
            self.modes.transition(ModeEvent::EnterInsert);
        } else {
            self.modes.transition(ModeEvent::Exit);
        }
    }

    fn builtin<T: TextView>(&mut self, command: BuiltinCommand, text: &T, out: &mut Output) {
        self.builder.take_prefix();
        let cursor = out.cursor;
        let line_start = scan::scan_line_start(text, cursor).offset;
        match command {
            BuiltinCommand::EnterInsert => {
                self.modes.transition(ModeEvent::EnterInsert);
            }
            BuiltinCommand::Append => {
                let end = scan::line_content_end(text, cursor);
                self.modes.transition(ModeEvent::EnterInsert);
                out.move_to((cursor + 1).min(end).max(cursor));
            }
            BuiltinCommand::InsertAtLineStart => {
                self.modes.transition(ModeEvent::EnterInsert);
                out.move_to(scan::first_non_blank(text, line_start));
            }
            BuiltinCommand::AppendAtLineEnd => {
                self.modes.transition(ModeEvent::EnterInsert);
                out.move_to(scan::line_content_end(text, cursor));
            }
            BuiltinCommand::EnterReplace => {
                self.modes.transition(ModeEvent::EnterReplace);
            }
            BuiltinCommand::ToggleVisual(kind) => {
                self.modes.toggle_visual(kind, cursor);
                out.push(Action::SetSelection(self.modes.selection(cursor)));
            }
            BuiltinCommand::EnterSelect(kind) => {
                self.modes.enter_select_mode(kind, cursor);
                // Select is exclusive: cover the character under the cursor.
                if kind != SelectionKind::Line && cursor < scan::line_content_end(text, cursor) {
                    out.move_to(cursor + 1);
                }
                out.push(Action::SetSelection(self.modes.selection(out.cursor)));
            }
            BuiltinCommand::ToggleSelectVisual => {
                let moved = self.modes.toggle_select_visual(text, cursor);
                if moved != cursor {
                    out.move_to(moved);
                }
                out.push(Action::SetSelection(self.modes.selection(out.cursor)));
            }
            BuiltinCommand::SingleVisualCommand => {
                let moved = self.modes.process_single_visual_command(text, cursor);
                if moved != cursor {
                    out.move_to(moved);
                }
                out.push(Action::SetSelection(self.modes.selection(out.cursor)));
            }
            BuiltinCommand::SwapSelectionEnds => {
                let head = self.modes.swap_ends(cursor);
                out.move_to(head);
                out.push(Action::SetSelection(self.modes.selection(head)));
            }
        }
        if !matches!(command, BuiltinCommand::SwapSelectionEnds) {
            self.preferred_col = None;
        }
    }

    fn extension_command<T: TextView>(
        &mut self,
        command: &Arc<dyn ExtensionCommand>,
        text: &T,
        out: &mut Output,
    ) {
        let (count, register) = self.builder.take_prefix();
        let mut ctx = CommandContext {
            text,
            modes: &mut self.modes,
            cursor: out.cursor,
            count: count.unwrap_or(1).max(1),
            register,
            actions: Vec::new(),
        };
        command.execute(&mut ctx);
        let cursor = ctx.cursor.min(text.len_chars());
        out.actions.append(&mut ctx.actions);
        if cursor != out.cursor {
            out.move_to(cursor);
        }
        self.preferred_col = None;
    }
}
