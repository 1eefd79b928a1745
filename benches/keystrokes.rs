//! Benchmarks for key dispatch and indent object resolution.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ropey::Rope;
use std::time::Duration;
use vim_modal::{
    Engine, IndentObject, IndentObjectExtension, InputEvent, KeyEvent, Keymap, KeymapBuilder,
    TextView, key::parse_keys,
};

/// Rope-based buffer for benchmarking
struct BenchBuffer {
    rope: Rope,
}

impl BenchBuffer {
    fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl TextView for BenchBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }
}

/// Nested blocks, four levels deep, repeated `blocks` times.
fn generate_sample_text(blocks: usize) -> String {
    let mut text = String::new();
    for i in 0..blocks {
        text.push_str(&format!("fn item_{i}() {{\n"));
        for depth in 1..=4 {
            let indent = "    ".repeat(depth);
            text.push_str(&format!("{indent}let value_{depth} = compute({i}, {depth});\n"));
            text.push_str(&format!("{indent}if value_{depth} > 0 {{\n"));
        }
        text.push_str(&"    ".repeat(5));
        text.push_str("return;\n");
        for depth in (1..=4).rev() {
            text.push_str(&"    ".repeat(depth));
            text.push_str("}\n");
        }
        text.push_str("}\n\n");
    }
    text
}

fn keymap() -> Keymap {
    let mut builder = KeymapBuilder::with_builtins();
    builder
        .register_extension(&IndentObjectExtension)
        .expect("fresh builder");
    builder.build()
}

fn inputs(notation: &str) -> Vec<InputEvent> {
    parse_keys(notation)
        .expect("valid notation")
        .keys()
        .iter()
        .copied()
        .map(InputEvent::Key)
        .collect()
}

/// Offset of the deepest line in the middle block.
fn deep_offset(text: &str, blocks: usize) -> usize {
    let line = (blocks / 2) * 16 + 9;
    text.lines()
        .take(line)
        .map(|l| l.chars().count() + 1)
        .sum::<usize>()
        + 20
}

fn benchmark_indent_resolve(c: &mut Criterion) {
    let blocks = 500;
    let text = generate_sample_text(blocks);
    let buffer = BenchBuffer::new(&text);
    let cursor = deep_offset(&text, blocks);

    c.bench_function("indent object (ii)", |b| {
        b.iter(|| black_box(IndentObject::INNER.resolve(&buffer, black_box(cursor))));
    });
    c.bench_function("indent object (aI)", |b| {
        b.iter(|| {
            black_box(IndentObject::WITH_ABOVE_AND_BELOW.resolve(&buffer, black_box(cursor)))
        });
    });

    let flat = "x\n".repeat(20_000);
    let flat_buffer = BenchBuffer::new(&flat);
    c.bench_function("indent object (whole buffer fallback)", |b| {
        b.iter(|| black_box(IndentObject::INNER.resolve(&flat_buffer, black_box(10_000))));
    });
}

fn benchmark_simple_movements(c: &mut Criterion) {
    let text = generate_sample_text(200);
    let buffer = BenchBuffer::new(&text);
    let keymap = keymap();
    let mut engine = Engine::new();
    let mut cursor = 0;
    let movements = inputs("jjllhkwwb");

    c.bench_function("simple movements (hjkl w b)", |b| {
        b.iter(|| {
            for input in &movements {
                let (new_cursor, _) =
                    engine.handle_event(&keymap, &buffer, cursor, black_box(input.clone()));
                cursor = new_cursor;
            }
        });
    });
}

fn benchmark_indent_operators(c: &mut Criterion) {
    let blocks = 200;
    let text = generate_sample_text(blocks);
    let buffer = BenchBuffer::new(&text);
    let keymap = keymap();
    let mut engine = Engine::new();
    let cursor = deep_offset(&text, blocks);
    let delete = inputs("dii");
    let yank = inputs("\"a2yaI");

    c.bench_function("operator on indent object (dii, \"a2yaI)", |b| {
        b.iter(|| {
            for input in delete.iter().chain(&yank) {
                let (_, actions) = engine.handle_event(&keymap, &buffer, cursor, black_box(input.clone()));
                black_box(actions);
            }
        });
    });
}

fn benchmark_visual_select(c: &mut Criterion) {
    let blocks = 200;
    let text = generate_sample_text(blocks);
    let buffer = BenchBuffer::new(&text);
    let keymap = keymap();
    let mut engine = Engine::new();
    let start = deep_offset(&text, blocks);
    let sequence = inputs("vai<C-g><C-g><Esc>");

    c.bench_function("visual selection (vai, <C-g> round trip)", |b| {
        b.iter(|| {
            let mut cursor = start;
            for input in &sequence {
                let (new_cursor, actions) =
                    engine.handle_event(&keymap, &buffer, cursor, black_box(input.clone()));
                cursor = new_cursor;
                black_box(actions);
            }
        });
    });
}

fn benchmark_mapping_expansion(c: &mut Criterion) {
    let text = generate_sample_text(50);
    let buffer = BenchBuffer::new(&text);
    let mut builder = KeymapBuilder::with_builtins();
    builder
        .register_extension(&IndentObjectExtension)
        .expect("fresh builder");
    let mut previous = parse_keys("l").expect("valid notation");
    for i in 0..50 {
        let from = parse_keys(&format!("<Space>{i:02}")).expect("valid notation");
        builder.register_key_mapping(vim_modal::ModeMask::NORMAL, from.clone(), previous, true);
        previous = from;
    }
    let keymap = builder.build();
    let mut engine = Engine::new();
    let chain = inputs("<Space>49");

    c.bench_function("mapping chain (50 expansions)", |b| {
        b.iter(|| {
            for input in &chain {
                let (_, actions) = engine.handle_event(&keymap, &buffer, 0, black_box(input.clone()));
                black_box(actions);
            }
        });
    });
}

fn benchmark_insert_typing(c: &mut Criterion) {
    let text = generate_sample_text(50);
    let buffer = BenchBuffer::new(&text);
    let keymap = keymap();
    let mut engine = Engine::new();

    c.bench_function("insert typing", |b| {
        b.iter(|| {
            let mut cursor = 0;
            let (new_cursor, _) =
                engine.handle_event(&keymap, &buffer, cursor, InputEvent::Key(KeyEvent::char('i')));
            cursor = new_cursor;
            for ch in "hello world".chars() {
                let (new_cursor, actions) =
                    engine.handle_event(&keymap, &buffer, cursor, black_box(InputEvent::ReceivedChar(ch)));
                cursor = new_cursor;
                black_box(actions);
            }
            let _ = engine.handle_event(&keymap, &buffer, cursor, InputEvent::Key(KeyEvent::esc()));
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = benchmark_indent_resolve,
              benchmark_simple_movements,
              benchmark_indent_operators,
              benchmark_visual_select,
              benchmark_mapping_expansion,
              benchmark_insert_typing
}
criterion_main!(benches);
