//! Drives the engine headlessly over a small Python-like snippet and prints
//! what each key sequence does.
//!
//! Run with: RUST_LOG=vim_modal=debug cargo run --example indent_objects

use tracing_subscriber::EnvFilter;
use vim_modal::{
    Action, Engine, EngineConfig, InputEvent, Keymap, OperatorId, key::parse_keys,
};

const CONFIG: &str = r#"
extensions:
  - textobj-indent
mappings:
  - mode: n
    from: "<Space>v"
    to: "vai"
"#;

const SNIPPET: &str = "\
def outer():
    x = 1
    if x:
        y = 2

        z = 3
    return x
";

struct Host {
    engine: Engine,
    keymap: Keymap,
    text: Vec<char>,
    cursor: usize,
}

impl Host {
    fn run(&mut self, notation: &str) -> Result<Vec<Action>, Box<dyn std::error::Error>> {
        let mut all = Vec::new();
        for key in parse_keys(notation)?.keys() {
            let (cursor, actions) =
                self.engine
                    .handle_event(&self.keymap, &self.text, self.cursor, InputEvent::Key(*key));
            for action in &actions {
                self.apply(action);
            }
            self.cursor = cursor;
            all.extend(actions);
        }
        Ok(all)
    }

    fn apply(&mut self, action: &Action) {
        match action {
            Action::ApplyOperator {
                operator: OperatorId::Delete | OperatorId::Change,
                range,
                ..
            } => {
                self.text.drain(range.start..range.end);
            }
            Action::InsertText { at, text } => {
                self.text.splice(*at..*at, text.chars());
            }
            _ => {}
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.text[start..end].iter().collect()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_yaml(CONFIG)?;
    let mut host = Host {
        engine: Engine::from_config(&config),
        keymap: config.keymap()?,
        text: SNIPPET.chars().collect(),
        cursor: 0,
    };

    // Put the cursor on `y = 2`.
    let start = SNIPPET.find("y = 2").map(|b| SNIPPET[..b].chars().count()).unwrap_or(0);

    for keys in ["vii", "vai", "vaI", "<Space>v"] {
        host.cursor = start;
        host.run(keys)?;
        if let Some(selection) = host.engine.selection(host.cursor) {
            let range = selection.range(&host.text);
            println!("{keys:>9} -> {} {range:?}", host.engine.mode().as_str());
            println!("{}", host.slice(range.start, range.end));
        }
        host.run("<Esc>")?;
    }

    // Select mode and back, the cursor shifts by one each way.
    host.cursor = start;
    for keys in ["gh", "<C-g>", "<C-g>"] {
        let actions = host.run(keys)?;
        println!("{keys:>9} -> {} cursor {} {actions:?}", host.engine.mode().as_str(), host.cursor);
    }
    host.run("<Esc>")?;

    host.cursor = start;
    host.run("dii")?;
    println!("after dii:\n{}", host.slice(0, host.text.len()));
    Ok(())
}
