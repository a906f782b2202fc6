// Quick demonstration of undo/redo over a text buffer
// Run with: RUST_LOG=info cargo run --bin demo_text_editor

use futures::executor::block_on;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use undo_history::command::trait_def::OperationFuture;
use undo_history::{
    CommandAdapter, CommandError, CommandManager, HistoryConfig, Instance, sync_after_all,
};

/// Editor whose methods can be replayed by name
struct TextEditor {
    text: Mutex<String>,
}

impl TextEditor {
    fn text(&self) -> String {
        self.text.lock().map(|text| text.clone()).unwrap_or_default()
    }

    fn replace(&self, new_text: String) -> String {
        match self.text.lock() {
            Ok(mut text) => std::mem::replace(&mut *text, new_text),
            Err(_) => String::new(),
        }
    }
}

impl Instance for TextEditor {
    fn invoke(&self, method: &str, args: Vec<Value>) -> OperationFuture {
        let result = match (method, args.first()) {
            ("set_text", Some(Value::String(text))) => {
                self.replace(text.clone());
                Ok(Value::Null)
            }
            ("set_text", _) => Err(CommandError::from("set_text expects a string")),
            (other, _) => Err(CommandError::UnknownMethod(other.to_string())),
        };
        Box::pin(futures::future::ready(result))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("📝 undo_history - Text Editor Demo");
    println!("===================================");

    let editor = Arc::new(TextEditor {
        text: Mutex::new(String::new()),
    });

    let lookup = Arc::clone(&editor);
    let mut manager = CommandManager::builder(HistoryConfig::with_limit(20))
        .get_instance(move |_id| -> Option<Arc<dyn Instance>> {
            Some(Arc::clone(&lookup) as Arc<dyn Instance>)
        })
        .on_increment(|index| println!("   ↑ pointer {}", index))
        .on_decrement(|index| println!("   ↓ pointer {}", index))
        .build();

    let adapter = CommandAdapter::builder()
        .undo(|prev| prev)
        .redo(|next| next)
        .build();

    let target = Arc::clone(&editor);
    let set_text = adapter.wrap("set_text", move |new_text: String, recorder| {
        let prev = target.replace(new_text.clone());
        recorder.record(json!(prev), json!(new_text))
    });

    for text in ["Hello", "Hello, world", "Hello, undo"] {
        manager.save_state(set_text(text.to_string()), None, None);
        println!("✏️  set_text({:?}) -> {:?}", text, editor.text());
    }

    let undo_done = sync_after_all(|| println!("   ✅ undo finished"));
    manager.save_state(
        set_text("Hello, hooks".to_string()),
        Some(undo_done),
        None,
    );
    println!("✏️  set_text(\"Hello, hooks\") -> {:?}", editor.text());

    block_on(manager.undo(None))?;
    println!("\n↩️  undo -> {:?}", editor.text());

    block_on(manager.undo(Some(2)))?;
    println!("↩️  undo x2 -> {:?}", editor.text());

    block_on(manager.redo(None))?;
    println!("↪️  redo -> {:?}", editor.text());

    manager.save_state(set_text("Branch".to_string()), None, None);
    println!("\n🌿 set_text(\"Branch\") -> {:?}", editor.text());
    println!("   - Can redo: {}", manager.can_redo());

    match block_on(manager.redo(None)) {
        Ok(_) => println!("↪️  redo -> {:?}", editor.text()),
        Err(err) => println!("⛔ redo rejected: {}", err),
    }

    println!("\n📊 History:");
    println!("   - Entries: {}/{}", manager.len(), manager.limit());
    println!("   - Pointer: {}", manager.index());
    println!("   - Actions: {}", manager.all_actions_counter());

    Ok(())
}
