use log::info;
use quickstyle::{EngineConfig, StyleEngine};
use serde_json::Value;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = EngineConfig::from_env();

    // Initialize logger with error handling
    quickstyle::logger::init(config.log_level)
        .map_err(|e| format!("Failed to initialize logger: {}", e))?;

    let mut args = std::env::args().skip(1);
    let (Some(sheet_path), Some(tree_path)) = (args.next(), args.next()) else {
        return Err("usage: quickstyle <stylesheet.json> <tree.json>".into());
    };

    let (sheet, tree) = tokio::try_join!(
        tokio::fs::read_to_string(&sheet_path),
        tokio::fs::read_to_string(&tree_path)
    )?;

    let mut engine = StyleEngine::new(config);
    engine.load_style_sheet(&sheet)?;

    let tree: Value = serde_json::from_str(&tree)?;
    let root = engine.document().root();
    match &tree {
        Value::Array(nodes) => {
            for node in nodes {
                engine.build_tree(root, node)?;
            }
        }
        node => {
            engine.build_tree(root, node)?;
        }
    }

    let start = std::time::Instant::now();
    let restyled = engine.restyle();
    info!(target: "css", "Restyled {} nodes in {:?}", restyled, start.elapsed());

    println!("{}", serde_json::to_string_pretty(&engine.computed_styles())?);
    Ok(())
}
