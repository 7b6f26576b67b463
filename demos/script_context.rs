//! Walk through one script run against a sandbox context.
//!
//! Run with: cargo run --example script_context

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sandbox_context_rs::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    let data_root = std::env::temp_dir().join("sandbox-context-demo");
    let config = SandboxConfig::builder()
        .data_root(data_root.display().to_string())
        .build();

    let record = RequestRecord::from_json_str(
        r#"{"url": "https://{{host}}/users/001",
            "headers": [{"key": "Accept", "value": "application/json", "isActive": true},
                        {"key": "X-Trace", "value": "on", "isActive": false}]}"#,
    )?;

    let libraries: HashMap<String, PathBuf> =
        [("helpers".to_string(), PathBuf::from("/libs/helpers.js"))]
            .into_iter()
            .collect();

    let mut variables: Variables = [("host".to_string(), "example.com".to_string())]
        .into_iter()
        .collect();

    let mut ctx = SandboxContext::builder(
        ScriptIdentity::new("p1", "v1", "env-1", "staging"),
        &mut variables,
    )
    .library_index(libraries)
    .request_record(record)
    .store(DirectoryFileStore::from_config(&config))
    .loader(|path: &Path| -> Result<String> { Ok(format!("<module {}>", path.display())) })
    .config(config)
    .build();

    println!("environment: {}", ctx.environment());
    if let Some(request) = ctx.request() {
        let request = request.with_variables(ctx.variables());
        println!("request: {} {} {:?}", request.method, request.url, request.headers);
    }

    println!("loaded: {}", ctx.load_library("helpers")?);
    match ctx.load_library("lodash") {
        Ok(_) => println!("lodash unexpectedly available"),
        Err(e) => println!("lodash: {e}"),
    }

    ctx.write_file("seen.txt", "001", true)?;
    println!("seen.txt: {}", ctx.read_file("seen.txt")?);
    println!(
        "seen.txt lives at {}",
        ctx.resolve_project_file_path("seen.txt", "data")
    );

    ctx.set_variable("lastUser", "001");
    ctx.tests_mut().insert("user exists".to_string(), json!(true));
    ctx.export(json!({"id": "001"}));

    let outcome = ctx.finish();
    println!("outcome: {}", serde_json::to_string_pretty(&outcome)?);
    println!("variables after run: {variables:?}");

    std::fs::remove_dir_all(&data_root)?;
    Ok(())
}
