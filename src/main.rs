//! Debug binary: read a request body from stdin, run a dry rewrite against a
//! fresh session, and print what the engine saw and changed.

use std::io::Read;

use whittle_core::ids::SessionId;
use whittle_core::state::SessionState;
use whittle_engine::{rewrite_request, EngineConfig};
use whittle_formats::detect_format;
use whittle_telemetry::LogConfig;

#[tokio::main]
async fn main() {
    whittle_telemetry::init_logging(&LogConfig::default());

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .expect("failed to read stdin");

    let mut body: serde_json::Value =
        serde_json::from_str(&input).expect("stdin is not valid JSON");

    let Some(variant) = detect_format(&body) else {
        eprintln!("unrecognized request body format");
        std::process::exit(1);
    };
    tracing::info!(?variant, "format detected");

    let mut state = SessionState::new(SessionId::new());
    let config = EngineConfig::default();

    match rewrite_request(&mut body, &mut state, &config, "stdin") {
        Some(summary) => {
            tracing::info!(
                replaced = summary.replaced,
                nudged = summary.nudged,
                notice_injected = summary.notice_injected,
                "dry-run rewrite complete"
            );
            println!("{}", serde_json::to_string_pretty(&body).expect("serialize body"));
        }
        None => {
            eprintln!("body carries no message list; nothing to rewrite");
            std::process::exit(1);
        }
    }
}
