//! Linkboard RPC Server: JSON-RPC over stdin/stdout for the rendering layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"link.move", "params":{"id":"...","section":"...","index":0}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Requests are read on a separate thread so the loop can wake while stdin
//! is idle: a pending save is written as soon as its debounce expires, not
//! when the next request happens to arrive. Anything still pending is
//! flushed when stdin closes.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use linkboard::app::{App, AppConfig};
use linkboard::logging;
use linkboard::rpc_handler::handle_method;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Bounds on how long the loop sleeps between save checks while idle.
const MIN_IDLE_WAKE: Duration = Duration::from_millis(10);
const MAX_IDLE_WAKE: Duration = Duration::from_millis(250);

fn send(out: &mut impl Write, value: &Value) {
    if writeln!(out, "{}", value).and_then(|_| out.flush()).is_err() {
        warn!("stdout closed; response dropped");
    }
}

/// Writes a due save, reporting a failure to the front-end.
fn tick(app: &Mutex<App>, out: &mut impl Write) {
    if let Ok(mut a) = app.lock() {
        if let Err(e) = a.tick() {
            send(out, &json!({"event":"persistenceError","error":e.to_string()}));
        }
    }
}

fn handle_line(app: &Mutex<App>, out: &mut impl Write, line: &str) {
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            send(out, &json!({"id":null,"error":format!("parse error: {}",e)}));
            return;
        }
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    let response = match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    };
    send(out, &response);
}

fn main() -> ExitCode {
    logging::init();

    let config = AppConfig::from_env();
    let app = match App::new(&config) {
        Ok(app) => Mutex::new(app),
        Err(e) => {
            error!(error = %e, path = %config.db_path().display(), "failed to open board store");
            return ExitCode::FAILURE;
        }
    };
    info!(path = %config.db_path().display(), "linkboard rpc ready");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    send(&mut out, &json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}));

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("stdin closed");
    });

    let idle_wake = config.save_debounce.clamp(MIN_IDLE_WAKE, MAX_IDLE_WAKE);
    loop {
        match rx.recv_timeout(idle_wake) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    handle_line(&app, &mut out, &line);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        tick(&app, &mut out);
    }

    match app.lock() {
        Ok(mut a) => a.shutdown(),
        Err(e) => error!(error = %e, "app state poisoned; pending save lost"),
    }
    ExitCode::SUCCESS
}
