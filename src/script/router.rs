// src/script/router.rs

use crate::script::Script;
use crate::types::RuntimeId;

/// Pick the runtime that must run `script`.
///
/// The first generate stage wins, then the first execute stage; a script with
/// no stages runs under `default`.
pub fn route(script: &Script, default: &str) -> RuntimeId {
    script
        .generate
        .first()
        .or_else(|| script.execute.first())
        .map(|stage| stage.language.clone())
        .unwrap_or_else(|| default.to_string())
}
