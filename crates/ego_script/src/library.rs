//! Loaded scripts, addressed by `ScriptId`
//!
//! A script that fails to compile or load still gets an id; it refers to
//! the no-op script so the owning profile keeps working.

use crate::bytecode::Script;
use crate::compiler::Compiler;
use crate::error::{FallbackError, ScriptError};
use ego_core::{ScriptId, ScriptSettings};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Extension of compiled scripts on disk; anything else is source text.
pub const COMPILED_EXTENSION: &str = "egos";

#[derive(Debug, Default)]
pub struct ScriptLibrary {
    scripts: Vec<Script>,
    names: Vec<String>,
    by_name: HashMap<String, ScriptId>,
    compiler: Compiler,
    noop: Script,
}

impl ScriptLibrary {
    pub fn new(settings: &ScriptSettings) -> Self {
        Self {
            compiler: Compiler::new(settings),
            ..Self::default()
        }
    }

    /// Compile `source` under `name`. Loading an existing name replaces it
    /// and keeps its id.
    pub fn load_source(&mut self, name: &str, source: &str) -> Result<ScriptId, FallbackError> {
        let script = self.compiler.compile(source).map_err(ScriptError::from);
        self.register(name, script)
    }

    /// Load a script produced by [`Script::to_bytes`].
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<ScriptId, FallbackError> {
        let script = Script::from_bytes(bytes).map_err(ScriptError::from);
        self.register(name, script)
    }

    /// Load a file, named after its stem. `.egos` files are compiled
    /// scripts; everything else is compiled from source.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<ScriptId, FallbackError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let compiled = path.extension().is_some_and(|ext| ext == COMPILED_EXTENSION);
        let script = if compiled {
            std::fs::read(path)
                .map_err(ScriptError::from)
                .and_then(|bytes| Script::from_bytes(&bytes).map_err(ScriptError::from))
        } else {
            std::fs::read_to_string(path)
                .map_err(ScriptError::from)
                .and_then(|source| self.compiler.compile(&source).map_err(ScriptError::from))
        };
        self.register(&name, script)
    }

    fn register(&mut self, name: &str, script: Result<Script, ScriptError>) -> Result<ScriptId, FallbackError> {
        let id = match self.by_name.get(name) {
            Some(id) => *id,
            None => {
                let id = ScriptId(self.scripts.len() as u16);
                self.scripts.push(Script::noop());
                self.names.push(name.to_string());
                self.by_name.insert(name.to_string(), id);
                id
            }
        };
        match script {
            Ok(script) => {
                debug!(name, ?id, instructions = script.len(), "script loaded");
                self.scripts[id.0 as usize] = script;
                Ok(id)
            }
            Err(cause) => {
                warn!(name, ?id, %cause, "script failed to load, using the no-op script");
                self.scripts[id.0 as usize] = Script::noop();
                Err(FallbackError {
                    name: name.to_string(),
                    id,
                    cause,
                })
            }
        }
    }

    /// The script for `id`; unknown ids get the no-op script.
    pub fn get(&self, id: ScriptId) -> &Script {
        self.scripts.get(id.0 as usize).unwrap_or(&self.noop)
    }

    pub fn find(&self, name: &str) -> Option<ScriptId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: ScriptId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;

    #[test]
    fn broken_source_falls_back_to_noop() {
        let mut library = ScriptLibrary::default();
        let error = library.load_source("broken", "x = 1\n\tEnd").expect_err("tab indent");
        assert!(matches!(
            error.cause,
            ScriptError::Compile(CompileError::TabIndent { line: 2 })
        ));
        assert_eq!(library.find("broken"), Some(error.id));
        assert!(library.get(error.id).is_empty());
    }

    #[test]
    fn reloading_keeps_the_id() {
        let mut library = ScriptLibrary::default();
        let first = library.load_source("guard", "x = 1").expect("loads");
        let second = library.load_source("guard", "x = 1\ny = 2").expect("loads");
        assert_eq!(first, second);
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(first).len(), 2);
        assert_eq!(library.name(first), Some("guard"));
    }

    #[test]
    fn bytes_round_trip_and_corruption() {
        let mut library = ScriptLibrary::default();
        let id = library.load_source("guard", "IfAttacked\n  x = 1").expect("loads");
        let bytes = library.get(id).to_bytes();
        let copy = library.load_bytes("copy", &bytes).expect("loads");
        assert_eq!(library.get(copy), library.get(id));

        let error = library.load_bytes("corrupt", &bytes[..bytes.len() - 1]).expect_err("truncated");
        assert!(matches!(error.cause, ScriptError::Load(_)));
        assert!(library.get(error.id).is_empty());
    }

    #[test]
    fn unknown_id_and_missing_file_are_noop() {
        let mut library = ScriptLibrary::default();
        assert!(library.get(ScriptId(42)).is_empty());
        let error = library
            .load_file("/nonexistent/ego/guard.txt")
            .expect_err("missing file");
        assert!(matches!(error.cause, ScriptError::Io(_)));
        assert_eq!(error.name, "guard");
    }
}
