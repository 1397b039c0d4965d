//! Starlark translators loaded from the config file or `--translator`.
//!
//! A script sees two globals: `event`, a dict of the canonical fields, and
//! `raw`, the raw record as a dict. The value of its last expression is the
//! description. A script that fails or returns `None` yields an empty string,
//! which the registry replaces with the generic description.

use starlark::environment::{Globals, GlobalsBuilder, Module};
use starlark::eval::Evaluator;
use starlark::syntax::{AstModule, Dialect};
use std::path::Path;

use super::{sip, Translator};
use crate::error::CompilationError;
use crate::event::{CanonicalFields, RawRecord};

#[starlark::starlark_module]
pub(crate) fn translator_globals(builder: &mut starlark::environment::GlobalsBuilder) {
    /// Plain-language meaning of a SIP response code.
    fn sip_reason(code: i32) -> anyhow::Result<String> {
        Ok(u16::try_from(code)
            .ok()
            .and_then(sip::explain_code)
            .map(|e| e.simple.to_string())
            .unwrap_or_else(|| "Unknown SIP code.".to_string()))
    }

    /// Technical meaning of a SIP response code.
    fn sip_detail(code: i32) -> anyhow::Result<String> {
        Ok(u16::try_from(code)
            .ok()
            .and_then(sip::explain_code)
            .map(|e| e.detailed.to_string())
            .unwrap_or_else(|| "No detailed explanation available".to_string()))
    }

    /// Microsoft subcode description, cause and resolution joined by " - ".
    fn sip_subcode(code: i32) -> anyhow::Result<String> {
        let sub = sip::explain_subcode(u32::try_from(code).unwrap_or(u32::MAX));
        Ok(format!("{} - {} - {}", sub.description, sub.cause, sub.resolution))
    }
}

fn dialect() -> Dialect {
    Dialect {
        enable_f_strings: true,
        ..Dialect::Extended
    }
}

pub struct StarlarkTranslator {
    name: String,
    script_source: String,
    globals: Globals,
}

impl std::fmt::Debug for StarlarkTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarlarkTranslator")
            .field("name", &self.name)
            .finish()
    }
}

impl StarlarkTranslator {
    /// Compile a translator from inline source. Syntax errors surface here,
    /// not on the first event.
    pub fn from_script(name: &str, script: &str) -> Result<Self, CompilationError> {
        let globals = GlobalsBuilder::standard().with(translator_globals).build();
        let _ast = AstModule::parse(name, script.to_string(), &dialect())?;

        Ok(Self {
            name: name.to_string(),
            script_source: script.to_string(),
            globals,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CompilationError> {
        let script = std::fs::read_to_string(path).map_err(|e| {
            CompilationError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        Self::from_script(&path.display().to_string(), &script)
    }

    fn eval(&self, fields: &CanonicalFields, raw: &RawRecord) -> anyhow::Result<String> {
        let module = Module::new();

        let mut event = serde_json::to_value(fields)?;
        if let serde_json::Value::Object(map) = &mut event {
            map.insert(
                "display_type".to_string(),
                serde_json::Value::String(fields.display_type().to_string()),
            );
        }
        let event_value = json_to_starlark_value(module.heap(), event)?;
        module.set("event", event_value);
        let raw_value =
            json_to_starlark_value(module.heap(), serde_json::Value::Object(raw.clone()))?;
        module.set("raw", raw_value);

        let ast = AstModule::parse(&self.name, self.script_source.clone(), &dialect())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let mut eval = Evaluator::new(&module);
        let result = eval
            .eval_module(ast, &self.globals)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        if result.is_none() {
            Ok(String::new())
        } else if let Some(s) = result.unpack_str() {
            Ok(s.to_string())
        } else {
            Ok(result.to_string())
        }
    }
}

impl Translator for StarlarkTranslator {
    fn describe(&self, fields: &CanonicalFields, raw: &RawRecord) -> String {
        match self.eval(fields, raw) {
            Ok(text) => text,
            Err(e) => {
                log::warn!(
                    "translator '{}' failed on {} event: {}",
                    self.name,
                    fields.display_type(),
                    e
                );
                String::new()
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn json_to_starlark_value(
    heap: &starlark::values::Heap,
    json: serde_json::Value,
) -> anyhow::Result<starlark::values::Value<'_>> {
    use starlark::values::Value;

    match json {
        serde_json::Value::Null => Ok(Value::new_none()),
        serde_json::Value::Bool(b) => Ok(Value::new_bool(b)),
        serde_json::Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => Ok(heap.alloc(i)),
            None => Ok(heap.alloc(n.as_f64().unwrap_or(f64::NAN))),
        },
        serde_json::Value::String(s) => Ok(heap.alloc(s)),
        serde_json::Value::Array(arr) => {
            let values = arr
                .into_iter()
                .map(|v| json_to_starlark_value(heap, v))
                .collect::<anyhow::Result<Vec<Value>>>()?;
            Ok(heap.alloc(values))
        }
        serde_json::Value::Object(obj) => {
            use starlark::collections::SmallMap;
            use starlark::values::dict::Dict;

            let mut content = SmallMap::new();
            for (k, v) in obj {
                let key = heap.alloc(k);
                let value = json_to_starlark_value(heap, v)?;
                content.insert_hashed(
                    key.get_hashed().map_err(|e| anyhow::anyhow!("{}", e))?,
                    value,
                );
            }
            Ok(heap.alloc(Dict::new(content)))
        }
    }
}
