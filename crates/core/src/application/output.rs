// Output Formatter - reduces results/errors to one payload at FLUSH

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{json, Map, Value};
use std::io;

use super::constants::HEADER_CONTENT_TYPE;
use crate::domain::ProcessPool;
use crate::error::Result;
use crate::port::ResponseSink;

/// Serializes the terminal payload
///
/// Diagnostic mode: pretty printed, unicode left as-is.
/// Otherwise: compact, non-ASCII and `< > & '` escaped as `\uXXXX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    diagnostic: bool,
}

impl OutputFormatter {
    pub fn new(diagnostic: bool) -> Self {
        Self { diagnostic }
    }

    /// Payload value before serialization
    pub fn payload(pool: &ProcessPool) -> Value {
        let result = collapse(&pool.results);

        if pool.errors.is_empty() {
            return result;
        }

        json!({
            "errors": pool.errors,
            "data": result,
        })
    }

    pub fn render(&self, pool: &ProcessPool) -> Result<String> {
        let payload = Self::payload(pool);

        if self.diagnostic {
            return Ok(serde_json::to_string_pretty(&payload)?);
        }

        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, EmbedSafeFormatter);
        payload.serialize(&mut serializer)?;

        // Only ASCII is ever written by EmbedSafeFormatter
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the MIME header and the payload
    pub fn flush(&self, pool: &ProcessPool, sink: &mut dyn ResponseSink) -> Result<()> {
        let body = self.render(pool)?;

        sink.set_header(HEADER_CONTENT_TYPE, &pool.mime);
        sink.write_body(&body);
        if !sink.is_embedded() {
            sink.write_body("\n");
        }
        Ok(())
    }
}

/// A single result collapses to its value; anything else stays a mapping
fn collapse(results: &Map<String, Value>) -> Value {
    if results.len() == 1 {
        if let Some(only) = results.values().next() {
            return only.clone();
        }
    }
    Value::Object(results.clone())
}

/// JSON formatter that keeps output safe to embed in HTML/script contexts
struct EmbedSafeFormatter;

impl Formatter for EmbedSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && !matches!(ch, '<' | '>' | '&' | '\'') {
                writer.write_all(&[ch as u8])?;
                continue;
            }
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestEnv;
    use crate::error::GatewayError;
    use crate::port::BufferedResponse;

    fn pool_with_results(results: Value) -> ProcessPool {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        pool.results = results.as_object().cloned().unwrap_or_default();
        pool
    }

    #[test]
    fn test_single_result_collapses() {
        let pool = pool_with_results(json!({"a": 5}));
        assert_eq!(OutputFormatter::default().render(&pool).unwrap(), "5");
    }

    #[test]
    fn test_multiple_results_stay_mapping() {
        let pool = pool_with_results(json!({"b": 6, "a": 5}));
        assert_eq!(
            OutputFormatter::default().render(&pool).unwrap(),
            r#"{"a":5,"b":6}"#
        );
    }

    #[test]
    fn test_no_results_is_empty_object() {
        let pool = pool_with_results(json!({}));
        assert_eq!(OutputFormatter::default().render(&pool).unwrap(), "{}");
    }

    #[test]
    fn test_errors_wrap_collapsed_result() {
        let mut pool = pool_with_results(json!({"job": {"ok": false}}));
        pool.push_error(&GatewayError::Execution("boom".into()));

        let payload = OutputFormatter::payload(&pool);
        assert_eq!(payload["data"], json!({"ok": false}));
        assert_eq!(payload["errors"][0]["code"], json!(crate::error::code::EXECUTION_ERROR));
        assert_eq!(payload["errors"][0]["message"], json!("Execution error: boom"));
    }

    #[test]
    fn test_compact_mode_escapes_for_embedding() {
        let pool = pool_with_results(json!({"k": "é</script>&'"}));
        let out = OutputFormatter::new(false).render(&pool).unwrap();
        assert_eq!(out, r#""\u00e9\u003c/script\u003e\u0026\u0027""#);
        assert!(out.is_ascii());
    }

    #[test]
    fn test_compact_mode_escapes_astral_as_surrogates() {
        let pool = pool_with_results(json!({"k": "😀"}));
        let out = OutputFormatter::new(false).render(&pool).unwrap();
        assert_eq!(out, r#""\ud83d\ude00""#);
    }

    #[test]
    fn test_diagnostic_mode_keeps_unicode_and_slashes() {
        let pool = pool_with_results(json!({"a": "é/x", "b": [1, {"c": null}]}));
        let out = OutputFormatter::new(true).render(&pool).unwrap();
        assert!(out.contains("é/x"));
        assert!(out.contains('\n'));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"a": "é/x", "b": [1, {"c": null}]}));
    }

    #[test]
    fn test_compact_output_round_trips_through_parser() {
        let original = json!({"x": {"y": ["ü", "\"quoted\"", "tab\there"]}, "z": 1});
        let pool = pool_with_results(original.clone());
        let out = OutputFormatter::new(false).render(&pool).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_flush_writes_mime_and_newline() {
        let mut pool = pool_with_results(json!({"a": 1}));
        pool.mime = "application/json".into();
        let mut sink = BufferedResponse::new();

        OutputFormatter::default().flush(&pool, &mut sink).unwrap();

        assert_eq!(sink.header("content-type"), Some("application/json"));
        assert_eq!(sink.body(), "1\n");
    }

    #[test]
    fn test_flush_embedded_has_no_newline() {
        let pool = pool_with_results(json!({"a": 1}));
        let mut sink = BufferedResponse::embedded();

        OutputFormatter::default().flush(&pool, &mut sink).unwrap();
        assert_eq!(sink.body(), "1");
    }
}
