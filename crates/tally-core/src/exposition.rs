//! Encoders for collected families.
//!
//! Text output follows the Prometheus exposition format 0.0.4: a `# HELP` and
//! `# TYPE` line per family, then one line per sample.

use std::fmt::Write;

use serde_json::{json, Map};

use crate::metric::{MetricFamily, Value};

/// Content type of the text format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// HELP text only escapes backslash and newline.
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn write_value(out: &mut String, v: Value) -> std::fmt::Result {
    match v {
        Value::Unsigned(n) => write!(out, "{n}"),
        Value::Signed(n) => write!(out, "{n}"),
        Value::Float(f) if f.is_nan() => out.write_str("NaN"),
        Value::Float(f) if f.is_infinite() => {
            out.write_str(if f > 0.0 { "+Inf" } else { "-Inf" })
        }
        Value::Float(f) => write!(out, "{f}"),
    }
}

/// Labels of a sample followed by any default labels it does not override.
fn merged_labels<'a>(
    own: &'a [(String, String)],
    defaults: &'a [(String, String)],
) -> impl Iterator<Item = &'a (String, String)> {
    own.iter()
        .chain(defaults.iter().filter(move |(k, _)| !own.iter().any(|(o, _)| o == k)))
}

/// Render families in text exposition format.
pub fn encode_text(
    families: &[MetricFamily],
    default_labels: &[(String, String)],
    out: &mut String,
) -> std::fmt::Result {
    for fam in families {
        writeln!(out, "# HELP {} {}", fam.name, escape_help(&fam.help))?;
        writeln!(out, "# TYPE {} {}", fam.name, fam.kind.as_str())?;
        for s in &fam.samples {
            out.push_str(&fam.name);
            let mut labels = merged_labels(&s.labels, default_labels).peekable();
            if labels.peek().is_some() {
                out.push('{');
                for (i, (k, v)) in labels.enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write!(out, "{}=\"{}\"", k, escape_label(v))?;
                }
                out.push('}');
            }
            out.push(' ');
            write_value(out, s.value)?;
            out.push('\n');
        }
    }
    Ok(())
}

/// Render families as a JSON array, one object per family.
pub fn encode_json(families: &[MetricFamily], default_labels: &[(String, String)]) -> serde_json::Value {
    let list: Vec<serde_json::Value> = families
        .iter()
        .map(|fam| {
            let values: Vec<serde_json::Value> = fam
                .samples
                .iter()
                .map(|s| {
                    let labels: Map<String, serde_json::Value> = merged_labels(&s.labels, default_labels)
                        .map(|(k, v)| (k.clone(), json!(v)))
                        .collect();
                    json!({ "labels": labels, "value": s.value })
                })
                .collect();
            json!({
                "name": fam.name,
                "help": fam.help,
                "type": fam.kind,
                "values": values,
            })
        })
        .collect();
    serde_json::Value::Array(list)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::metric::{MetricKind, Sample};

    fn family(samples: Vec<Sample>) -> MetricFamily {
        MetricFamily {
            name: "demo_total".into(),
            help: "line one\nback\\slash".into(),
            kind: MetricKind::Counter,
            samples,
        }
    }

    #[test]
    fn text_escapes_help_and_labels() {
        let fam = family(vec![Sample {
            labels: vec![("path".into(), "a\"b\\c\nd".into())],
            value: Value::Unsigned(7),
        }]);
        let mut out = String::new();
        encode_text(&[fam], &[], &mut out).unwrap();
        assert_eq!(
            out,
            "# HELP demo_total line one\\nback\\\\slash\n\
             # TYPE demo_total counter\n\
             demo_total{path=\"a\\\"b\\\\c\\nd\"} 7\n"
        );
    }

    #[test]
    fn unlabeled_sample_has_no_braces() {
        let mut out = String::new();
        encode_text(&[family(vec![Sample::unlabeled(Value::Signed(-2))])], &[], &mut out).unwrap();
        assert!(out.ends_with("demo_total -2\n"));
    }

    #[test]
    fn special_floats() {
        let mut out = String::new();
        let fam = family(vec![
            Sample::unlabeled(Value::Float(f64::INFINITY)),
            Sample::unlabeled(Value::Float(f64::NEG_INFINITY)),
            Sample::unlabeled(Value::Float(f64::NAN)),
            Sample::unlabeled(Value::Float(1.5)),
        ]);
        encode_text(&[fam], &[], &mut out).unwrap();
        assert!(out.contains("demo_total +Inf\n"));
        assert!(out.contains("demo_total -Inf\n"));
        assert!(out.contains("demo_total NaN\n"));
        assert!(out.contains("demo_total 1.5\n"));
    }

    #[test]
    fn default_labels_do_not_override_own() {
        let defaults = vec![
            ("service".to_string(), "api".to_string()),
            ("path".to_string(), "ignored".to_string()),
        ];
        let fam = family(vec![Sample {
            labels: vec![("path".into(), "/".into())],
            value: Value::Unsigned(1),
        }]);
        let mut out = String::new();
        encode_text(&[fam.clone()], &defaults, &mut out).unwrap();
        assert!(out.contains("demo_total{path=\"/\",service=\"api\"} 1\n"));

        let v = encode_json(&[fam], &defaults);
        assert_eq!(v[0]["values"][0]["labels"]["path"], "/");
        assert_eq!(v[0]["values"][0]["labels"]["service"], "api");
        assert_eq!(v[0]["type"], "counter");
        assert_eq!(v[0]["values"][0]["value"], 1);
    }
}
