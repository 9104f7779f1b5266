use anyhow::Result;
use profview::ShowOutput;
use serde::Serialize;
use serde_json::Value;

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }

        let rendered = render_value(&serde_json::to_value(value)?, 0);
        println!("{rendered}");
        Ok(())
    }

    /// Print `value[field]` verbatim in pretty mode, or the whole value as JSON.
    pub fn print_document(&self, value: &Value, field: &str) -> Result<()> {
        match value.get(field).and_then(Value::as_str) {
            Some(doc) if !self.json => {
                println!("{doc}");
                Ok(())
            }
            _ => self.print_serialized(value),
        }
    }

    pub fn print_show(&self, show: &ShowOutput) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(show)?);
            return Ok(());
        }

        if show.rows.is_empty() {
            self.print_warning(profview::NO_MATCHES_MESSAGE);
        }

        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            self.style("profview", "36;1"),
            self.style(&show.file, "37;1")
        ));
        out.push_str(&format!(
            "{} {} {} {} {} {}\n",
            self.style("metric", "90"),
            show.metric.label(),
            self.style("order", "90"),
            show.order.label(),
            self.style("threshold", "90"),
            show.threshold
        ));
        out.push_str(&format!(
            "{} {}/{}\n",
            self.style("matched", "90"),
            show.matched,
            show.total
        ));

        let width = show
            .rows
            .iter()
            .map(|r| r.section.chars().count())
            .max()
            .unwrap_or(0)
            .max("section".len());
        out.push_str(&format!(
            "{}\n",
            self.style(&format!("{:<width$}  {:>14}  {:>7}", "section", "value", "calls"), "90")
        ));
        for row in &show.rows {
            out.push_str(&format!(
                "{:<width$}  {:>14.6}  {:>7}\n",
                row.section, row.value, row.calls
            ));
        }
        println!("{}", out.trim_end());
        Ok(())
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "code": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    pub fn print_warning(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "warning",
                "code": "warning",
                "message": msg,
            });
            eprintln!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("warn", "33;1"));
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) => render_array(items, indent),
        Value::Object(map) => render_object(map, indent),
    }
}

fn render_array(items: &[Value], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for item in items {
        match item {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!("{pad}-\n{}\n", render_value(item, indent + 2)));
            }
            _ => out.push_str(&format!("{pad}- {}\n", render_value(item, indent + 2))),
        }
    }
    out.trim_end().to_string()
}

fn render_object(map: &serde_json::Map<String, Value>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, value) in map {
        match value {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!(
                    "{pad}{key}:\n{}\n",
                    render_value(value, indent + 2)
                ));
            }
            _ => out.push_str(&format!(
                "{pad}{key}: {}\n",
                render_value(value, indent + 2)
            )),
        }
    }
    out.trim_end().to_string()
}
