//! Functions every program can call: console output and colors.

use std::io::Write;
use std::rc::Rc;

use crate::value::{NativeFn, Value};

/// Receives text written by a script.
pub type OutputFn = Rc<dyn Fn(&str)>;

pub(crate) fn default_stdout() -> OutputFn {
    Rc::new(|text| {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    })
}

pub(crate) fn default_stderr() -> OutputFn {
    Rc::new(|text| {
        let _ = std::io::stderr().lock().write_all(text.as_bytes());
    })
}

/// Every builtin, bound to the given output sinks.
pub(crate) fn builtins(stdout: &OutputFn, stderr: &OutputFn) -> Vec<(&'static str, NativeFn)> {
    vec![
        ("write", writer(stdout, "")),
        ("writeLine", writer(stdout, "\n")),
        ("writeError", writer(stderr, "")),
        ("writeErrorLine", writer(stderr, "\n")),
        ("setForeground", colorizer(stdout, 0)),
        ("setBackground", colorizer(stdout, 10)),
        ("resetColor", {
            let out = stdout.clone();
            NativeFn::new(move |_| {
                out("\x1b[0m");
                Ok(Value::Undefined)
            })
        }),
    ]
}

/// Arguments rendered and joined without a separator.
fn render(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect()
}

fn writer(sink: &OutputFn, suffix: &'static str) -> NativeFn {
    let sink = sink.clone();
    NativeFn::new(move |args| {
        let mut text = render(&args);
        text.push_str(suffix);
        sink(&text);
        Ok(Value::Undefined)
    })
}

fn colorizer(sink: &OutputFn, offset: u8) -> NativeFn {
    let sink = sink.clone();
    NativeFn::new(move |args| {
        let name = args
            .first()
            .map(Value::to_string)
            .ok_or_else(|| "expected a color name".to_string())?;
        let code = color_code(&name).ok_or_else(|| format!("unknown color [{name}]"))?;
        sink(&format!("\x1b[{}m", code + offset));
        Ok(Value::Undefined)
    })
}

/// SGR foreground code for a color name: `red`, `brightRed`, `bright_red`...
fn color_code(name: &str) -> Option<u8> {
    const BASE: [&str; 8] = [
        "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
    ];
    let name = name.to_ascii_lowercase().replace('_', "");
    let (bright, base) = match name.strip_prefix("bright") {
        Some(rest) => (true, rest.to_string()),
        None => (false, name),
    };
    let index = BASE.iter().position(|c| *c == base)? as u8;
    Some(if bright { 90 + index } else { 30 + index })
}
