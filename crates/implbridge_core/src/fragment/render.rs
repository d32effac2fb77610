//! Fragment script rendering.
//!
//! Produces the exact script text of one `implementors/**/trait.*.js`
//! fragment: build the `implementors` object, then hand it to
//! `window.register_implementors` or park it in `window.pending_implementors`.

use crate::model::contribution::Contribution;
use std::fmt::Write;

const FRAGMENT_PREAMBLE: &str = "(function() {var implementors = {};\n";

const FRAGMENT_TRAILER: &str = concat!(
    "\n\n",
    "            if (window.register_implementors) {\n",
    "                window.register_implementors(implementors);\n",
    "            } else {\n",
    "                window.pending_implementors = implementors;\n",
    "            }\n",
    "        \n",
    "})()\n",
);

/// Renders `contribution` as a fragment script.
///
/// Items are emitted verbatim apart from escaping `\`, `"` and characters a
/// script string literal cannot hold raw (control characters, U+2028, U+2029);
/// keys escape `'` instead of `"`. Empty groups render as `[]`, non-empty lists
/// keep the trailing comma the generator writes.
pub fn render_fragment(contribution: &Contribution) -> String {
    let mut out = String::from(FRAGMENT_PREAMBLE);
    for group in contribution.groups() {
        out.push_str("implementors['");
        push_escaped(&mut out, &group.key, '\'');
        out.push_str("'] = [");
        for item in &group.items {
            out.push('"');
            push_escaped(&mut out, item, '"');
            out.push_str("\",");
        }
        out.push_str("];");
    }
    out.push_str(FRAGMENT_TRAILER);
    out
}

fn push_escaped(out: &mut String, value: &str, quote: char) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}
