//! HTTP/1.1 wire-format reconstruction.
//!
//! Output layout:
//! ```text
//! <METHOD> <path>[?<query>] HTTP/1.1
//! <Name>: <Value>        (one line per captured header, arrival order)
//!                        (blank separator)
//! <body text | [Binary data: N bytes]>
//! ```
//! Lines are joined with `\n` and nothing is appended after the body, so a
//! request without a body ends in `"\n\n"`.

use crate::capture::classifier::binary_marker;
use crate::capture::model::RequestModel;

/// Render `model` as a raw request. Pure: same model, same bytes.
pub fn render(model: &RequestModel) -> Vec<u8> {
    let mut lines = Vec::with_capacity(model.headers().len() + 3);

    lines.push(format!(
        "{} {} HTTP/1.1",
        model.method(),
        model.url().path_with_query()
    ));
    for header in model.headers().iter() {
        lines.push(format!("{}: {}", header.name, header.value));
    }
    lines.push(String::new());
    lines.push(render_body(model.raw_body()));

    lines.join("\n").into_bytes()
}

fn render_body(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => binary_marker(body.len()),
    }
}
